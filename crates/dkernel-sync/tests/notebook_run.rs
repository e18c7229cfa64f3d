//! Integration tests for headless notebook execution.
//!
//! Uses a shell-script stand-in for `dmd` that turns every
//! `writeln("...")` string literal of the assembled program into a line of
//! output, and fails to compile any program containing `COMPILE_ERROR`.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use dkernel_core::{Kernel, KernelConfig};
use dkernel_sync::{JupyterCell, JupyterNotebook, run_notebook};
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const FAKE_DMD: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "DMD64 D Compiler v2.109.1"
    exit 0
fi
src="$1"
if grep -q COMPILE_ERROR "$src"; then
    echo "$src(1): Error: undefined identifier \`COMPILE_ERROR\`" >&2
    exit 1
fi
out="./$(basename "$src" .d)"
{
    echo '#!/bin/sh'
    echo "cat <<'__OUTPUT__'"
    sed -n 's/.*writeln("\([^"]*\)").*/\1/p' "$src"
    echo '__OUTPUT__'
} > "$out"
chmod +x "$out"
"#;

/// Create a temporary directory for test artifacts.
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

fn kernel(dir: &TempDir) -> Kernel {
    let compiler = dir.path().join("dmd");
    fs::write(&compiler, FAKE_DMD).unwrap();
    fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

    let config = KernelConfig::default()
        .with_compiler(compiler.to_string_lossy())
        .with_work_dir(dir.path());
    Kernel::new(config).expect("Failed to start kernel")
}

fn sample_notebook() -> JupyterNotebook {
    let mut notebook = JupyterNotebook::new();
    notebook.cells = vec![
        JupyterCell::markdown("# Greetings\n"),
        JupyterCell::code("import std.stdio;"),
        JupyterCell::code("void greet() { writeln(\"hello\"); }"),
        JupyterCell::code("greet();\nwriteln(\"done\");"),
        JupyterCell::code("int broken() { return COMPILE_ERROR; }"),
    ];
    notebook
}

// =============================================================================
// Execution Tests
// =============================================================================

#[tokio::test]
async fn test_run_records_outputs_and_counts() {
    let temp = temp_dir();
    let mut kernel = kernel(&temp);
    let input = temp.path().join("greetings.ipynb");
    let output = temp.path().join("greetings.out.ipynb");
    sample_notebook().write_to_file(&input).unwrap();

    let run = run_notebook(&mut kernel, &input, &output).await.unwrap();
    assert_eq!(run.executed, 4);
    assert!(!run.aborted);

    let notebook = JupyterNotebook::read_from_file(&output).unwrap();
    let code: Vec<&JupyterCell> = notebook.code_cells().collect();
    let counts: Vec<Option<u64>> = code.iter().map(|c| c.execution_count).collect();
    assert_eq!(counts, vec![Some(1), Some(2), Some(3), Some(4)]);

    // The fake compiler echoes every writeln literal in the assembled program.
    assert_eq!(code[2].stream_text("stdout"), "hello\ndone\n");
    assert!(code[3].stream_text("stdout").contains("line(1): Error"));
    assert!(code[0].outputs.as_ref().unwrap().is_empty());

    assert_eq!(notebook.cells[0].cell_type, "markdown");
    assert!(notebook.cells[0].outputs.is_none());
}

#[tokio::test]
async fn test_run_sets_language_info() {
    let temp = temp_dir();
    let mut kernel = kernel(&temp);
    let path = temp.path().join("in_place.ipynb");
    sample_notebook().write_to_file(&path).unwrap();

    run_notebook(&mut kernel, &path, &path).await.unwrap();

    let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["metadata"]["language_info"]["name"], "d");
    assert_eq!(value["metadata"]["language_info"]["version"], "v2.109.1");
    assert_eq!(value["metadata"]["kernelspec"]["name"], "d");
}

#[tokio::test]
async fn test_missing_notebook_is_read_error() {
    let temp = temp_dir();
    let mut kernel = kernel(&temp);
    let missing = temp.path().join("missing.ipynb");

    let err = run_notebook(&mut kernel, &missing, &missing).await.unwrap_err();
    assert!(matches!(err, dkernel_sync::SyncError::ReadError { .. }));
}
