//! Run command implementation.
//!
//! Executes the code cells of a `.ipynb` notebook headlessly and writes the
//! outputs back into the notebook.

use std::path::Path;
use std::time::Instant;

use dkernel_core::{Kernel, KernelConfig};

use crate::colors;

/// Execute a notebook, writing the result to `output` (or in place).
pub async fn execute(
    notebook_path: &str,
    output: Option<&str>,
    config: KernelConfig,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let path = Path::new(notebook_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", notebook_path);
    }
    let output = output.map(Path::new).unwrap_or(path);

    let mut kernel = Kernel::new(config)?;

    println!(
        "\n{}dkernel{} - Running {}",
        colors::BOLD,
        colors::RESET,
        path.display()
    );
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Compiler:{} {} {}",
        colors::CYAN,
        colors::RESET,
        kernel.toolchain().name(),
        kernel.toolchain().version().unwrap_or("(unknown version)")
    );

    let run = dkernel_sync::run_notebook(&mut kernel, path, output).await?;

    println!("{}", "─".repeat(50));
    if run.aborted {
        println!(
            "{}Aborted{} after {} cells",
            colors::YELLOW,
            colors::RESET,
            run.executed
        );
    } else {
        println!(
            "{}Completed{} {} cells in {:.2}s",
            colors::GREEN,
            colors::RESET,
            run.executed,
            start.elapsed().as_secs_f64()
        );
    }
    println!("{}  ◆ Written:{} {}", colors::CYAN, colors::RESET, output.display());

    Ok(())
}
