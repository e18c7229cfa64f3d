//! D compiler discovery.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Version number as printed by `dmd --version` (e.g. `v2.109.1`).
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(v\d+(\.\d+)+)").unwrap_or_else(|e| panic!("invalid version pattern: {e}"))
});

/// The D compiler used by a session.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Resolved path of the compiler executable.
    compiler_path: PathBuf,

    /// Short name for banners (`dmd`, `ldmd2`, ...).
    name: String,

    /// Parsed version (e.g. `v2.109.1`), if the output contained one.
    version: Option<String>,
}

impl Toolchain {
    /// Locate `compiler` (a name on PATH or a path) and query its version.
    ///
    /// A missing or unrunnable compiler is a configuration error.
    pub fn detect(compiler: &str) -> Result<Self> {
        let compiler_path = which::which(compiler).map_err(|_| {
            Error::Configuration(format!("compiler `{compiler}` not found in PATH"))
        })?;

        let output = Command::new(&compiler_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::Configuration(format!(
                    "failed to run `{} --version`: {e}",
                    compiler_path.display()
                ))
            })?;

        let text = String::from_utf8_lossy(&output.stdout);
        let version = parse_version(&text);
        if version.is_none() {
            tracing::warn!("could not parse a version from `{compiler} --version`");
        }

        let name = compiler_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| compiler.to_string());

        tracing::debug!(path = %compiler_path.display(), ?version, "detected D compiler");

        Ok(Self {
            compiler_path,
            name,
            version,
        })
    }

    /// Path of the compiler executable.
    pub fn compiler_path(&self) -> &Path {
        &self.compiler_path
    }

    /// Compiler name without directory or extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiler version, if known.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Build the compile command for `source`, run from `cwd`.
    pub fn compile_command(
        &self,
        source: &Path,
        flags: &[String],
        cwd: &Path,
    ) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.compiler_path);
        cmd.arg(source)
            .args(flags)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Extract the first `v<major>.<minor>...` version from compiler output.
pub fn parse_version(text: &str) -> Option<String> {
    VERSION_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
