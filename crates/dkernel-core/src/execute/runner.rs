//! Compiling and running one assembled program.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::InterruptHandle;
use super::supervise::supervise;
use crate::compile::{BuildWorkspace, Toolchain, neutralize};
use crate::config::KernelConfig;
use crate::error::{Error, Phase, Result};
use crate::frontend::{Frontend, StreamName};

/// Outcome of running a compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code, if the program exited normally.
    pub exit_code: Option<i32>,
    /// Terminating signal, if the program was killed by one (unix).
    pub signal: Option<i32>,
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
}

impl ExecutionResult {
    /// Whether the program exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text reported after the output of a program that did not succeed.
    pub fn fault(&self) -> Option<String> {
        match (self.exit_code, self.signal) {
            (Some(0), _) => None,
            (Some(code), _) => Some(format!("process exited with code {code}\n")),
            (None, Some(signal)) => Some(format!("process terminated by signal {signal}\n")),
            (None, None) => Some("process terminated abnormally\n".to_string()),
        }
    }

    fn record_status(&mut self, status: ExitStatus) {
        self.exit_code = status.code();
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            self.signal = status.signal();
        }
    }
}

/// Drives the compiler and the produced binary for one execution.
pub struct ProgramRunner<'a> {
    toolchain: &'a Toolchain,
    config: &'a KernelConfig,
    interrupt: &'a InterruptHandle,
}

impl<'a> ProgramRunner<'a> {
    pub fn new(
        toolchain: &'a Toolchain,
        config: &'a KernelConfig,
        interrupt: &'a InterruptHandle,
    ) -> Self {
        Self {
            toolchain,
            config,
            interrupt,
        }
    }

    /// The interrupt handle the runner honours.
    pub fn interrupt(&self) -> &InterruptHandle {
        self.interrupt
    }

    /// Compile the workspace's source into its binary.
    ///
    /// A non-zero exit or any text on stderr fails with
    /// [`Error::Compilation`], carrying the neutralised compiler output.
    pub async fn compile(&self, workspace: &BuildWorkspace) -> Result<()> {
        let mut command = self.toolchain.compile_command(
            workspace.source(),
            &self.config.compiler_flags,
            workspace.dir(),
        );
        tracing::debug!(?command, "compiling");

        let child = command.spawn().map_err(|e| {
            Error::Configuration(format!(
                "failed to start compiler {}: {e}",
                self.toolchain.compiler_path().display()
            ))
        })?;

        let mut output = String::new();
        let mut wrote_stderr = false;
        let status = supervise(
            child,
            Phase::Compile,
            self.config.timeout,
            self.interrupt,
            |name, text| {
                wrote_stderr |= name == StreamName::Stderr && !text.is_empty();
                output.push_str(&text);
            },
        )
        .await?;

        if status.success() && !wrote_stderr {
            return Ok(());
        }

        tracing::debug!(code = ?status.code(), "compilation failed");
        Err(Error::Compilation {
            diagnostics: neutralize(
                &output,
                workspace.source(),
                workspace.dir(),
                &self.config.placeholder,
            ),
        })
    }

    /// Run the compiled binary, streaming its output to `frontend`.
    ///
    /// `stdin` is written to the program and then closed. Without it the
    /// program reads end-of-file.
    pub async fn run<F: Frontend>(
        &self,
        workspace: &BuildWorkspace,
        frontend: &mut F,
        stdin: Option<String>,
    ) -> Result<ExecutionResult> {
        let binary = workspace.binary();
        let mut command = Command::new(&binary);
        command
            .current_dir(workspace.dir())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(binary = %binary.display(), "running");

        let mut child = command.spawn().map_err(|source| Error::Launch {
            program: self.config.placeholder.clone(),
            source,
        })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            tokio::spawn(async move {
                // The program may exit without reading; a broken pipe is fine.
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    tracing::debug!("stdin not fully written: {e}");
                }
            });
        }

        let mut result = ExecutionResult::default();
        let status = supervise(
            child,
            Phase::Run,
            self.config.timeout,
            self.interrupt,
            |name, text| {
                frontend.stream(name, &text);
                match name {
                    StreamName::Stdout => result.stdout.push_str(&text),
                    StreamName::Stderr => result.stderr.push_str(&text),
                }
            },
        )
        .await?;

        result.record_status(status);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages() {
        let ok = ExecutionResult {
            exit_code: Some(0),
            ..Default::default()
        };
        assert!(ok.success());
        assert_eq!(ok.fault(), None);

        let failed = ExecutionResult {
            exit_code: Some(3),
            ..Default::default()
        };
        assert_eq!(failed.fault().as_deref(), Some("process exited with code 3\n"));

        let killed = ExecutionResult {
            signal: Some(11),
            ..Default::default()
        };
        assert!(!killed.success());
        assert_eq!(killed.fault().as_deref(), Some("process terminated by signal 11\n"));
    }
}
