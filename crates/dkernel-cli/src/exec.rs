//! Exec command implementation.
//!
//! Runs D source files as consecutive cells of one session, printing their
//! output as it arrives.

use std::io::Write;

use dkernel_core::{ExecuteRequest, Frontend, Kernel, KernelConfig, ReplyStatus, StreamName};

use crate::colors;

/// Front-end writing cell output straight to the terminal.
struct TerminalFrontend;

impl Frontend for TerminalFrontend {
    fn stream(&mut self, name: StreamName, text: &str) {
        match name {
            StreamName::Stdout => {
                print!("{text}");
                colors::flush_stdout();
            }
            StreamName::Stderr => {
                eprint!("{text}");
                std::io::stderr().flush().ok();
            }
        }
    }

    async fn raw_input(&mut self, _prompt: &str) -> Option<String> {
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await;
        line.ok().flatten()
    }
}

/// Execute each file as one cell, in order.
pub async fn execute(files: &[String], config: KernelConfig, quiet: bool) -> anyhow::Result<()> {
    let mut kernel = Kernel::new(config)?;
    let mut frontend = TerminalFrontend;

    // Ctrl+C interrupts the running cell instead of killing the CLI.
    let interrupt = kernel.interrupt_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupt.interrupt();
        }
    });

    for file in files {
        let code = std::fs::read_to_string(file)
            .map_err(|e| anyhow::anyhow!("Failed to read {file}: {e}"))?;

        if !quiet {
            println!(
                "{}[{}] {}{}",
                colors::DIM,
                kernel.execution_count() + 1,
                file,
                colors::RESET
            );
        }

        let reply = kernel
            .execute(&ExecuteRequest::new(code), &mut frontend)
            .await?;
        if reply.status == ReplyStatus::Abort {
            anyhow::bail!("Execution of {file} was interrupted");
        }
    }

    Ok(())
}
