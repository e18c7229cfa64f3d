//! dkernel CLI - Jupyter kernel for the D programming language.

mod colors;
mod exec;
mod info;
mod protocol;
mod run;
mod serve;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dkernel_core::{KernelConfig, StatementPolicy};

#[derive(Parser)]
#[command(name = "dkernel")]
#[command(about = "Jupyter kernel for the D programming language")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    kernel: KernelArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by every command that starts a kernel session.
#[derive(Args)]
struct KernelArgs {
    /// D compiler to use (defaults to $DKERNEL_COMPILER, then dmd)
    #[arg(long, global = true)]
    compiler: Option<String>,

    /// Extra flag passed to the compiler (repeatable)
    #[arg(long = "compiler-flag", global = true, allow_hyphen_values = true)]
    compiler_flags: Vec<String>,

    /// Per-phase timeout in seconds (0 disables)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Directory for temporary build folders (defaults to the current directory)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Run statements that share a cell with declarations
    #[arg(long, global = true)]
    residual: bool,
}

impl KernelArgs {
    fn config(&self) -> KernelConfig {
        let mut config = KernelConfig::default().with_extra_flags(self.compiler_flags.clone());
        if let Some(compiler) = &self.compiler {
            config = config.with_compiler(compiler);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(dir) = &self.work_dir {
            config = config.with_work_dir(dir);
        }
        if self.residual {
            config = config.with_statement_policy(StatementPolicy::Residual);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one kernel session over JSON lines on stdin/stdout
    Serve,

    /// Execute a Jupyter notebook (.ipynb) headlessly
    Run {
        /// Path to the notebook
        notebook: String,

        /// Write the executed notebook here instead of in place
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Execute D source files as consecutive cells
    Exec {
        /// Cell files, executed in order
        #[arg(required = true)]
        files: Vec<String>,

        /// Do not print a header before each cell
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the kernel banner and language information
    Info {
        /// Print kernel info as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Always on stderr: stdout carries the serve protocol.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format dkernel-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<dkernel_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else if let Some(dkernel_sync::SyncError::Kernel { source, .. }) =
            err.downcast_ref::<dkernel_sync::SyncError>()
        {
            anyhow::anyhow!("{}", source.with_hint())
        } else {
            err
        }
    };

    let config = cli.kernel.config();

    match cli.command {
        Commands::Serve => serve::execute(config).await.map_err(format_error)?,

        Commands::Run { notebook, output } => {
            run::execute(&notebook, output.as_deref(), config)
                .await
                .map_err(format_error)?;
        }

        Commands::Exec { files, quiet } => {
            exec::execute(&files, config, quiet)
                .await
                .map_err(format_error)?;
        }

        Commands::Info { json } => info::execute(config, json).map_err(format_error)?,
    }

    Ok(())
}
