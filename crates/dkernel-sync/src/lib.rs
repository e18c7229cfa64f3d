//! Jupyter notebook support for the D kernel.
//!
//! Reads `.ipynb` files, executes their code cells through a
//! [`Kernel`](dkernel_core::Kernel) and writes the outputs back.
//!
//! # Architecture
//!
//! ```text
//! notebook.ipynb ─────► JupyterNotebook ─────► execute_notebook ─────► notebook.ipynb
//!                                                   │
//!                                                   ▼
//!                                            Kernel (one session)
//! ```

mod error;
mod execute;
mod ipynb;

pub use error::{SyncError, SyncResult};
pub use execute::{NotebookRun, execute_notebook};
pub use ipynb::{CellOutput, JupyterCell, JupyterMetadata, JupyterNotebook, KernelSpec, MultilineText};

use std::path::Path;

use dkernel_core::Kernel;

/// Execute the notebook at `input` and write the result to `output`.
///
/// `input` and `output` may be the same path.
pub async fn run_notebook(
    kernel: &mut Kernel,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> SyncResult<NotebookRun> {
    let input = input.as_ref();
    let output = output.as_ref();

    let mut notebook = JupyterNotebook::read_from_file(input)?;
    let run = execute_notebook(kernel, &mut notebook).await?;
    notebook.write_to_file(output)?;

    tracing::info!(
        "Executed {} → {} ({} cells)",
        input.display(),
        output.display(),
        run.executed
    );

    Ok(run)
}
