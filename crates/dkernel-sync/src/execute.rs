//! Headless notebook execution.

use dkernel_core::{CollectingFrontend, ExecuteRequest, Kernel, ReplyStatus};

use crate::error::{SyncError, SyncResult};
use crate::ipynb::{CellOutput, JupyterNotebook, KernelSpec, MultilineText};

/// Summary of a notebook run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotebookRun {
    /// Code cells executed.
    pub executed: usize,
    /// Whether execution stopped early because a cell was interrupted.
    pub aborted: bool,
}

/// Execute every code cell of `notebook` in order through `kernel`.
///
/// Each executed cell's outputs are replaced by the stream output it
/// produced and its execution count is set from the reply. Input requests
/// are answered with end-of-file.
pub async fn execute_notebook(
    kernel: &mut Kernel,
    notebook: &mut JupyterNotebook,
) -> SyncResult<NotebookRun> {
    let mut run = NotebookRun::default();

    if notebook.metadata.kernelspec.is_none() {
        notebook.metadata.kernelspec = Some(KernelSpec::d_kernel());
    }
    notebook.metadata.language_info = Some(serde_json::to_value(kernel.info().language_info)?);

    for (index, cell) in notebook.cells.iter_mut().enumerate() {
        if !cell.is_code() {
            continue;
        }

        let request = ExecuteRequest::new(cell.source.text()).allow_stdin(false);
        let mut frontend = CollectingFrontend::new();
        let reply = kernel
            .execute(&request, &mut frontend)
            .await
            .map_err(|source| SyncError::Kernel { index, source })?;

        cell.execution_count = Some(reply.execution_count);
        cell.outputs = Some(
            frontend
                .take()
                .into_iter()
                .map(|(name, text)| CellOutput::Stream {
                    name: name.as_str().to_string(),
                    text: MultilineText::from_text(&text),
                })
                .collect(),
        );
        run.executed += 1;

        if reply.status == ReplyStatus::Abort {
            tracing::warn!(cell = index, "cell interrupted, skipping the rest of the notebook");
            run.aborted = true;
            break;
        }
    }

    Ok(run)
}
