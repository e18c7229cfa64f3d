//! The kernel session.
//!
//! A [`Kernel`] owns everything that outlives a single cell: the declaration
//! store, the detected toolchain, the execution counter and the interrupt
//! handle. Hosts feed it [`ExecuteRequest`]s and a [`Frontend`].

mod messages;

pub use messages::{
    CompleteReply, ExecuteReply, ExecuteRequest, InspectReply, KernelInfo, LanguageInfo,
    PROTOCOL_VERSION, ReplyStatus,
};

use serde_json::Map;

use crate::assemble::{AssembledProgram, assemble};
use crate::classify::{Classification, Classifier};
use crate::compile::{BuildWorkspace, Toolchain};
use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::execute::{InterruptHandle, ProgramRunner};
use crate::frontend::{Frontend, Muted, StreamName};
use crate::store::{DeclarationStore, StoreTransaction};

/// Implementation name reported to front-ends.
pub const IMPLEMENTATION: &str = "d_kernel";

/// A D kernel session.
pub struct Kernel {
    config: KernelConfig,
    toolchain: Toolchain,
    classifier: Classifier,
    store: DeclarationStore,
    execution_count: u64,
    interrupt: InterruptHandle,
}

impl Kernel {
    /// Start a session, locating the configured compiler.
    pub fn new(config: KernelConfig) -> Result<Self> {
        let toolchain = Toolchain::detect(&config.compiler)?;
        Ok(Self::with_toolchain(config, toolchain))
    }

    /// Start a session with an already detected toolchain.
    pub fn with_toolchain(config: KernelConfig, toolchain: Toolchain) -> Self {
        tracing::info!(
            compiler = %toolchain.compiler_path().display(),
            version = toolchain.version().unwrap_or("unknown"),
            work_dir = %config.work_dir.display(),
            "D kernel session started"
        );
        Self {
            classifier: Classifier::new(config.statement_policy),
            config,
            toolchain,
            store: DeclarationStore::new(),
            execution_count: 0,
            interrupt: InterruptHandle::new(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Declarations remembered so far.
    pub fn store(&self) -> &DeclarationStore {
        &self.store
    }

    /// Number of counted executions.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// A handle that interrupts the cell currently executing.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Forget all declarations and restart the execution counter.
    pub fn reset(&mut self) {
        self.store.clear();
        self.execution_count = 0;
    }

    /// Kernel banner.
    pub fn banner(&self) -> String {
        format!(
            "D kernel.\n Uses {}, compiles in D {}, and creates source code files and \
             executables in temporary folder.\n",
            self.toolchain.name(),
            self.language_version()
        )
    }

    /// Kernel and language description.
    pub fn info(&self) -> KernelInfo {
        KernelInfo {
            protocol_version: PROTOCOL_VERSION.to_string(),
            implementation: IMPLEMENTATION.to_string(),
            implementation_version: env!("CARGO_PKG_VERSION").to_string(),
            language_info: LanguageInfo {
                name: "d".to_string(),
                version: self.language_version().to_string(),
                mimetype: "text/plain".to_string(),
                file_extension: ".d".to_string(),
            },
            banner: self.banner(),
            help_links: Vec::new(),
        }
    }

    /// Code completion. Not supported: no matches.
    pub fn complete(&self, _code: &str, cursor_pos: usize) -> CompleteReply {
        CompleteReply {
            status: ReplyStatus::Ok,
            matches: Vec::new(),
            cursor_start: cursor_pos,
            cursor_end: cursor_pos,
            metadata: Map::new(),
        }
    }

    /// Object inspection. Not supported: nothing found.
    pub fn inspect(&self, _code: &str, _cursor_pos: usize, _detail_level: u8) -> InspectReply {
        InspectReply {
            status: ReplyStatus::Ok,
            found: false,
            data: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Execute one cell.
    ///
    /// Compiler diagnostics, timeouts and non-zero exits are reported through
    /// `frontend` and still produce an `ok` reply; an interrupt produces
    /// `abort`. Only kernel-level failures (such as a missing compiler)
    /// are returned as errors.
    pub async fn execute<F: Frontend>(
        &mut self,
        request: &ExecuteRequest,
        frontend: &mut F,
    ) -> Result<ExecuteReply> {
        if request.store_history && !request.silent {
            self.execution_count += 1;
        }
        self.interrupt.reset();

        let status = if request.silent {
            self.execute_cell(request, &mut Muted(frontend)).await?
        } else {
            self.execute_cell(request, frontend).await?
        };
        Ok(ExecuteReply::new(status, self.execution_count))
    }

    async fn execute_cell<F: Frontend>(
        &mut self,
        request: &ExecuteRequest,
        frontend: &mut F,
    ) -> Result<ReplyStatus> {
        let cell = self.classifier.classify(&request.code);
        if matches!(cell, Classification::Empty) {
            return Ok(ReplyStatus::Ok);
        }

        let Self {
            config,
            toolchain,
            store,
            interrupt,
            ..
        } = self;
        let tx = store.apply(cell.declarations());
        let program = assemble(tx.store(), &cell);
        let workspace = BuildWorkspace::create(&config.work_dir, program.source())?;
        let runner = ProgramRunner::new(toolchain, config, interrupt);

        let outcome =
            compile_and_run(&runner, &workspace, tx, &program, request.allow_stdin, frontend)
                .await;

        if let Err(e) = workspace.close() {
            tracing::warn!("{e}");
        }

        match outcome {
            Ok(()) => Ok(ReplyStatus::Ok),
            Err(Error::Compilation { diagnostics }) => {
                frontend.stream(StreamName::Stdout, &diagnostics);
                Ok(ReplyStatus::Ok)
            }
            Err(err @ Error::Timeout { .. }) => {
                frontend.stream(StreamName::Stderr, &format!("{err}\n"));
                Ok(ReplyStatus::Ok)
            }
            Err(Error::Interrupted) => {
                tracing::debug!("cell interrupted");
                Ok(ReplyStatus::Abort)
            }
            Err(err) => Err(err),
        }
    }

    fn language_version(&self) -> &str {
        self.toolchain.version().unwrap_or("unknown")
    }
}

/// Compile the assembled program and, if that succeeds, run it.
///
/// The transaction is committed once the program ran to completion or hit
/// the run timeout. A compile failure or an interrupt drops it, which rolls
/// the cell's declarations back.
async fn compile_and_run<F: Frontend>(
    runner: &ProgramRunner<'_>,
    workspace: &BuildWorkspace,
    tx: StoreTransaction<'_>,
    program: &AssembledProgram,
    allow_stdin: bool,
    frontend: &mut F,
) -> Result<()> {
    if let Err(err) = runner.compile(workspace).await {
        if tx.changes() > 0 {
            tracing::warn!(
                entries = tx.changes(),
                "compilation failed, discarding cell declarations"
            );
        }
        return Err(err);
    }

    let stdin = if allow_stdin && program.reads_stdin() {
        tokio::select! {
            answer = frontend.raw_input("") => answer,
            _ = runner.interrupt().interrupted() => return Err(Error::Interrupted),
        }
    } else {
        None
    };

    match runner.run(workspace, frontend, stdin).await {
        Ok(result) => {
            tx.commit();
            if let Some(trailer) = result.fault() {
                frontend.stream(StreamName::Stderr, &trailer);
            }
            Ok(())
        }
        Err(err @ Error::Timeout { .. }) => {
            tx.commit();
            Err(err)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::CollectingFrontend;

    fn kernel() -> Kernel {
        // `sh` stands in for a compiler; these tests never reach it.
        let toolchain = Toolchain::detect("sh").unwrap();
        Kernel::with_toolchain(KernelConfig::default(), toolchain)
    }

    #[tokio::test]
    async fn test_whitespace_cell_is_ok_without_compiling() {
        let mut kernel = kernel();
        let mut frontend = CollectingFrontend::new();
        let reply = kernel
            .execute(&ExecuteRequest::new("  \n\t\n"), &mut frontend)
            .await
            .unwrap();

        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(reply.execution_count, 1);
        assert!(frontend.outputs().is_empty());
    }

    #[tokio::test]
    async fn test_silent_requests_are_not_counted() {
        let mut kernel = kernel();
        let mut frontend = CollectingFrontend::new();
        let reply = kernel
            .execute(&ExecuteRequest::new("").silent(true), &mut frontend)
            .await
            .unwrap();
        assert_eq!(reply.execution_count, 0);

        let reply = kernel
            .execute(&ExecuteRequest::new("").store_history(false), &mut frontend)
            .await
            .unwrap();
        assert_eq!(reply.execution_count, 0);
    }

    #[test]
    fn test_info() {
        let kernel = kernel();
        let info = kernel.info();
        assert_eq!(info.implementation, "d_kernel");
        assert_eq!(info.language_info.name, "d");
        assert_eq!(info.language_info.file_extension, ".d");
        assert_eq!(info.language_info.mimetype, "text/plain");
        assert!(info.banner.starts_with("D kernel.\n Uses sh, compiles in D "));
        assert!(info.banner.ends_with("executables in temporary folder.\n"));
    }

    #[test]
    fn test_complete_and_inspect_are_empty() {
        let kernel = kernel();
        let complete = kernel.complete("writ", 4);
        assert!(complete.matches.is_empty());
        assert_eq!((complete.cursor_start, complete.cursor_end), (4, 4));
        assert!(!kernel.inspect("writeln", 3, 0).found);
    }
}
