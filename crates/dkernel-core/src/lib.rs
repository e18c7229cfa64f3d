//! Core engine for the D Jupyter kernel.
//!
//! This crate provides:
//! - Cell classification into programs, declarations and statements
//! - A transactional store of declarations remembered across cells
//! - Program assembly into a single D module
//! - Compilation and execution with streamed output, timeouts and interrupts
//! - The kernel session tying these together

pub mod assemble;
pub mod classify;
pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod frontend;
pub mod kernel;
pub mod store;

pub use assemble::{AssembledProgram, assemble};
pub use classify::{Classification, Classifier, DeclKind, Declaration};
pub use compile::{BuildWorkspace, Toolchain};
pub use config::{COMPILER_ENV, DEFAULT_TIMEOUT, KernelConfig, StatementPolicy};
pub use error::{Error, Phase, Result};
pub use execute::{ExecutionResult, InterruptHandle, ProgramRunner};
pub use frontend::{CollectingFrontend, Frontend, Muted, StreamName};
pub use kernel::{
    CompleteReply, ExecuteReply, ExecuteRequest, IMPLEMENTATION, InspectReply, Kernel, KernelInfo,
    LanguageInfo, ReplyStatus,
};
pub use store::{DeclarationStore, StoreTransaction};
