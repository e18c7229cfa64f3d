//! Running compiled cells.
//!
//! [`ProgramRunner`] compiles a [`BuildWorkspace`](crate::compile::BuildWorkspace)
//! and runs the result, under the configured timeout and the session's
//! [`InterruptHandle`].

mod interrupt;
mod runner;
mod supervise;

pub use interrupt::InterruptHandle;
pub use runner::{ExecutionResult, ProgramRunner};
