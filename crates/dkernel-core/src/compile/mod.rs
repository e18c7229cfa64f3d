//! Compiling assembled programs.
//!
//! - [`Toolchain`] locates the D compiler and reads its version.
//! - [`BuildWorkspace`] is the per-execution temp directory and source file.
//! - [`neutralize`] scrubs temporary paths out of diagnostics.

mod diagnostics;
mod toolchain;
mod workspace;

pub use diagnostics::neutralize;
pub use toolchain::{Toolchain, parse_version};
pub use workspace::BuildWorkspace;
