//! Error types for dkernel-core.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for dkernel-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The phase of a cell execution that an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Running the D compiler.
    Compile,
    /// Running the produced binary.
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Compile => f.write_str("compilation"),
            Phase::Run => f.write_str("execution"),
        }
    }
}

/// Errors that can occur in dkernel-core.
#[derive(Debug, Error)]
pub enum Error {
    /// The compiler reported diagnostics for the assembled program.
    ///
    /// `diagnostics` has already had temporary paths replaced.
    #[error("compilation failed")]
    Compilation { diagnostics: String },

    /// A compiler or program run exceeded the configured timeout.
    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    /// Execution was interrupted by the front-end.
    #[error("execution interrupted")]
    Interrupted,

    /// The compiler could not be found or spawned.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The compiler reported success but its output could not be started.
    ///
    /// `program` names the binary the way diagnostics name the source.
    #[error("failed to start compiled program `{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// A temporary build directory could not be removed.
    #[error("failed to clean up temp dir {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was triggered by user code rather than the kernel's
    /// environment. These are reported as cell output, never as kernel errors.
    pub fn is_user_fault(&self) -> bool {
        matches!(
            self,
            Error::Compilation { .. } | Error::Timeout { .. } | Error::Interrupted
        )
    }

    /// Whether the session cannot go on: every later cell would fail the
    /// same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Launch { .. })
    }

    /// Render the error together with a recovery hint for the operator.
    pub fn with_hint(&self) -> String {
        match self {
            Error::Configuration(_) => format!(
                "{self}\n  hint: install dmd (https://dlang.org/download.html) \
                 or point --compiler / DKERNEL_COMPILER at a D compiler"
            ),
            Error::Launch { .. } => format!(
                "{self}\n  hint: the compiler produced no runnable binary; \
                 check --compiler-flag for options such as -c or -of"
            ),
            Error::Cleanup { path, .. } => {
                format!("{self}\n  hint: remove {} manually", path.display())
            }
            Error::Timeout { .. } => {
                format!("{self}\n  hint: raise the limit with --timeout (0 disables it)")
            }
            _ => self.to_string(),
        }
    }
}
