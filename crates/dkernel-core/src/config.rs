//! Kernel configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the compiler executable.
pub const COMPILER_ENV: &str = "DKERNEL_COMPILER";

/// Default per-phase timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// What to do with the statements of a cell that also contains declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementPolicy {
    /// A cell is either declarations or statements. Text around declarations
    /// is not executed.
    #[default]
    Exclusive,
    /// Text not consumed by any declaration is embedded into `main`.
    Residual,
}

/// Configuration for a kernel session.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Compiler executable name or path.
    pub compiler: String,

    /// Flags passed after the source file.
    pub compiler_flags: Vec<String>,

    /// Directory the per-execution temp directories are created in.
    pub work_dir: PathBuf,

    /// Limit for each of the compile and run phases. `None` waits forever.
    pub timeout: Option<Duration>,

    /// Replacement for temporary paths in compiler diagnostics.
    pub placeholder: String,

    /// Handling of statements mixed with declarations.
    pub statement_policy: StatementPolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            compiler: std::env::var(COMPILER_ENV).unwrap_or_else(|_| "dmd".to_string()),
            compiler_flags: vec!["-op".to_string()],
            work_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            timeout: Some(DEFAULT_TIMEOUT),
            placeholder: "line".to_string(),
            statement_policy: StatementPolicy::default(),
        }
    }
}

impl KernelConfig {
    /// Use a specific compiler executable.
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// Create temp directories under `dir`.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Set the per-phase timeout. A zero duration disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set the statement policy.
    pub fn with_statement_policy(mut self, policy: StatementPolicy) -> Self {
        self.statement_policy = policy;
        self
    }

    /// Append extra compiler flags.
    pub fn with_extra_flags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.compiler_flags.extend(flags);
        self
    }
}
