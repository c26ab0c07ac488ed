//! Exit codes for the blindql CLI.
//!
//! Scripts wrapping `blindql reconstruct` can tell a config mistake apart from
//! an endpoint that yielded little or nothing.

/// Exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// A complete schema was reconstructed
    Success = 0,
    /// Configuration error (bad config file, missing endpoint, invalid flag)
    ConfigError = 2,
    /// The reconstructed schema is empty or partial (cancelled, nothing found)
    SchemaError = 3,
    /// I/O error (output write failure)
    IoError = 4,
}

impl ExitCode {
    /// Exit the process with this exit code.
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::SchemaError => write!(f, "partial schema"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
