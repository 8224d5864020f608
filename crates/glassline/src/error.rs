//! CLI error types with miette diagnostics.
//!
//! Maps config and engine errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use glassline_config::ConfigError;
use glassline_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const CONFIG: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Query outcomes ───────────────────────────────────────────────
    #[error("Query rejected ({status}): {message}")]
    #[diagnostic(code(glassline::rejected))]
    Rejected { message: String, status: u16 },

    #[error("Query failed ({status}): {message}")]
    #[diagnostic(
        code(glassline::failed),
        help("Run again with -v for transport details.")
    )]
    QueryFailed { message: String, status: u16 },

    #[error("{failed} of {total} queries did not succeed")]
    #[diagnostic(code(glassline::batch_failed))]
    BatchFailed { failed: usize, total: usize },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Unknown location '{location}'")]
    #[diagnostic(
        code(glassline::unknown_location),
        help("Run: glassline devices to see configured locations")
    )]
    UnknownLocation { location: String },

    #[error("Line {line}: {reason}")]
    #[diagnostic(
        code(glassline::batch_syntax),
        help("Each line is `location query-type target`; blank lines and # comments are skipped.")
    )]
    BatchLine { line: usize, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(glassline::config),
        help("Check the file reported by: glassline config path")
    )]
    Config(#[from] ConfigError),

    // ── Engine ───────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(glassline::engine))]
    Engine(CoreError),

    #[error("Cannot set up logging: {reason}")]
    #[diagnostic(code(glassline::logging))]
    Logging { reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::BatchLine { .. } => exit_code::USAGE,
            Self::UnknownLocation { .. }
            | Self::Config(_)
            | Self::Engine(CoreError::Config { .. }) => exit_code::CONFIG,
            _ => exit_code::FAILURE,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownLocation { location } => CliError::UnknownLocation { location },
            other => CliError::Engine(other),
        }
    }
}
