// ── Core error types ──
//
// Errors the engine can raise internally. Only `UnknownLocation` ever
// escapes `execute`; transport faults are folded into a generic failure
// result before they reach a caller, and `connect_failure` gives the logged
// cause a stable shape.

use thiserror::Error;

use crate::model::{Platform, QueryType, TransportClass};

/// Unified error type for the core crate.
///
/// `Clone` so a single in-flight execution can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Precondition violations ──────────────────────────────────────
    #[error("Unknown location: {location}")]
    UnknownLocation { location: String },

    // ── Transport faults (logged, never shown to callers) ────────────
    #[error("{transport} transport failed: {cause}")]
    ConnectFailure {
        transport: TransportClass,
        cause: String,
    },

    // ── Command construction ─────────────────────────────────────────
    #[error("No {query_type} command for platform {platform}: {message}")]
    Build {
        platform: Platform,
        query_type: QueryType,
        message: String,
    },

    // ── Cache store faults ───────────────────────────────────────────
    #[error("Cache store error: {message}")]
    Cache { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Fold a raw transport error into a `ConnectFailure`, keeping a short
    /// classification of the fault in the cause.
    pub fn connect_failure(transport: TransportClass, err: &glassline_api::Error) -> Self {
        let kind = if err.is_auth() {
            "authentication"
        } else if err.is_timeout() {
            "timeout"
        } else if err.is_tunnel() {
            "tunnel"
        } else {
            "connection"
        };
        Self::ConnectFailure {
            transport,
            cause: format!("{kind}: {err}"),
        }
    }
}
