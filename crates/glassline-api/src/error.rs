use thiserror::Error;

/// libssh2's `LIBSSH2_ERROR_TIMEOUT`.
const SSH_ERROR_TIMEOUT: i32 = -9;

/// Top-level error type for the `glassline-api` crate.
///
/// Covers every failure mode of both device transports: HTTP calls to
/// query agents, SSH sessions, and the local port forwards used to reach
/// devices behind a proxy. `glassline-core` collapses all of these into a
/// single connect failure before anything reaches a caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device or proxy rejected the supplied username/password.
    #[error("Authentication failed for {username}@{host}")]
    Authentication { host: String, username: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, protocol fault, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential could not be encoded as an HTTP header value.
    #[error("Invalid header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── SSH ─────────────────────────────────────────────────────────
    /// TCP connection to the SSH endpoint could not be established.
    #[error("Cannot connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    /// Error reported by libssh2 (handshake, channel, read timeout, ...).
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    /// The port forward through a proxy could not be established.
    #[error("Tunnel through proxy '{proxy}' failed: {reason}")]
    Tunnel { proxy: String, reason: String },

    /// Local socket or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Worker pool ─────────────────────────────────────────────────
    /// The blocking session worker panicked or the pool was shut down.
    #[error("Session worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// Returns `true` if the failure was caused by a timeout on either transport.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Ssh(e) => e.code() == ssh2::ErrorCode::Session(SSH_ERROR_TIMEOUT),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error came from the proxy tunnel rather than the device.
    pub fn is_tunnel(&self) -> bool {
        matches!(self, Self::Tunnel { .. })
    }

    /// Returns `true` if credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tunnel_and_auth_errors() {
        let tunnel = Error::Tunnel {
            proxy: "bastion".into(),
            reason: "refused".into(),
        };
        assert!(tunnel.is_tunnel());
        assert!(!tunnel.is_auth());

        let auth = Error::Authentication {
            host: "192.0.2.1".into(),
            username: "lg".into(),
        };
        assert!(auth.is_auth());
        assert!(!auth.is_timeout());
    }

    #[test]
    fn io_timeout_is_timeout() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert!(err.is_timeout());
    }
}
