// Shared HTTP transport configuration for building reqwest::Client instances.
//
// Query agents are usually reached over plain HTTP on a management network,
// or over HTTPS with a self-signed certificate, so TLS verification is
// selectable per deployment.

use std::time::Duration;

/// Default per-request timeout for query agents.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

const USER_AGENT: &str = concat!("glassline/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode for HTTPS agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (for agents with self-signed certificates).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Fixed timeout applied to every request, connect included.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Redirects are never followed: an agent answering with a redirect is
    /// misconfigured and the response is passed back as-is.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT);

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }
}
