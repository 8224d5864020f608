// Scrape transport: one command over an SSH session, optionally tunnelled
// through a proxy.
//
// libssh2 is synchronous, so every call runs on tokio's blocking pool behind
// a semaphore that caps concurrent device sessions. Tunnels and sessions are
// RAII guards: the session is always released before the tunnel it rides on,
// on every exit path.

mod ssh;
mod tunnel;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::Error;

pub use ssh::{SshConnector, SshSession};
pub use tunnel::SshTunnel;

/// Loopback address the proxy tunnel binds to.
pub const LOCAL_BIND_HOST: &str = "127.0.0.1";

/// Base allowance per command character, scaled by `delay_factor`.
const PER_CHAR_DELAY: Duration = Duration::from_millis(100);

// ── Request types ────────────────────────────────────────────────

/// Where a device session terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
    /// Platform identifier, used for logging and session tuning.
    pub device_type: String,
}

/// Username/password pair for a device or proxy.
#[derive(Clone)]
pub struct Login {
    pub username: String,
    pub password: SecretString,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A proxy (bastion) host the device is reached through.
#[derive(Debug, Clone)]
pub struct ProxyHop {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// The proxy's own credential, never the device's.
    pub login: Login,
}

/// Session timing.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// libssh2 timeout for connect, handshake, auth and reads.
    pub timeout: Duration,
    /// Multiplier applied to the per-character allowance on command reads.
    pub delay_factor: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            delay_factor: 0.2,
        }
    }
}

impl SessionOptions {
    /// Read timeout for a command: the session timeout plus a delay
    /// allowance proportional to the command length.
    pub fn command_timeout(&self, command: &str) -> Duration {
        let chars = u32::try_from(command.chars().count()).unwrap_or(u32::MAX);
        self.timeout + (PER_CHAR_DELAY * chars).mul_f64(self.delay_factor.max(0.0))
    }
}

// ── Connector seam ───────────────────────────────────────────────

/// An open port forward. Dropping it tears the forward down.
pub trait Tunnel: Send {
    /// Local port bound on [`LOCAL_BIND_HOST`].
    fn local_port(&self) -> u16;
}

/// An authenticated interactive session. Dropping it disconnects.
pub trait CommandSession: Send {
    fn send_command(&mut self, command: &str, timeout: Duration) -> Result<String, Error>;
}

/// Opens tunnels and sessions. All methods block.
pub trait Connector: Send + Sync + 'static {
    type Tunnel: Tunnel;
    type Session: CommandSession;

    /// Forward a local port through `proxy` to `remote_host:remote_port`.
    fn open_tunnel(
        &self,
        proxy: &ProxyHop,
        remote_host: &str,
        remote_port: u16,
        options: &SessionOptions,
    ) -> Result<Self::Tunnel, Error>;

    /// Open and authenticate a session to `host:port`.
    fn open_session(
        &self,
        host: &str,
        port: u16,
        target: &SessionTarget,
        login: &Login,
        options: &SessionOptions,
    ) -> Result<Self::Session, Error>;
}

// ── ScrapeClient ─────────────────────────────────────────────────

/// Runs single commands on devices over SSH on a bounded worker pool.
pub struct ScrapeClient<C: Connector = SshConnector> {
    connector: Arc<C>,
    workers: Arc<Semaphore>,
    options: SessionOptions,
}

impl ScrapeClient<SshConnector> {
    /// Create a client backed by libssh2.
    pub fn new(max_sessions: usize, options: SessionOptions) -> Self {
        Self::with_connector(SshConnector, max_sessions, options)
    }
}

impl<C: Connector> ScrapeClient<C> {
    /// Create a client with a custom connector.
    ///
    /// `max_sessions` bounds how many blocking sessions run at once; it is
    /// clamped to at least one.
    pub fn with_connector(connector: C, max_sessions: usize, options: SessionOptions) -> Self {
        Self {
            connector: Arc::new(connector),
            workers: Arc::new(Semaphore::new(max_sessions.max(1))),
            options,
        }
    }

    /// Sessions that could start right now without waiting for a worker.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Send one command and return its full output.
    ///
    /// With a `proxy`, a tunnel is opened first and the session connects
    /// through its local binding; without one, the session connects
    /// directly and no tunnel is ever attempted.
    pub async fn send_command(
        &self,
        target: &SessionTarget,
        login: &Login,
        proxy: Option<&ProxyHop>,
        command: &str,
    ) -> Result<String, Error> {
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;

        let connector = Arc::clone(&self.connector);
        let target = target.clone();
        let login = login.clone();
        let proxy = proxy.cloned();
        let command = command.to_owned();
        let options = self.options;

        tokio::task::spawn_blocking(move || {
            // Held for the whole blocking section, even if the caller goes away.
            let _permit = permit;
            run_command(
                connector.as_ref(),
                &target,
                &login,
                proxy.as_ref(),
                &command,
                &options,
            )
        })
        .await
        .map_err(|e| Error::Worker(e.to_string()))?
    }
}

fn run_command<C: Connector>(
    connector: &C,
    target: &SessionTarget,
    login: &Login,
    proxy: Option<&ProxyHop>,
    command: &str,
    options: &SessionOptions,
) -> Result<String, Error> {
    let timeout = options.command_timeout(command);

    let Some(proxy) = proxy else {
        debug!(host = %target.host, port = target.port, device_type = %target.device_type, "connecting directly");
        let mut session =
            connector.open_session(&target.host, target.port, target, login, options)?;
        return session.send_command(command, timeout);
    };

    debug!(proxy = %proxy.name, host = %proxy.host, port = proxy.port, "opening tunnel");
    let tunnel = connector.open_tunnel(proxy, &target.host, target.port, options)?;
    let local_port = tunnel.local_port();
    debug!(proxy = %proxy.name, local_port, "tunnel established");

    let output = connector
        .open_session(LOCAL_BIND_HOST, local_port, target, login, options)
        .and_then(|mut session| session.send_command(command, timeout));

    // Session (if any) is already gone; the tunnel goes last.
    drop(tunnel);
    output
}
