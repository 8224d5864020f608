// libssh2-backed sessions.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use secrecy::ExposeSecret;
use ssh2::Session;
use tracing::{debug, trace};

use super::tunnel::SshTunnel;
use super::{CommandSession, Connector, Login, ProxyHop, SessionOptions, SessionTarget};
use crate::error::Error;

/// Wide terminal so vendor CLIs don't wrap long BGP lines.
const PTY_COLUMNS: u32 = 511;
const PTY_ROWS: u32 = 24;

/// Connector that opens real SSH sessions and port forwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Tunnel = SshTunnel;
    type Session = SshSession;

    fn open_tunnel(
        &self,
        proxy: &ProxyHop,
        remote_host: &str,
        remote_port: u16,
        options: &SessionOptions,
    ) -> Result<SshTunnel, Error> {
        SshTunnel::open(proxy, remote_host, remote_port, options)
    }

    fn open_session(
        &self,
        host: &str,
        port: u16,
        target: &SessionTarget,
        login: &Login,
        options: &SessionOptions,
    ) -> Result<SshSession, Error> {
        let session = connect(host, port, login, options.timeout)?;
        debug!(host, port, device_type = %target.device_type, "device session authenticated");
        Ok(SshSession {
            session,
            host: target.host.clone(),
        })
    }
}

/// Open a TCP connection, run the SSH handshake and authenticate with a password.
pub(crate) fn connect(
    host: &str,
    port: u16,
    login: &Login,
    timeout: Duration,
) -> Result<Session, Error> {
    let connect_error = |reason: String| Error::Connect {
        host: host.to_owned(),
        port,
        reason,
    };

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| connect_error(e.to_string()))?
        .next()
        .ok_or_else(|| connect_error("address did not resolve".into()))?;

    let tcp =
        TcpStream::connect_timeout(&addr, timeout).map_err(|e| connect_error(e.to_string()))?;
    tcp.set_read_timeout(Some(timeout))?;
    tcp.set_write_timeout(Some(timeout))?;

    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_millis(timeout));
    session.handshake()?;

    let auth_error = || Error::Authentication {
        host: host.to_owned(),
        username: login.username.clone(),
    };
    session
        .userauth_password(&login.username, login.password.expose_secret())
        .map_err(|_| auth_error())?;
    if !session.authenticated() {
        return Err(auth_error());
    }

    Ok(session)
}

pub(crate) fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

/// An authenticated device session. Disconnects on drop.
pub struct SshSession {
    session: Session,
    host: String,
}

impl CommandSession for SshSession {
    fn send_command(&mut self, command: &str, timeout: Duration) -> Result<String, Error> {
        self.session.set_timeout(timeout_millis(timeout));

        let mut channel = self.session.channel_session()?;
        channel.request_pty("vt100", None, Some((PTY_COLUMNS, PTY_ROWS, 0, 0)))?;
        channel.exec(command)?;

        let mut raw = Vec::new();
        channel.read_to_end(&mut raw)?;
        channel.wait_close()?;
        trace!(host = %self.host, bytes = raw.len(), "command output captured");

        Ok(String::from_utf8_lossy(&raw).replace("\r\n", "\n"))
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "query complete", None) {
            trace!(host = %self.host, error = %e, "disconnect failed");
        }
    }
}
