// Ephemeral local port forward through an SSH proxy.
//
// The proxy's `direct-tcpip` channel is opened during setup, then a listener
// is bound on an ephemeral loopback port; a forwarding thread accepts the
// device session's single TCP connection and pumps bytes between it and
// the channel. Dropping the tunnel stops the thread and disconnects from
// the proxy.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ssh2::{Channel, Session};
use tracing::{debug, warn};

use super::ssh::connect;
use super::{LOCAL_BIND_HOST, ProxyHop, SessionOptions, Tunnel};
use crate::error::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const BUFFER_SIZE: usize = 16 * 1024;

/// A live port forward. Torn down exactly once, on drop.
pub struct SshTunnel {
    proxy: String,
    local_port: u16,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SshTunnel {
    /// Authenticate to `proxy` with its own credential and forward an
    /// ephemeral loopback port to `remote_host:remote_port`.
    pub(crate) fn open(
        proxy: &ProxyHop,
        remote_host: &str,
        remote_port: u16,
        options: &SessionOptions,
    ) -> Result<Self, Error> {
        let tunnel_error = |reason: String| Error::Tunnel {
            proxy: proxy.name.clone(),
            reason,
        };

        let session = connect(&proxy.host, proxy.port, &proxy.login, options.timeout)
            .map_err(|e| tunnel_error(e.to_string()))?;
        // Opened before any device session exists, so a refused forward is
        // reported against the proxy.
        let channel = session
            .channel_direct_tcpip(remote_host, remote_port, None)
            .map_err(|e| forward_refused(proxy, remote_host, remote_port, &e))?;

        let listener = TcpListener::bind((LOCAL_BIND_HOST, 0))
            .and_then(|l| l.set_nonblocking(true).map(|()| l))
            .map_err(|e| tunnel_error(format!("local bind failed: {e}")))?;
        let local_port = listener
            .local_addr()
            .map_err(|e| tunnel_error(e.to_string()))?
            .port();

        let shutdown = Arc::new(AtomicBool::new(false));
        let forwarder = Forwarder {
            session,
            channel,
            listener,
            accept_timeout: options.timeout,
            shutdown: Arc::clone(&shutdown),
        };
        let worker = thread::Builder::new()
            .name(format!("glassline-tunnel-{local_port}"))
            .spawn(move || forwarder.run())
            .map_err(|e| tunnel_error(format!("cannot spawn forwarder: {e}")))?;

        debug!(proxy = %proxy.name, local_port, remote_host, remote_port, "port forward ready");
        Ok(Self {
            proxy: proxy.name.clone(),
            local_port,
            shutdown,
            worker: Some(worker),
        })
    }
}

impl Tunnel for SshTunnel {
    fn local_port(&self) -> u16 {
        self.local_port
    }
}

impl Drop for SshTunnel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(proxy = %self.proxy, "tunnel forwarder panicked");
            }
        }
        debug!(proxy = %self.proxy, local_port = self.local_port, "tunnel closed");
    }
}

struct Forwarder {
    session: Session,
    channel: Channel,
    listener: TcpListener,
    accept_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Forwarder {
    fn run(self) {
        let Self {
            session,
            channel,
            listener,
            accept_timeout,
            shutdown,
        } = self;
        if let Some(client) = accept(&listener, accept_timeout, &shutdown) {
            if let Err(e) = pump(&session, client, channel, &shutdown) {
                debug!(error = %e, "tunnel stream ended with error");
            }
        }
        if let Err(e) = session.disconnect(None, "tunnel closed", None) {
            debug!(error = %e, "proxy disconnect failed");
        }
    }
}

/// Wait for the device session to connect to the local binding.
fn accept(listener: &TcpListener, timeout: Duration, shutdown: &AtomicBool) -> Option<TcpStream> {
    let deadline = Instant::now() + timeout;
    while !shutdown.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, _)) => return Some(stream),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    warn!("no connection on tunnel before timeout");
                    return None;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                warn!(error = %e, "tunnel accept failed");
                return None;
            }
        }
    }
    None
}

/// Shuttle bytes both ways until either side closes or shutdown is signalled.
fn pump(
    session: &Session,
    mut client: TcpStream,
    mut channel: Channel,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    client.set_nonblocking(true)?;
    session.set_blocking(false);

    let mut buf = vec![0u8; BUFFER_SIZE];
    while !shutdown.load(Ordering::Acquire) {
        let mut idle = true;

        match client.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                write_all(&mut channel, &buf[..n], shutdown)?;
                idle = false;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }

        match channel.read(&mut buf) {
            Ok(0) if channel.eof() => break,
            Ok(0) => {}
            Ok(n) => {
                write_all(&mut client, &buf[..n], shutdown)?;
                idle = false;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }

        if idle {
            thread::sleep(POLL_INTERVAL);
        }
    }
    Ok(())
}

fn forward_refused(
    proxy: &ProxyHop,
    remote_host: &str,
    remote_port: u16,
    err: &ssh2::Error,
) -> Error {
    warn!(proxy = %proxy.name, remote_host, remote_port, error = %err, "proxy refused forward");
    Error::Tunnel {
        proxy: proxy.name.clone(),
        reason: format!("forward to {remote_host}:{remote_port} refused: {err}"),
    }
}

/// `write_all` for non-blocking writers.
fn write_all<W: Write>(writer: &mut W, mut data: &[u8], shutdown: &AtomicBool) -> io::Result<()> {
    while !data.is_empty() {
        if shutdown.load(Ordering::Acquire) {
            return Err(io::Error::new(ErrorKind::Interrupted, "tunnel shutting down"));
        }
        match writer.write(data) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
