#![allow(dead_code, clippy::unwrap_used)]
// Shared fixtures for glassline-core integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use glassline_api::{
    CommandSession, Connector, Error, Login, ProxyHop, SessionOptions, SessionTarget, Tunnel,
};
use secrecy::SecretString;

use glassline_core::{
    Credential, DeviceConfig, Dispatch, ExecutionResult, Platform, ProxyConfig, QueryType,
    Registry, Transport, TransportClass,
};

pub const TUNNEL_PORT: u16 = 40_022;

// ── Registry fixtures ───────────────────────────────────────────────

pub fn device(location: &str, platform: Platform, address: &str, port: u16) -> DeviceConfig {
    DeviceConfig {
        location: location.into(),
        display_name: location.to_uppercase(),
        address: address.into(),
        port,
        platform,
        queries: vec![
            QueryType::BgpRoute,
            QueryType::BgpCommunity,
            QueryType::BgpAspath,
            QueryType::Ping,
            QueryType::Traceroute,
        ],
        credential: "device".into(),
        proxy: None,
    }
}

pub fn credentials() -> HashMap<String, Credential> {
    HashMap::from([
        (
            "device".to_string(),
            Credential {
                username: "lg".into(),
                secret: SecretString::from("device-secret".to_string()),
            },
        ),
        (
            "bastion".to_string(),
            Credential {
                username: "jump".into(),
                secret: SecretString::from("bastion-secret".to_string()),
            },
        ),
    ])
}

pub fn bastion() -> ProxyConfig {
    ProxyConfig {
        name: "bastion".into(),
        address: "198.51.100.7".into(),
        port: 22,
        credential: "bastion".into(),
    }
}

pub fn registry(devices: Vec<DeviceConfig>) -> Arc<Registry> {
    Arc::new(Registry::new(devices, credentials(), [bastion()]).unwrap())
}

// ── Fake SSH connector ──────────────────────────────────────────────

#[derive(Default)]
pub struct SshLog {
    pub tunnels: AtomicUsize,
    pub tunnel_users: Mutex<Vec<String>>,
    pub sessions: Mutex<Vec<(String, u16, String)>>,
    pub commands: Mutex<Vec<String>>,
}

/// Connector whose sessions answer every command with `reply`.
#[derive(Clone)]
pub struct FakeConnector {
    pub reply: &'static str,
    pub log: Arc<SshLog>,
}

impl FakeConnector {
    pub fn replying(reply: &'static str) -> Self {
        Self {
            reply,
            log: Arc::default(),
        }
    }
}

pub struct FakeTunnel;

impl Tunnel for FakeTunnel {
    fn local_port(&self) -> u16 {
        TUNNEL_PORT
    }
}

pub struct FakeSession {
    reply: &'static str,
    log: Arc<SshLog>,
}

impl CommandSession for FakeSession {
    fn send_command(&mut self, command: &str, _timeout: Duration) -> Result<String, Error> {
        self.log.commands.lock().unwrap().push(command.to_owned());
        Ok(self.reply.to_owned())
    }
}

impl Connector for FakeConnector {
    type Tunnel = FakeTunnel;
    type Session = FakeSession;

    fn open_tunnel(
        &self,
        proxy: &ProxyHop,
        _remote_host: &str,
        _remote_port: u16,
        _options: &SessionOptions,
    ) -> Result<FakeTunnel, Error> {
        self.log.tunnels.fetch_add(1, Ordering::SeqCst);
        self.log
            .tunnel_users
            .lock()
            .unwrap()
            .push(proxy.login.username.clone());
        Ok(FakeTunnel)
    }

    fn open_session(
        &self,
        host: &str,
        port: u16,
        _target: &SessionTarget,
        login: &Login,
        _options: &SessionOptions,
    ) -> Result<FakeSession, Error> {
        self.log
            .sessions
            .lock()
            .unwrap()
            .push((host.to_owned(), port, login.username.clone()));
        Ok(FakeSession {
            reply: self.reply,
            log: Arc::clone(&self.log),
        })
    }
}

// ── Counting transport ──────────────────────────────────────────────

/// Transport that records calls and returns a canned result.
pub struct CountingTransport {
    class: TransportClass,
    result: ExecutionResult,
    pub calls: AtomicUsize,
}

impl CountingTransport {
    pub fn new(class: TransportClass, result: ExecutionResult) -> Arc<Self> {
        Arc::new(Self {
            class,
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    fn class(&self) -> TransportClass {
        self.class
    }

    async fn send(&self, _request: Dispatch<'_>) -> ExecutionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
