// ── Core transports ──
//
// Both transports share one contract: take a built payload, talk to exactly
// one device once, and hand back an `ExecutionResult`. Raw transport errors
// are logged here and replaced with the generic failure message; nothing
// below this layer reaches a caller.

mod rest;
mod scrape;

use async_trait::async_trait;

use crate::command::Payload;
use crate::model::{
    Credential, DeviceConfig, ExecutionResult, ProxyConfig, QueryType, TransportClass,
};

pub use rest::RestTransport;
pub use scrape::ScrapeTransport;

/// Everything a transport needs for one call.
#[derive(Debug)]
pub struct Dispatch<'a> {
    pub device: &'a DeviceConfig,
    pub query_type: QueryType,
    pub payload: Payload,
    /// The device's own credential.
    pub credential: &'a Credential,
    /// Proxy to tunnel through, with the proxy's credential.
    pub proxy: Option<(&'a ProxyConfig, &'a Credential)>,
}

/// A way of reaching devices.
#[async_trait]
pub trait Transport: Send + Sync {
    fn class(&self) -> TransportClass;

    /// Perform one call. Never fails: faults become a `Failed` result.
    async fn send(&self, request: Dispatch<'_>) -> ExecutionResult;
}
