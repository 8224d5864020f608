// REST transport for devices running a query agent.
//
// One POST per query: the payload built by the caller is sent verbatim as
// the JSON body, authenticated with the device's API key. The response body
// and status code are returned untouched -- interpreting them is the
// caller's business.

use std::net::Ipv6Addr;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the device credential.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Map a port to the URL scheme the agent is expected to speak.
///
/// Well-known HTTPS ports map to `https`; everything else, including
/// unrecognized ports, falls back to `http`.
pub fn scheme_for_port(port: u16) -> &'static str {
    match port {
        443 | 8443 => "https",
        _ => "http",
    }
}

/// Build the agent endpoint: `{scheme}://{host}:{port}/{path}`.
///
/// IPv6 literals are bracketed.
pub fn endpoint(host: &str, port: u16, path: &str) -> Result<Url, Error> {
    let scheme = scheme_for_port(port);
    let host = if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{scheme}://{host}:{port}/{path}"))?)
}

/// Raw agent reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for looking-glass query agents.
pub struct RestClient {
    http: reqwest::Client,
}

impl RestClient {
    /// Create a client from a `TransportConfig` (timeout, TLS mode).
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// POST `body` to `url`, authenticating with `api_key`.
    ///
    /// Any HTTP status is a successful call at this layer; only transport
    /// faults (connect, timeout, protocol, decode) are errors.
    pub async fn post(
        &self,
        url: Url,
        api_key: &SecretString,
        body: &serde_json::Value,
    ) -> Result<RestResponse, Error> {
        debug!("POST {}", url);

        let mut key = HeaderValue::from_str(api_key.expose_secret())?;
        key.set_sensitive(true);

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, key)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!(status, bytes = body.len(), "agent replied");

        Ok(RestResponse { status, body })
    }
}
