// glassline-api: transports used to reach looking-glass devices (REST agents + SSH sessions)

pub mod error;
pub mod rest;
pub mod scrape;
pub mod transport;

pub use error::Error;
pub use rest::{RestClient, RestResponse};
pub use scrape::{
    CommandSession, Connector, LOCAL_BIND_HOST, Login, ProxyHop, ScrapeClient, SessionOptions,
    SessionTarget, SshConnector, Tunnel,
};
pub use transport::{TlsMode, TransportConfig};
