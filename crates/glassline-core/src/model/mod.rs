// ── Domain model ──
//
// Plain data shared by every layer of the engine. Nothing here performs I/O.

mod device;
mod platform;
mod query;
mod result;

pub use device::{Credential, DeviceConfig, ProxyConfig, Registry};
pub use platform::{Platform, TransportClass};
pub use query::{Afi, Query, QueryType};
pub use result::{ExecutionResult, Outcome, Status, status_code};
