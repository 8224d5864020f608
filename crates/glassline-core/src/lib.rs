//! Query execution engine for the glassline looking glass.
//!
//! A [`Query`] names a device location, one of a fixed set of
//! [`QueryType`]s and a target. The engine validates it, renders a vendor
//! command or agent payload, makes exactly one call over the device's
//! transport, and normalizes the output:
//!
//! - **[`Engine`]** bundles everything behind `query()`, serving repeat
//!   requests from a [`ResultCache`] with single-flight deduplication.
//! - **[`Orchestrator`]** runs one request end to end. Only an unknown
//!   location is an error; rejections and transport faults come back as
//!   [`ExecutionResult`]s carrying user-safe messages.
//! - **[`Validator`]** and **[`CommandBuilder`]** are the policy seams, with
//!   [`BasicValidator`] and [`TemplateCommandBuilder`] as defaults.
//! - **[`ScrapeTransport`]** (SSH, optionally through a proxy tunnel) and
//!   **[`RestTransport`]** (query agents) implement [`Transport`].

pub mod cache;
pub mod command;
pub mod engine;
pub mod error;
pub mod messages;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod selector;
pub mod transport;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheStore, FileStore, MemoryStore, ResultCache, cache_key};
pub use command::{CommandBuilder, CommandOverrides, Payload, TemplateCommandBuilder};
pub use engine::{Engine, EngineConfig, ScrapeSettings};
pub use error::CoreError;
pub use messages::Messages;
pub use normalize::normalize;
pub use orchestrator::{Execute, Orchestrator};
pub use transport::{Dispatch, RestTransport, ScrapeTransport, Transport};
pub use validate::{BasicValidator, Rejection, Validator};

pub use model::{
    Afi, Credential, DeviceConfig, ExecutionResult, Outcome, Platform, ProxyConfig, Query,
    QueryType, Registry, Status, TransportClass, status_code,
};
