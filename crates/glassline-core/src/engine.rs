// ── Engine ──
//
// Wires the registry, default validator and command builder, both
// transports, the orchestrator and the result cache into one handle.

use std::sync::Arc;
use std::time::Duration;

use glassline_api::{RestClient, ScrapeClient, SessionOptions, TlsMode, TransportConfig, transport};

use crate::cache::{CacheStore, DEFAULT_TTL, MemoryStore, ResultCache};
use crate::command::{CommandOverrides, TemplateCommandBuilder};
use crate::error::CoreError;
use crate::messages::Messages;
use crate::model::{ExecutionResult, Query, Registry};
use crate::orchestrator::{Execute, Orchestrator};
use crate::transport::{RestTransport, ScrapeTransport};
use crate::validate::BasicValidator;

/// Default cap on concurrent SSH sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 8;

/// SSH session tuning.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeSettings {
    pub timeout: Duration,
    pub delay_factor: f64,
    pub max_sessions: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        let options = SessionOptions::default();
        Self {
            timeout: options.timeout,
            delay_factor: options.delay_factor,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// Everything needed to build an [`Engine`].
#[derive(Debug)]
pub struct EngineConfig {
    pub registry: Registry,
    pub messages: Messages,
    /// REST request timeout.
    pub request_timeout: Duration,
    /// Accept invalid TLS certificates from query agents.
    pub tls_insecure: bool,
    pub scrape: ScrapeSettings,
    pub cache_ttl: Duration,
    pub commands: CommandOverrides,
}

impl EngineConfig {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            messages: Messages::default(),
            request_timeout: transport::DEFAULT_REQUEST_TIMEOUT,
            tls_insecure: false,
            scrape: ScrapeSettings::default(),
            cache_ttl: DEFAULT_TTL,
            commands: CommandOverrides::default(),
        }
    }
}

/// Query entry point for callers.
pub struct Engine {
    orchestrator: Arc<Orchestrator>,
    cache: ResultCache,
}

impl Engine {
    /// Build an engine backed by an in-process cache.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Build an engine backed by `store`.
    pub fn with_store(config: EngineConfig, store: Arc<dyn CacheStore>) -> Result<Self, CoreError> {
        let EngineConfig {
            registry,
            messages,
            request_timeout,
            tls_insecure,
            scrape,
            cache_ttl,
            commands,
        } = config;

        let rest_client = RestClient::new(&TransportConfig {
            tls: if tls_insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: request_timeout,
        })
        .map_err(|e| CoreError::Config {
            message: e.to_string(),
        })?;
        let scrape_client = ScrapeClient::new(
            scrape.max_sessions,
            SessionOptions {
                timeout: scrape.timeout,
                delay_factor: scrape.delay_factor,
            },
        );

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(registry),
            Arc::new(BasicValidator::new(messages.clone())),
            Arc::new(TemplateCommandBuilder::new(commands)),
            Arc::new(ScrapeTransport::new(scrape_client, &messages.general)),
            Arc::new(RestTransport::new(rest_client, &messages.general)),
            messages,
        ));
        let cache = ResultCache::new(
            Arc::clone(&orchestrator) as Arc<dyn Execute>,
            store,
            cache_ttl,
        );

        Ok(Self {
            orchestrator,
            cache,
        })
    }

    pub fn registry(&self) -> &Registry {
        self.orchestrator.registry()
    }

    /// Run a query through the cache.
    pub async fn query(&self, query: &Query) -> Result<ExecutionResult, CoreError> {
        self.cache.lookup(query).await
    }

    /// Run a query against the device, bypassing the cache entirely.
    pub async fn query_uncached(&self, query: &Query) -> Result<ExecutionResult, CoreError> {
        self.orchestrator.execute(query).await
    }

    pub async fn clear_cache(&self) -> Result<(), CoreError> {
        self.cache.clear().await
    }
}
