//! Configuration for glassline.
//!
//! A TOML file layered over built-in defaults and `GLASSLINE_*` environment
//! variables, credential resolution (env + plaintext + keyring), and
//! translation into a `glassline_core::EngineConfig`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use glassline_core::{
    CommandOverrides, Credential, DeviceConfig, EngineConfig, Messages, Platform, ProxyConfig,
    QueryType, Registry, ScrapeSettings, TransportClass,
};

/// Keyring service name credentials are looked up under.
pub const KEYRING_SERVICE: &str = "glassline";

/// Prefix for environment overrides, e.g. `GLASSLINE_CACHE__TTL=30`.
pub const ENV_PREFIX: &str = "GLASSLINE_";

const CONFIG_FILE: &str = "glassline.toml";
const CACHE_FILE: &str = "results.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no secret found for credential '{credential}'")]
    NoCredentials { credential: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub cache: CacheSection,
    pub scrape: ScrapeSection,
    pub logging: Logging,
    pub messages: Messages,
    pub credentials: BTreeMap<String, CredentialEntry>,
    pub proxies: BTreeMap<String, ProxyEntry>,
    /// Devices keyed by location id.
    pub devices: BTreeMap<String, DeviceEntry>,
    /// Per-platform command template overrides.
    pub commands: HashMap<Platform, HashMap<QueryType, String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct General {
    /// REST request timeout in seconds.
    pub request_timeout: u64,
    /// Accept self-signed certificates from query agents.
    pub tls_insecure: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            request_timeout: 7,
            tls_insecure: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSection {
    /// Entry lifetime in seconds.
    pub ttl: u64,
    /// Results file shared by every invocation. Defaults to the platform
    /// cache directory.
    pub path: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl: 120,
            path: None,
        }
    }
}

impl CacheSection {
    /// The results file: `path` when set, else `results.json` in the
    /// platform cache directory.
    pub fn file(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            ProjectDirs::from("net", "glassline", "glassline").map_or_else(
                || dirs_fallback().join("cache").join(CACHE_FILE),
                |dirs| dirs.cache_dir().join(CACHE_FILE),
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeSection {
    /// SSH timeout in seconds.
    pub timeout: u64,
    pub delay_factor: f64,
    /// Concurrent SSH sessions.
    pub max_sessions: usize,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            timeout: 15,
            delay_factor: 0.2,
            max_sessions: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Filter directive, e.g. "info" or "glassline_core=debug".
    pub level: String,
    pub format: LogFormat,
    /// Write a daily rolling log here in addition to stderr.
    pub directory: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            directory: None,
        }
    }
}

/// A named credential, shared by devices and proxies.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialEntry {
    pub username: String,

    /// Plaintext secret (prefer `password_env` or the keyring).
    pub password: Option<String>,

    /// Environment variable holding the secret.
    pub password_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyEntry {
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub credential: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub address: String,
    /// Defaults to 22 for SSH platforms and 8080 for query agents.
    pub port: Option<u16>,
    pub platform: Platform,
    pub credential: String,
    pub proxy: Option<String>,
    pub display_name: Option<String>,
    /// Enabled query types; all of them when omitted.
    pub queries: Option<Vec<QueryType>>,
}

fn default_ssh_port() -> u16 {
    22
}

const DEFAULT_AGENT_PORT: u16 = 8080;

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "glassline", "glassline").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push(CONFIG_FILE);
            p
        },
        |dirs| dirs.config_dir().join(CONFIG_FILE),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("glassline");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from `path` (or the default location) and the
/// environment, then validate it.
///
/// An explicit path must exist; a missing default file just yields the
/// built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Check settings and cross references that serde can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.request_timeout == 0 {
            return Err(invalid("general.request_timeout", "must be at least 1 second"));
        }
        if self.scrape.timeout == 0 {
            return Err(invalid("scrape.timeout", "must be at least 1 second"));
        }
        if self.scrape.max_sessions == 0 {
            return Err(invalid("scrape.max_sessions", "must be at least 1"));
        }
        if !self.scrape.delay_factor.is_finite() || self.scrape.delay_factor < 0.0 {
            return Err(invalid("scrape.delay_factor", "must be a non-negative number"));
        }

        for (name, proxy) in &self.proxies {
            if !self.credentials.contains_key(&proxy.credential) {
                return Err(invalid(
                    &format!("proxies.{name}.credential"),
                    &format!("unknown credential '{}'", proxy.credential),
                ));
            }
        }

        for (location, device) in &self.devices {
            if !self.credentials.contains_key(&device.credential) {
                return Err(invalid(
                    &format!("devices.{location}.credential"),
                    &format!("unknown credential '{}'", device.credential),
                ));
            }
            if let Some(proxy) = &device.proxy {
                if !self.proxies.contains_key(proxy) {
                    return Err(invalid(
                        &format!("devices.{location}.proxy"),
                        &format!("unknown proxy '{proxy}'"),
                    ));
                }
                if device.platform.rest_path().is_some() {
                    return Err(invalid(
                        &format!("devices.{location}.proxy"),
                        &format!("{} devices are reached over REST and cannot use a proxy", device.platform),
                    ));
                }
            }
            if device.queries.as_ref().is_some_and(Vec::is_empty) {
                return Err(invalid(
                    &format!("devices.{location}.queries"),
                    "at least one query type must be enabled",
                ));
            }
        }
        Ok(())
    }

    /// Device entries as core device configs, in location order.
    pub fn device_configs(&self) -> Vec<DeviceConfig> {
        self.devices
            .iter()
            .map(|(location, entry)| entry.to_device(location))
            .collect()
    }

    /// Resolve every secret and build the engine configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let credentials = self
            .credentials
            .iter()
            .map(|(name, entry)| {
                Ok((
                    name.clone(),
                    Credential {
                        username: entry.username.clone(),
                        secret: resolve_secret(name, entry)?,
                    },
                ))
            })
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;

        let proxies = self.proxies.iter().map(|(name, p)| ProxyConfig {
            name: name.clone(),
            address: p.address.clone(),
            port: p.port,
            credential: p.credential.clone(),
        });

        let registry = Registry::new(self.device_configs(), credentials, proxies)
            .map_err(|e| invalid("devices", &e.to_string()))?;

        let commands: CommandOverrides = self.commands.clone();
        Ok(EngineConfig {
            registry,
            messages: self.messages.clone(),
            request_timeout: Duration::from_secs(self.general.request_timeout),
            tls_insecure: self.general.tls_insecure,
            scrape: ScrapeSettings {
                timeout: Duration::from_secs(self.scrape.timeout),
                delay_factor: self.scrape.delay_factor,
                max_sessions: self.scrape.max_sessions,
            },
            cache_ttl: Duration::from_secs(self.cache.ttl),
            commands,
        })
    }

    /// A copy safe to print: plaintext secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for entry in copy.credentials.values_mut() {
            if entry.password.is_some() {
                entry.password = Some("********".into());
            }
        }
        copy
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl DeviceEntry {
    fn to_device(&self, location: &str) -> DeviceConfig {
        let default_port = match glassline_core::selector::select(self.platform) {
            TransportClass::Scrape => default_ssh_port(),
            TransportClass::Rest => DEFAULT_AGENT_PORT,
        };
        DeviceConfig {
            location: location.to_owned(),
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| location.to_owned()),
            address: self.address.clone(),
            port: self.port.unwrap_or(default_port),
            platform: self.platform,
            queries: self
                .queries
                .clone()
                .unwrap_or_else(|| QueryType::iter().collect()),
            credential: self.credential.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a credential's secret.
///
/// Order: the variable named by `password_env`, then the plaintext
/// `password`, then the system keyring entry `credential/<name>`.
pub fn resolve_secret(name: &str, entry: &CredentialEntry) -> Result<SecretString, ConfigError> {
    // 1. Env var named in config
    if let Some(ref env_name) = entry.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Plaintext in config
    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    // 3. System keyring
    if let Ok(keyring_entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("credential/{name}")) {
        if let Ok(secret) = keyring_entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    Err(ConfigError::NoCredentials {
        credential: name.into(),
    })
}
