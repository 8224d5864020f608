// ── Device, credential and proxy registries ──

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Serialize;

use super::platform::{Platform, TransportClass};
use super::query::QueryType;
use crate::error::CoreError;
use crate::selector;

/// A queryable device, keyed by its location id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceConfig {
    /// Location id callers use to address this device (e.g. "nyc1").
    pub location: String,
    pub display_name: String,
    /// Hostname or IP address.
    pub address: String,
    pub port: u16,
    pub platform: Platform,
    /// Query types enabled for this device.
    pub queries: Vec<QueryType>,
    /// Name of the device credential in the registry.
    pub credential: String,
    /// Name of the proxy the device is reached through, if any.
    pub proxy: Option<String>,
}

impl DeviceConfig {
    pub fn transport(&self) -> TransportClass {
        selector::select(self.platform)
    }

    pub fn supports(&self, query_type: QueryType) -> bool {
        self.queries.contains(&query_type)
    }
}

/// Username and secret. The secret is redacted from `Debug` output.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub secret: SecretString,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// SSH proxy (bastion) with its own credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub credential: String,
}

/// Everything the engine can look up by name, built once at startup and
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    devices: IndexMap<String, DeviceConfig>,
    credentials: HashMap<String, Credential>,
    proxies: HashMap<String, ProxyConfig>,
}

impl Registry {
    /// Build a registry, checking that every reference resolves.
    ///
    /// Proxies are only meaningful for SSH devices; a REST device naming a
    /// proxy is a configuration error.
    pub fn new(
        devices: impl IntoIterator<Item = DeviceConfig>,
        credentials: HashMap<String, Credential>,
        proxies: impl IntoIterator<Item = ProxyConfig>,
    ) -> Result<Self, CoreError> {
        let proxies: HashMap<String, ProxyConfig> =
            proxies.into_iter().map(|p| (p.name.clone(), p)).collect();

        for proxy in proxies.values() {
            if !credentials.contains_key(&proxy.credential) {
                return Err(CoreError::Config {
                    message: format!(
                        "proxy '{}' references unknown credential '{}'",
                        proxy.name, proxy.credential
                    ),
                });
            }
        }

        let mut by_location = IndexMap::new();
        for device in devices {
            if !credentials.contains_key(&device.credential) {
                return Err(CoreError::Config {
                    message: format!(
                        "device '{}' references unknown credential '{}'",
                        device.location, device.credential
                    ),
                });
            }
            if let Some(proxy) = &device.proxy {
                if !proxies.contains_key(proxy) {
                    return Err(CoreError::Config {
                        message: format!(
                            "device '{}' references unknown proxy '{proxy}'",
                            device.location
                        ),
                    });
                }
                if device.transport() == TransportClass::Rest {
                    return Err(CoreError::Config {
                        message: format!(
                            "device '{}' uses the rest transport and cannot be proxied",
                            device.location
                        ),
                    });
                }
            }
            if by_location.contains_key(&device.location) {
                return Err(CoreError::Config {
                    message: format!("duplicate location '{}'", device.location),
                });
            }
            by_location.insert(device.location.clone(), device);
        }

        Ok(Self {
            devices: by_location,
            credentials,
            proxies,
        })
    }

    pub fn device(&self, location: &str) -> Option<&DeviceConfig> {
        self.devices.get(location)
    }

    pub fn credential(&self, name: &str) -> Option<&Credential> {
        self.credentials.get(name)
    }

    pub fn proxy(&self, name: &str) -> Option<&ProxyConfig> {
        self.proxies.get(name)
    }

    /// Devices in configuration order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
