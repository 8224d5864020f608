// Key/value backends for the result cache.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::CoreError;

/// Minimal key/value store with per-key expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Store `value`, clearing any expiry previously set on `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Expire `key` after `ttl`. No-op for a missing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CoreError>;

    async fn flush_all(&self) -> Result<(), CoreError>;
}

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-process store. Expired entries are evicted lazily on read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let now = Instant::now();
        if let Some(slot) = self.slots.get(key) {
            if slot.is_live(now) {
                return Ok(Some(slot.value.clone()));
            }
        }
        self.slots.remove_if(key, |_, slot| !slot.is_live(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.slots.insert(
            key.to_owned(),
            Slot {
                value: value.to_owned(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CoreError> {
        if let Some(mut slot) = self.slots.get_mut(key) {
            slot.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), CoreError> {
        self.slots.clear();
        Ok(())
    }
}
