// JSON file store: cached results survive the process, so one-shot callers
// (the CLI) still see hits within the TTL.
//
// The whole map is rewritten on every change through a temporary file and a
// rename. Expiry is wall-clock, since entries outlive the process that
// wrote them.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use super::store::CacheStore;
use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl Entry {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

type Entries = BTreeMap<String, Entry>;

/// Store backed by a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, CoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(io_error(&self.path, &e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Rewritten on the next save.
                warn!(path = %self.path.display(), error = %e, "discarding unreadable cache file");
                Ok(Entries::new())
            }
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }
        let json = serde_json::to_vec(entries).map_err(|e| CoreError::Cache {
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| io_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, &e))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now_millis()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        let now = now_millis();
        let mut entries = self.load().await?;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: None,
            },
        );
        self.save(&entries).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let Some(entry) = entries.get_mut(key) else {
            return Ok(());
        };
        let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        entry.expires_at = Some(now_millis().saturating_add(ttl));
        self.save(&entries).await
    }

    async fn flush_all(&self) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn io_error(path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::Cache {
        message: format!("{}: {err}", path.display()),
    }
}
