// ── Result cache ──
//
// Memoizes successful executions for a fixed TTL and makes sure only one
// execution per key is ever in flight: concurrent callers for the same
// query share a single future and its result.

mod file;
mod store;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{ExecutionResult, Outcome, Query};
use crate::orchestrator::Execute;

pub use file::FileStore;
pub use store::{CacheStore, MemoryStore};

/// Prefix shared by every cache key.
pub const KEY_PREFIX: &str = "glassline:query:";

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

type Flight = Shared<BoxFuture<'static, Result<ExecutionResult, CoreError>>>;

/// Cache key for a query: a digest of its canonical JSON form, so it
/// depends on every field and nothing else.
pub fn cache_key(query: &Query) -> String {
    let canonical = json!({
        "location": query.location(),
        "query_type": query.query_type().to_string(),
        "target": query.target(),
    })
    .to_string();
    format!("{KEY_PREFIX}{}", hex::encode(Sha256::digest(canonical.as_bytes())))
}

pub struct ResultCache {
    executor: Arc<dyn Execute>,
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    inflight: DashMap<String, Flight>,
}

impl ResultCache {
    pub fn new(executor: Arc<dyn Execute>, store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            executor,
            store,
            ttl,
            inflight: DashMap::new(),
        }
    }

    /// Executions currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Serve `query` from the store, join an identical in-flight execution,
    /// or start one.
    pub async fn lookup(&self, query: &Query) -> Result<ExecutionResult, CoreError> {
        let key = cache_key(query);
        if let Some(output) = read(self.store.as_ref(), &key).await {
            debug!(%key, "cache hit");
            return Ok(ExecutionResult::succeeded(output));
        }

        let flight = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| self.start(key.clone(), query.clone()))
            .clone();

        let mut waiter = Waiter {
            inflight: &self.inflight,
            key: &key,
            polled: flight.clone(),
            flight,
        };
        (&mut waiter.polled).await
    }

    /// Drop every stored entry.
    pub async fn clear(&self) -> Result<(), CoreError> {
        self.store.flush_all().await
    }

    fn start(&self, key: String, query: Query) -> Flight {
        let executor = Arc::clone(&self.executor);
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;

        async move {
            // Another flight may have filled the slot since the first check.
            if let Some(output) = read(store.as_ref(), &key).await {
                return Ok(ExecutionResult::succeeded(output));
            }

            let result = executor.execute(&query).await?;
            if result.outcome == Outcome::Succeeded && !result.output.is_empty() {
                write(store.as_ref(), &key, &result.output, ttl).await;
            } else {
                debug!(%key, outcome = %result.outcome, "result not cached");
            }
            Ok(result)
        }
        .boxed()
        .shared()
    }
}

/// A caller's handle on a flight. On drop, the map entry is removed once
/// the flight has finished, or when the last caller gives up on it, so a
/// later lookup never joins an abandoned execution.
///
/// `polled` is the handle being awaited; `flight` is never polled, so it
/// stays comparable with the map entry after completion.
struct Waiter<'a> {
    inflight: &'a DashMap<String, Flight>,
    key: &'a str,
    flight: Flight,
    polled: Flight,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let finished = self.flight.peek().is_some();
        // The map entry plus both handles held here.
        let abandoned = self.flight.strong_count().is_some_and(|n| n <= 3);
        if finished || abandoned {
            self.inflight
                .remove_if(self.key, |_, current| current.ptr_eq(&self.flight));
        }
    }
}

/// Store faults count as a miss.
async fn read(store: &dyn CacheStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!(%key, error = %e, "cache read failed");
            None
        }
    }
}

async fn write(store: &dyn CacheStore, key: &str, value: &str, ttl: Duration) {
    let stored = match store.set(key, value).await {
        Ok(()) => store.expire(key, ttl).await,
        Err(e) => Err(e),
    };
    if let Err(e) = stored {
        warn!(%key, error = %e, "cache write failed");
    }
}
