//! TTL cache for live schema snapshots
//!
//! A session asks many questions against the same schema; introspecting
//! `information_schema` on every one is wasted latency. The cache holds
//! the most recent snapshot and refetches once it is older than the
//! configured TTL.

use crate::adapter::{DatabaseAdapter, DatabaseError};
use crate::live::LiveSchema;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Single-slot cache with a time-to-live
pub struct SchemaCache {
    ttl: Duration,
    slot: RwLock<Option<Entry>>,
}

struct Entry {
    fetched_at: Instant,
    schema: Arc<LiveSchema>,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Get the cached snapshot if it is still fresh.
    pub async fn get(&self) -> Option<Arc<LiveSchema>> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.schema.clone()),
            _ => None,
        }
    }

    /// Store a fresh snapshot, replacing whatever was cached.
    pub async fn store(&self, schema: LiveSchema) -> Arc<LiveSchema> {
        let schema = Arc::new(schema);
        let mut slot = self.slot.write().await;
        *slot = Some(Entry {
            fetched_at: Instant::now(),
            schema: schema.clone(),
        });
        schema
    }

    /// Drop the cached snapshot so the next read refetches.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }

    /// Return the cached snapshot, fetching through the adapter on a
    /// miss. Concurrent misses may fetch twice; the last write wins.
    pub async fn get_or_fetch(
        &self,
        adapter: &dyn DatabaseAdapter,
        schema_name: &str,
    ) -> Result<Arc<LiveSchema>, DatabaseError> {
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }
        let schema = adapter.fetch_live_schema(schema_name).await?;
        Ok(self.store(schema).await)
    }
}
