//! In-memory cache backend.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use {async_trait::async_trait, dashmap::DashMap, serde_json::Value, tracing::trace};

use crate::{CacheStore, Result};

/// Expired entries are dropped lazily on read; a full sweep runs every
/// this many operations to stop abandoned keys from accumulating.
const SWEEP_EVERY_OPS: u64 = 512;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    deadline: Option<Instant>,
}

impl Entry {
    fn expired_at(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Process-local [`CacheStore`] backed by a concurrent map.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<(String, String), Entry>,
    ops_seen: AtomicU64,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get_at(&self, table: &str, id: &str, now: Instant) -> Option<Value> {
        let key = (table.to_string(), id.to_string());
        let entry = self.entries.get(&key)?;
        if entry.expired_at(now) {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn maybe_sweep(&self, now: Instant) {
        let seen = self.ops_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % SWEEP_EVERY_OPS != 0 {
            return;
        }
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.expired_at(now));
        trace!(
            swept = before.saturating_sub(self.entries.len()),
            "cache sweep"
        );
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>> {
        self.maybe_sweep(Instant::now());
        Ok(self.get_at(table, id, Instant::now()))
    }

    async fn set(&self, table: &str, id: &str, ttl: Option<Duration>, value: Value) -> Result<()> {
        self.maybe_sweep(Instant::now());
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert((table.to_string(), id.to_string()), Entry { value, deadline });
        Ok(())
    }

    async fn remove(&self, table: &str, id: &str) -> Result<()> {
        self.entries.remove(&(table.to_string(), id.to_string()));
        Ok(())
    }
}
