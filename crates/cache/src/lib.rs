//! Ephemeral TTL-bound key/value cache used for throttle and pagination state.
//!
//! The cache is a collaborator: losing its contents only resets throttling
//! and pagination, it never corrupts domain data. The [`CacheStore`] trait
//! has deliberately no compare-and-set — callers use get-then-set, and the
//! resulting window is documented where it matters.

pub mod error;
pub mod memory;

pub use {
    error::{Error, Result},
    memory::MemoryCache,
};

use {async_trait::async_trait, serde_json::Value, std::time::Duration};

/// Key/value cache collaborator. Entries live in named tables and expire
/// via TTL; throttle and pagination writes always carry one.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value, or `None` if absent or expired.
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>>;

    /// Store a value. `ttl = None` means the entry never expires.
    async fn set(&self, table: &str, id: &str, ttl: Option<Duration>, value: Value) -> Result<()>;

    /// Drop an entry. Removing an absent entry is not an error.
    async fn remove(&self, table: &str, id: &str) -> Result<()>;
}
