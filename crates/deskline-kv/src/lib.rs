//! Key-value storage for short-lived secrets (refresh and reset tokens).
//!
//! Besides get, set with an optional TTL and delete, the store offers an
//! atomic compare-and-delete used to consume single-use tokens.
//! `RedisStore` backs production; `MemoryStore` serves tests and
//! single-process development.

pub mod memory;
pub mod redis_store;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value`, replacing any previous value. With a TTL the key
    /// disappears once it elapses.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove `key` only if it currently holds `expected`, as one atomic
    /// step. Returns whether the key was removed. Of several concurrent
    /// callers with the same value, at most one gets `true`.
    async fn take_if_eq(&self, key: &str, expected: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
