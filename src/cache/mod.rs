//! Scratch cache
//!
//! Session-lifetime key-value entries that must not outlive the process or
//! the login they belong to, such as the ids of warnings already shown as
//! alerts. Entries are JSON-serialized so any serde type can be stored.
//!
//! # Usage
//!
//! ```rust,ignore
//! use studyvault::cache::{CacheLayer, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! cache.set("session:toastedWarnings", &vec!["w1"]).await?;
//! cache.delete_prefix("session:").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub use memory::MemoryCache;

/// Prefix of every entry that logout must wipe
pub const SESSION_SCOPE: &str = "session:";

/// Key of the already-alerted warning ids
pub const TOASTED_WARNINGS_KEY: &str = "session:toastedWarnings";

/// Cache layer trait
///
/// Generic methods keep this trait out of `dyn` position; hold the concrete
/// `MemoryCache` instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value, replacing any previous one
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every value whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}
