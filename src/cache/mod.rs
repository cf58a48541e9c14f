//! Cache layer
//!
//! Reader-facing lists are cached in process with moka. Values are stored
//! as JSON, so any serializable type can be cached under a string key.
//!
//! ```rust,ignore
//! let cache = create_cache(&config.cache);
//! cache.set("section:articles:items", &items, cache.default_ttl()).await?;
//! cache.delete_pattern("section:articles:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The methods are generic over the cached value, so this trait is not
/// object safe; hold a concrete cache behind an `Arc` instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value that expires after `ttl`
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values whose key matches a glob pattern (`*` and `?`)
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Shared cache handle
pub type SharedCache = Arc<MemoryCache>;

/// Create the cache from configuration
pub fn create_cache(config: &CacheConfig) -> SharedCache {
    let ttl = Duration::from_secs(config.ttl_seconds.max(1));
    Arc::new(MemoryCache::with_default_ttl(ttl))
}

/// Cache key of a section's item list
pub fn section_items_key(section_key: &str) -> String {
    format!("section:{}:items", section_key)
}

/// Pattern covering every cached entry of a section
pub fn section_pattern(section_key: &str) -> String {
    format!("section:{}:*", section_key)
}

/// Cache key of a singleton record
pub fn singleton_key(singleton_key: &str) -> String {
    format!("singleton:{}", singleton_key)
}
