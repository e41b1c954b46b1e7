//! Listing cache with an in-process backend and a Redis backend.
//!
//! Failures never surface to callers: a broken Redis behaves like an empty
//! cache and a failed invalidation is only logged.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use deadpool_redis::{Config as RedisPoolConfig, Pool, Runtime};
use redis::AsyncCommands;

use crate::{
    config::CacheConfig,
    error::{AppError, Result},
};

const PRODUCTS_KEY: &str = "Products_";

/// Local maps at or above this size drop expired entries on the next insert.
const LOCAL_SWEEP_THRESHOLD: usize = 256;

#[derive(Clone, Debug)]
struct LocalEntry {
    value: String,
    stored_at: Instant,
    ttl: Duration,
}

impl LocalEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

#[derive(Clone)]
enum Backend {
    Local(Arc<DashMap<String, LocalEntry>>),
    Redis(Pool),
}

#[derive(Clone)]
pub struct CacheBackend {
    backend: Backend,
    prefix: String,
    ttl: Duration,
}

impl CacheBackend {
    pub fn new_local(prefix: &str, ttl: Duration) -> Self {
        Self {
            backend: Backend::Local(Arc::new(DashMap::new())),
            prefix: prefix.to_string(),
            ttl,
        }
    }

    pub fn new_redis(pool: Pool, prefix: &str, ttl: Duration) -> Self {
        Self {
            backend: Backend::Redis(pool),
            prefix: prefix.to_string(),
            ttl,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self.backend {
            Backend::Local(_) => "local",
            Backend::Redis(_) => "redis",
        }
    }

    /// Key for one unfiltered page of the product listing.
    pub fn products_page_key(&self, page: i64, limit: i64) -> String {
        format!("{}{}{}_{}", self.prefix, PRODUCTS_KEY, page, limit)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match &self.backend {
            Backend::Local(map) => {
                let entry = map.get(key)?;
                if entry.is_expired() {
                    drop(entry);
                    map.remove(key);
                    return None;
                }
                Some(entry.value.clone())
            }
            Backend::Redis(pool) => {
                let mut conn = match pool.get().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get Redis connection");
                        return None;
                    }
                };

                match conn.get::<_, Option<String>>(key).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET error");
                        None
                    }
                }
            }
        }
    }

    pub async fn set(&self, key: &str, value: String) {
        match &self.backend {
            Backend::Local(map) => {
                if map.len() >= LOCAL_SWEEP_THRESHOLD {
                    map.retain(|_, entry| !entry.is_expired());
                }
                map.insert(
                    key.to_string(),
                    LocalEntry {
                        value,
                        stored_at: Instant::now(),
                        ttl: self.ttl,
                    },
                );
            }
            Backend::Redis(pool) => {
                let mut conn = match pool.get().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get Redis connection");
                        return;
                    }
                };

                if let Err(e) = conn
                    .set_ex::<_, _, ()>(key, value, self.ttl.as_secs().max(1))
                    .await
                {
                    tracing::warn!(key = %key, error = %e, "Redis SET error");
                }
            }
        }
    }

    /// Drops every cached product listing page.
    pub async fn invalidate_products(&self) {
        let prefix = format!("{}{}", self.prefix, PRODUCTS_KEY);
        tracing::info!("Deleting products from cache");

        match self.delete_by_prefix(&prefix).await {
            Ok(count) => tracing::debug!(prefix = %prefix, count, "cache keys removed"),
            Err(e) => tracing::warn!(prefix = %prefix, error = %e, "cache invalidation failed"),
        }
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        match &self.backend {
            Backend::Local(map) => {
                let before = map.len();
                map.retain(|key, _| !key.starts_with(prefix));
                Ok(before.saturating_sub(map.len()))
            }
            Backend::Redis(pool) => {
                let mut conn = pool
                    .get()
                    .await
                    .map_err(|e| AppError::InternalError(format!("Redis pool error: {}", e)))?;

                let pattern = format!("{}*", escape_glob(prefix));
                let mut keys: Vec<String> = Vec::new();
                {
                    let mut iter = conn
                        .scan_match::<_, String>(&pattern)
                        .await
                        .map_err(|e| AppError::InternalError(format!("Redis SCAN error: {}", e)))?;
                    while let Some(key) = iter.next_item().await {
                        keys.push(key);
                    }
                }

                if keys.is_empty() {
                    return Ok(0);
                }

                let count = keys.len();
                conn.unlink::<_, ()>(keys)
                    .await
                    .map_err(|e| AppError::InternalError(format!("Redis UNLINK error: {}", e)))?;

                Ok(count)
            }
        }
    }
}

pub fn create_cache_backend(config: &CacheConfig) -> Result<CacheBackend> {
    let ttl = Duration::from_secs(config.ttl_secs);

    match &config.redis_url {
        Some(url) => {
            let pool = RedisPoolConfig::from_url(url.as_str())
                .create_pool(Some(Runtime::Tokio1))
                .map_err(|e| AppError::ConfigError(format!("Invalid REDIS_URL: {}", e)))?;
            tracing::info!("Product listing cache backed by Redis");
            Ok(CacheBackend::new_redis(pool, &config.key_prefix, ttl))
        }
        None => {
            tracing::info!("REDIS_URL not set, product listing cache kept in memory");
            Ok(CacheBackend::new_local(&config.key_prefix, ttl))
        }
    }
}

/// Escapes Redis glob metacharacters so a prefix matches literally.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> CacheBackend {
        CacheBackend::new_local("test_cache:", Duration::from_secs(60))
    }

    #[test]
    fn page_keys_carry_prefix_page_and_limit() {
        assert_eq!(cache().products_page_key(2, 25), "test_cache:Products_2_25");
    }

    #[tokio::test]
    async fn local_get_set_round_trip() {
        let cache = cache();
        let key = cache.products_page_key(0, 25);

        assert!(cache.get(&key).await.is_none());
        cache.set(&key, "{\"items\":[]}".to_string()).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("{\"items\":[]}"));
        assert_eq!(cache.mode(), "local");
    }

    #[tokio::test]
    async fn local_entries_expire() {
        let cache = CacheBackend::new_local("test_cache:", Duration::from_millis(20));
        cache.set("test_cache:Products_0_25", "x".to_string()).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("test_cache:Products_0_25").await.is_none());
    }

    #[tokio::test]
    async fn expired_pages_are_reclaimed_on_insert() {
        let cache = CacheBackend::new_local("test_cache:", Duration::from_secs(60));
        let Backend::Local(map) = &cache.backend else {
            unreachable!()
        };

        for page in 0..1000 {
            map.insert(
                cache.products_page_key(page, 25),
                LocalEntry {
                    value: "x".to_string(),
                    stored_at: Instant::now(),
                    ttl: Duration::from_millis(1),
                },
            );
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.set(&cache.products_page_key(1000, 25), "y".to_string()).await;

        assert_eq!(map.len(), 1);
        assert_eq!(
            cache.get(&cache.products_page_key(1000, 25)).await.as_deref(),
            Some("y")
        );
    }

    #[tokio::test]
    async fn small_maps_skip_the_sweep() {
        let cache = CacheBackend::new_local("test_cache:", Duration::from_millis(1));
        cache.set(&cache.products_page_key(0, 25), "x".to_string()).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.set(&cache.products_page_key(1, 25), "y".to_string()).await;

        match &cache.backend {
            Backend::Local(map) => assert_eq!(map.len(), 2),
            Backend::Redis(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn invalidation_removes_only_product_pages() {
        let cache = cache();
        cache.set(&cache.products_page_key(0, 25), "a".to_string()).await;
        cache.set(&cache.products_page_key(1, 10), "b".to_string()).await;
        cache.set("test_cache:Categories_0_25", "c".to_string()).await;
        cache.set("other:Products_0_25", "d".to_string()).await;

        cache.invalidate_products().await;

        assert!(cache.get(&cache.products_page_key(0, 25)).await.is_none());
        assert!(cache.get(&cache.products_page_key(1, 10)).await.is_none());
        assert_eq!(cache.get("test_cache:Categories_0_25").await.as_deref(), Some("c"));
        assert_eq!(cache.get("other:Products_0_25").await.as_deref(), Some("d"));
    }

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("app[1]*:"), "app\\[1\\]\\*:");
    }
}
