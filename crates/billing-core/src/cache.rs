//! Object Cache Abstraction
//!
//! Read-through (cache-aside) layer over vendor and store lookups. The cache
//! is best-effort and never authoritative: the binding store and the vendor
//! API remain the sources of truth, and concurrent writers are last-writer-
//! wins. No TTL is imposed here; eviction policy belongs to the backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BillingError, Result};

/// Cache namespace used for all billing entries
pub const BILLING_NAMESPACE: &str = "billing";

/// Key-value cache with namespaced keys
///
/// Object-safe byte interface; use [`CacheExt`] for typed access.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a raw value, `Ok(None)` on miss
    async fn get_bytes(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a raw value
    async fn set_bytes(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;
}

/// Typed helpers over the byte-level [`Cache`] interface
#[allow(async_fn_in_trait)]
pub trait CacheExt: Cache {
    /// Get and deserialize a value
    async fn get<T>(&self, namespace: &str, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.get_bytes(namespace, key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Serialize and set a value
    async fn set<T>(&self, namespace: &str, key: &str, value: &T) -> Result<()>
    where
        T: serde::Serialize + Sync,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set_bytes(namespace, key, bytes).await
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

/// In-memory cache (for development and tests)
pub struct MemoryCache {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached entries (test helper)
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_bytes(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| BillingError::Cache("cache lock poisoned".into()))?;
        Ok(entries.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    async fn set_bytes(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BillingError::Cache("cache lock poisoned".into()))?;
        entries.insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BillingError::Cache("cache lock poisoned".into()))?;
        entries.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemoryCache::new();
        cache
            .set(BILLING_NAMESPACE, "customer:cus_1", &"hello".to_string())
            .await
            .unwrap();

        let value: Option<String> = cache.get(BILLING_NAMESPACE, "customer:cus_1").await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_miss_is_none() {
        let cache = MemoryCache::new();
        let value: Option<String> = cache.get(BILLING_NAMESPACE, "nope").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let cache = MemoryCache::new();
        cache
            .set("other", "key", &1u32)
            .await
            .unwrap();

        let value: Option<u32> = cache.get(BILLING_NAMESPACE, "key").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let cache = MemoryCache::new();
        cache.delete(BILLING_NAMESPACE, "absent").await.unwrap();
    }
}
