//! Package cache keyed by request fingerprint.
//!
//! Two identical requests inside the TTL window return the same package
//! without invoking the generation service. Entries are evicted lazily on
//! read; concurrent writers for the same fingerprint race and the last
//! writer wins, which is acceptable because responses for identical input
//! are equivalent.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use riverboat_types::Result;
use riverboat_types::package::Package;

/// Compute the cache key for a claim/task pair.
///
/// The task text is hashed so arbitrarily long tasks yield bounded keys.
pub fn fingerprint(claim: &str, task: &str) -> String {
    let digest = Sha256::digest(task.as_bytes());
    let short: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("riverboat:{claim}:{short}")
}

/// Storage backend for completed packages.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Package>>;
    async fn set(&self, key: &str, package: &Package, ttl: Duration) -> Result<()>;
}

struct CacheEntry {
    package: Package,
    expires_at: DateTime<Utc>,
}

/// Process-local cache with per-entry TTL.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Package>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.package.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, package: &Package, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(1800));
        let entry = CacheEntry {
            package: package.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }
}
