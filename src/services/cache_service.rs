use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

const DEFAULT_MAX_ENTRIES: usize = 64;

/// Time-bounded memo for expensive, idempotent lookups. Concurrent misses
/// each run their own computation; the last writer wins. At most
/// `max_entries` keys are held; a full cache drops the entry closest to
/// expiry.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    max_entries: usize,
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl<T> TtlCache<T> {
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of stored entries, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn cache_key(parts: &[String]) -> String {
    parts.join("\u{1f}")
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fresh cached value for `key`, or runs `compute` and stores
    /// its result. Errors are returned as-is and never stored.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &[String],
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = cache_key(key);
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.value.clone());
                }
            }
        }

        debug!("cache miss for {:?}", key);
        let value = compute().await?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("cache full, evicting {:?}", oldest);
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(value)
    }

    pub async fn invalidate(&self, key: &[String]) {
        self.entries.write().await.remove(&cache_key(key));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
