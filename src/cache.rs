use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::errors::GraphEngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => now.saturating_duration_since(self.stored_at) < ttl,
        }
    }
}

/// Memoizes derived metrics by key.
///
/// Entries with `ttl = None` live until [`MetricCache::clear`] or
/// [`MetricCache::invalidate`]; others expire once older than their ttl. A
/// zero ttl never serves a cached value.
#[derive(Default)]
pub struct MetricCache {
    inner: RwLock<AHashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MetricCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the fresh cached value for `key`, or runs `compute` and stores
    /// its result. Errors from `compute` are returned and nothing is stored.
    pub fn get_or_compute<T, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<Arc<T>, GraphEngineError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, GraphEngineError>,
    {
        if let Some(value) = self.get::<T>(key) {
            return Ok(value);
        }
        let value = Arc::new(compute()?);
        let erased: Arc<dyn Any + Send + Sync> = value.clone();
        self.inner.write().insert(
            key.to_string(),
            CacheEntry {
                value: erased,
                stored_at: Instant::now(),
                ttl,
            },
        );
        Ok(value)
    }

    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let found = {
            let guard = self.inner.read();
            guard
                .get(key)
                .filter(|entry| entry.is_fresh(Instant::now()))
                .and_then(|entry| entry.value.clone().downcast::<T>().ok())
        };
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "metric cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "metric cache miss");
        }
        found
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.write().remove(key);
    }

    /// Drops entries whose ttl has elapsed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|_, entry| entry.is_fresh(now));
        before - guard.len()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.inner.read().len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }
}
