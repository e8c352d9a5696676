use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;

use crate::store::StateStore;

/// In-process TTL memo keyed by logical document name.
///
/// Entries expire by wall-clock comparison at read time; there is no
/// background eviction. The cache is private to one process and never
/// shared across invocations.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created: Instant,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value iff `now - created < ttl`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let Ok(entries) = self.entries.lock() else {
            return None;
        };
        let entry = entries.get(key)?;
        if entry.created.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    created: Instant::now(),
                },
            );
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// [`StateStore`] wrapped with a short-TTL read memo.
///
/// Several handlers in one dispatch commonly touch the same namespace; the
/// memo keeps that to a single disk read. Writes always go through to disk
/// and refresh the memo together, so a read-after-write inside the TTL
/// window sees the written value.
#[derive(Debug)]
pub struct CachedStore {
    store: StateStore,
    cache: TtlCache,
}

impl CachedStore {
    pub fn new(store: StateStore, ttl: Duration) -> Self {
        Self {
            store,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn read(&self, namespace: &str, session_id: Option<&str>) -> Value {
        let key = memo_key(namespace, session_id);
        if let Some(value) = self.cache.get(&key) {
            return value;
        }
        let value = self.store.read(namespace, session_id);
        self.cache.put(&key, value.clone());
        value
    }

    pub fn write(&self, namespace: &str, document: &Value, session_id: Option<&str>) -> bool {
        let ok = self.store.write(namespace, document, session_id);
        let key = memo_key(namespace, session_id);
        if ok {
            self.cache.put(&key, document.clone());
        } else {
            // Disk and memo may disagree; force the next read to disk.
            self.cache.invalidate(&key);
        }
        ok
    }

    pub fn update(
        &self,
        namespace: &str,
        session_id: Option<&str>,
        updater: impl FnOnce(&mut Value),
    ) -> bool {
        let key = memo_key(namespace, session_id);
        self.cache.invalidate(&key);
        self.store.update(namespace, session_id, updater)
    }
}

fn memo_key(namespace: &str, session_id: Option<&str>) -> String {
    match session_id {
        None => format!("global/{namespace}"),
        Some(sid) => format!("session/{sid}/{namespace}"),
    }
}
