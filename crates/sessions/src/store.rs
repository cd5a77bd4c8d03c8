//! Pluggable persistence behind sessions.
//!
//! `SessionStore` is the narrow contract the HTTP layer drives: fetch a
//! payload by session ID, write one back with an optional TTL override,
//! drop one. `MemoryStore` is the in-process implementation used by tests
//! and single-node deployments.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use seabag_domain::Result;

/// Backing store for session payloads.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Whether the store can serve requests right now. Defaults to `true`;
    /// connection-backed stores report their actual state.
    fn is_ready(&self) -> bool {
        true
    }

    /// Fetch the payload stored under `id`, if any.
    async fn get(&self, id: &str) -> Result<Option<Map<String, Value>>>;

    /// Write `payload` under `id`. `ttl` overrides the store's default
    /// entry lifetime; `None` keeps the default.
    async fn set(
        &self,
        id: &str,
        payload: &Map<String, Value>,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Drop the payload stored under `id`. Dropping an absent ID is not an
    /// error.
    async fn remove(&self, id: &str) -> Result<()>;
}

struct StoredEntry {
    payload: Map<String, Value>,
    expires_at: Instant,
}

/// In-process session store with per-entry expiry.
///
/// Expired entries are evicted when read; nothing sweeps in the
/// background.
pub struct MemoryStore {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries currently held, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Map<String, Value>>> {
        let mut entries = self.entries.lock();

        let expired = matches!(entries.get(id), Some(entry) if entry.expires_at <= Instant::now());
        if expired {
            entries.remove(id);
            return Ok(None);
        }
        Ok(entries.get(id).map(|entry| entry.payload.clone()))
    }

    async fn set(
        &self,
        id: &str,
        payload: &Map<String, Value>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let entry = StoredEntry {
            payload: payload.clone(),
            expires_at: Instant::now() + ttl.unwrap_or(self.default_ttl),
        };
        self.entries.lock().insert(id.to_owned(), entry);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.entries.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(key: &str, value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_owned(), json!(value));
        map
    }

    #[tokio::test]
    async fn roundtrip() {
        let store = MemoryStore::new(Duration::from_secs(60));
        store
            .set("abc", &payload("theme", "dark"), None)
            .await
            .unwrap();

        let loaded = store.get("abc").await.unwrap().unwrap();
        assert_eq!(loaded.get("theme"), Some(&json!("dark")));
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let store = MemoryStore::new(Duration::from_secs(60));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_deletes_the_entry() {
        let store = MemoryStore::new(Duration::from_secs(60));
        store
            .set("abc", &payload("theme", "dark"), None)
            .await
            .unwrap();
        store.remove("abc").await.unwrap();
        assert!(store.get("abc").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_absent_is_ok() {
        let store = MemoryStore::new(Duration::from_secs(60));
        store.remove("missing").await.unwrap();
    }

    #[tokio::test]
    async fn entries_expire_on_read() {
        let store = MemoryStore::new(Duration::from_millis(5));
        store
            .set("abc", &payload("theme", "dark"), None)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(store.get("abc").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn ttl_override_beats_the_default() {
        let store = MemoryStore::new(Duration::from_millis(5));
        store
            .set("abc", &payload("theme", "dark"), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(store.get("abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ready_by_default() {
        let store = MemoryStore::new(Duration::from_secs(60));
        assert!(store.is_ready());
    }
}
