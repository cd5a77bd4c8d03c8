//! The per-request session handle.
//!
//! `Session` clones cheaply (an `Arc` around the state) so the HTTP layer
//! can keep one copy for the response phase while handlers work through
//! another. Accessors lock internally and never hold the lock across an
//! await point.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use seabag_domain::Result;

use crate::state::SessionState;
use crate::store::SessionStore;

/// Handle to one client's session for the duration of a request.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Start a brand-new session against `store`.
    ///
    /// `store_blank` decides whether the empty session starts dirty, i.e.
    /// whether it is persisted even if the request never touches it.
    pub fn fresh(store: Arc<dyn SessionStore>, store_blank: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::fresh(store_blank))),
            store,
        }
    }

    /// Rebuild a session from the payload fetched for a returning cookie.
    pub fn hydrated(store: Arc<dyn SessionStore>, id: String, payload: Map<String, Value>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::hydrated(id, payload))),
            store,
        }
    }

    /// The session ID the response cookie will carry.
    pub fn id(&self) -> String {
        self.state.lock().id.clone()
    }

    pub fn is_modified(&self) -> bool {
        self.state.lock().is_modified
    }

    pub fn is_lazy(&self) -> bool {
        self.state.lock().is_lazy
    }

    // ── plain entries ───────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().get(key)
    }

    /// Read and delete in one step. Dirties the session even when the key
    /// was absent.
    pub fn take(&self, key: &str) -> Option<Value> {
        self.state.lock().take(key)
    }

    /// Store values. `set("theme", json!("dark"))` stores one entry and
    /// returns the value; `set(json!({ ... }), None)` merges a whole
    /// mapping and returns it. A null, false, zero, or empty-string key is
    /// rejected, as is any other combination of arguments.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Option<Value>>) -> Result<Value> {
        self.state.lock().set(key.into(), value.into())
    }

    /// Delete one entry. Dirties the session even when the key was absent.
    pub fn clear(&self, key: &str) {
        self.state.lock().clear(key)
    }

    /// Force a write-back at response time without changing any data.
    pub fn touch(&self) {
        self.state.lock().touch()
    }

    /// Snapshot of the stored entries.
    pub fn entries(&self) -> Map<String, Value> {
        self.state.lock().entries()
    }

    // ── flash messages ──────────────────────────────────────────────

    /// Append a one-time message under `kind`; returns the list so far.
    pub fn flash(&self, kind: &str, message: impl Into<Value>) -> Value {
        self.state.lock().flash_append(kind, message.into())
    }

    /// Replace everything stored under `kind` with `message` as-is.
    pub fn flash_override(&self, kind: &str, message: impl Into<Value>) -> Value {
        self.state.lock().flash_override(kind, message.into())
    }

    /// Read and delete the messages under `kind` (empty list when absent).
    pub fn flash_take(&self, kind: &str) -> Value {
        self.state.lock().flash_take(kind)
    }

    /// Read and delete every one-time message, grouped by kind.
    pub fn flash_drain(&self) -> Map<String, Value> {
        self.state.lock().flash_drain()
    }

    // ── lazy surface ────────────────────────────────────────────────

    /// Toggle lazy mode. While on, the lazy surface is swept into the
    /// store at response time.
    pub fn lazy(&self, enabled: bool) {
        self.state.lock().set_lazy_mode(enabled)
    }

    /// Put a field on the lazy surface. Only persisted while lazy mode is
    /// on; `_`-prefixed names stay request-local either way.
    pub fn set_lazy(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.lock().set_lazy(key.into(), value.into())
    }

    /// Read a field from the lazy surface.
    pub fn lazy_field(&self, key: &str) -> Option<Value> {
        self.state.lock().lazy_field(key)
    }

    // ── lifecycle ───────────────────────────────────────────────────

    /// Abandon the current session: wipe the stored data and mint a new
    /// ID. The old ID is dropped from the store best-effort. The lazy
    /// surface survives, so captured fields follow the new ID.
    pub async fn reset(&self) {
        let dropped = self.state.lock().reset();
        if let Err(error) = self.store.remove(&dropped).await {
            tracing::debug!(session_id = %dropped, %error, "dropping session after reset failed");
        }
    }

    /// Collect what the response phase must persist.
    ///
    /// Returns `None` when the session is clean and not lazy, meaning no
    /// write-back and no cookie. In lazy mode the lazy surface is captured
    /// into the store first.
    pub fn prepare_write(&self) -> Option<(String, Map<String, Value>)> {
        let mut state = self.state.lock();
        if !state.is_modified && !state.is_lazy {
            return None;
        }
        if state.is_lazy {
            state.capture_lazy_fields();
        }
        Some((state.id.clone(), state.entries()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Session")
            .field("id", &state.id)
            .field("is_modified", &state.is_modified)
            .field("is_lazy", &state.is_lazy)
            .finish_non_exhaustive()
    }
}
