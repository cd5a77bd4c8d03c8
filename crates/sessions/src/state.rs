//! In-memory session state and the mutation rules over it.
//!
//! Every mutation funnels through here so the dirty flag stays accurate:
//! the HTTP layer only writes a session back to its store when something
//! changed during the request (or lazy mode is on).

use serde_json::{Map, Value};

use seabag_domain::{Error, Result};

use crate::id;

/// Store entry holding flash messages, grouped by kind.
pub(crate) const FLASH_KEY: &str = "_flash";

/// Store entry listing which keys were captured from the lazy surface, so
/// a later request can split them back out.
pub(crate) const LAZY_KEYS_KEY: &str = "_lazyKeys";

/// Names the lazy capture never persists as plain entries.
pub(crate) const RESERVED_KEYS: &[&str] = &[
    "id", "store", "isModified", "isLazy", "reset", "get", "set", "clear", "touch", "flash",
    "lazy",
];

/// One client's session for the duration of a request.
pub(crate) struct SessionState {
    pub(crate) id: String,
    pub(crate) store: Map<String, Value>,
    pub(crate) lazy_fields: Map<String, Value>,
    pub(crate) is_modified: bool,
    pub(crate) is_lazy: bool,
}

impl SessionState {
    /// Brand-new session under a freshly minted ID.
    ///
    /// `store_blank` decides whether the empty session starts dirty, i.e.
    /// whether it is persisted even if the request never touches it.
    pub(crate) fn fresh(store_blank: bool) -> Self {
        Self {
            id: id::generate(),
            store: Map::new(),
            lazy_fields: Map::new(),
            is_modified: store_blank,
            is_lazy: false,
        }
    }

    /// Session rebuilt from the payload fetched for a returning cookie.
    ///
    /// A lazy-key list in the payload re-enables lazy mode and moves the
    /// listed entries back onto the lazy surface. The list entry itself
    /// stays in the store until the next capture overwrites it.
    pub(crate) fn hydrated(id: String, mut payload: Map<String, Value>) -> Self {
        let mut lazy_fields = Map::new();
        let mut is_lazy = false;

        if let Some(Value::Array(names)) = payload.get(LAZY_KEYS_KEY).cloned() {
            is_lazy = true;
            for name in names {
                if let Value::String(name) = name {
                    if let Some(value) = payload.remove(&name) {
                        lazy_fields.insert(name, value);
                    }
                }
            }
        }

        Self {
            id,
            store: payload,
            lazy_fields,
            is_modified: false,
            is_lazy,
        }
    }

    // ── plain entries ───────────────────────────────────────────────

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key).cloned()
    }

    /// Read and delete in one step. Dirties the session even when the key
    /// was absent.
    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        self.is_modified = true;
        self.store.remove(key)
    }

    /// Store values. Two calling conventions share this entry point: a
    /// string key with a value stores one entry and returns the value; an
    /// object key with no value merges every entry and returns the
    /// mapping. Anything else is rejected before the session is dirtied.
    pub(crate) fn set(&mut self, key: Value, value: Option<Value>) -> Result<Value> {
        if is_falsy(&key) {
            return Err(Error::InvalidSetArguments("missing key".into()));
        }

        match (key, value) {
            (Value::String(name), Some(value)) => {
                self.is_modified = true;
                self.store.insert(name, value.clone());
                Ok(value)
            }
            (Value::Object(entries), None) => {
                self.is_modified = true;
                for (name, value) in &entries {
                    self.store.insert(name.clone(), value.clone());
                }
                Ok(Value::Object(entries))
            }
            _ => Err(Error::InvalidSetArguments(
                "expected a string key with a value, or a mapping alone".into(),
            )),
        }
    }

    /// Delete one entry. Dirties the session even when the key was absent.
    pub(crate) fn clear(&mut self, key: &str) {
        self.is_modified = true;
        self.store.remove(key);
    }

    /// Dirty the session without changing any data, forcing a write-back
    /// at response time.
    pub(crate) fn touch(&mut self) {
        self.is_modified = true;
    }

    /// Snapshot of the stored entries.
    pub(crate) fn entries(&self) -> Map<String, Value> {
        self.store.clone()
    }

    // ── flash messages ──────────────────────────────────────────────

    /// Append a flash message under `kind` and return the list so far.
    ///
    /// A scalar left behind by an earlier override is promoted to a
    /// one-element list before appending.
    pub(crate) fn flash_append(&mut self, kind: &str, message: Value) -> Value {
        self.with_flash(|flash| {
            let next = match flash.remove(kind) {
                Some(Value::Array(mut messages)) => {
                    messages.push(message);
                    Value::Array(messages)
                }
                Some(existing) => Value::Array(vec![existing, message]),
                None => Value::Array(vec![message]),
            };
            flash.insert(kind.to_owned(), next.clone());
            next
        })
    }

    /// Replace whatever is stored under `kind` with `message` as-is.
    pub(crate) fn flash_override(&mut self, kind: &str, message: Value) -> Value {
        self.with_flash(|flash| {
            flash.insert(kind.to_owned(), message.clone());
            message
        })
    }

    /// Read and delete the messages under `kind`. Absent kinds come back
    /// as an empty list.
    pub(crate) fn flash_take(&mut self, kind: &str) -> Value {
        self.with_flash(|flash| {
            flash
                .remove(kind)
                .unwrap_or_else(|| Value::Array(Vec::new()))
        })
    }

    /// Read and delete every flash message, grouped by kind.
    pub(crate) fn flash_drain(&mut self) -> Map<String, Value> {
        self.with_flash(std::mem::take)
    }

    /// Every flash call, reads included, dirties the session and
    /// materializes the flash entry in the store.
    fn with_flash<T>(&mut self, apply: impl FnOnce(&mut Map<String, Value>) -> T) -> T {
        self.is_modified = true;

        let mut entries = match self.store.remove(FLASH_KEY) {
            Some(Value::Object(entries)) => entries,
            _ => Map::new(),
        };
        let out = apply(&mut entries);
        self.store.insert(FLASH_KEY.to_owned(), Value::Object(entries));
        out
    }

    // ── lazy surface ────────────────────────────────────────────────

    pub(crate) fn set_lazy_mode(&mut self, enabled: bool) {
        self.is_lazy = enabled;
    }

    /// Put a field on the lazy surface. Does not dirty the session; lazy
    /// fields only persist through the capture at response time.
    pub(crate) fn set_lazy(&mut self, key: String, value: Value) {
        self.lazy_fields.insert(key, value);
    }

    pub(crate) fn lazy_field(&self, key: &str) -> Option<Value> {
        self.lazy_fields.get(key).cloned()
    }

    /// Copy lazy-surface fields into the store and record their names so
    /// hydration can split them back out. Reserved and `_`-prefixed names
    /// stay request-local. The name list is only written when at least one
    /// field was captured.
    pub(crate) fn capture_lazy_fields(&mut self) {
        let mut names = Vec::new();
        for (key, value) in &self.lazy_fields {
            if RESERVED_KEYS.contains(&key.as_str()) || key.starts_with('_') {
                continue;
            }
            names.push(Value::String(key.clone()));
            self.store.insert(key.clone(), value.clone());
        }

        if !names.is_empty() {
            self.store
                .insert(LAZY_KEYS_KEY.to_owned(), Value::Array(names));
        }
    }

    // ── reset ───────────────────────────────────────────────────────

    /// Wipe the stored data and adopt a freshly minted ID; returns the
    /// dropped ID. The lazy surface and lazy mode survive. Dirties the
    /// session so the empty state is written back under the new ID.
    pub(crate) fn reset(&mut self) -> String {
        let dropped = std::mem::replace(&mut self.id, id::generate());
        self.store = Map::new();
        self.is_modified = true;
        dropped
    }
}

/// Null, `false`, zero, and the empty string all count as a missing key.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64().map_or(false, |n| n == 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blank() -> SessionState {
        SessionState::fresh(false)
    }

    #[test]
    fn fresh_respects_store_blank() {
        assert!(SessionState::fresh(true).is_modified);
        assert!(!SessionState::fresh(false).is_modified);
    }

    #[test]
    fn fresh_id_is_valid() {
        assert!(id::is_valid(&blank().id));
    }

    #[test]
    fn set_single_stores_and_returns_value() {
        let mut state = blank();
        let stored = state.set(json!("theme"), Some(json!("dark"))).unwrap();
        assert_eq!(stored, json!("dark"));
        assert_eq!(state.get("theme"), Some(json!("dark")));
        assert!(state.is_modified);
    }

    #[test]
    fn set_bulk_merges_and_returns_mapping() {
        let mut state = blank();
        state.set(json!("keep"), Some(json!(1))).unwrap();

        let stored = state
            .set(json!({"theme": "dark", "lang": "en"}), None)
            .unwrap();
        assert_eq!(stored, json!({"theme": "dark", "lang": "en"}));
        assert_eq!(state.get("keep"), Some(json!(1)));
        assert_eq!(state.get("theme"), Some(json!("dark")));
        assert_eq!(state.get("lang"), Some(json!("en")));
    }

    #[test]
    fn set_rejects_falsy_keys() {
        let mut state = blank();
        for key in [json!(null), json!(""), json!(false), json!(0)] {
            let err = state.set(key, Some(json!("v"))).unwrap_err();
            assert!(matches!(err, Error::InvalidSetArguments(_)));
        }
        assert!(!state.is_modified);
    }

    #[test]
    fn set_rejects_mixed_conventions() {
        let mut state = blank();
        // Mapping plus a value, even an explicit null.
        assert!(state.set(json!({"a": 1}), Some(json!(2))).is_err());
        assert!(state.set(json!({"a": 1}), Some(json!(null))).is_err());
        // String key without a value.
        assert!(state.set(json!("a"), None).is_err());
        // Non-string scalar key.
        assert!(state.set(json!(7), Some(json!(1))).is_err());
        assert!(!state.is_modified);
    }

    #[test]
    fn set_stores_explicit_null_values() {
        let mut state = blank();
        let stored = state.set(json!("gone"), Some(json!(null))).unwrap();
        assert_eq!(stored, json!(null));
        assert_eq!(state.get("gone"), Some(json!(null)));
    }

    #[test]
    fn take_removes_and_dirties() {
        let mut state = blank();
        state.set(json!("once"), Some(json!(42))).unwrap();

        assert_eq!(state.take("once"), Some(json!(42)));
        assert_eq!(state.get("once"), None);
    }

    #[test]
    fn take_absent_still_dirties() {
        let mut state = blank();
        assert_eq!(state.take("ghost"), None);
        assert!(state.is_modified);
    }

    #[test]
    fn clear_absent_still_dirties() {
        let mut state = blank();
        state.clear("ghost");
        assert!(state.is_modified);
    }

    #[test]
    fn touch_only_dirties() {
        let mut state = blank();
        state.touch();
        assert!(state.is_modified);
        assert!(state.entries().is_empty());
    }

    #[test]
    fn flash_appends_into_a_list() {
        let mut state = blank();
        assert_eq!(state.flash_append("info", json!("one")), json!(["one"]));
        assert_eq!(
            state.flash_append("info", json!("two")),
            json!(["one", "two"])
        );
    }

    #[test]
    fn flash_take_clears_one_kind() {
        let mut state = blank();
        state.flash_append("info", json!("one"));
        state.flash_append("error", json!("bad"));

        assert_eq!(state.flash_take("info"), json!(["one"]));
        assert_eq!(state.flash_take("info"), json!([]));
        assert_eq!(state.flash_take("error"), json!(["bad"]));
    }

    #[test]
    fn flash_take_absent_is_empty_list() {
        let mut state = blank();
        assert_eq!(state.flash_take("missing"), json!([]));
    }

    #[test]
    fn flash_override_stores_raw_value() {
        let mut state = blank();
        state.flash_append("info", json!("old"));
        assert_eq!(state.flash_override("info", json!("only")), json!("only"));
        assert_eq!(state.flash_take("info"), json!("only"));
    }

    #[test]
    fn flash_append_after_override_promotes_to_list() {
        let mut state = blank();
        state.flash_override("info", json!("first"));
        assert_eq!(
            state.flash_append("info", json!("second")),
            json!(["first", "second"])
        );
    }

    #[test]
    fn flash_drain_returns_everything() {
        let mut state = blank();
        state.flash_append("info", json!("one"));
        state.flash_append("error", json!("bad"));

        let drained = state.flash_drain();
        assert_eq!(drained.get("info"), Some(&json!(["one"])));
        assert_eq!(drained.get("error"), Some(&json!(["bad"])));
        assert!(state.flash_drain().is_empty());
    }

    #[test]
    fn flash_reads_dirty_and_materialize() {
        let mut state = blank();
        state.flash_take("anything");
        assert!(state.is_modified);
        assert_eq!(state.get(FLASH_KEY), Some(json!({})));
    }

    #[test]
    fn capture_copies_lazy_fields_and_records_names() {
        let mut state = blank();
        state.set_lazy_mode(true);
        state.set_lazy("alpha".into(), json!(1));
        state.set_lazy("beta".into(), json!(2));
        state.capture_lazy_fields();

        assert_eq!(state.get("alpha"), Some(json!(1)));
        assert_eq!(state.get("beta"), Some(json!(2)));
        assert_eq!(state.get(LAZY_KEYS_KEY), Some(json!(["alpha", "beta"])));
    }

    #[test]
    fn capture_skips_reserved_and_private_names() {
        let mut state = blank();
        state.set_lazy("kept".into(), json!(true));
        state.set_lazy("_private".into(), json!("hidden"));
        state.set_lazy("id".into(), json!("clobber"));
        state.capture_lazy_fields();

        assert_eq!(state.get("kept"), Some(json!(true)));
        assert_eq!(state.get("_private"), None);
        assert_eq!(state.get("id"), None);
        assert_eq!(state.get(LAZY_KEYS_KEY), Some(json!(["kept"])));
    }

    #[test]
    fn capture_without_fields_writes_no_name_list() {
        let mut state = blank();
        state.set_lazy("_private".into(), json!("hidden"));
        state.capture_lazy_fields();
        assert_eq!(state.get(LAZY_KEYS_KEY), None);
    }

    #[test]
    fn hydration_splits_lazy_fields_back_out() {
        let mut payload = Map::new();
        payload.insert("plain".into(), json!("stays"));
        payload.insert("alpha".into(), json!(1));
        payload.insert(LAZY_KEYS_KEY.into(), json!(["alpha", "gone"]));

        let state = SessionState::hydrated("some-id".into(), payload);
        assert!(state.is_lazy);
        assert!(!state.is_modified);
        assert_eq!(state.lazy_field("alpha"), Some(json!(1)));
        // Listed but absent names are skipped, not invented.
        assert_eq!(state.lazy_field("gone"), None);
        assert_eq!(state.get("alpha"), None);
        assert_eq!(state.get("plain"), Some(json!("stays")));
        // The name list itself stays behind until the next capture.
        assert_eq!(state.get(LAZY_KEYS_KEY), Some(json!(["alpha", "gone"])));
    }

    #[test]
    fn hydration_without_name_list_is_not_lazy() {
        let mut payload = Map::new();
        payload.insert("plain".into(), json!(1));
        let state = SessionState::hydrated("some-id".into(), payload);
        assert!(!state.is_lazy);
        assert_eq!(state.get("plain"), Some(json!(1)));
    }

    #[test]
    fn reset_mints_new_id_and_wipes_store() {
        let mut state = blank();
        state.set(json!("theme"), Some(json!("dark"))).unwrap();
        state.set_lazy_mode(true);
        state.set_lazy("kept".into(), json!(1));
        let old_id = state.id.clone();

        let dropped = state.reset();
        assert_eq!(dropped, old_id);
        assert_ne!(state.id, old_id);
        assert!(id::is_valid(&state.id));
        assert!(state.entries().is_empty());
        assert!(state.is_modified);
        // Lazy mode and surface survive a reset.
        assert!(state.is_lazy);
        assert_eq!(state.lazy_field("kept"), Some(json!(1)));
    }
}
