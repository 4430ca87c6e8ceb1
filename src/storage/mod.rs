use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable record holding `{user, token}`.
pub(crate) const SESSION_KEY: &str = "ai-study-auth";

/// Minimal key/value port over the durable client storage.
///
/// The browser build writes to `window.localStorage`; tests inject
/// [`MemoryStorage`]. Writes are best-effort: a full or disabled storage must
/// never break the calling transition.
pub(crate) trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// `window.localStorage`. Looked up on every call so the adapter itself holds
/// no JS handles.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserStorage;

impl BrowserStorage {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::local_storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = Self::local_storage() {
            if storage.set_item(key, value).is_err() {
                tracing::warn!(key, "localStorage write rejected");
            }
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// In-process store, used by tests and as a fallback when no browser storage
/// is reachable.
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_item`/`remove_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|n| *n).unwrap_or(0)
    }

    fn bump_writes(&self) {
        if let Ok(mut n) = self.writes.lock() {
            *n += 1;
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok().and_then(|m| m.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut m) = self.items.lock() {
            m.insert(key.to_string(), value.to_string());
        }
        self.bump_writes();
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut m) = self.items.lock() {
            m.remove(key);
        }
        self.bump_writes();
    }
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let json = store.get_item(key)?;
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(key, error = %e, "ignoring malformed stored value");
            None
        }
    }
}

pub(crate) fn save_json_to_storage<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => store.set_item(key, &json),
        Err(e) => tracing::warn!(key, error = %e, "failed to encode value for storage"),
    }
}


// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_browser_storage_roundtrip() {
        let store = BrowserStorage;
        store.remove_item(SESSION_KEY);
        assert!(store.get_item(SESSION_KEY).is_none());

        store.set_item(SESSION_KEY, r#"{"user":{"email":"u"},"token":"t"}"#);
        assert!(store.get_item(SESSION_KEY).is_some());

        store.remove_item(SESSION_KEY);
        assert!(store.get_item(SESSION_KEY).is_none());
    }
}
