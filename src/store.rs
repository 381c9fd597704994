//! # State Store
//! Minimal key-value persistence contract for the two adaptation stores. The
//! scoring core stays pure; everything stateful goes through an injected
//! `KeyValueStore`, so tests run on the in-memory implementation and the app
//! binary wires up the file-backed one.
//!
//! The only durability promise required of implementations: a read reflects
//! the most recent write from the same process.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// Deserialize the persisted record under `key`, falling back to `T::default()`
/// when the key is absent or the payload fails to parse. Malformed state is
/// treated like missing state rather than surfaced as an error.
pub fn load_state<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    store
        .get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn save_state<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        Err(e) => tracing::warn!(key, error = %e, "failed to serialize state record"),
    }
}

/// Process-local store for tests and single-run sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("memory store mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.inner
            .lock()
            .expect("memory store mutex poisoned")
            .insert(key.to_string(), value);
    }
}

/// One JSON file per key under a base directory, written atomically via a
/// temp file and rename. Writes are best-effort: a failed write is logged,
/// not propagated, since losing one adaptation update is harmless.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir);
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain namespace separators; map anything non-filename-safe
        // to '_' so each key is one flat file.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: String) {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let result = fs::File::create(&tmp)
            .and_then(|mut f| f.write_all(value.as_bytes()))
            .and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "failed to persist state record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Rec {
        n: u32,
        label: String,
    }

    fn unique_tmp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        dir.push(format!("kv_store_test_{}", nanos));
        dir
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        save_state(&store, "adaptive:v1:s1", &Rec { n: 3, label: "x".into() });
        let got: Rec = load_state(&store, "adaptive:v1:s1");
        assert_eq!(got, Rec { n: 3, label: "x".into() });
    }

    #[test]
    fn missing_key_yields_default() {
        let store = MemoryStore::new();
        let got: Rec = load_state(&store, "nope");
        assert_eq!(got, Rec::default());
    }

    #[test]
    fn malformed_payload_yields_default() {
        let store = MemoryStore::new();
        store.set("bad", "{not json".to_string());
        let got: Rec = load_state(&store, "bad");
        assert_eq!(got, Rec::default());
    }

    #[test]
    fn file_store_roundtrip_and_overwrite() {
        let dir = unique_tmp_dir();
        let store = JsonFileStore::new(&dir);
        save_state(&store, "sensitivity:v1:s2", &Rec { n: 1, label: "a".into() });
        save_state(&store, "sensitivity:v1:s2", &Rec { n: 2, label: "b".into() });
        let got: Rec = load_state(&store, "sensitivity:v1:s2");
        assert_eq!(got, Rec { n: 2, label: "b".into() });
        let _ = fs::remove_dir_all(&dir);
    }
}
