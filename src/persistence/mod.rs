//! Persistent key-value storage
//!
//! The host supplies the actual store (LocalStorage, AsyncStorage, a file);
//! values are JSON strings. Anything missing or malformed is replaced by
//! compiled-in defaults before the simulation sees it.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// String-keyed, string-valued store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to decode `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and decode a value; `Ok(None)` when the key is absent
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, Error> {
    let Some(json) = store.get(key) else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| Error::Decode {
            key: key.to_owned(),
            source,
        })
}

/// Read a value, falling back to `T::default()` when absent or malformed
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match load(store, key) {
        Ok(Some(value)) => {
            log::info!("Loaded `{}` from storage", key);
            value
        }
        Ok(None) => {
            log::info!("No `{}` in storage, using defaults", key);
            T::default()
        }
        Err(err) => {
            log::warn!("{}; using defaults", err);
            T::default()
        }
    }
}

/// Encode and write a value
pub fn save<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<(), Error> {
    let json = serde_json::to_string(value).map_err(|source| Error::Encode {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Prefs {
        volume: f32,
        name: String,
    }

    impl Default for Prefs {
        fn default() -> Self {
            Self {
                volume: 0.8,
                name: "player".into(),
            }
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut store = MemoryStore::new();
        let prefs = Prefs {
            volume: 0.25,
            name: "ace".into(),
        };
        save(&mut store, "prefs", &prefs).expect("save");
        assert_eq!(store.len(), 1);
        assert_eq!(load::<Prefs>(&store, "prefs").expect("load"), Some(prefs));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(load::<Prefs>(&store, "absent").expect("load").is_none());
        assert_eq!(load_or_default::<Prefs>(&store, "absent"), Prefs::default());
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set("prefs", "{not json".into());
        assert!(matches!(
            load::<Prefs>(&store, "prefs"),
            Err(Error::Decode { .. })
        ));
        assert_eq!(load_or_default::<Prefs>(&store, "prefs"), Prefs::default());
    }

    #[test]
    fn test_partial_value_fills_defaults() {
        let mut store = MemoryStore::new();
        store.set("prefs", r#"{"volume":0.1}"#.into());
        let prefs: Prefs = load_or_default(&store, "prefs");
        assert_eq!(prefs.volume, 0.1);
        assert_eq!(prefs.name, "player");
    }
}
