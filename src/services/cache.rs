use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::services::storage::Storage;

/// 24 heures.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

const PREFIX: &str = "cache_";

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    /// Write time, milliseconds since epoch.
    pub timestamp: i64,
}

/// Process-wide key/value cache with per-entry expiry, mirrored to the data
/// directory so it survives restarts and backend outages.
#[derive(Debug, Clone)]
pub struct CacheStore {
    storage: Storage,
}

impl CacheStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Returns the cached value, evicting it first when older than the TTL.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_with_timestamp(key).map(|(value, _)| value)
    }

    /// Same as `get`, also exposing the entry's write time.
    pub fn get_with_timestamp<T: DeserializeOwned>(&self, key: &str) -> Option<(T, i64)> {
        let entry: CacheEntry = self.storage.read(&format!("{PREFIX}{key}"))?;
        if Utc::now().timestamp_millis() - entry.timestamp > CACHE_TTL_MS {
            self.remove(key);
            return None;
        }
        let value = serde_json::from_value(entry.value).ok()?;
        Some((value, entry.timestamp))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            value: match serde_json::to_value(value) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("Valeur non sérialisable pour '{}': {}", key, e);
                    return;
                }
            },
            timestamp: Utc::now().timestamp_millis(),
        };
        if let Err(e) = self.storage.write(&format!("{PREFIX}{key}"), &entry) {
            tracing::warn!("Écriture du cache '{}' impossible: {}", key, e);
        }
    }

    pub fn remove(&self, key: &str) {
        self.storage.remove(&format!("{PREFIX}{key}"));
    }

    /// Clears cache entries only; unrelated persisted keys are untouched.
    pub fn clear(&self) {
        for key in self.storage.keys_with_prefix(PREFIX) {
            self.storage.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path) -> CacheStore {
        CacheStore::new(Storage::new(dir).unwrap())
    }

    #[test]
    fn set_puis_get_rend_la_valeur() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());

        cache.set("repas", &vec![1, 2, 3]);
        assert_eq!(cache.get::<Vec<i32>>("repas"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn une_entree_expiree_est_evincee() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());
        let storage = Storage::new(dir.path()).unwrap();

        // Entrée antidatée au-delà du TTL
        let entry = CacheEntry {
            value: serde_json::json!("vieux"),
            timestamp: Utc::now().timestamp_millis() - CACHE_TTL_MS - 1,
        };
        storage.write("cache_perime", &entry).unwrap();

        assert_eq!(cache.get::<String>("perime"), None);
        // L'éviction est effective : le fichier a disparu, pas de réinsertion
        assert!(!dir.path().join("cache_perime.json").exists());
        assert_eq!(cache.get::<String>("perime"), None);
    }

    #[test]
    fn clear_ne_touche_que_le_prefixe_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());
        let storage = Storage::new(dir.path()).unwrap();

        cache.set("a", &1);
        storage.write("user_preferences", &42).unwrap();

        cache.clear();

        assert_eq!(cache.get::<i32>("a"), None);
        assert_eq!(storage.read::<i32>("user_preferences"), Some(42));
    }
}
