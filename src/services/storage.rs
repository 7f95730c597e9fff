use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, Result};

/// JSON-file persistence under the data directory. One key = one file.
/// Plays the role the browser's localStorage held for the client state.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// A corrupted or missing file reads as `None`; the caller falls back to
    /// its defaults.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Entrée '{}' illisible, ignorée: {}", key, e);
                None
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Query(format!("sérialisation de '{key}': {e}")))?;
        fs::write(self.path(key), raw)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path(key));
    }

    /// Keys (file stems) starting with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.path().file_stem()?.to_str()?.to_string();
                let is_json = e.path().extension().map(|x| x == "json").unwrap_or(false);
                (is_json && name.starts_with(prefix)).then_some(name)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecrit_et_relit_une_valeur() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();

        storage.write("clef", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let lu: Vec<String> = storage.read("clef").unwrap();
        assert_eq!(lu, vec!["a", "b"]);
    }

    #[test]
    fn un_fichier_corrompu_se_lit_comme_absent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();

        std::fs::write(dir.path().join("cassé.json"), "{pas du json").unwrap();
        assert!(storage.read::<Vec<String>>("cassé").is_none());
    }

    #[test]
    fn liste_les_clefs_par_prefixe() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();

        storage.write("cache_a", &1).unwrap();
        storage.write("cache_b", &2).unwrap();
        storage.write("autre", &3).unwrap();

        let mut keys = storage.keys_with_prefix("cache_");
        keys.sort();
        assert_eq!(keys, vec!["cache_a", "cache_b"]);
    }
}
