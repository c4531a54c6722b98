/// Local filesystem storage backend.
///
/// Each key is stored as `<dir>/<key>.json` with:
/// - Atomic writes (write to .tmp, fsync, rename)
/// - SHA-256 change detection, so unchanged values are not rewritten
/// - Key validation (no path separators, no `..`)
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use super::{KeyValueStorage, StorageError};

pub struct LocalStorage {
    dir: PathBuf,
    /// key -> SHA-256 of the last value read or written
    hashes: Mutex<HashMap<String, String>>,
}

impl LocalStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            hashes: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.trim().is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Compute SHA-256 hash of content (for change detection).
    fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    /// Refuses to write empty content over a non-empty file.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        let tmp_path = path.with_extension("quadro.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                self.hashes
                    .lock()
                    .unwrap()
                    .insert(key.to_string(), Self::content_hash(&content));
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let hash = Self::content_hash(value);

        let mut hashes = self.hashes.lock().unwrap();
        if hashes.get(key) == Some(&hash) && path.exists() {
            log::debug!("[quadro.storage.local] {} unchanged, skipping write", key);
            return Ok(());
        }

        Self::atomic_write(&path, value)?;
        hashes.insert(key.to_string(), hash);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        self.hashes.lock().unwrap().remove(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_then_get() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        storage.set("workspace", r#"{"a":1}"#).unwrap();
        assert_eq!(
            storage.get("workspace").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );

        let on_disk = fs::read_to_string(dir.path().join("workspace.json")).unwrap();
        assert_eq!(on_disk, r#"{"a":1}"#);
    }

    #[test]
    fn test_get_missing_key() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.get("a/b"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.path_for("").is_err());
    }

    #[test]
    fn test_rewrites_after_external_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        storage.set("k", "same").unwrap();
        fs::remove_file(dir.path().join("k.json")).unwrap();
        storage.set("k", "same").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("same"));
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_refuses_empty_overwrite() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        storage.set("k", "content").unwrap();
        assert!(storage.set("k", "  ").is_err());
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("content"));
    }
}
