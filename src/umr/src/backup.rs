//! Pre-modification backup store.
//!
//! Every bundle (and the master database) is copied into the store before
//! its first modification, keyed by its hash name. Later modifications of
//! the same file never overwrite the stored copy, so the store always
//! holds the pristine pre-modification bytes. "Restore all" copies every
//! entry back over its source path.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backup copy missing for {0}")]
    EntryMissing(String),
}

/// Manifest entry for one preserved file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Path the file was copied from and restores to
    pub source: PathBuf,
    /// SHA-256 of the preserved bytes
    pub sha256: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: BTreeMap<String, BackupEntry>,
}

/// On-disk backup store: one copy per key plus a JSON manifest
pub struct BackupStore {
    root: PathBuf,
    manifest: Manifest,
}

/// Compute SHA-256 hash of a file
pub fn hash_file(path: &Path) -> Result<String, BackupError> {
    let data = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

impl BackupStore {
    /// Open the store at `root`, creating it if needed
    pub fn open(root: &Path) -> Result<Self, BackupError> {
        fs::create_dir_all(root)?;

        let manifest_path = root.join("manifest.json");
        let manifest = if manifest_path.is_file() {
            serde_json::from_str(&fs::read_to_string(&manifest_path)?)?
        } else {
            Manifest::default()
        };

        Ok(BackupStore {
            root: root.to_path_buf(),
            manifest,
        })
    }

    /// Number of preserved files
    pub fn len(&self) -> usize {
        self.manifest.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.entries.is_empty()
    }

    /// Whether `key` already has a preserved copy
    pub fn contains(&self, key: &str) -> bool {
        self.manifest.entries.contains_key(key)
    }

    /// Preserve `source` under `key` unless a copy already exists.
    ///
    /// Returns `true` if a new copy was made. The first copy wins: a key
    /// that is already preserved keeps its original bytes no matter how
    /// often the source is modified afterwards.
    pub fn preserve(&mut self, key: &str, source: &Path) -> Result<bool, BackupError> {
        if self.contains(key) {
            return Ok(false);
        }

        let stored = self.root.join(key);
        fs::copy(source, &stored)?;

        self.manifest.entries.insert(
            key.to_string(),
            BackupEntry {
                source: source.to_path_buf(),
                sha256: hash_file(&stored)?,
            },
        );
        self.save_manifest()?;

        Ok(true)
    }

    /// Copy every preserved file back over its source path.
    ///
    /// Returns the restored keys. The store is left intact, so restoring
    /// twice is a no-op file-content-wise.
    pub fn restore_all(&self) -> Result<Vec<String>, BackupError> {
        let mut restored = Vec::with_capacity(self.manifest.entries.len());

        for (key, entry) in &self.manifest.entries {
            let stored = self.root.join(key);
            if !stored.is_file() {
                return Err(BackupError::EntryMissing(key.clone()));
            }
            if let Some(parent) = entry.source.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&stored, &entry.source)?;
            restored.push(key.clone());
        }

        Ok(restored)
    }

    fn save_manifest(&self) -> Result<(), BackupError> {
        let json = serde_json::to_string_pretty(&self.manifest)?;
        fs::write(self.root.join("manifest.json"), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, content: &[u8]) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_first_preserve_wins() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ab01");
        let store_dir = dir.path().join("backup");

        write_file(&source, b"original");
        let mut store = BackupStore::open(&store_dir).unwrap();

        assert!(store.preserve("ab01", &source).unwrap());

        // Modify and preserve again: the stored copy must not change
        write_file(&source, b"modified");
        assert!(!store.preserve("ab01", &source).unwrap());

        assert_eq!(fs::read(store_dir.join("ab01")).unwrap(), b"original");
    }

    #[test]
    fn test_restore_all_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("aa11");
        let b = dir.path().join("bb22");

        write_file(&a, b"bundle a");
        write_file(&b, b"bundle b");

        let mut store = BackupStore::open(&dir.path().join("backup")).unwrap();
        store.preserve("aa11", &a).unwrap();
        store.preserve("bb22", &b).unwrap();

        write_file(&a, b"patched a");
        write_file(&b, b"patched b");

        let restored = store.restore_all().unwrap();
        assert_eq!(restored, vec!["aa11".to_string(), "bb22".to_string()]);

        assert_eq!(fs::read(&a).unwrap(), b"bundle a");
        assert_eq!(fs::read(&b).unwrap(), b"bundle b");
    }

    #[test]
    fn test_restore_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(&dir.path().join("backup")).unwrap();
        assert!(store.restore_all().unwrap().is_empty());
    }

    #[test]
    fn test_manifest_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cc33");
        let store_dir = dir.path().join("backup");

        write_file(&source, b"content");

        {
            let mut store = BackupStore::open(&store_dir).unwrap();
            store.preserve("cc33", &source).unwrap();
        }

        let store = BackupStore::open(&store_dir).unwrap();
        assert!(store.contains("cc33"));
        assert_eq!(store.len(), 1);

        // Restore still works from the reopened manifest
        write_file(&source, b"changed");
        store.restore_all().unwrap();
        assert_eq!(fs::read(&source).unwrap(), b"content");
    }

    #[test]
    fn test_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        write_file(&path, b"test content");

        let hash = hash_file(&path).unwrap();
        assert_eq!(hash.len(), 64);
    }
}
