//! Byte stores for save slots.

use crate::{Codec, StorageError};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where encoded slots live. Implementations must make `write` all-or-nothing
/// from the reader's point of view.
pub trait SaveStorage {
    /// Bytes stored under `slot`, or `None` if it was never written.
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), StorageError>;
    /// Removing a missing slot is not an error.
    fn remove(&mut self, slot: &str) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and embedded hosts that persist the
/// bytes themselves.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slots: BTreeMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStorage for MemoryStorage {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.slots.get(slot).cloned())
    }

    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.slots.insert(slot.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<(), StorageError> {
        self.slots.remove(slot);
        Ok(())
    }
}

/// One file per slot inside a directory, named `{slot}.{ext}`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
    extension: &'static str,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, codec: Codec) -> Self {
        Self {
            dir: dir.into(),
            extension: codec.extension(),
        }
    }

    fn path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{slot}.{}", self.extension)))
    }
}

impl SaveStorage for FileStorage {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path(slot)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), len = bytes.len(), "read slot");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path(slot)?;
        atomic_write(&path, bytes)?;
        debug!(path = %path.display(), len = bytes.len(), "wrote slot");
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<(), StorageError> {
        let path = self.path(slot)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Write `data` to `{path}.tmp`, sync it, then rename over `path`, so a
/// crash mid-write leaves the previous file intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rebirth_idle_storage_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_storage_overwrites() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.read("current").unwrap(), None);
        storage.write("current", b"one").unwrap();
        storage.write("current", b"two").unwrap();
        assert_eq!(storage.read("current").unwrap().as_deref(), Some(&b"two"[..]));
        storage.remove("current").unwrap();
        storage.remove("current").unwrap();
        assert_eq!(storage.read("current").unwrap(), None);
    }

    #[test]
    fn file_storage_roundtrip_creates_dir() {
        let dir = test_dir("roundtrip");
        let mut storage = FileStorage::new(dir.join("nested"), Codec::Json);
        assert_eq!(storage.read("current").unwrap(), None);
        storage.write("current", b"{}").unwrap();
        assert_eq!(storage.read("current").unwrap(), Some(b"{}".to_vec()));
        assert!(dir.join("nested/current.json").exists());
        assert!(!dir.join("nested/current.json.tmp").exists());
        storage.remove("current").unwrap();
        storage.remove("current").unwrap();
        assert_eq!(storage.read("current").unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_rejects_path_like_slots() {
        let dir = test_dir("slots");
        let mut storage = FileStorage::new(&dir, Codec::Bincode);
        for slot in ["", "../escape", "a/b", "dot.dot"] {
            assert!(matches!(
                storage.write(slot, b"x"),
                Err(StorageError::InvalidSlot(_))
            ));
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = test_dir("atomic");
        let path = dir.join("save.bin");
        atomic_write(&path, b"version 1").unwrap();
        atomic_write(&path, b"version 2").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"version 2");
        let _ = fs::remove_dir_all(&dir);
    }
}
