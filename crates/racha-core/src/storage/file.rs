use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Scratch file renamed over the storage file on every write
const STORAGE_TMP_FILE: &str = "storage.json.tmp";

/// Key-value storage persisted as a single JSON object on disk.
///
/// Every mutation writes the whole map to a scratch file and renames it over
/// the real one, so a crash never leaves a half-written file behind. The
/// lock only keeps concurrent writers in this process from interleaving
/// read-modify-write cycles.
pub struct FileStore {
    path: PathBuf,
    tmp_path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(STORAGE_FILE),
            tmp_path: data_dir.join(STORAGE_TMP_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read before a mutation. An unparseable file is replaced by the next
    /// write instead of blocking it; the flag says a rewrite is due.
    async fn read_for_update(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_all().await {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Serialization(e)) => {
                warn!(path = ?self.path, error = %e, "Storage file is corrupt, starting from empty");
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.tmp_path, contents).await?;
        tokio::fs::rename(&self.tmp_path, &self.path).await?;
        debug!(path = ?self.path, keys = entries.len(), "Storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.read_for_update().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut entries, corrupt) = self.read_for_update().await?;
        if entries.remove(key).is_none() && !corrupt {
            return Ok(());
        }
        self.write_all(&entries).await
    }
}
