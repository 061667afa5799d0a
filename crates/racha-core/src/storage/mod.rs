//! Durable key-value storage for session state.
//!
//! This module provides:
//! - `KeyValueStore`: the async storage interface shared by the session store
//!   and the request adapter
//! - `FileStore`: a JSON file in the data directory
//! - `KeychainStore`: the OS keychain, via `keyring`
//! - `MemoryStore`: an in-process map for tests and throwaway sessions
//!
//! Stores are shared as `Arc<dyn KeyValueStore>` and treated as an external,
//! uncoordinated resource: callers await each read or write in sequence.

pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StorageBackend};

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

/// Shared handle to a storage backend
pub type SharedStore = Arc<dyn KeyValueStore>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set or has been removed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Open the backend selected by the configuration
pub fn open(config: &Config) -> anyhow::Result<SharedStore> {
    let store: SharedStore = match config.storage_backend {
        StorageBackend::File => Arc::new(FileStore::new(config.data_dir()?)),
        StorageBackend::Keyring => Arc::new(KeychainStore::new()),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
