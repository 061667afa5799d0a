// Shared by several test binaries; not every helper is used by each.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};

use racha_core::storage::{KeyValueStore, MemoryStore, SharedStore, StorageError};
use racha_core::Config;

pub fn b64url_no_pad(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Unsigned JWT whose `exp` claim is `expires_at` (second precision).
pub fn fake_jwt(expires_at: DateTime<Utc>) -> String {
    let header = b64url_no_pad(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({ "sub": "user-1", "exp": expires_at.timestamp() });
    let payload = b64url_no_pad(&serde_json::to_vec(&payload).unwrap());
    let signature = b64url_no_pad(b"signature");
    format!("{header}.{payload}.{signature}")
}

pub fn config_with_interval(interval: Duration) -> Config {
    Config {
        expiry_check_interval: interval,
        ..Config::default()
    }
}

pub fn memory_store() -> (Arc<MemoryStore>, SharedStore) {
    let store = Arc::new(MemoryStore::new());
    let shared: SharedStore = store.clone();
    (store, shared)
}

/// Storage whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }
}

/// Storage that reads fine but refuses writes.
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read-only".to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// Storage whose reads take their value first and then stall, so a read
/// started before a write still returns the older value.
#[derive(Default)]
pub struct SlowReadStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl KeyValueStore for SlowReadStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.inner.get(key).await;
        tokio::time::sleep(self.delay).await;
        value
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}
