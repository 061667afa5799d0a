use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::token::{decode_expiry, TokenError};
use crate::config::Config;
use crate::storage::{SharedStore, StorageError};

/// Whether the session reads an expiry from the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Decode the JWT `exp` claim, persist it, and drop the session once it passes
    #[default]
    Tracked,
    /// Trust any non-empty token until an explicit sign-out
    Untracked,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Access token could not be decoded: {0}")]
    MalformedToken(#[from] TokenError),

    #[error("Access token is empty")]
    EmptyToken,

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

/// Storage keys owned by the session
#[derive(Debug, Clone)]
pub struct SessionKeys {
    pub token: String,
    pub expires_at: String,
    pub last_group: String,
}

impl From<&Config> for SessionKeys {
    fn from(config: &Config) -> Self {
        Self {
            token: config.token_key.clone(),
            expires_at: config.expires_at_key.clone(),
            last_group: config.last_group_key.clone(),
        }
    }
}

/// Point-in-time view of the session, as published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    fn loading() -> Self {
        Self {
            token: None,
            expires_at: None,
            is_loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// A non-empty token that, when an expiry is known, has not reached it.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self
            .token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        has_token && self.expires_at.map(|exp| now < exp).unwrap_or(true)
    }

    /// Time left before expiry, zero once passed, `None` without an expiry
    pub fn time_until_expiry(&self) -> Option<chrono::Duration> {
        self.expires_at
            .map(|exp| (exp - Utc::now()).max(chrono::Duration::zero()))
    }
}

/// Why a stored session was discarded during startup
enum Discard {
    Storage(StorageError),
    Stale(&'static str),
}

struct Inner {
    storage: SharedStore,
    keys: SessionKeys,
    policy: ExpiryPolicy,
    check_interval: Duration,
    state: watch::Sender<SessionSnapshot>,
    rehydrate_started: AtomicBool,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn cancel_monitor(&self) {
        let mut slot = self.monitor.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_monitor();
    }
}

/// The authoritative in-memory session, mirrored to durable storage.
///
/// Cloning yields another handle to the same session. The expiry monitor
/// holds only a weak reference, so dropping the last handle tears it down.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create a store in the loading state. Call [`SessionStore::rehydrate`]
    /// before routing on it.
    pub fn new(storage: SharedStore, config: &Config, policy: ExpiryPolicy) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::loading());
        Self {
            inner: Arc::new(Inner {
                storage,
                keys: SessionKeys::from(config),
                policy,
                check_interval: config.expiry_check_interval,
                state,
                rehydrate_started: AtomicBool::new(false),
                monitor: Mutex::new(None),
            }),
        }
    }

    /// Create a store and restore any persisted session
    pub async fn open(storage: SharedStore, config: &Config, policy: ExpiryPolicy) -> Self {
        let store = Self::new(storage, config, policy);
        store.rehydrate().await;
        store
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.inner.policy
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every change to the session
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().expires_at
    }

    /// Wait until startup rehydration has finished
    pub async fn ready(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| !s.is_loading).await;
    }

    /// Restore the persisted session. Runs once per store; later calls wait
    /// for the first to finish. Never fails: anything unreadable leaves the
    /// session signed out.
    pub async fn rehydrate(&self) {
        if self.inner.rehydrate_started.swap(true, Ordering::SeqCst) {
            self.ready().await;
            return;
        }

        let restored = match self.load_persisted().await {
            Ok(restored) => restored,
            Err(Discard::Storage(e)) => {
                error!(error = %e, "Failed to load stored session");
                self.sign_out().await;
                None
            }
            Err(Discard::Stale(reason)) => {
                warn!(reason, "Stored session expired or invalid, signing out");
                self.sign_out().await;
                None
            }
        };

        let expires_at = restored.as_ref().and_then(|(_, exp)| *exp);
        debug!(restored = restored.is_some(), ?expires_at, "Session rehydrated");

        // A sign-in that landed while storage was being read wins
        let mut applied = false;
        self.inner.state.send_modify(|s| {
            if let Some((token, expires_at)) = restored {
                if s.token.is_none() {
                    s.token = Some(token);
                    s.expires_at = expires_at;
                    applied = true;
                }
            }
            s.is_loading = false;
        });
        if applied {
            self.arm_monitor(expires_at);
        }
    }

    async fn load_persisted(&self) -> Result<Option<(String, Option<DateTime<Utc>>)>, Discard> {
        let storage = &self.inner.storage;
        let keys = &self.inner.keys;

        let token = match storage.get(&keys.token).await.map_err(Discard::Storage)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if token.trim().is_empty() {
            return Err(Discard::Stale("empty token"));
        }

        match self.inner.policy {
            ExpiryPolicy::Untracked => Ok(Some((token, None))),
            ExpiryPolicy::Tracked => {
                let raw = storage
                    .get(&keys.expires_at)
                    .await
                    .map_err(Discard::Storage)?
                    .ok_or(Discard::Stale("missing expiry"))?;
                let expires_at = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .ok_or(Discard::Stale("unreadable expiry"))?;
                if Utc::now() >= expires_at {
                    return Err(Discard::Stale("expired"));
                }
                Ok(Some((token, Some(expires_at))))
            }
        }
    }

    /// Start a session with a freshly issued token.
    ///
    /// The token is durable once this returns `Ok`. A token that cannot be
    /// decoded (or an empty one under [`ExpiryPolicy::Untracked`]) clears any
    /// previous session and is reported as an error so the caller can tell
    /// the user the login did not take.
    pub async fn sign_in(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();

        let expires_at = match self.inner.policy {
            ExpiryPolicy::Tracked => match decode_expiry(token) {
                Ok(expires_at) => Some(expires_at),
                Err(e) => {
                    error!(error = %e, "Failed to decode access token");
                    self.sign_out().await;
                    return Err(e.into());
                }
            },
            ExpiryPolicy::Untracked => {
                if token.is_empty() {
                    self.sign_out().await;
                    return Err(SessionError::EmptyToken);
                }
                None
            }
        };

        if let Err(e) = self.persist(token, expires_at).await {
            error!(error = %e, "Failed to persist session");
            self.sign_out().await;
            return Err(e.into());
        }

        self.inner.state.send_modify(|s| {
            s.token = Some(token.to_string());
            s.expires_at = expires_at;
        });
        self.arm_monitor(expires_at);
        info!(?expires_at, "Signed in");
        Ok(())
    }

    async fn persist(
        &self,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let storage = &self.inner.storage;
        let keys = &self.inner.keys;
        storage.set(&keys.token, token).await?;
        if let Some(expires_at) = expires_at {
            storage
                .set(&keys.expires_at, &expires_at.timestamp_millis().to_string())
                .await?;
        }
        Ok(())
    }

    /// End the session: storage first, then memory. Safe to call repeatedly.
    pub async fn sign_out(&self) {
        self.inner.cancel_monitor();
        self.clear().await;
        info!("Signed out");
    }

    async fn clear(&self) {
        let storage = &self.inner.storage;
        let keys = &self.inner.keys;

        // Untracked sessions still drop a marker left by an earlier tracked run
        let doomed = [
            keys.token.as_str(),
            keys.expires_at.as_str(),
            keys.last_group.as_str(),
        ];
        for key in doomed {
            if let Err(e) = storage.remove(key).await {
                warn!(key, error = %e, "Failed to remove session entry");
            }
        }

        self.inner.state.send_if_modified(|s| {
            let changed = s.token.is_some() || s.expires_at.is_some();
            s.token = None;
            s.expires_at = None;
            changed
        });
    }

    /// Replace any running expiry monitor with one for `expires_at`.
    fn arm_monitor(&self, expires_at: Option<DateTime<Utc>>) {
        self.inner.cancel_monitor();
        let Some(expires_at) = expires_at else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.check_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if Utc::now() >= expires_at {
                    warn!("Access token expired, signing out");
                    SessionStore { inner }.clear().await;
                    return;
                }
            }
        });

        let mut slot = self.inner.monitor.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(handle);
    }

    /// Stop background expiry checks. The session itself is left as is.
    pub fn dispose(&self) {
        self.inner.cancel_monitor();
    }

    /// Whether an expiry monitor is currently scheduled
    pub fn is_monitoring(&self) -> bool {
        let slot = self.inner.monitor.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    // ===== Last visited group =====

    pub async fn remember_group(&self, group_id: &str) -> Result<(), StorageError> {
        self.inner
            .storage
            .set(&self.inner.keys.last_group, group_id)
            .await
    }

    pub async fn last_group(&self) -> Result<Option<String>, StorageError> {
        self.inner.storage.get(&self.inner.keys.last_group).await
    }

    pub async fn forget_group(&self) -> Result<(), StorageError> {
        self.inner.storage.remove(&self.inner.keys.last_group).await
    }
}
