//! Server-side refresh token registry.
//!
//! Refresh tokens are only honoured while an entry for them exists here, which
//! makes them revocable rather than merely expirable. Entries are keyed by the
//! SHA-256 of the raw token so the registry never holds usable credentials.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

/// How often the background task purges expired entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// A live refresh token binding.
#[derive(Debug, Clone)]
struct RegistryEntry {
    subject: String,
    expires_at: DateTime<Utc>,
}

/// Concurrent map of outstanding refresh tokens.
#[derive(Debug, Default)]
pub struct RefreshTokenRegistry {
    entries: DashMap<String, RegistryEntry>,
}

/// SHA-256 hash a refresh token for use as a registry key.
fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl RefreshTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly issued refresh token for `subject`.
    pub fn insert(&self, token: &str, subject: &str, expires_at: DateTime<Utc>) {
        self.entries.insert(
            token_key(token),
            RegistryEntry {
                subject: subject.to_string(),
                expires_at,
            },
        );
    }

    /// Whether `token` is registered and bound to `subject`.
    pub fn is_bound(&self, token: &str, subject: &str) -> bool {
        self.entries
            .get(&token_key(token))
            .is_some_and(|e| e.subject == subject)
    }

    /// Atomically remove `token` if it is registered to `subject`.
    ///
    /// Returns `true` exactly once per registered token, so concurrent
    /// presentations of the same token cannot both succeed.
    pub fn consume(&self, token: &str, subject: &str) -> bool {
        self.entries
            .remove_if(&token_key(token), |_, e| e.subject == subject)
            .is_some()
    }

    /// Remove `token` from the registry. Removing an absent token is a no-op.
    pub fn revoke(&self, token: &str) {
        self.entries.remove(&token_key(token));
    }

    /// Remove every token registered to `subject`. Returns how many were removed.
    pub fn revoke_subject(&self, subject: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.subject != subject);
        before.saturating_sub(self.entries.len())
    }

    /// Evict entries whose tokens have expired.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }

    /// Number of outstanding entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a periodic purge task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                registry.purge_expired();
                debug!(outstanding = registry.len(), "purged expired refresh tokens");
            }
        })
    }
}
