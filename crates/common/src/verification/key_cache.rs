//! Cache-aside store for vendor public keys.
//!
//! Entries live for a fixed TTL from insertion and are evicted lazily when a
//! lookup finds them expired. The table lock is never held across a fetch, so
//! a slow key endpoint only delays callers waiting on that key. Two concurrent
//! misses for the same key may both fetch; the later insert wins.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use error_stack::{Report, ResultExt};
use tokio::time::Instant;

use super::key_fetcher::KeyFetcher;
use crate::error::EventNotificationError;
use crate::models::PublicKey;

/// Default lifetime of a cached key.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct CacheEntry {
    value: Arc<PublicKey>,
    expires_at: Instant,
}

pub struct PublicKeyCache {
    fetcher: Arc<dyn KeyFetcher>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl PublicKeyCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self::with_ttl(fetcher, DEFAULT_KEY_TTL)
    }

    #[must_use]
    pub fn with_ttl(fetcher: Arc<dyn KeyFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the key for `key_id`, fetching it on a miss or after expiry.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::KeyCache`] wrapping the fetch failure.
    /// Failures are not cached.
    pub async fn get_public_key(
        &self,
        key_id: &str,
    ) -> Result<Arc<PublicKey>, Report<EventNotificationError>> {
        if let Some(key) = self.lookup(key_id) {
            log::debug!("Public key cache hit for kid: {}", key_id);
            return Ok(key);
        }

        log::debug!("Public key cache miss for kid: {}", key_id);
        let key = self
            .fetcher
            .fetch(key_id)
            .await
            .change_context(EventNotificationError::KeyCache {
                message: format!("Failed to load public key for kid: {}", key_id),
            })?;

        let key = Arc::new(key);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key_id.to_string(),
            CacheEntry {
                value: Arc::clone(&key),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(key)
    }

    fn lookup(&self, key_id: &str) -> Option<Arc<PublicKey>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key_id) {
                Some(entry) if now < entry.expires_at => return Some(Arc::clone(&entry.value)),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict unless a concurrent refresh already replaced it.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries
            .get(key_id)
            .is_some_and(|entry| entry.expires_at <= now)
        {
            entries.remove(key_id);
        }
        None
    }

    /// Number of stored entries, expired ones included until looked up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
