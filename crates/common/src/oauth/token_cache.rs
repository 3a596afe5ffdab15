//! Application token cache.
//!
//! Tokens are kept per [`OAuthEnvironment`] and handed out until
//! [`AppTokenCache::SAFETY_BUFFER`] before the issuer's expiry, so a token
//! never reaches the key endpoint moments before it lapses.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use super::environment::OAuthEnvironment;

/// Application access token as issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime reported by the issuer.
    pub expires_in: Duration,
}

#[derive(Debug)]
struct CachedToken {
    token: AppToken,
    refresh_at: Instant,
}

#[derive(Debug, Default)]
pub struct AppTokenCache {
    entries: RwLock<HashMap<OAuthEnvironment, CachedToken>>,
}

impl AppTokenCache {
    pub const SAFETY_BUFFER: Duration = Duration::from_secs(5 * 60);

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token while it is outside the safety buffer.
    #[must_use]
    pub fn get(&self, environment: OAuthEnvironment) -> Option<AppToken> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&environment)
            .filter(|cached| Instant::now() < cached.refresh_at)
            .map(|cached| cached.token.clone())
    }

    /// Stores a freshly issued token, replacing any previous one.
    pub fn update(&self, environment: OAuthEnvironment, token: AppToken) {
        let refresh_at = Instant::now() + token.expires_in.saturating_sub(Self::SAFETY_BUFFER);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(environment, CachedToken { token, refresh_at });
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
