//! Public key retrieval from the vendor key endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use error_stack::{Report, ResultExt};
use reqwest::header::AUTHORIZATION;
use url::Url;

use crate::error::EventNotificationError;
use crate::models::PublicKey;
use crate::oauth::TokenProvider;
use crate::settings::Settings;

/// Resolves a key id to the vendor's published key record.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Fetches the key once. Callers decide whether to retry.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::KeyFetch`] when the key cannot be
    /// retrieved or decoded.
    async fn fetch(&self, key_id: &str) -> Result<PublicKey, Report<EventNotificationError>>;
}

/// Fetches `GET <base>/<key id>` with an application bearer token.
pub struct HttpKeyFetcher {
    client: reqwest::Client,
    base_url: Url,
    token_provider: Arc<dyn TokenProvider>,
}

impl HttpKeyFetcher {
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] if `base_url` is not
    /// an absolute URL.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, Report<EventNotificationError>> {
        let base_url = Url::parse(base_url)
            .change_context(EventNotificationError::Configuration {
                message: "Invalid public key endpoint".to_string(),
            })
            .attach(base_url.to_string())?;

        Ok(Self {
            client,
            base_url,
            token_provider,
        })
    }

    /// Uses `verification.public_key_base_url` when set, otherwise the vendor
    /// environment's key endpoint.
    ///
    /// # Errors
    ///
    /// See [`HttpKeyFetcher::new`].
    pub fn from_settings(
        settings: &Settings,
        client: reqwest::Client,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, Report<EventNotificationError>> {
        let base_url = settings
            .verification
            .public_key_base_url
            .as_deref()
            .unwrap_or_else(|| settings.vendor.environment.public_key_endpoint());

        Self::new(client, base_url, token_provider)
    }

    /// URL of the key resource for `key_id`.
    #[must_use]
    pub fn key_url(&self, key_id: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(key_id)
        )
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self, key_id: &str) -> Result<PublicKey, Report<EventNotificationError>> {
        let token = self
            .token_provider
            .access_token()
            .await
            .attach("Fetch application token failed")?;

        let url = self.key_url(key_id);
        let fetch_error = || EventNotificationError::KeyFetch {
            message: format!("Public Key retrieval failed for kid: {}", key_id),
        };

        log::debug!("Fetching public key from {}", url);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .change_context_lazy(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Public Key retrieval failed with {}: {}", status, body);
            return Err(Report::new(fetch_error()).attach(format!("{}: {}", status, body)));
        }

        let mut key: PublicKey = response.json().await.change_context_lazy(fetch_error)?;
        if key.key_id.is_empty() {
            key.key_id = key_id.to_string();
        }

        Ok(key)
    }
}
