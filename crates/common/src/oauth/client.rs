use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::environment::OAuthEnvironment;
use super::token_cache::{AppToken, AppTokenCache};
use super::TokenProvider;
use crate::error::EventNotificationError;
use crate::settings::Settings;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Application keyset used for the client credentials grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub cert_id: String,
}

impl Credentials {
    /// `Basic base64(app_id:cert_id)`.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let pair = format!("{}:{}", self.app_id, self.cert_id);
        format!("Basic {}", general_purpose::STANDARD.encode(pair))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: String,
}

/// Client credentials OAuth client with an injected token cache.
pub struct OAuthClient {
    client: reqwest::Client,
    environment: OAuthEnvironment,
    credentials: Credentials,
    scopes: Vec<String>,
    token_url: Url,
    cache: Arc<AppTokenCache>,
}

fn configuration_error(message: impl Into<String>) -> EventNotificationError {
    EventNotificationError::Configuration {
        message: message.into(),
    }
}

impl OAuthClient {
    /// Creates a client for `environment` posting to its token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] when credentials or
    /// scopes are empty.
    pub fn new(
        client: reqwest::Client,
        environment: OAuthEnvironment,
        credentials: Credentials,
        scopes: Vec<String>,
        cache: Arc<AppTokenCache>,
    ) -> Result<Self, Report<EventNotificationError>> {
        if credentials.app_id.trim().is_empty() || credentials.cert_id.trim().is_empty() {
            return Err(Report::new(configuration_error(format!(
                "Credentials have not been loaded for {}",
                environment.config_identifier()
            ))));
        }
        if scopes.iter().all(|scope| scope.trim().is_empty()) {
            return Err(Report::new(configuration_error(
                "Scopes can't be empty",
            )));
        }

        let token_url = Url::parse(environment.api_endpoint())
            .change_context(configuration_error("Invalid token endpoint"))?;

        Ok(Self {
            client,
            environment,
            credentials,
            scopes,
            token_url,
            cache,
        })
    }

    /// Builds the client from `[vendor]` settings.
    ///
    /// # Errors
    ///
    /// See [`OAuthClient::new`]; also fails if the `token_url` override is not
    /// an absolute URL.
    pub fn from_settings(
        settings: &Settings,
        client: reqwest::Client,
        cache: Arc<AppTokenCache>,
    ) -> Result<Self, Report<EventNotificationError>> {
        let vendor = &settings.vendor;
        let oauth = Self::new(
            client,
            vendor.environment,
            Credentials {
                app_id: vendor.app_id.clone(),
                cert_id: vendor.cert_id.clone(),
            },
            vendor.scopes.clone(),
            cache,
        )?;

        match &vendor.token_url {
            Some(token_url) => oauth.with_token_url(token_url),
            None => Ok(oauth),
        }
    }

    /// Posts to `token_url` instead of the environment's token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] if `token_url` does not parse.
    pub fn with_token_url(mut self, token_url: &str) -> Result<Self, Report<EventNotificationError>> {
        self.token_url = Url::parse(token_url)
            .change_context(configuration_error("Invalid token url"))
            .attach(token_url.to_string())?;
        Ok(self)
    }

    #[must_use]
    pub fn environment(&self) -> OAuthEnvironment {
        self.environment
    }

    /// Form body of the client credentials grant. Scopes are joined with `+`.
    #[must_use]
    pub fn request_body(&self) -> String {
        let scopes = self
            .scopes
            .iter()
            .filter(|scope| !scope.trim().is_empty())
            .map(|scope| urlencoding::encode(scope.trim()).into_owned())
            .collect::<Vec<_>>()
            .join("+");

        format!("grant_type=client_credentials&scope={}", scopes)
    }

    /// Returns a cached application token or requests a new one.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::OAuthToken`] if the token endpoint is
    /// unreachable, answers with a non-200 status or an unexpected body.
    pub async fn application_token(&self) -> Result<AppToken, Report<EventNotificationError>> {
        if let Some(token) = self.cache.get(self.environment) {
            log::debug!(
                "Returning token from cache for {}",
                self.environment.config_identifier()
            );
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        self.cache.update(self.environment, token.clone());
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<AppToken, Report<EventNotificationError>> {
        let token_error = || EventNotificationError::OAuthToken {
            message: format!(
                "Error in fetching the token for {}",
                self.environment.config_identifier()
            ),
        };

        let response = self
            .client
            .post(self.token_url.clone())
            .header(AUTHORIZATION, self.credentials.authorization_header())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(self.request_body())
            .send()
            .await
            .change_context_lazy(token_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::error!("Error in fetching the token. Status: {}, Error: {}", status, body);
            return Err(Report::new(token_error()).attach(format!("{}: {}", status, body)));
        }

        let parsed: TokenResponse = response.json().await.change_context_lazy(token_error)?;
        log::info!(
            "Fetched application token for {}",
            self.environment.config_identifier()
        );

        Ok(AppToken {
            access_token: parsed.access_token,
            token_type: parsed.token_type,
            expires_in: Duration::from_secs(parsed.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for OAuthClient {
    async fn access_token(&self) -> Result<String, Report<EventNotificationError>> {
        self.application_token()
            .await
            .map(|token| token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tests::create_test_settings;

    fn credentials() -> Credentials {
        Credentials {
            app_id: "app".to_string(),
            cert_id: "cert".to_string(),
        }
    }

    #[test]
    fn test_authorization_header() {
        // base64("app:cert")
        assert_eq!(credentials().authorization_header(), "Basic YXBwOmNlcnQ=");
    }

    #[test]
    fn test_request_body_joins_scopes() {
        let client = OAuthClient::new(
            reqwest::Client::new(),
            OAuthEnvironment::Production,
            credentials(),
            vec![
                "https://api.ebay.com/oauth/api_scope".to_string(),
                "https://api.ebay.com/oauth/api_scope/buy.marketing".to_string(),
            ],
            Arc::new(AppTokenCache::new()),
        )
        .expect("should build client");

        assert_eq!(
            client.request_body(),
            "grant_type=client_credentials&scope=\
             https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope+\
             https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope%2Fbuy.marketing"
        );
    }

    #[test]
    fn test_rejects_empty_scopes() {
        let result = OAuthClient::new(
            reqwest::Client::new(),
            OAuthEnvironment::Production,
            credentials(),
            Vec::new(),
            Arc::new(AppTokenCache::new()),
        );
        let report = result.err().expect("should reject empty scopes");
        assert!(matches!(
            report.current_context(),
            EventNotificationError::Configuration { .. }
        ));
    }

    #[test]
    fn test_rejects_missing_credentials() {
        let result = OAuthClient::new(
            reqwest::Client::new(),
            OAuthEnvironment::Sandbox,
            Credentials {
                app_id: String::new(),
                cert_id: "cert".to_string(),
            },
            vec!["https://api.ebay.com/oauth/api_scope".to_string()],
            Arc::new(AppTokenCache::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_settings_uses_vendor_environment() {
        let settings = create_test_settings();
        let client = OAuthClient::from_settings(
            &settings,
            reqwest::Client::new(),
            Arc::new(AppTokenCache::new()),
        )
        .expect("should build client from settings");

        assert_eq!(client.environment(), OAuthEnvironment::Sandbox);
        assert_eq!(
            client.token_url.as_str(),
            "https://api.sandbox.ebay.com/identity/v1/oauth2/token"
        );
    }

    #[tokio::test]
    async fn test_cached_token_skips_request() {
        let cache = Arc::new(AppTokenCache::new());
        cache.update(
            OAuthEnvironment::Production,
            AppToken {
                access_token: "cached".to_string(),
                token_type: "Application Access Token".to_string(),
                expires_in: Duration::from_secs(7200),
            },
        );

        // Unroutable token url: any request would fail.
        let client = OAuthClient::new(
            reqwest::Client::new(),
            OAuthEnvironment::Production,
            credentials(),
            vec!["https://api.ebay.com/oauth/api_scope".to_string()],
            cache,
        )
        .expect("should build client")
        .with_token_url("http://127.0.0.1:9/token")
        .expect("should accept override");

        let token = client.access_token().await.expect("should use cached token");
        assert_eq!(token, "cached");
    }
}
