use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use validator::Validate;

use crate::constants::DEFAULT_API_SCOPE;
use crate::error::EventNotificationError;
use crate::oauth::OAuthEnvironment;
use crate::verification::VerifierBackend;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "EVENT_NOTIFICATION";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

/// Receiving endpoint registered with the vendor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Endpoint {
    /// Exact URL registered for the subscription. Part of the challenge hash.
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 32, max = 80))]
    pub verification_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Vendor {
    #[serde(default)]
    pub environment: OAuthEnvironment,
    #[validate(length(min = 1))]
    pub app_id: String,
    #[validate(length(min = 1))]
    pub cert_id: String,
    #[serde(default = "default_scopes")]
    #[validate(length(min = 1))]
    pub scopes: Vec<String>,
    /// Overrides the environment's token endpoint.
    #[serde(default)]
    #[validate(url)]
    pub token_url: Option<String>,
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_API_SCOPE.to_string()]
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Verification {
    #[serde(default)]
    pub backend: VerifierBackend,
    #[serde(default = "default_key_cache_ttl_secs")]
    #[validate(range(min = 1))]
    pub key_cache_ttl_secs: u64,
    #[serde(default = "default_key_fetch_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub key_fetch_timeout_secs: u64,
    /// Overrides the environment's public key endpoint.
    #[serde(default)]
    #[validate(url)]
    pub public_key_base_url: Option<String>,
}

fn default_key_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_key_fetch_timeout_secs() -> u64 {
    10
}

impl Default for Verification {
    fn default() -> Self {
        Self {
            backend: VerifierBackend::default(),
            key_cache_ttl_secs: default_key_cache_ttl_secs(),
            key_fetch_timeout_secs: default_key_fetch_timeout_secs(),
            public_key_base_url: None,
        }
    }
}

impl Verification {
    #[must_use]
    pub fn key_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.key_cache_ttl_secs)
    }

    #[must_use]
    pub fn key_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.key_fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Server {
    #[serde(default = "default_bind_address")]
    #[validate(length(min = 1))]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub endpoint: Endpoint,
    #[validate(nested)]
    pub vendor: Vendor,
    #[serde(default)]
    #[validate(nested)]
    pub verification: Verification,
    #[serde(default)]
    #[validate(nested)]
    pub server: Server,
}

impl Settings {
    /// Loads the bundled `event-notification.toml` plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] if the merged settings
    /// do not parse or fail validation.
    pub fn new() -> Result<Self, Report<EventNotificationError>> {
        let toml_str = include_str!("../../../event-notification.toml");
        Self::from_toml(toml_str)
    }

    /// Parses `toml_str`, applies `EVENT_NOTIFICATION__SECTION__KEY` overrides
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] if the merged settings
    /// do not parse or fail validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<EventNotificationError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(EventNotificationError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(EventNotificationError::Configuration {
                    message: "Failed to deserialize configuration".to_string(),
                })?;

        settings
            .validate()
            .change_context(EventNotificationError::Configuration {
                message: "Settings validation failed".to_string(),
            })?;

        Ok(settings)
    }
}
