//! Endpoint ownership handshake.
//!
//! The vendor proves the receiver controls its endpoint by sending a
//! `challenge_code` and expecting back the lowercase hex SHA-256 of
//! `challenge_code || verification_token || endpoint`.

use error_stack::Report;
use sha2::{Digest, Sha256};

use crate::error::EventNotificationError;
use crate::models::ChallengeResponse;
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct EndpointValidator {
    endpoint: String,
    verification_token: String,
}

impl EndpointValidator {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, verification_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            verification_token: verification_token.into(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.endpoint.url.clone(),
            settings.endpoint.verification_token.clone(),
        )
    }

    /// Computes the handshake answer for `challenge_code`.
    ///
    /// # Errors
    ///
    /// - [`EventNotificationError::MissingConfig`] if the endpoint or the
    ///   verification token is empty. Checked before anything is hashed.
    /// - [`EventNotificationError::EndpointValidation`] if `challenge_code` is empty.
    pub fn generate_challenge_response(
        &self,
        challenge_code: &str,
    ) -> Result<ChallengeResponse, Report<EventNotificationError>> {
        if self.endpoint.is_empty() || self.verification_token.is_empty() {
            return Err(Report::new(EventNotificationError::MissingConfig {
                message: "Endpoint and verification token are required".to_string(),
            }));
        }
        if challenge_code.is_empty() {
            return Err(Report::new(EventNotificationError::EndpointValidation {
                message: "Challenge code is empty".to_string(),
            }));
        }

        let mut hasher = Sha256::new();
        hasher.update(challenge_code.as_bytes());
        hasher.update(self.verification_token.as_bytes());
        hasher.update(self.endpoint.as_bytes());

        Ok(ChallengeResponse::new(hex::encode(hasher.finalize())))
    }
}
