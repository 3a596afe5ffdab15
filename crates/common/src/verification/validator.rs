//! Notification signature validation.
//!
//! Each call runs three steps with no state kept between calls:
//!
//! 1. **Decode** the `x-ebay-signature` header into a [`SignatureEnvelope`].
//! 2. **Resolve** the referenced key through the [`PublicKeyCache`] and unwrap
//!    its key material to DER.
//! 3. **Verify** the signature over the message bytes with the configured
//!    [`SignatureVerifier`].
//!
//! A cryptographic mismatch is `Ok(false)`. Anything that prevents verification
//! from running is an [`EventNotificationError::SignatureValidation`] error.

use std::sync::Arc;

use error_stack::{Report, ResultExt};

use super::backend::{SignatureAlgorithm, SignatureVerifier};
use super::envelope::SignatureEnvelope;
use super::key_cache::PublicKeyCache;
use super::key_material::decode_key_der;
use crate::error::EventNotificationError;
use crate::models::Message;
use crate::serializer;

pub struct SignatureValidator {
    cache: Arc<PublicKeyCache>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignatureValidator {
    #[must_use]
    pub fn new(cache: Arc<PublicKeyCache>, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { cache, verifier }
    }

    /// Verifies `header` against the canonical serialization of `message`.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::SignatureValidation`] if the header is
    /// malformed, the key cannot be resolved or the algorithm is unsupported.
    pub async fn validate(
        &self,
        message: &Message,
        header: &str,
    ) -> Result<bool, Report<EventNotificationError>> {
        let payload = serializer::serialize(message).change_context(
            EventNotificationError::SignatureValidation {
                message: "Failed to serialize message".to_string(),
            },
        )?;
        self.validate_raw(&payload, header).await
    }

    /// Verifies `header` against `payload` exactly as given.
    ///
    /// # Errors
    ///
    /// See [`SignatureValidator::validate`].
    pub async fn validate_raw(
        &self,
        payload: &str,
        header: &str,
    ) -> Result<bool, Report<EventNotificationError>> {
        let envelope = SignatureEnvelope::decode(header)?;

        let key = self
            .cache
            .get_public_key(&envelope.key_id)
            .await
            .change_context(EventNotificationError::SignatureValidation {
                message: format!("Unable to resolve public key {}", envelope.key_id),
            })?;

        let der = decode_key_der(&key.key).attach(format!("kid: {}", envelope.key_id))?;
        let algorithm = SignatureAlgorithm::from_key(&key)?;

        let verified = self
            .verifier
            .verify(&der, algorithm, payload.as_bytes(), &envelope.signature)
            .attach(format!("backend: {}", self.verifier.name()))?;

        if verified {
            log::debug!(
                "Signature verified with kid {} using {}",
                envelope.key_id,
                algorithm
            );
        } else {
            log::error!(
                "Signature mismatch for kid {} using {} ({} backend)",
                envelope.key_id,
                algorithm,
                self.verifier.name()
            );
        }

        Ok(verified)
    }
}
