//! Error types for notification verification.
//!
//! Every fallible operation in this crate returns
//! `Result<T, Report<EventNotificationError>>`. The variants keep the failure
//! classes apart so the transport layer can map them precisely: a signature
//! that verifies as a mismatch is *not* an error, it is `Ok(false)`.

use derive_more::{Display, Error};
use http::StatusCode;

#[derive(Debug, Display, Error)]
pub enum EventNotificationError {
    /// Malformed or non-round-trippable message data.
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// The public key cache could not resolve a key id.
    #[display("Public key cache error: {message}")]
    KeyCache { message: String },

    /// The vendor key endpoint could not be reached or returned garbage.
    #[display("Public key fetch error: {message}")]
    KeyFetch { message: String },

    /// An application token could not be obtained.
    #[display("OAuth token error: {message}")]
    OAuthToken { message: String },

    /// Decoding, structural or key-resolution failure during verification.
    #[display("Signature validation error: {message}")]
    SignatureValidation { message: String },

    /// Endpoint url or verification token not configured.
    #[display("Missing endpoint validation config: {message}")]
    MissingConfig { message: String },

    /// Unexpected failure while computing a challenge response.
    #[display("Endpoint validation error: {message}")]
    EndpointValidation { message: String },

    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// No processor is registered for the message topic.
    #[display("Message processor not registered for topic: {topic}")]
    ProcessorNotDefined { topic: String },
}

/// Maps an error onto the HTTP response the transport should send.
pub trait IntoHttpResponse {
    /// HTTP status for this error.
    fn status_code(&self) -> StatusCode;

    /// Message safe to return to the caller.
    fn user_message(&self) -> String;
}

impl IntoHttpResponse for EventNotificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Serialization { .. } => StatusCode::BAD_REQUEST,
            Self::KeyCache { .. }
            | Self::KeyFetch { .. }
            | Self::OAuthToken { .. }
            | Self::SignatureValidation { .. }
            | Self::MissingConfig { .. }
            | Self::EndpointValidation { .. }
            | Self::Configuration { .. }
            | Self::ProcessorNotDefined { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Serialization { .. } => "Malformed notification payload".to_string(),
            Self::SignatureValidation { .. } | Self::KeyCache { .. } | Self::KeyFetch { .. } => {
                "Signature validation processing failure".to_string()
            }
            Self::MissingConfig { .. } | Self::EndpointValidation { .. } => {
                "Endpoint validation failure".to_string()
            }
            Self::OAuthToken { .. } | Self::Configuration { .. } => {
                "Service misconfigured".to_string()
            }
            Self::ProcessorNotDefined { .. } => "Notification could not be processed".to_string(),
        }
    }
}
