//! Notification, key and handshake models.
//!
//! Field declaration order is wire order: the canonical serializer emits
//! struct fields in the order they appear here, and the vendor signs exactly
//! that order. Do not reorder fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serializer::timestamp;

/// Inbound notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub metadata: Metadata,
    pub notification: Notification,
}

impl Message {
    /// Topic this notification belongs to.
    #[must_use]
    pub fn topic(&self) -> Topic {
        Topic::parse(&self.metadata.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub topic: String,
    pub schema_version: String,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: String,
    #[serde(with = "timestamp")]
    pub event_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub publish_date: DateTime<Utc>,
    pub publish_attempt_count: u32,
    /// Topic specific payload, kept opaque with member order preserved.
    pub data: serde_json::Value,
}

/// Known notification topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    MarketplaceAccountDeletion,
    Other(String),
}

impl Topic {
    const MARKETPLACE_ACCOUNT_DELETION: &'static str = "MARKETPLACE_ACCOUNT_DELETION";

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::MARKETPLACE_ACCOUNT_DELETION => Self::MarketplaceAccountDeletion,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MarketplaceAccountDeletion => Self::MARKETPLACE_ACCOUNT_DELETION,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `MARKETPLACE_ACCOUNT_DELETION` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeletionData {
    pub username: String,
    pub user_id: String,
    pub eias_token: String,
}

/// Public key record published by the vendor key endpoint.
///
/// `key` holds the base64 DER `SubjectPublicKeyInfo`, usually wrapped in
/// `-----BEGIN PUBLIC KEY-----` delimiters; see
/// [`crate::verification::key_material`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// Filled in by the fetcher from the requested id when the vendor omits it.
    #[serde(rename = "keyId", default, skip_serializing_if = "String::is_empty")]
    pub key_id: String,
    pub algorithm: String,
    pub digest: String,
    pub key: String,
}

/// Body returned to the endpoint ownership handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    #[serde(rename = "challengeResponse")]
    pub response: String,
}

impl ChallengeResponse {
    #[must_use]
    pub fn new(response: String) -> Self {
        Self { response }
    }
}
