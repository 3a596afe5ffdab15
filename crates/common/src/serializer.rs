//! Canonical message serialization.
//!
//! The vendor signs the compact JSON form of a notification. Re-creating those
//! bytes exactly is what makes verification of a typed [`Message`] possible, so
//! the encoding here is fixed:
//!
//! - struct fields in declaration order, payload members in received order;
//! - minimal string escaping (only `"`, `\` and control characters), so `/`,
//!   `+`, `<`, `&` and non-ASCII text pass through untouched;
//! - timestamps in UTC as `YYYY-MM-DDTHH:mm:ss.sssZ`;
//! - payload numbers in the textual form they were received in.

use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::EventNotificationError;
use crate::models::Message;

/// Serializes a notification into its canonical signed form.
///
/// # Errors
///
/// Returns [`EventNotificationError::Serialization`] if the message cannot be encoded.
pub fn serialize(message: &Message) -> Result<String, Report<EventNotificationError>> {
    serialize_value(message)
}

/// Serializes any value with the canonical encoding rules.
///
/// # Errors
///
/// Returns [`EventNotificationError::Serialization`] if the value cannot be encoded.
pub fn serialize_value<T>(value: &T) -> Result<String, Report<EventNotificationError>>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).change_context(EventNotificationError::Serialization {
        message: "Failed to serialize value".to_string(),
    })
}

/// Parses a raw JSON document.
///
/// # Errors
///
/// Returns [`EventNotificationError::Serialization`] if `raw` is not valid JSON
/// for `T`.
pub fn deserialize<T>(raw: &str) -> Result<T, Report<EventNotificationError>>
where
    T: DeserializeOwned,
{
    serde_json::from_str(raw).change_context(EventNotificationError::Serialization {
        message: format!(
            "Failed to deserialize {}",
            std::any::type_name::<T>()
        ),
    })
}

/// Projects an already parsed value onto a typed structure.
///
/// The value is re-serialized and parsed again, which is how topic payloads
/// are pulled out of the opaque `notification.data` member.
///
/// # Errors
///
/// Returns [`EventNotificationError::Serialization`] if the value does not fit `T`.
pub fn deserialize_value<T, V>(value: &V) -> Result<T, Report<EventNotificationError>>
where
    T: DeserializeOwned,
    V: Serialize + ?Sized,
{
    let raw = serialize_value(value)?;
    deserialize(&raw)
}

/// Serde adapter for vendor timestamps.
pub mod timestamp {
    use chrono::{DateTime, ParseError, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// `YYYY-MM-DDTHH:mm:ss.sssZ`, always UTC.
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    #[must_use]
    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    /// Parses an RFC 3339 timestamp and normalizes it to UTC.
    ///
    /// # Errors
    ///
    /// Returns the chrono parse error for anything that is not RFC 3339.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|parsed| parsed.with_timezone(&Utc))
    }

    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    /// # Errors
    ///
    /// Fails when the input is not a string or not an RFC 3339 timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
