//! Signature header decoding.
//!
//! The `x-ebay-signature` header is base64 over a small JSON document:
//! `{"alg":"ecdsa","kid":"<key id>","signature":"<base64 DER>","digest":"SHA1"}`.

use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::error::EventNotificationError;
use crate::serializer;

/// Decoded signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    pub algorithm: String,
    pub key_id: String,
    /// DER encoded `ECDSA-Sig-Value`.
    pub signature: Vec<u8>,
    pub digest: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct SignatureHeader {
    #[serde(default)]
    alg: String,
    kid: String,
    signature: String,
    #[serde(default)]
    digest: String,
}

fn invalid(message: impl Into<String>) -> EventNotificationError {
    EventNotificationError::SignatureValidation {
        message: message.into(),
    }
}

impl SignatureEnvelope {
    /// Decodes a raw header value.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::SignatureValidation`] when the header is
    /// empty, not base64, not UTF-8 JSON, `null`, or missing the key id or
    /// signature.
    pub fn decode(header: &str) -> Result<Self, Report<EventNotificationError>> {
        let header = header.trim();
        if header.is_empty() {
            return Err(Report::new(invalid("Signature header is empty")));
        }

        let json_bytes = general_purpose::STANDARD
            .decode(header)
            .change_context(invalid("Signature header is not valid base64"))?;
        let json = String::from_utf8(json_bytes)
            .change_context(invalid("Signature header is not valid UTF-8"))?;

        let parsed: SignatureHeader = serde_json::from_str(&json)
            .change_context(invalid("Signature header is not a signature envelope"))
            .attach(json.clone())?;

        if parsed.kid.trim().is_empty() {
            return Err(Report::new(invalid("Signature envelope has no key id")));
        }

        let signature = general_purpose::STANDARD
            .decode(parsed.signature.trim())
            .change_context(invalid("Signature is not valid base64"))?;
        if signature.is_empty() {
            return Err(Report::new(invalid("Signature envelope has no signature")));
        }

        Ok(Self {
            algorithm: parsed.alg,
            key_id: parsed.kid,
            signature,
            digest: parsed.digest,
        })
    }

    /// Encodes the envelope back into a header value.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Serialization`] if the header JSON
    /// cannot be written.
    pub fn encode(&self) -> Result<String, Report<EventNotificationError>> {
        let header = SignatureHeader {
            alg: self.algorithm.clone(),
            kid: self.key_id.clone(),
            signature: general_purpose::STANDARD.encode(&self.signature),
            digest: self.digest.clone(),
        };
        let json = serializer::serialize_value(&header)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Header captured from a sandbox notification.
    const VENDOR_HEADER: &str = "eyJhbGciOiJlY2RzYSIsImtpZCI6Ijk5MzYyNjFhLTdkN2ItNDYyMS1hMGYxLTk2Y2NiNDI4YWY0OSIsInNpZ25hdHVyZSI6Ik1FWUNJUUNmeGZJV3V4bVdjSUJRSjljNS9YN2lHREpxczJSQ0dzQkVhQWppbnlycmZBSWhBSVY2d0djVGlCdVY1S0pVaWYyaG9reXJMK1E5c3NIa2FkK214Mm5FRTI1dyIsImRpZ2VzdCI6IlNIQTEifQ==";

    fn assert_validation_error(result: Result<SignatureEnvelope, Report<EventNotificationError>>) {
        let report = result.expect_err("should fail to decode");
        assert!(matches!(
            report.current_context(),
            EventNotificationError::SignatureValidation { .. }
        ));
    }

    #[test]
    fn test_decode_vendor_header() {
        let envelope = SignatureEnvelope::decode(VENDOR_HEADER).expect("should decode header");

        assert_eq!(envelope.algorithm, "ecdsa");
        assert_eq!(envelope.key_id, "9936261a-7d7b-4621-a0f1-96ccb428af49");
        assert_eq!(envelope.digest, "SHA1");
        // DER sequence tag
        assert_eq!(envelope.signature[0], 0x30);
        assert_eq!(envelope.signature.len(), 72);
    }

    #[test]
    fn test_encode_decode() {
        let envelope = SignatureEnvelope {
            algorithm: "ecdsa".into(),
            key_id: "kid-1".into(),
            signature: vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01],
            digest: "SHA256".into(),
        };

        let header = envelope.encode().expect("should encode header");
        let json = general_purpose::STANDARD
            .decode(&header)
            .expect("should be base64");
        assert_eq!(
            String::from_utf8(json).expect("should be utf-8"),
            r#"{"alg":"ecdsa","kid":"kid-1","signature":"MAYCAQECAQE=","digest":"SHA256"}"#
        );

        let decoded = SignatureEnvelope::decode(&header).expect("should decode encoded header");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_decode_rejects_empty_header() {
        assert_validation_error(SignatureEnvelope::decode(""));
        assert_validation_error(SignatureEnvelope::decode("   "));
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert_validation_error(SignatureEnvelope::decode("not-base64!!!"));
    }

    #[test]
    fn test_decode_rejects_null_envelope() {
        let header = general_purpose::STANDARD.encode("null");
        assert_validation_error(SignatureEnvelope::decode(&header));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let header = general_purpose::STANDARD.encode("kid=abc;signature=def");
        assert_validation_error(SignatureEnvelope::decode(&header));
    }

    #[test]
    fn test_decode_rejects_missing_kid() {
        let header = general_purpose::STANDARD
            .encode(r#"{"alg":"ecdsa","kid":"","signature":"MAYCAQECAQE=","digest":"SHA1"}"#);
        assert_validation_error(SignatureEnvelope::decode(&header));
    }

    #[test]
    fn test_decode_rejects_bad_signature_encoding() {
        let header = general_purpose::STANDARD
            .encode(r#"{"alg":"ecdsa","kid":"kid-1","signature":"%%%","digest":"SHA1"}"#);
        assert_validation_error(SignatureEnvelope::decode(&header));
    }
}
