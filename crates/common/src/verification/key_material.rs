//! Key material unwrapping.
//!
//! Vendor keys arrive as text. The accepted grammar is
//!
//! ```text
//! material := ws* [ begin ] body [ end ] ws*
//! begin    := "-----BEGIN " label "-----"
//! end      := "-----END " label "-----"      (same label as begin)
//! body     := base64 characters, optionally broken by whitespace
//! ```
//!
//! When a matching `begin`/`end` pair is present only the text between them
//! is used. Otherwise the whole field is taken to be the base64 body already.

use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};

use crate::error::EventNotificationError;

const BEGIN_PREFIX: &str = "-----BEGIN ";
const END_PREFIX: &str = "-----END ";
const DASHES: &str = "-----";

/// Returns the base64 body of `material` with delimiters and whitespace removed.
#[must_use]
pub fn extract_key_body(material: &str) -> String {
    let trimmed = material.trim();
    let body = delimited_body(trimmed).unwrap_or(trimmed);
    body.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Extracts and base64-decodes the key body into DER bytes.
///
/// # Errors
///
/// Returns [`EventNotificationError::SignatureValidation`] if the body is empty
/// or not valid base64.
pub fn decode_key_der(material: &str) -> Result<Vec<u8>, Report<EventNotificationError>> {
    let body = extract_key_body(material);
    if body.is_empty() {
        return Err(Report::new(EventNotificationError::SignatureValidation {
            message: "Public key material is empty".to_string(),
        }));
    }

    general_purpose::STANDARD
        .decode(&body)
        .change_context(EventNotificationError::SignatureValidation {
            message: "Public key material is not valid base64".to_string(),
        })
}

fn delimited_body(material: &str) -> Option<&str> {
    let begin = material.find(BEGIN_PREFIX)?;
    let after_prefix = &material[begin + BEGIN_PREFIX.len()..];
    let label_len = after_prefix.find(DASHES)?;
    let label = &after_prefix[..label_len];
    if label.contains('\n') {
        return None;
    }

    let body_and_rest = &after_prefix[label_len + DASHES.len()..];
    let end_marker = format!("{END_PREFIX}{label}{DASHES}");
    let body_len = body_and_rest.find(&end_marker)?;

    Some(&body_and_rest[..body_len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_vendor_format() {
        let material = "-----BEGIN PUBLIC KEY-----MFkwEwYHKoZIzj0CAQ==-----END PUBLIC KEY-----";
        assert_eq!(extract_key_body(material), "MFkwEwYHKoZIzj0CAQ==");
    }

    #[test]
    fn test_multi_line_pem() {
        let material = "-----BEGIN PUBLIC KEY-----\nMFkwEwYH\nKoZIzj0C\nAQ==\n-----END PUBLIC KEY-----\n";
        assert_eq!(extract_key_body(material), "MFkwEwYHKoZIzj0CAQ==");
    }

    #[test]
    fn test_bare_body_is_used_as_is() {
        assert_eq!(extract_key_body("  MFkwEwYHKoZIzj0CAQ==  "), "MFkwEwYHKoZIzj0CAQ==");
    }

    #[test]
    fn test_other_labels_are_accepted() {
        let material = "-----BEGIN EC PUBLIC KEY-----QUJD-----END EC PUBLIC KEY-----";
        assert_eq!(extract_key_body(material), "QUJD");
    }

    #[test]
    fn test_unterminated_begin_falls_back_to_whole_field() {
        let material = "-----BEGIN PUBLIC KEY-----QUJD";
        assert_eq!(extract_key_body(material), "-----BEGINPUBLICKEY-----QUJD");
        assert!(decode_key_der(material).is_err());
    }

    #[test]
    fn test_mismatched_labels_fall_back_to_whole_field() {
        let material = "-----BEGIN PUBLIC KEY-----QUJD-----END PRIVATE KEY-----";
        assert_ne!(extract_key_body(material), "QUJD");
        assert!(decode_key_der(material).is_err());
    }

    #[test]
    fn test_decode_key_der() {
        let der = decode_key_der("-----BEGIN PUBLIC KEY-----QUJD-----END PUBLIC KEY-----")
            .expect("should decode body");
        assert_eq!(der, b"ABC");
    }

    #[test]
    fn test_decode_rejects_empty_body() {
        let result = decode_key_der("-----BEGIN PUBLIC KEY----------END PUBLIC KEY-----");
        let report = result.expect_err("should reject empty body");
        assert!(matches!(
            report.current_context(),
            EventNotificationError::SignatureValidation { .. }
        ));
    }
}
