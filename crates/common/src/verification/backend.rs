//! Signature verification backends.
//!
//! Two implementations sit behind [`SignatureVerifier`]:
//!
//! - [`RingVerifier`] uses `ring`, the BoringSSL-derived native library.
//! - [`RustCryptoVerifier`] uses the pure-Rust `p256` and `sha1`/`sha2` crates.
//!
//! They are selected at run time through [`VerifierBackend`] and must reach the
//! same accept/reject decision for any input both support. A signature that is
//! not a well-formed DER sequence for the key's curve counts as a mismatch in
//! both, since `ring` does not report the difference.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use ring::signature::{self as ring_signature, UnparsedPublicKey, VerificationAlgorithm};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384};
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::error::EventNotificationError;
use crate::models::PublicKey;

const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

fn validation_error(message: impl Into<String>) -> EventNotificationError {
    EventNotificationError::SignatureValidation {
        message: message.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
}

impl DigestAlgorithm {
    /// Hashes `data` with this digest.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Report<EventNotificationError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            _ => Err(Report::new(validation_error(format!(
                "Unsupported digest: {}",
                s
            )))),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    Ecdsa,
}

impl FromStr for SignatureScheme {
    type Err = Report<EventNotificationError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ECDSA") {
            Ok(Self::Ecdsa)
        } else {
            Err(Report::new(validation_error(format!(
                "Unsupported signature algorithm: {}",
                s
            ))))
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ecdsa => "ECDSA",
        })
    }
}

/// Digest plus signature scheme, named like `SHA256withECDSA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureAlgorithm {
    pub digest: DigestAlgorithm,
    pub scheme: SignatureScheme,
}

impl SignatureAlgorithm {
    /// Builds the algorithm advertised by a vendor key record.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::SignatureValidation`] for digests or
    /// schemes this crate does not implement.
    pub fn from_key(key: &PublicKey) -> Result<Self, Report<EventNotificationError>> {
        format!("{}with{}", key.digest, key.algorithm).parse()
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Report<EventNotificationError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let split = lower
            .find("with")
            .ok_or_else(|| Report::new(validation_error(format!("Invalid algorithm: {}", s))))?;

        Ok(Self {
            digest: s[..split].parse()?,
            scheme: s[split + "with".len()..].parse()?,
        })
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}with{}", self.digest, self.scheme)
    }
}

/// Verifies a signature given key bytes, algorithm and message bytes.
pub trait SignatureVerifier: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    /// Verifies `signature` (DER) over `message` with a DER
    /// `SubjectPublicKeyInfo` public key.
    ///
    /// Returns `Ok(false)` when the signature does not match.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::SignatureValidation`] if the key cannot
    /// be parsed or the algorithm is not supported by this backend.
    fn verify(
        &self,
        public_key_der: &[u8],
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, Report<EventNotificationError>>;
}

/// `ring` backed verifier. Supports ECDSA P-256 with SHA-256 and SHA-384.
#[derive(Debug, Default, Clone, Copy)]
pub struct RingVerifier;

impl RingVerifier {
    fn algorithm(
        algorithm: SignatureAlgorithm,
    ) -> Result<&'static dyn VerificationAlgorithm, Report<EventNotificationError>> {
        match (algorithm.scheme, algorithm.digest) {
            (SignatureScheme::Ecdsa, DigestAlgorithm::Sha256) => {
                Ok(&ring_signature::ECDSA_P256_SHA256_ASN1)
            }
            (SignatureScheme::Ecdsa, DigestAlgorithm::Sha384) => {
                Ok(&ring_signature::ECDSA_P256_SHA384_ASN1)
            }
            (SignatureScheme::Ecdsa, DigestAlgorithm::Sha1) => Err(Report::new(validation_error(
                format!("{} is not supported by the ring backend", algorithm),
            ))),
        }
    }
}

/// Parses a DER `SubjectPublicKeyInfo` into a P-256 verifying key.
///
/// Both backends go through here so they accept and reject the same keys.
/// Compressed and uncompressed SEC1 points are accepted; the point must lie on
/// the curve.
fn p256_key_from_spki(der: &[u8]) -> Result<VerifyingKey, Report<EventNotificationError>> {
    let info = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| Report::new(validation_error(format!("Invalid public key: {}", e))))?;

    if info.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(Report::new(validation_error(format!(
            "Public key is not an EC key: {}",
            info.algorithm.oid
        ))));
    }

    let curve = info
        .algorithm
        .parameters_oid()
        .map_err(|e| Report::new(validation_error(format!("Missing curve parameter: {}", e))))?;
    if curve != SECP256R1 {
        return Err(Report::new(validation_error(format!(
            "Unsupported curve: {}",
            curve
        ))));
    }

    let point = info
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| Report::new(validation_error("Public key bit string is not byte aligned")))?;

    VerifyingKey::from_sec1_bytes(point)
        .map_err(|_| Report::new(validation_error("Public key is not a valid P-256 point")))
}

impl SignatureVerifier for RingVerifier {
    fn name(&self) -> &'static str {
        "ring"
    }

    fn verify(
        &self,
        public_key_der: &[u8],
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, Report<EventNotificationError>> {
        let verification_algorithm = Self::algorithm(algorithm)?;
        let point = p256_key_from_spki(public_key_der)?.to_encoded_point(false);

        let key = UnparsedPublicKey::new(verification_algorithm, point.as_bytes());
        Ok(key.verify(message, signature).is_ok())
    }
}

/// `p256` backed verifier. Supports ECDSA P-256 with SHA-1, SHA-256 and SHA-384.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoVerifier;

impl SignatureVerifier for RustCryptoVerifier {
    fn name(&self) -> &'static str {
        "rust_crypto"
    }

    fn verify(
        &self,
        public_key_der: &[u8],
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, Report<EventNotificationError>> {
        let SignatureScheme::Ecdsa = algorithm.scheme;

        let key = p256_key_from_spki(public_key_der)?;

        let Ok(signature) = Signature::from_der(signature) else {
            log::debug!("Signature is not a DER encoded P-256 signature");
            return Ok(false);
        };

        let prehash = algorithm.digest.digest(message);
        Ok(key.verify_prehash(&prehash, &signature).is_ok())
    }
}

/// Backend selection, read from settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierBackend {
    Ring,
    #[default]
    RustCrypto,
}

impl VerifierBackend {
    #[must_use]
    pub fn build(self) -> Arc<dyn SignatureVerifier> {
        match self {
            Self::Ring => Arc::new(RingVerifier),
            Self::RustCrypto => Arc::new(RustCryptoVerifier),
        }
    }
}

impl FromStr for VerifierBackend {
    type Err = Report<EventNotificationError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ring" => Ok(Self::Ring),
            "rust_crypto" => Ok(Self::RustCrypto),
            other => Err(Report::new(EventNotificationError::Configuration {
                message: format!("Unknown verifier backend: {}", other),
            }))
            .attach("expected one of: ring, rust_crypto"),
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose, Engine};

    use super::*;
    use crate::test_support::tests::{
        canonical_message_raw, sign_payload, tampered_message_raw, test_public_key_base64,
        test_signing_key,
    };

    const P256_CURVE_OID: &[u8] = &[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
    const P384_CURVE_OID: &[u8] = &[0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x22];

    fn public_key_der() -> Vec<u8> {
        general_purpose::STANDARD
            .decode(test_public_key_base64())
            .expect("should decode test key")
    }

    fn backends() -> Vec<Arc<dyn SignatureVerifier>> {
        vec![VerifierBackend::Ring.build(), VerifierBackend::RustCrypto.build()]
    }

    /// DER `SubjectPublicKeyInfo` for an EC point on the given named curve.
    fn ec_spki(curve_oid: &[u8], point: &[u8]) -> Vec<u8> {
        let mut algorithm = vec![0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
        algorithm.extend_from_slice(curve_oid);

        let mut body = vec![0x30, algorithm.len() as u8];
        body.extend(algorithm);
        body.extend([0x03, (point.len() + 1) as u8, 0x00]);
        body.extend_from_slice(point);

        let mut der = vec![0x30, body.len() as u8];
        der.extend(body);
        der
    }

    fn test_point(compress: bool) -> Vec<u8> {
        test_signing_key()
            .verifying_key()
            .to_encoded_point(compress)
            .as_bytes()
            .to_vec()
    }

    /// Key variants: uncompressed, compressed, off-curve, wrong curve.
    fn key_corpus() -> Vec<Vec<u8>> {
        let mut off_curve = test_point(false);
        let last = off_curve.len() - 1;
        off_curve[last] ^= 0x01;

        vec![
            public_key_der(),
            ec_spki(P256_CURVE_OID, &test_point(true)),
            ec_spki(P256_CURVE_OID, &off_curve),
            ec_spki(P384_CURVE_OID, &test_point(false)),
        ]
    }

    /// `Some(accepted)` or `None` for a key or algorithm error.
    fn outcome(result: Result<bool, Report<EventNotificationError>>) -> Option<bool> {
        match result {
            Ok(verified) => Some(verified),
            Err(report) => {
                assert!(matches!(
                    report.current_context(),
                    EventNotificationError::SignatureValidation { .. }
                ));
                None
            }
        }
    }

    fn sha256_ecdsa() -> SignatureAlgorithm {
        "SHA256withECDSA".parse().expect("should parse algorithm")
    }

    #[test]
    fn test_parse_algorithm_names() {
        let algorithm: SignatureAlgorithm = "SHA1withECDSA".parse().expect("should parse");
        assert_eq!(algorithm.digest, DigestAlgorithm::Sha1);
        assert_eq!(algorithm.scheme, SignatureScheme::Ecdsa);
        assert_eq!(algorithm.to_string(), "SHA1withECDSA");

        let algorithm: SignatureAlgorithm = "sha-384withecdsa".parse().expect("should parse");
        assert_eq!(algorithm.digest, DigestAlgorithm::Sha384);

        assert!("SHA256withRSA".parse::<SignatureAlgorithm>().is_err());
        assert!("MD5withECDSA".parse::<SignatureAlgorithm>().is_err());
        assert!("ECDSA".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn test_algorithm_from_vendor_key() {
        let key = PublicKey {
            key_id: String::new(),
            algorithm: "ECDSA".into(),
            digest: "SHA1".into(),
            key: String::new(),
        };
        let algorithm = SignatureAlgorithm::from_key(&key).expect("should build algorithm");
        assert_eq!(algorithm.to_string(), "SHA1withECDSA");
    }

    #[test]
    fn test_both_backends_accept_valid_signature() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha256);

        for backend in backends() {
            let verified = backend
                .verify(&public_key_der(), sha256_ecdsa(), payload.as_bytes(), &signature)
                .expect("should verify");
            assert!(verified, "{} should accept a valid signature", backend.name());
        }
    }

    #[test]
    fn test_both_backends_reject_tampered_payload() {
        let signature = sign_payload(canonical_message_raw().as_bytes(), DigestAlgorithm::Sha256);
        let tampered = tampered_message_raw();

        for backend in backends() {
            let verified = backend
                .verify(&public_key_der(), sha256_ecdsa(), tampered.as_bytes(), &signature)
                .expect("should verify");
            assert!(!verified, "{} should reject a tampered payload", backend.name());
        }
    }

    #[test]
    fn test_backends_agree_on_mutation_corpus() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha256);
        let mut corpus: Vec<(Vec<u8>, Vec<u8>)> = vec![(payload.as_bytes().to_vec(), signature.clone())];
        for index in [0, 17, payload.len() / 2, payload.len() - 1] {
            let mut mutated = payload.as_bytes().to_vec();
            mutated[index] ^= 0x01;
            corpus.push((mutated, signature.clone()));
        }
        let mut bad_signature = signature.clone();
        let last = bad_signature.len() - 1;
        bad_signature[last] ^= 0x01;
        corpus.push((payload.as_bytes().to_vec(), bad_signature));
        corpus.push((payload.as_bytes().to_vec(), b"not a der signature".to_vec()));

        for key in key_corpus() {
            for (message, signature) in &corpus {
                let ring = outcome(RingVerifier.verify(&key, sha256_ecdsa(), message, signature));
                let rust_crypto =
                    outcome(RustCryptoVerifier.verify(&key, sha256_ecdsa(), message, signature));
                assert_eq!(ring, rust_crypto, "backends disagree");
            }
        }
    }

    #[test]
    fn test_spki_builder_matches_encoded_key() {
        assert_eq!(ec_spki(P256_CURVE_OID, &test_point(false)), public_key_der());
    }

    #[test]
    fn test_compressed_key_accepted_by_both() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha256);
        let key = ec_spki(P256_CURVE_OID, &test_point(true));

        for backend in backends() {
            let valid = backend.verify(&key, sha256_ecdsa(), payload.as_bytes(), &signature);
            assert_eq!(outcome(valid), Some(true), "{} valid", backend.name());

            let tampered =
                backend.verify(&key, sha256_ecdsa(), tampered_message_raw().as_bytes(), &signature);
            assert_eq!(outcome(tampered), Some(false), "{} tampered", backend.name());
        }
    }

    #[test]
    fn test_off_curve_and_foreign_curve_keys_are_errors() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha256);
        let keys = key_corpus();

        for backend in backends() {
            for key in &keys[2..] {
                let result = backend.verify(key, sha256_ecdsa(), payload.as_bytes(), &signature);
                assert_eq!(outcome(result), None, "{} should reject the key", backend.name());
            }
        }
    }

    #[test]
    fn test_sha384_supported_by_both() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha384);
        let algorithm: SignatureAlgorithm = "SHA384withECDSA".parse().expect("should parse");

        for backend in backends() {
            let verified = backend
                .verify(&public_key_der(), algorithm, payload.as_bytes(), &signature)
                .expect("should verify");
            assert!(verified, "{} should accept SHA-384", backend.name());
        }
    }

    #[test]
    fn test_sha1_only_in_rust_crypto() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha1);
        let algorithm: SignatureAlgorithm = "SHA1withECDSA".parse().expect("should parse");

        let verified = RustCryptoVerifier
            .verify(&public_key_der(), algorithm, payload.as_bytes(), &signature)
            .expect("should verify");
        assert!(verified);

        let result = RingVerifier.verify(&public_key_der(), algorithm, payload.as_bytes(), &signature);
        assert!(result.is_err(), "ring has no SHA-1 ECDSA");
    }

    #[test]
    fn test_invalid_key_is_an_error() {
        let payload = canonical_message_raw();
        let signature = sign_payload(payload.as_bytes(), DigestAlgorithm::Sha256);

        for backend in backends() {
            let result = backend.verify(b"garbage", sha256_ecdsa(), payload.as_bytes(), &signature);
            let report = result.expect_err("should reject garbage key");
            assert!(matches!(
                report.current_context(),
                EventNotificationError::SignatureValidation { .. }
            ));
        }
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("ring".parse::<VerifierBackend>().ok(), Some(VerifierBackend::Ring));
        assert_eq!(
            "rust_crypto".parse::<VerifierBackend>().ok(),
            Some(VerifierBackend::RustCrypto)
        );
        assert!("openssl".parse::<VerifierBackend>().is_err());
        assert_eq!(VerifierBackend::Ring.build().name(), "ring");
    }
}
