#[cfg(any(test, feature = "test-support"))]
pub mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::{engine::general_purpose, Engine};
    use error_stack::Report;
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use p256::ecdsa::{Signature, SigningKey};
    use p256::pkcs8::EncodePublicKey;

    use crate::error::EventNotificationError;
    use crate::models::{Message, PublicKey};
    use crate::oauth::TokenProvider;
    use crate::settings::Settings;
    use crate::verification::{DigestAlgorithm, KeyFetcher, SignatureEnvelope};

    pub const TEST_KID: &str = "9936261a-7d7b-4621-a0f1-96ccb428af49";

    /// Compact form of the account deletion notification used across tests.
    pub fn canonical_message_raw() -> String {
        concat!(
            r#"{"metadata":{"topic":"MARKETPLACE_ACCOUNT_DELETION","schemaVersion":"1.0","deprecated":false},"#,
            r#""notification":{"notificationId":"49feeaeb-4982-42d9-a377-9645b8479411_33f7e043-fed8-442b-9d44-791923bd9a6d","#,
            r#""eventDate":"2021-03-19T20:43:59.462Z","publishDate":"2021-03-19T20:43:59.679Z","publishAttemptCount":1,"#,
            r#""data":{"username":"test_user","userId":"ma8vp1jySJC","eiasToken":"nY+sHZ2PrBmdj6wVnY+sEZ2PrA2dj6wJnY+gAZGEpwmdj6x9nY+seQ=="}}}"#
        )
        .to_string()
    }

    /// Same notification with the username changed after signing.
    pub fn tampered_message_raw() -> String {
        canonical_message_raw().replace("test_user", "test_usEr")
    }

    pub fn create_test_message() -> Message {
        serde_json::from_str(&canonical_message_raw()).expect("Invalid test message")
    }

    pub fn create_tampered_message() -> Message {
        serde_json::from_str(&tampered_message_raw()).expect("Invalid tampered message")
    }

    pub fn test_signing_key() -> SigningKey {
        SigningKey::from_slice(&[0x42; 32]).expect("Invalid test signing key")
    }

    /// Base64 DER `SubjectPublicKeyInfo` of [`test_signing_key`].
    pub fn test_public_key_base64() -> String {
        let der = test_signing_key()
            .verifying_key()
            .to_public_key_der()
            .expect("should encode public key");
        general_purpose::STANDARD.encode(der.as_bytes())
    }

    /// Key record in the vendor's single-line PEM style.
    pub fn test_public_key(digest: &str) -> PublicKey {
        PublicKey {
            key_id: TEST_KID.to_string(),
            algorithm: "ECDSA".to_string(),
            digest: digest.to_string(),
            key: format!(
                "-----BEGIN PUBLIC KEY-----{}-----END PUBLIC KEY-----",
                test_public_key_base64()
            ),
        }
    }

    /// DER signature over `payload` using the given digest.
    pub fn sign_payload(payload: &[u8], digest: DigestAlgorithm) -> Vec<u8> {
        let prehash = digest.digest(payload);
        let signature: Signature = test_signing_key()
            .sign_prehash(&prehash)
            .expect("should sign prehash");
        signature.to_der().as_bytes().to_vec()
    }

    /// Value of the `x-ebay-signature` header for `payload`.
    pub fn signature_header(payload: &str, digest: DigestAlgorithm) -> String {
        SignatureEnvelope {
            algorithm: "ecdsa".to_string(),
            key_id: TEST_KID.to_string(),
            signature: sign_payload(payload.as_bytes(), digest),
            digest: digest.to_string(),
        }
        .encode()
        .expect("should encode signature header")
    }

    /// Key fetcher serving a fixed key table and counting calls.
    #[derive(Default)]
    pub struct MockKeyFetcher {
        keys: Mutex<HashMap<String, PublicKey>>,
        calls: AtomicUsize,
    }

    impl MockKeyFetcher {
        pub fn with_key(key: PublicKey) -> Self {
            let fetcher = Self::default();
            fetcher.insert(key);
            fetcher
        }

        pub fn insert(&self, key: PublicKey) {
            self.keys
                .lock()
                .expect("mock key table poisoned")
                .insert(key.key_id.clone(), key);
        }

        pub fn remove(&self, key_id: &str) {
            self.keys
                .lock()
                .expect("mock key table poisoned")
                .remove(key_id);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeyFetcher for MockKeyFetcher {
        async fn fetch(&self, key_id: &str) -> Result<PublicKey, Report<EventNotificationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let keys = self.keys.lock().expect("mock key table poisoned");
            keys.get(key_id).cloned().ok_or_else(|| {
                Report::new(EventNotificationError::KeyFetch {
                    message: format!("No key published for kid: {}", key_id),
                })
            })
        }
    }

    /// Token provider returning a fixed bearer token.
    pub struct StaticTokenProvider(pub String);

    #[async_trait]
    impl TokenProvider for StaticTokenProvider {
        async fn access_token(&self) -> Result<String, Report<EventNotificationError>> {
            Ok(self.0.clone())
        }
    }

    pub fn crate_test_settings_str() -> String {
        r#"
            [endpoint]
            url = "http://www.testendpoint.com/webhook"
            verification_token = "71745723-d031-455c-bfa5-f90d11b4f20a"

            [vendor]
            environment = "SANDBOX"
            app_id = "test-app-id"
            cert_id = "test-cert-id"

            [verification]
            backend = "rust_crypto"
            key_cache_ttl_secs = 3600

            [server]
            port = 8081
            "#
        .to_string()
    }

    pub fn create_test_settings() -> Settings {
        let toml_str = crate_test_settings_str();
        Settings::from_toml(&toml_str).expect("Invalid config")
    }
}
