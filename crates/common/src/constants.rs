use http::header::HeaderName;

pub const HEADER_X_EBAY_SIGNATURE: HeaderName = HeaderName::from_static("x-ebay-signature");

/// Route serving both the notification POST and the challenge GET.
pub const WEBHOOK_PATH: &str = "/ebay-event-notification/webhook";

/// Query parameter carrying the handshake nonce.
pub const CHALLENGE_CODE_PARAM: &str = "challenge_code";

/// Scope required to read notification public keys.
pub const DEFAULT_API_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";
