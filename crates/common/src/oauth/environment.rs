use serde::{Deserialize, Serialize};

/// Vendor environment an application is registered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OAuthEnvironment {
    #[default]
    Production,
    Sandbox,
}

impl OAuthEnvironment {
    /// API host used to key per-environment state.
    #[must_use]
    pub fn config_identifier(self) -> &'static str {
        match self {
            Self::Production => "api.ebay.com",
            Self::Sandbox => "api.sandbox.ebay.com",
        }
    }

    /// Token endpoint for the client credentials grant.
    #[must_use]
    pub fn api_endpoint(self) -> &'static str {
        match self {
            Self::Production => "https://api.ebay.com/identity/v1/oauth2/token",
            Self::Sandbox => "https://api.sandbox.ebay.com/identity/v1/oauth2/token",
        }
    }

    /// Base of the notification public key resource. The key id is appended.
    #[must_use]
    pub fn public_key_endpoint(self) -> &'static str {
        match self {
            Self::Production => "https://api.ebay.com/commerce/notification/v1/public_key/",
            Self::Sandbox => "https://api.sandbox.ebay.com/commerce/notification/v1/public_key/",
        }
    }
}
