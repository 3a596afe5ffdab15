//! OAuth application tokens for outbound vendor calls.
//!
//! - [`OAuthClient`]: client credentials grant against the vendor token endpoint
//! - [`AppTokenCache`]: per-environment token cache owned by the caller
//! - [`OAuthEnvironment`]: production and sandbox endpoints

use async_trait::async_trait;
use error_stack::Report;

use crate::error::EventNotificationError;

pub mod client;
pub mod environment;
pub mod token_cache;

pub use client::{Credentials, OAuthClient};
pub use environment::OAuthEnvironment;
pub use token_cache::{AppToken, AppTokenCache};

/// Source of bearer tokens for authenticated vendor requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a currently valid access token.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::OAuthToken`] when no token can be obtained.
    async fn access_token(&self) -> Result<String, Report<EventNotificationError>>;
}
