//! HTTP adapter for the notification receiver.
//!
//! Serves the notification webhook and the endpoint challenge on
//! [`WEBHOOK_PATH`]:
//!
//! - `POST` verifies `x-ebay-signature` and dispatches the message:
//!   `204` when processed, `412` on signature mismatch, `500` on any failure.
//! - `GET ?challenge_code=` answers the ownership handshake: `200` or `500`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use error_stack::{Report, ResultExt};
use serde::Deserialize;

use event_notification_common::challenge::EndpointValidator;
use event_notification_common::constants::{HEADER_X_EBAY_SIGNATURE, WEBHOOK_PATH};
use event_notification_common::error::EventNotificationError;
use event_notification_common::models::Message;
use event_notification_common::oauth::{AppTokenCache, OAuthClient};
use event_notification_common::processor::ProcessorRegistry;
use event_notification_common::settings::Settings;
use event_notification_common::verification::{
    HttpKeyFetcher, PublicKeyCache, SignatureValidator,
};

pub mod error;
use crate::error::{to_error_response, to_internal_error_response};

/// Collaborators shared by the handlers.
pub struct AppState {
    pub validator: SignatureValidator,
    pub endpoint_validator: EndpointValidator,
    pub processors: ProcessorRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(
        validator: SignatureValidator,
        endpoint_validator: EndpointValidator,
        processors: ProcessorRegistry,
    ) -> Self {
        Self {
            validator,
            endpoint_validator,
            processors,
        }
    }

    /// Wires the OAuth client, key fetcher, key cache and verifier backend
    /// from settings.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::Configuration`] if the HTTP client or
    /// any vendor endpoint cannot be set up.
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<EventNotificationError>> {
        let client = reqwest::Client::builder()
            .timeout(settings.verification.key_fetch_timeout())
            .build()
            .change_context(EventNotificationError::Configuration {
                message: "Failed to build HTTP client".to_string(),
            })?;

        let token_provider = Arc::new(OAuthClient::from_settings(
            settings,
            client.clone(),
            Arc::new(AppTokenCache::new()),
        )?);
        let fetcher = Arc::new(HttpKeyFetcher::from_settings(
            settings,
            client,
            token_provider,
        )?);
        let cache = Arc::new(PublicKeyCache::with_ttl(
            fetcher,
            settings.verification.key_cache_ttl(),
        ));

        log::info!(
            "Verifying notifications with the {:?} backend, key ttl {}s",
            settings.verification.backend,
            settings.verification.key_cache_ttl_secs
        );

        Ok(Self::new(
            SignatureValidator::new(cache, settings.verification.backend.build()),
            EndpointValidator::from_settings(settings),
            ProcessorRegistry::with_defaults(),
        ))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle_notification).get(handle_challenge))
        .with_state(state)
}

/// POST webhook: verify, then dispatch.
async fn handle_notification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(message): Json<Message>,
) -> Response {
    let Some(signature) = headers
        .get(HEADER_X_EBAY_SIGNATURE)
        .and_then(|value| value.to_str().ok())
    else {
        log::error!("Signature validation processing failure: missing signature header");
        return to_internal_error_response(Report::new(
            EventNotificationError::SignatureValidation {
                message: format!("Missing {} header", HEADER_X_EBAY_SIGNATURE),
            },
        ));
    };

    match state.validator.validate(&message, signature).await {
        Ok(true) => match state.processors.dispatch(&message).await {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(e) => {
                log::error!("Notification processing failure: {:?}", e);
                to_internal_error_response(e)
            }
        },
        Ok(false) => StatusCode::PRECONDITION_FAILED.into_response(),
        Err(e) => {
            log::error!("Signature validation processing failure: {:?}", e);
            to_internal_error_response(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeQuery {
    challenge_code: Option<String>,
}

/// GET webhook: endpoint ownership handshake.
async fn handle_challenge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChallengeQuery>,
) -> Response {
    let challenge_code = query.challenge_code.unwrap_or_default();

    match state
        .endpoint_validator
        .generate_challenge_response(&challenge_code)
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            log::error!("Endpoint validation failure: {:?}", e);
            to_error_response(e)
        }
    }
}
