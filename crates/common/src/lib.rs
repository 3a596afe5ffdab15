//! Trust verification for eBay event notifications.
//!
//! This crate authenticates inbound notification webhooks and answers the
//! endpoint ownership handshake. It is transport agnostic: the server crate
//! wires it into HTTP routes.
//!
//! # Modules
//!
//! - [`challenge`]: Endpoint challenge response generation
//! - [`constants`]: Header names, routes and default scopes
//! - [`error`]: Error types and HTTP status mapping
//! - [`models`]: Notification, public key and handshake models
//! - [`oauth`]: Application token client and cache for vendor API calls
//! - [`processor`]: Per-topic handling of verified notifications
//! - [`serializer`]: Canonical JSON encoding of notifications
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and mocks
//! - [`verification`]: Key resolution, caching and signature verification

pub mod challenge;
pub mod constants;
pub mod error;
pub mod models;
pub mod oauth;
pub mod processor;
pub mod serializer;
pub mod settings;
pub mod test_support;
pub mod verification;
