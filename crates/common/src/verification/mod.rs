//! Notification signature verification.
//!
//! This module resolves the vendor's published ECDSA keys and verifies
//! notification signatures against them, with two interchangeable
//! cryptographic backends.

pub mod backend;
pub mod envelope;
pub mod key_cache;
pub mod key_fetcher;
pub mod key_material;
pub mod validator;

pub use backend::*;
pub use envelope::*;
pub use key_cache::*;
pub use key_fetcher::*;
pub use validator::*;
