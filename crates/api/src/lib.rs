//! # StakeHub API
//!
//! HTTP surface for the StakeHub ledger core. Thin JSON handlers over
//! `stakehub_core`; authentication is bearer-token verification against the
//! external identity provider's shared secret, the deposit webhook is
//! HMAC-signed by the chain notifier.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
