//! Shared application state for the HTTP surface.

use crate::config::Config;
use jsonwebtoken::DecodingKey;
use stakehub_core::types::{now_ms, Currency};
use stakehub_core::{Ledger, Store, TokenRegistry, WebhookProcessor};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub webhook: WebhookProcessor,
    pub decoding_key: Arc<DecodingKey>,
    pub started_at: u64,
}

impl AppState {
    pub fn new(cfg: &Config, store: Arc<Store>) -> Self {
        let mut registry = TokenRegistry::new();
        if let Some(tokens) = &cfg.tokens {
            for (address, code) in tokens {
                match Currency::parse(code) {
                    Some(currency) => registry.register(address.clone(), currency),
                    None => warn!(address = %address, code = %code, "unknown currency in token allow-list, skipping"),
                }
            }
        }
        AppState {
            ledger: Ledger::new(Arc::clone(&store)),
            webhook: WebhookProcessor::new(store, registry, cfg.webhook_secret()),
            decoding_key: Arc::new(DecodingKey::from_secret(cfg.auth_secret().as_bytes())),
            started_at: now_ms(),
        }
    }
}
