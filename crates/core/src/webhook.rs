//! Deposit webhook processor.
//!
//! Pipeline per inbound chain event:
//! `received → signature-verified → deduplicated → resolved → credited`,
//! with rejection at any stage. Webhook delivery is at-least-once, so the
//! dedupe step against the confirmed ledger log is mandatory — replaying the
//! same transaction hash must never double-credit.

use crate::error::CoreError;
use crate::store::Store;
use crate::types::{
    new_id, now_ms, Currency, EntryKind, EntryStatus, LedgerEntry,
};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

// ════════════════════════════════════════════════════════════════════════════
// SIGNATURE VERIFICATION
// ════════════════════════════════════════════════════════════════════════════

/// HMAC-SHA256 over the raw request body, constant-time compared against the
/// hex signature from the `x-signature` header.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let sig_bytes = match hex::decode(signature_hex.trim()) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Hex signature for a body; used by senders and tests.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

// ════════════════════════════════════════════════════════════════════════════
// EVENT SHAPE
// ════════════════════════════════════════════════════════════════════════════

// The notifier wraps each transfer in a deeply nested envelope; only the
// first activity of a block event is relevant to deposits.

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    event: Option<EventBody>,
}

#[derive(Debug, Deserialize)]
struct EventBody {
    data: Option<EventData>,
}

#[derive(Debug, Deserialize)]
struct EventData {
    block: Option<EventBlock>,
}

#[derive(Debug, Deserialize)]
struct EventBlock {
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Activity {
    category: String,
    hash: String,
    from_address: String,
    #[allow(dead_code)]
    to_address: Option<String>,
    raw_contract: RawContract,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    /// Hex-encoded token amount, e.g. "0x2386f26fc10000".
    raw_value: String,
    /// Hex-encoded decimal count, e.g. "0x12" for 18.
    decimal: String,
    /// Token contract address.
    address: String,
}

/// Parse a 0x-prefixed (or bare) hex quantity.
fn parse_hex_u128(s: &str) -> Option<u128> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    if stripped.is_empty() {
        return None;
    }
    u128::from_str_radix(stripped, 16).ok()
}

// ════════════════════════════════════════════════════════════════════════════
// TOKEN REGISTRY
// ════════════════════════════════════════════════════════════════════════════

/// Static allow-list mapping token contract addresses to currencies. Events
/// for anything else are acknowledged and ignored; the chain emits plenty of
/// irrelevant transfers.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    contracts: HashMap<String, Currency>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Currency)>,
        S: Into<String>,
    {
        let mut registry = TokenRegistry::new();
        for (addr, currency) in pairs {
            registry.register(addr, currency);
        }
        registry
    }

    pub fn register(&mut self, address: impl Into<String>, currency: Currency) {
        self.contracts
            .insert(address.into().to_ascii_lowercase(), currency);
    }

    pub fn resolve(&self, address: &str) -> Option<Currency> {
        self.contracts.get(&address.to_ascii_lowercase()).copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PROCESSOR
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of processing one webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// A deposit was credited and logged.
    Credited {
        user_id: String,
        currency: Currency,
        amount: Decimal,
    },
    /// The event is not a deposit we care about; acknowledged without writes.
    Ignored(&'static str),
}

/// Stateless-per-request processor over the shared store.
#[derive(Clone)]
pub struct WebhookProcessor {
    store: Arc<Store>,
    registry: TokenRegistry,
    secret: String,
}

impl WebhookProcessor {
    pub fn new(store: Arc<Store>, registry: TokenRegistry, secret: impl Into<String>) -> Self {
        WebhookProcessor {
            store,
            registry,
            secret: secret.into(),
        }
    }

    /// Run the full pipeline for one delivery. The balance credit and the
    /// confirmed ledger entry commit as one atomic unit, with the dedupe
    /// check inside the same unit.
    pub fn process(&self, body: &[u8], signature: &str) -> Result<WebhookOutcome, CoreError> {
        if !verify_signature(&self.secret, body, signature) {
            warn!("webhook rejected: bad signature");
            return Err(CoreError::InvalidSignature);
        }

        let envelope: WebhookEnvelope = serde_json::from_slice(body)
            .map_err(|e| CoreError::InvalidPayload(format!("malformed webhook body: {e}")))?;
        let activity = match envelope
            .event
            .and_then(|e| e.data)
            .and_then(|d| d.block)
            .and_then(|b| b.activities.into_iter().next())
        {
            Some(a) => a,
            None => return Ok(WebhookOutcome::Ignored("no activity")),
        };
        if activity.category != "token" {
            return Ok(WebhookOutcome::Ignored("not a token transfer"));
        }

        let currency = match self.registry.resolve(&activity.raw_contract.address) {
            Some(c) => c,
            None => return Ok(WebhookOutcome::Ignored("unsupported token")),
        };

        let raw_value = parse_hex_u128(&activity.raw_contract.raw_value)
            .ok_or_else(|| CoreError::InvalidPayload("bad rawValue".into()))?;
        let decimals = parse_hex_u128(&activity.raw_contract.decimal)
            .ok_or_else(|| CoreError::InvalidPayload("bad decimal count".into()))?;
        if decimals > 28 {
            return Err(CoreError::InvalidPayload("decimal count out of range".into()));
        }
        let amount = i128::try_from(raw_value)
            .ok()
            .and_then(|v| Decimal::try_from_i128_with_scale(v, decimals as u32).ok())
            .ok_or_else(|| CoreError::InvalidPayload("rawValue out of range".into()))?;
        if amount <= Decimal::ZERO {
            return Ok(WebhookOutcome::Ignored("zero-value transfer"));
        }

        let tx_hash = activity.hash;
        let from_address = activity.from_address;

        let outcome = self.store.run_atomic(|view, batch| {
            if view.confirmed_entry_by_reference(&tx_hash).is_some() {
                return Err(CoreError::AlreadyProcessed(tx_hash.clone()));
            }
            let account = view
                .account_by_wallet(currency, &from_address)
                .ok_or_else(|| CoreError::UserNotFound(from_address.clone()))?;
            let user_id = account.id.clone();

            batch.adjust_balance(&user_id, currency.balance_field(), amount);
            batch.insert_entry(LedgerEntry {
                id: new_id(),
                user_id: user_id.clone(),
                kind: EntryKind::Deposit,
                currency,
                amount,
                status: EntryStatus::Confirmed,
                reference: tx_hash.clone(),
                meta: serde_json::json!({
                    "network": "BEP-20",
                    "txHash": tx_hash,
                    "fromAddress": from_address,
                }),
                created_at: now_ms(),
            });
            Ok(WebhookOutcome::Credited {
                user_id,
                currency,
                amount,
            })
        })?;

        if let WebhookOutcome::Credited {
            ref user_id,
            currency,
            amount,
        } = outcome
        {
            info!(user = %user_id, currency = currency.code(), %amount, "deposit credited");
        }
        Ok(outcome)
    }
}
