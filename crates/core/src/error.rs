//! Error type for all ledger operations.
//!
//! Every business-rule failure raised inside an atomic unit carries a stable
//! wire code; the HTTP layer maps variants to status codes without string
//! matching. Any error returned from a mutation closure discards the whole
//! write batch.

use crate::types::BalanceField;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("unknown staking tier: {0}")]
    InvalidTier(String),

    #[error("amount out of range for tier (min {min}, max {max:?})")]
    AmountOutOfRange { min: Decimal, max: Option<Decimal> },

    #[error("insufficient {field:?} balance")]
    InsufficientBalance { field: BalanceField },

    #[error("account is already a founder")]
    AlreadyFounder,

    #[error("account already joined the trading hub")]
    AlreadyJoined,

    #[error("trading session not found: {0}")]
    SessionNotFound(String),

    #[error("trading session is not open")]
    SessionClosed,

    #[error("account not found: {0}")]
    UserNotFound(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("sponsor account missing from upline: {0}")]
    SponsorMissing(String),

    #[error("stake not found: {0}")]
    StakeNotFound(String),

    #[error("stake is not active: {0}")]
    StakeNotActive(String),

    #[error("transaction already processed: {0}")]
    AlreadyProcessed(String),

    #[error("webhook signature verification failed")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("store error: {0}")]
    Store(String),
}

impl CoreError {
    /// Stable error code exposed on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidTier(_) => "invalid_tier",
            CoreError::AmountOutOfRange { .. } => "amount_out_of_range",
            CoreError::InsufficientBalance { field } => match field {
                BalanceField::Trading => "insufficient_trading_balance",
                _ => "insufficient_balance",
            },
            CoreError::AlreadyFounder => "already_founder",
            CoreError::AlreadyJoined => "already_joined",
            CoreError::SessionNotFound(_) => "session_not_found",
            CoreError::SessionClosed => "session_closed",
            CoreError::UserNotFound(_) => "user_not_found",
            CoreError::AccountExists(_) => "account_exists",
            CoreError::SponsorMissing(_) => "sponsor_not_found",
            CoreError::StakeNotFound(_) => "stake_not_found",
            CoreError::StakeNotActive(_) => "stake_not_active",
            CoreError::AlreadyProcessed(_) => "already_processed",
            CoreError::InvalidSignature => "invalid_signature",
            CoreError::InvalidPayload(_) => "invalid_payload",
            CoreError::Store(_) => "internal",
        }
    }
}
