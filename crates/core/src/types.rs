//! Domain records: accounts, stakes, ledger entries, payouts, trading sessions.
//!
//! All money fields are `rust_decimal::Decimal`. Balance fields are only ever
//! mutated through [`crate::store::WriteOp::AdjustBalance`] increments inside
//! an atomic unit, never by replacing a whole record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ════════════════════════════════════════════════════════════════════════════
// CURRENCIES & BALANCES
// ════════════════════════════════════════════════════════════════════════════

/// Supported deposit/withdrawal currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usdt,
    Bnb,
    Phi,
}

impl Currency {
    /// Parse a currency code case-insensitively (clients send "usdt"/"USDT").
    pub fn parse(s: &str) -> Option<Currency> {
        match s.to_ascii_uppercase().as_str() {
            "USDT" => Some(Currency::Usdt),
            "BNB" => Some(Currency::Bnb),
            "PHI" => Some(Currency::Phi),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Bnb => "BNB",
            Currency::Phi => "PHI",
        }
    }

    /// The spot balance field holding this currency.
    pub fn balance_field(&self) -> BalanceField {
        match self {
            Currency::Usdt => BalanceField::Usdt,
            Currency::Bnb => BalanceField::Bnb,
            Currency::Phi => BalanceField::Phi,
        }
    }
}

/// Named balance fields on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    Usdt,
    Bnb,
    Phi,
    Reward,
    Commission,
    Trading,
}

impl BalanceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceField::Usdt => "usdt",
            BalanceField::Bnb => "bnb",
            BalanceField::Phi => "phi",
            BalanceField::Reward => "reward",
            BalanceField::Commission => "commission",
            BalanceField::Trading => "trading",
        }
    }
}

/// Per-account balance set. Every field is non-negative after any committed
/// atomic unit; the store enforces this when applying a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub usdt: Decimal,
    pub bnb: Decimal,
    pub phi: Decimal,
    pub reward: Decimal,
    pub commission: Decimal,
    pub trading: Decimal,
}

impl Balances {
    pub fn get(&self, field: BalanceField) -> Decimal {
        match field {
            BalanceField::Usdt => self.usdt,
            BalanceField::Bnb => self.bnb,
            BalanceField::Phi => self.phi,
            BalanceField::Reward => self.reward,
            BalanceField::Commission => self.commission,
            BalanceField::Trading => self.trading,
        }
    }

    pub fn get_mut(&mut self, field: BalanceField) -> &mut Decimal {
        match field {
            BalanceField::Usdt => &mut self.usdt,
            BalanceField::Bnb => &mut self.bnb,
            BalanceField::Phi => &mut self.phi,
            BalanceField::Reward => &mut self.reward,
            BalanceField::Commission => &mut self.commission,
            BalanceField::Trading => &mut self.trading,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ACCOUNT
// ════════════════════════════════════════════════════════════════════════════

/// Referral metadata materialized once at signup.
///
/// `path` is the full ancestor chain ordered nearest-first: `path[0]` is the
/// direct sponsor, `path[1]` the sponsor's sponsor, and so on. Commission
/// fanout indexes this list directly and never walks the referral graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub sponsor_id: Option<String>,
    pub path: Vec<String>,
    pub level: u32,
}

/// Per-user account document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balances: Balances,
    /// Registered deposit addresses per currency, used by the webhook
    /// processor to resolve an inbound transfer back to an account.
    pub wallets: HashMap<Currency, String>,
    pub referral: Referral,
    /// One-time, irreversible upgrade flag.
    pub is_founder: bool,
    /// One-time trading-hub join gate.
    pub joined_trading_hub: bool,
    pub created_at: u64,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Account {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            balances: Balances::default(),
            wallets: HashMap::new(),
            referral: Referral::default(),
            is_founder: false,
            joined_trading_hub: false,
            created_at: now_ms(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// STAKE
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeStatus {
    Active,
    Completed,
    Cancelled,
}

/// A principal-locking investment record.
///
/// `daily_pct` is copied from the package definition at creation time and is
/// immutable afterwards; later settings changes never affect existing stakes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stake {
    pub id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub tier: String,
    pub daily_pct: Decimal,
    pub auto_compound: bool,
    pub status: StakeStatus,
    pub term_days: u32,
    pub start_at: u64,
    pub last_accrued_at: u64,
    pub total_accrued: Decimal,
}

// ════════════════════════════════════════════════════════════════════════════
// LEDGER ENTRIES
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    StakeOpen,
    FounderPurchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Reviewing,
    Confirmed,
    Failed,
}

/// Append-only record of one balance-affecting event.
///
/// `amount` is signed: credits positive, debits negative. `reference` is the
/// external idempotency key (blockchain tx hash for deposits); no two
/// `Confirmed` entries may share one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub kind: EntryKind,
    pub currency: Currency,
    pub amount: Decimal,
    pub status: EntryStatus,
    pub reference: String,
    pub meta: serde_json::Value,
    pub created_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// PAYOUTS
// ════════════════════════════════════════════════════════════════════════════

/// What kind of event produced a commission credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutSource {
    DirectSpot,
    StakeDaily,
    TradingHub,
}

/// Immutable record of one commission credit to one upline sponsor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub to_user_id: String,
    pub from_user_id: String,
    pub source: PayoutSource,
    /// Upline level, 1-indexed: 1 = direct sponsor.
    pub level: u8,
    pub amount: Decimal,
    pub stake_id: Option<String>,
    pub created_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// TRADING HUB
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
    Settled,
}

/// One trading-hub round. Opening and settling sessions is an external batch
/// concern; this core only reads the status gate when placing bets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSession {
    pub id: String,
    pub status: SessionStatus,
    pub opened_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetDirection {
    Rise,
    Fall,
}

impl BetDirection {
    pub fn parse(s: &str) -> Option<BetDirection> {
        match s {
            "rise" => Some(BetDirection::Rise),
            "fall" => Some(BetDirection::Fall),
            _ => None,
        }
    }
}

/// A live position in one session. Keyed by `(session_id, user_id)`; a second
/// bet from the same user in the same session overwrites the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub session_id: String,
    pub user_id: String,
    pub direction: BetDirection,
    pub amount: Decimal,
    pub placed_at: u64,
}

impl Bet {
    /// Stable bet identifier: one live position per user per session.
    pub fn bet_id(&self) -> String {
        format!("{}:{}", self.session_id, self.user_id)
    }
}
