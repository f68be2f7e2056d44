//! In-memory document store and the atomic-unit primitive.
//!
//! # Atomic units
//!
//! [`Store::run_atomic`] is the sole sanctioned path for mutating balances and
//! appending ledger records. The mutation closure receives a consistent
//! [`StoreView`] over all documents and a [`WriteBatch`] of typed ops; the
//! batch is validated and applied only if the closure returns `Ok`. Either
//! every op in the batch becomes visible or none does.
//!
//! The write lock is held for the duration of a unit, so conflicting units on
//! the same documents are serialized. This is the in-process stand-in for the
//! managed document store's optimistic-concurrency retry; callers never
//! observe a partially applied batch either way.
//!
//! # Invariants enforced at apply time
//!
//! - every balance field is non-negative after the batch
//! - no two `Confirmed` ledger entries share a reference
//! - `is_founder` and `joined_trading_hub` transition false→true at most once
//! - stake accrual only touches `Active` stakes
//!
//! Seed and inspection helpers live outside the atomic path and are meant for
//! bootstrap and tests, in the manner of an ops/backfill tool.

use crate::error::CoreError;
use crate::settings::GlobalSettings;
use crate::types::{
    Account, BalanceField, Bet, Currency, EntryStatus, LedgerEntry, Payout, Stake, StakeStatus,
    TradingSession,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════════
// WRITE BATCH
// ════════════════════════════════════════════════════════════════════════════

/// One typed write produced inside an atomic unit.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Signed increment of a single balance field. Balances are never
    /// replaced wholesale; concurrent credits to one account compose.
    AdjustBalance {
        user_id: String,
        field: BalanceField,
        delta: Decimal,
    },
    InsertAccount(Account),
    InsertStake(Stake),
    InsertLedgerEntry(LedgerEntry),
    InsertPayout(Payout),
    SetFounder { user_id: String },
    SetJoinedTradingHub { user_id: String },
    UpsertBet(Bet),
    /// Advance a stake's accrual bookkeeping. When `compound` is set the
    /// accrued amount is folded into the principal instead of a balance
    /// credit. Never touches `daily_pct`.
    AccrueStake {
        stake_id: String,
        accrued: Decimal,
        compound: bool,
        at: u64,
    },
}

/// Ordered collection of writes produced by one mutation closure.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn adjust_balance(&mut self, user_id: &str, field: BalanceField, delta: Decimal) {
        self.ops.push(WriteOp::AdjustBalance {
            user_id: user_id.to_string(),
            field,
            delta,
        });
    }

    pub fn insert_account(&mut self, account: Account) {
        self.ops.push(WriteOp::InsertAccount(account));
    }

    pub fn insert_stake(&mut self, stake: Stake) {
        self.ops.push(WriteOp::InsertStake(stake));
    }

    pub fn insert_entry(&mut self, entry: LedgerEntry) {
        self.ops.push(WriteOp::InsertLedgerEntry(entry));
    }

    pub fn insert_payout(&mut self, payout: Payout) {
        self.ops.push(WriteOp::InsertPayout(payout));
    }

    pub fn set_founder(&mut self, user_id: &str) {
        self.ops.push(WriteOp::SetFounder {
            user_id: user_id.to_string(),
        });
    }

    pub fn set_joined_trading_hub(&mut self, user_id: &str) {
        self.ops.push(WriteOp::SetJoinedTradingHub {
            user_id: user_id.to_string(),
        });
    }

    pub fn upsert_bet(&mut self, bet: Bet) {
        self.ops.push(WriteOp::UpsertBet(bet));
    }

    pub fn accrue_stake(&mut self, stake_id: &str, accrued: Decimal, compound: bool, at: u64) {
        self.ops.push(WriteOp::AccrueStake {
            stake_id: stake_id.to_string(),
            accrued,
            compound,
            at,
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// READ VIEW
// ════════════════════════════════════════════════════════════════════════════

/// Consistent read view over all documents for the duration of one unit.
pub struct StoreView<'a> {
    inner: &'a StoreInner,
}

impl<'a> StoreView<'a> {
    pub fn settings(&self) -> &GlobalSettings {
        &self.inner.settings
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.inner.accounts.get(id)
    }

    /// Resolve an account by its registered deposit address for a currency.
    /// Address comparison is case-insensitive (hex addresses arrive in mixed
    /// case from the chain notifier).
    pub fn account_by_wallet(&self, currency: Currency, address: &str) -> Option<&Account> {
        self.inner.accounts.values().find(|a| {
            a.wallets
                .get(&currency)
                .map(|w| w.eq_ignore_ascii_case(address))
                .unwrap_or(false)
        })
    }

    pub fn session(&self, id: &str) -> Option<&TradingSession> {
        self.inner.sessions.get(id)
    }

    pub fn stake(&self, id: &str) -> Option<&Stake> {
        self.inner.stakes.get(id)
    }

    pub fn bet(&self, session_id: &str, user_id: &str) -> Option<&Bet> {
        self.inner
            .bets
            .get(&(session_id.to_string(), user_id.to_string()))
    }

    /// The idempotency lookup: is there a `Confirmed` entry with this
    /// external reference anywhere in the log?
    pub fn confirmed_entry_by_reference(&self, reference: &str) -> Option<&LedgerEntry> {
        self.inner
            .entries
            .iter()
            .find(|e| e.status == EntryStatus::Confirmed && e.reference == reference)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// STORE
// ════════════════════════════════════════════════════════════════════════════

struct StoreInner {
    settings: GlobalSettings,
    accounts: HashMap<String, Account>,
    stakes: HashMap<String, Stake>,
    entries: Vec<LedgerEntry>,
    payouts: Vec<Payout>,
    sessions: HashMap<String, TradingSession>,
    bets: HashMap<(String, String), Bet>,
}

/// The document store. Cheap to share behind an `Arc`.
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Store")
            .field("accounts", &inner.accounts.len())
            .field("stakes", &inner.stakes.len())
            .field("entries", &inner.entries.len())
            .field("payouts", &inner.payouts.len())
            .field("sessions", &inner.sessions.len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_settings(GlobalSettings::default())
    }

    pub fn with_settings(settings: GlobalSettings) -> Self {
        Store {
            inner: RwLock::new(StoreInner {
                settings,
                accounts: HashMap::new(),
                stakes: HashMap::new(),
                entries: Vec::new(),
                payouts: Vec::new(),
                sessions: HashMap::new(),
                bets: HashMap::new(),
            }),
        }
    }

    /// Run one atomic unit: snapshot reads, collect writes, commit
    /// all-or-nothing. Any `Err` from the closure or from batch validation
    /// leaves the store untouched.
    pub fn run_atomic<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&StoreView<'_>, &mut WriteBatch) -> Result<T, CoreError>,
    {
        let mut inner = self.inner.write();
        let mut batch = WriteBatch::default();
        let out = {
            let view = StoreView { inner: &inner };
            f(&view, &mut batch)?
        };
        let ops = batch.len();
        inner.apply(batch)?;
        debug!(ops, "atomic unit committed");
        Ok(out)
    }

    // ── seed & inspection (outside the atomic path) ─────────────────────────

    pub fn set_settings(&self, settings: GlobalSettings) {
        self.inner.write().settings = settings;
    }

    pub fn settings(&self) -> GlobalSettings {
        self.inner.read().settings.clone()
    }

    pub fn seed_account(&self, account: Account) {
        self.inner.write().accounts.insert(account.id.clone(), account);
    }

    pub fn seed_session(&self, session: TradingSession) {
        self.inner.write().sessions.insert(session.id.clone(), session);
    }

    pub fn account(&self, id: &str) -> Option<Account> {
        self.inner.read().accounts.get(id).cloned()
    }

    pub fn session(&self, id: &str) -> Option<TradingSession> {
        self.inner.read().sessions.get(id).cloned()
    }

    pub fn stake(&self, id: &str) -> Option<Stake> {
        self.inner.read().stakes.get(id).cloned()
    }

    pub fn stakes_for_user(&self, user_id: &str) -> Vec<Stake> {
        let inner = self.inner.read();
        let mut stakes: Vec<Stake> = inner
            .stakes
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        stakes.sort_by_key(|s| s.start_at);
        stakes
    }

    pub fn entries_for_user(&self, user_id: &str) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn entries_with_reference(&self, reference: &str) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|e| e.reference == reference)
            .cloned()
            .collect()
    }

    pub fn payouts_to_user(&self, user_id: &str) -> Vec<Payout> {
        self.inner
            .read()
            .payouts
            .iter()
            .filter(|p| p.to_user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn bet(&self, session_id: &str, user_id: &str) -> Option<Bet> {
        self.inner
            .read()
            .bets
            .get(&(session_id.to_string(), user_id.to_string()))
            .cloned()
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BATCH APPLICATION
// ════════════════════════════════════════════════════════════════════════════

impl StoreInner {
    /// Validate the whole batch first, then commit. The validation pass
    /// stages balance deltas so a batch that would drive any field negative
    /// is rejected before a single op lands.
    fn apply(&mut self, batch: WriteBatch) -> Result<(), CoreError> {
        self.validate(&batch)?;
        for op in batch.ops {
            self.commit_op(op);
        }
        Ok(())
    }

    fn validate(&self, batch: &WriteBatch) -> Result<(), CoreError> {
        let mut staged: HashMap<(String, BalanceField), Decimal> = HashMap::new();
        let mut new_accounts: HashSet<&str> = HashSet::new();
        let mut new_refs: HashSet<&str> = HashSet::new();
        let mut founder_set: HashSet<&str> = HashSet::new();
        let mut joined_set: HashSet<&str> = HashSet::new();

        for op in &batch.ops {
            match op {
                WriteOp::AdjustBalance {
                    user_id,
                    field,
                    delta,
                } => {
                    let base = match self.accounts.get(user_id) {
                        Some(a) => a.balances.get(*field),
                        None if new_accounts.contains(user_id.as_str()) => Decimal::ZERO,
                        None => return Err(CoreError::UserNotFound(user_id.clone())),
                    };
                    let key = (user_id.clone(), *field);
                    let entry = staged.entry(key).or_insert(base);
                    *entry += *delta;
                    if *entry < Decimal::ZERO {
                        return Err(CoreError::InsufficientBalance { field: *field });
                    }
                }
                WriteOp::InsertAccount(a) => {
                    if self.accounts.contains_key(&a.id) || !new_accounts.insert(&a.id) {
                        return Err(CoreError::AccountExists(a.id.clone()));
                    }
                }
                WriteOp::InsertStake(s) => {
                    if self.stakes.contains_key(&s.id) {
                        return Err(CoreError::Store(format!("duplicate stake id {}", s.id)));
                    }
                }
                WriteOp::InsertLedgerEntry(e) => {
                    if e.status == EntryStatus::Confirmed && !e.reference.is_empty() {
                        let dup = self
                            .entries
                            .iter()
                            .any(|x| x.status == EntryStatus::Confirmed && x.reference == e.reference)
                            || !new_refs.insert(&e.reference);
                        if dup {
                            return Err(CoreError::AlreadyProcessed(e.reference.clone()));
                        }
                    }
                }
                WriteOp::InsertPayout(_) => {}
                WriteOp::SetFounder { user_id } => {
                    let already = self
                        .accounts
                        .get(user_id)
                        .map(|a| a.is_founder)
                        .unwrap_or(false);
                    if already || !founder_set.insert(user_id) {
                        return Err(CoreError::AlreadyFounder);
                    }
                }
                WriteOp::SetJoinedTradingHub { user_id } => {
                    let already = self
                        .accounts
                        .get(user_id)
                        .map(|a| a.joined_trading_hub)
                        .unwrap_or(false);
                    if already || !joined_set.insert(user_id) {
                        return Err(CoreError::AlreadyJoined);
                    }
                }
                WriteOp::UpsertBet(b) => {
                    if !self.sessions.contains_key(&b.session_id) {
                        return Err(CoreError::SessionNotFound(b.session_id.clone()));
                    }
                }
                WriteOp::AccrueStake { stake_id, .. } => match self.stakes.get(stake_id) {
                    None => return Err(CoreError::StakeNotFound(stake_id.clone())),
                    Some(s) if s.status != StakeStatus::Active => {
                        return Err(CoreError::StakeNotActive(stake_id.clone()))
                    }
                    Some(_) => {}
                },
            }
        }
        Ok(())
    }

    fn commit_op(&mut self, op: WriteOp) {
        match op {
            WriteOp::AdjustBalance {
                user_id,
                field,
                delta,
            } => {
                if let Some(account) = self.accounts.get_mut(&user_id) {
                    *account.balances.get_mut(field) += delta;
                }
            }
            WriteOp::InsertAccount(a) => {
                self.accounts.insert(a.id.clone(), a);
            }
            WriteOp::InsertStake(s) => {
                self.stakes.insert(s.id.clone(), s);
            }
            WriteOp::InsertLedgerEntry(e) => {
                self.entries.push(e);
            }
            WriteOp::InsertPayout(p) => {
                self.payouts.push(p);
            }
            WriteOp::SetFounder { user_id } => {
                if let Some(account) = self.accounts.get_mut(&user_id) {
                    account.is_founder = true;
                }
            }
            WriteOp::SetJoinedTradingHub { user_id } => {
                if let Some(account) = self.accounts.get_mut(&user_id) {
                    account.joined_trading_hub = true;
                }
            }
            WriteOp::UpsertBet(b) => {
                self.bets
                    .insert((b.session_id.clone(), b.user_id.clone()), b);
            }
            WriteOp::AccrueStake {
                stake_id,
                accrued,
                compound,
                at,
            } => {
                if let Some(stake) = self.stakes.get_mut(&stake_id) {
                    stake.total_accrued += accrued;
                    stake.last_accrued_at = at;
                    if compound {
                        stake.amount += accrued;
                    }
                }
            }
        }
    }
}
