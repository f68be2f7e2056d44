//! Ledger operations: the only code that moves money.
//!
//! Every operation runs as one atomic unit against the [`Store`]: settings
//! and the touched accounts are read inside the unit, preconditions are
//! checked against that snapshot, and all writes commit together or not at
//! all. Nothing here retries; webhook redelivery and client resubmission are
//! the callers' concern, enabled by the idempotency guarantees below.

use crate::commission::distribute;
use crate::error::CoreError;
use crate::store::Store;
use crate::types::{
    new_id, now_ms, Account, BalanceField, Bet, BetDirection, Currency, EntryKind, EntryStatus,
    LedgerEntry, PayoutSource, Referral, Stake, StakeStatus,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Maximum upline depth for spot and staking-reward commission.
pub const AFFILIATE_LEVELS: u8 = 5;
/// Maximum upline depth for the trading-hub profit/loss split.
pub const TRADING_HUB_LEVELS: u8 = 6;

// ════════════════════════════════════════════════════════════════════════════
// OPERATION INPUTS & OUTPUTS
// ════════════════════════════════════════════════════════════════════════════

/// Signup input. Wallet addresses are assigned by the custody layer before
/// registration reaches the ledger.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub sponsor_id: Option<String>,
    pub wallets: HashMap<Currency, String>,
}

/// Result of a successful stake opening.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedStake {
    pub stake_id: String,
    pub daily_pct: Decimal,
}

/// Result of a trading-hub join. `joined_now` is false for the idempotent
/// repeat call; `gift` is the amount actually credited.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub joined_now: bool,
    pub gift: Decimal,
}

/// Result of one daily accrual on one stake.
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualOutcome {
    pub accrued: Decimal,
    pub compounded: bool,
    pub commission_total: Decimal,
}

// ════════════════════════════════════════════════════════════════════════════
// LEDGER SERVICE
// ════════════════════════════════════════════════════════════════════════════

/// The ledger service. Cheap to clone; shares one store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<Store>,
}

impl Ledger {
    pub fn new(store: Arc<Store>) -> Self {
        Ledger { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Create an account, materializing the referral path at signup: the
    /// direct sponsor is prepended to the sponsor's own path, so `path[0]`
    /// is always the nearest ancestor. The path is never recomputed later.
    pub fn register_account(&self, input: NewAccount) -> Result<Account, CoreError> {
        let account = self.store.run_atomic(|view, batch| {
            if view.account(&input.user_id).is_some() {
                return Err(CoreError::AccountExists(input.user_id.clone()));
            }
            let referral = match &input.sponsor_id {
                Some(sponsor_id) => {
                    let sponsor = view
                        .account(sponsor_id)
                        .ok_or_else(|| CoreError::SponsorMissing(sponsor_id.clone()))?;
                    let mut path = Vec::with_capacity(sponsor.referral.path.len() + 1);
                    path.push(sponsor_id.clone());
                    path.extend(sponsor.referral.path.iter().cloned());
                    Referral {
                        sponsor_id: Some(sponsor_id.clone()),
                        path,
                        level: sponsor.referral.level + 1,
                    }
                }
                None => Referral::default(),
            };
            let account = Account {
                id: input.user_id.clone(),
                name: input.name.clone(),
                email: input.email.clone(),
                balances: Default::default(),
                wallets: input.wallets.clone(),
                referral,
                is_founder: false,
                joined_trading_hub: false,
                created_at: now_ms(),
            };
            batch.insert_account(account.clone());
            Ok(account)
        })?;
        info!(user = %account.id, level = account.referral.level, "account registered");
        Ok(account)
    }

    /// Open a stake: validate tier and bounds, deduct the principal, create
    /// the stake with its locked-in daily percentage, log the purchase, and
    /// fan out spot commission to the upline — one atomic unit.
    pub fn open_stake(
        &self,
        user_id: &str,
        amount: Decimal,
        tier: &str,
        auto_compound: bool,
    ) -> Result<OpenedStake, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidPayload("amount must be positive".into()));
        }
        let opened = self.store.run_atomic(|view, batch| {
            let settings = view.settings();
            let pkg = settings
                .staking
                .packages
                .get(tier)
                .ok_or_else(|| CoreError::InvalidTier(tier.to_string()))?;
            if amount < pkg.min || pkg.max.map(|max| amount > max).unwrap_or(false) {
                return Err(CoreError::AmountOutOfRange {
                    min: pkg.min,
                    max: pkg.max,
                });
            }
            let account = view
                .account(user_id)
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            if account.balances.usdt < amount {
                return Err(CoreError::InsufficientBalance {
                    field: BalanceField::Usdt,
                });
            }

            let stake_id = new_id();
            let now = now_ms();
            batch.adjust_balance(user_id, BalanceField::Usdt, -amount);
            batch.insert_stake(Stake {
                id: stake_id.clone(),
                user_id: user_id.to_string(),
                amount,
                tier: tier.to_string(),
                daily_pct: pkg.daily_pct,
                auto_compound,
                status: StakeStatus::Active,
                term_days: settings.staking.term_days,
                start_at: now,
                last_accrued_at: now,
                total_accrued: Decimal::ZERO,
            });
            batch.insert_entry(LedgerEntry {
                id: new_id(),
                user_id: user_id.to_string(),
                kind: EntryKind::StakeOpen,
                currency: Currency::Usdt,
                amount: -amount,
                status: EntryStatus::Confirmed,
                reference: format!("STAKE-{stake_id}"),
                meta: serde_json::json!({ "tier": tier, "autoCompound": auto_compound }),
                created_at: now,
            });

            distribute(
                view,
                batch,
                user_id,
                amount,
                &account.referral.path,
                &settings.affiliate.spot,
                PayoutSource::DirectSpot,
                AFFILIATE_LEVELS,
                Some(&stake_id),
            )?;

            Ok(OpenedStake {
                stake_id,
                daily_pct: pkg.daily_pct,
            })
        })?;
        info!(user = %user_id, stake = %opened.stake_id, %amount, tier, "stake opened");
        Ok(opened)
    }

    /// One-time founder upgrade. Charges the configured cost exactly once;
    /// a repeat call fails with `already_founder` and changes nothing.
    pub fn become_founder(&self, user_id: &str) -> Result<Decimal, CoreError> {
        let cost = self.store.run_atomic(|view, batch| {
            let settings = view.settings();
            let cost = settings.founder_cost;
            let account = view
                .account(user_id)
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            if account.is_founder {
                return Err(CoreError::AlreadyFounder);
            }
            if account.balances.usdt < cost {
                return Err(CoreError::InsufficientBalance {
                    field: BalanceField::Usdt,
                });
            }
            batch.adjust_balance(user_id, BalanceField::Usdt, -cost);
            batch.set_founder(user_id);
            batch.insert_entry(LedgerEntry {
                id: new_id(),
                user_id: user_id.to_string(),
                kind: EntryKind::FounderPurchase,
                currency: Currency::Usdt,
                amount: -cost,
                status: EntryStatus::Confirmed,
                reference: format!("FOUNDER-{user_id}"),
                meta: serde_json::json!({ "description": "Founder membership purchase" }),
                created_at: now_ms(),
            });
            Ok(cost)
        })?;
        info!(user = %user_id, %cost, "founder membership purchased");
        Ok(cost)
    }

    /// Idempotent trading-hub join: the free gift is credited on the first
    /// call only, the second call is a no-op success.
    pub fn join_trading_hub(&self, user_id: &str) -> Result<JoinOutcome, CoreError> {
        let outcome = self.store.run_atomic(|view, batch| {
            let gift = view.settings().affiliate.trading_hub.free_join_gift;
            let account = view
                .account(user_id)
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            if account.joined_trading_hub {
                return Ok(JoinOutcome {
                    joined_now: false,
                    gift: Decimal::ZERO,
                });
            }
            batch.set_joined_trading_hub(user_id);
            batch.adjust_balance(user_id, BalanceField::Trading, gift);
            Ok(JoinOutcome {
                joined_now: true,
                gift,
            })
        })?;
        if outcome.joined_now {
            info!(user = %user_id, gift = %outcome.gift, "joined trading hub");
        }
        Ok(outcome)
    }

    /// Place (or replace) a bet in an open session. The new amount is
    /// deducted from the trading balance and the position upserted; one live
    /// position per user per session. Settlement is an external batch.
    pub fn place_bet(
        &self,
        user_id: &str,
        session_id: &str,
        direction: BetDirection,
        amount: Decimal,
    ) -> Result<String, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidPayload("amount must be positive".into()));
        }
        let bet_id = self.store.run_atomic(|view, batch| {
            let session = view
                .session(session_id)
                .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
            if session.status != crate::types::SessionStatus::Open {
                return Err(CoreError::SessionClosed);
            }
            let account = view
                .account(user_id)
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            if account.balances.trading < amount {
                return Err(CoreError::InsufficientBalance {
                    field: BalanceField::Trading,
                });
            }
            batch.adjust_balance(user_id, BalanceField::Trading, -amount);
            let bet = Bet {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
                direction,
                amount,
                placed_at: now_ms(),
            };
            let bet_id = bet.bet_id();
            batch.upsert_bet(bet);
            Ok(bet_id)
        })?;
        info!(user = %user_id, session = %session_id, %amount, ?direction, "bet placed");
        Ok(bet_id)
    }

    /// Log a user-submitted deposit request for external review. No balance
    /// changes here; the on-chain webhook (or a reviewer) confirms later.
    pub fn request_deposit(
        &self,
        user_id: &str,
        amount: Decimal,
        currency: Currency,
        tx_hash: &str,
    ) -> Result<String, CoreError> {
        if amount <= Decimal::ZERO || tx_hash.is_empty() {
            return Err(CoreError::InvalidPayload(
                "amount must be positive and txHash present".into(),
            ));
        }
        self.store.run_atomic(|view, batch| {
            if view.account(user_id).is_none() {
                return Err(CoreError::UserNotFound(user_id.to_string()));
            }
            let id = new_id();
            batch.insert_entry(LedgerEntry {
                id: id.clone(),
                user_id: user_id.to_string(),
                kind: EntryKind::Deposit,
                currency,
                amount,
                status: EntryStatus::Reviewing,
                reference: tx_hash.to_string(),
                meta: serde_json::json!({ "network": "BEP-20", "txHash": tx_hash }),
                created_at: now_ms(),
            });
            Ok(id)
        })
    }

    /// Deduct the amount up front and log a `Reviewing` withdrawal. The
    /// external reviewer either pays out (status → confirmed) or fails the
    /// entry and refunds; both transitions live outside this core.
    pub fn request_withdrawal(
        &self,
        user_id: &str,
        amount: Decimal,
        currency: Currency,
    ) -> Result<String, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidPayload("amount must be positive".into()));
        }
        let id = self.store.run_atomic(|view, batch| {
            let field = currency.balance_field();
            let account = view
                .account(user_id)
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            if account.balances.get(field) < amount {
                return Err(CoreError::InsufficientBalance { field });
            }
            let id = new_id();
            batch.adjust_balance(user_id, field, -amount);
            batch.insert_entry(LedgerEntry {
                id: id.clone(),
                user_id: user_id.to_string(),
                kind: EntryKind::Withdrawal,
                currency,
                amount: -amount,
                status: EntryStatus::Reviewing,
                reference: format!("WD-{id}"),
                meta: serde_json::json!({ "network": "BEP-20" }),
                created_at: now_ms(),
            });
            Ok(id)
        })?;
        info!(user = %user_id, %amount, currency = currency.code(), "withdrawal requested");
        Ok(id)
    }

    /// One daily accrual for one stake: credit `amount × daily_pct` to the
    /// owner (reward balance, or compounded into the principal) and fan out
    /// staking-reward commission over the upline. Invoked per-stake by the
    /// external daily job.
    pub fn accrue_stake_daily(&self, stake_id: &str) -> Result<AccrualOutcome, CoreError> {
        let outcome = self.store.run_atomic(|view, batch| {
            let stake = view
                .stake(stake_id)
                .ok_or_else(|| CoreError::StakeNotFound(stake_id.to_string()))?;
            if stake.status != StakeStatus::Active {
                return Err(CoreError::StakeNotActive(stake_id.to_string()));
            }
            let account = view
                .account(&stake.user_id)
                .ok_or_else(|| CoreError::UserNotFound(stake.user_id.clone()))?;
            let settings = view.settings();

            // accrual rate was locked in at stake creation
            let accrued = stake.amount * stake.daily_pct;
            batch.accrue_stake(stake_id, accrued, stake.auto_compound, now_ms());
            if !stake.auto_compound {
                batch.adjust_balance(&stake.user_id, BalanceField::Reward, accrued);
            }

            let commission_total = distribute(
                view,
                batch,
                &stake.user_id,
                accrued,
                &account.referral.path,
                &settings.affiliate.staking,
                PayoutSource::StakeDaily,
                AFFILIATE_LEVELS,
                Some(stake_id),
            )?;

            Ok(AccrualOutcome {
                accrued,
                compounded: stake.auto_compound,
                commission_total,
            })
        })?;
        info!(
            stake = %stake_id,
            accrued = %outcome.accrued,
            compounded = outcome.compounded,
            "daily accrual applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use crate::types::TradingSession;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(Store::new()))
    }

    fn seed_user(ledger: &Ledger, id: &str, usdt: i64) {
        let mut account = Account::new(id);
        account.balances.usdt = Decimal::from(usdt);
        ledger.store().seed_account(account);
    }

    fn seed_chain(ledger: &Ledger, id: &str, usdt: i64, path: &[&str]) {
        let mut account = Account::new(id);
        account.balances.usdt = Decimal::from(usdt);
        account.referral = Referral {
            sponsor_id: path.first().map(|s| s.to_string()),
            path: path.iter().map(|s| s.to_string()).collect(),
            level: path.len() as u32,
        };
        ledger.store().seed_account(account);
    }

    #[test]
    fn registration_builds_nearest_first_path() {
        let ledger = ledger();
        seed_user(&ledger, "root", 0);
        let mid = ledger
            .register_account(NewAccount {
                user_id: "mid".into(),
                name: "Mid".into(),
                email: "mid@example.com".into(),
                sponsor_id: Some("root".into()),
                wallets: HashMap::new(),
            })
            .unwrap();
        assert_eq!(mid.referral.path, vec!["root".to_string()]);
        assert_eq!(mid.referral.level, 1);

        let leaf = ledger
            .register_account(NewAccount {
                user_id: "leaf".into(),
                name: "Leaf".into(),
                email: "leaf@example.com".into(),
                sponsor_id: Some("mid".into()),
                wallets: HashMap::new(),
            })
            .unwrap();
        // nearest ancestor first: direct sponsor at index 0
        assert_eq!(leaf.referral.path, vec!["mid".to_string(), "root".to_string()]);
        assert_eq!(leaf.referral.level, 2);
    }

    #[test]
    fn open_stake_rejects_unknown_tier_before_any_write() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 1000);
        let res = ledger.open_stake("u1", Decimal::from(100), "Mystery", false);
        assert_eq!(res, Err(CoreError::InvalidTier("Mystery".into())));
        assert_eq!(
            ledger.store().account("u1").unwrap().balances.usdt,
            Decimal::from(1000)
        );
    }

    #[test]
    fn open_stake_rejects_amount_above_tier_max() {
        // usdt=1000, Harmony is 50..=499, stake of 500 must bounce
        let ledger = ledger();
        seed_user(&ledger, "u1", 1000);
        let res = ledger.open_stake("u1", Decimal::from(500), "Harmony", false);
        assert!(matches!(res, Err(CoreError::AmountOutOfRange { .. })));
        assert_eq!(
            ledger.store().account("u1").unwrap().balances.usdt,
            Decimal::from(1000)
        );
        assert!(ledger.store().stakes_for_user("u1").is_empty());
    }

    #[test]
    fn open_stake_rejects_insufficient_balance() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 100);
        let res = ledger.open_stake("u1", Decimal::from(600), "Proportion", false);
        assert_eq!(
            res,
            Err(CoreError::InsufficientBalance {
                field: BalanceField::Usdt
            })
        );
    }

    #[test]
    fn open_stake_deducts_creates_and_fans_out() {
        // usdt=1000, chain [a, b], Proportion 500..=1999:
        // balance → 500, a += 50 (l1 10%), b += 30 (l2 6%)
        let ledger = ledger();
        seed_user(&ledger, "a", 0);
        seed_user(&ledger, "b", 0);
        seed_chain(&ledger, "u1", 1000, &["a", "b"]);

        let opened = ledger
            .open_stake("u1", Decimal::from(500), "Proportion", false)
            .unwrap();
        assert_eq!(opened.daily_pct, Decimal::new(5, 3));

        let store = ledger.store();
        assert_eq!(store.account("u1").unwrap().balances.usdt, Decimal::from(500));
        assert_eq!(store.account("a").unwrap().balances.commission, Decimal::from(50));
        assert_eq!(store.account("b").unwrap().balances.commission, Decimal::from(30));
        assert_eq!(store.payouts_to_user("a").len(), 1);
        assert_eq!(store.payouts_to_user("b").len(), 1);

        let stake = store.stake(&opened.stake_id).unwrap();
        assert_eq!(stake.daily_pct, Decimal::new(5, 3));
        assert_eq!(stake.status, StakeStatus::Active);
        assert_eq!(stake.total_accrued, Decimal::ZERO);
        assert_eq!(stake.term_days, 365);

        // purchase shows up in the ledger log as a signed debit
        let entries = store.entries_for_user("u1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::StakeOpen);
        assert_eq!(entries[0].amount, Decimal::from(-500));
    }

    #[test]
    fn open_stake_with_missing_sponsor_rolls_everything_back() {
        let ledger = ledger();
        seed_user(&ledger, "a", 0);
        seed_chain(&ledger, "u1", 1000, &["a", "ghost"]);
        let res = ledger.open_stake("u1", Decimal::from(500), "Proportion", false);
        assert_eq!(res, Err(CoreError::SponsorMissing("ghost".into())));
        let store = ledger.store();
        // no deduction, no stake, no partial commission
        assert_eq!(store.account("u1").unwrap().balances.usdt, Decimal::from(1000));
        assert!(store.stakes_for_user("u1").is_empty());
        assert_eq!(store.account("a").unwrap().balances.commission, Decimal::ZERO);
    }

    #[test]
    fn founder_purchase_charges_exactly_once() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 6000);
        let cost = ledger.become_founder("u1").unwrap();
        assert_eq!(cost, Decimal::from(5000));
        assert_eq!(ledger.store().account("u1").unwrap().balances.usdt, Decimal::from(1000));

        let res = ledger.become_founder("u1");
        assert_eq!(res, Err(CoreError::AlreadyFounder));
        assert_eq!(ledger.store().account("u1").unwrap().balances.usdt, Decimal::from(1000));
    }

    #[test]
    fn founder_purchase_requires_balance() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 4999);
        let res = ledger.become_founder("u1");
        assert_eq!(
            res,
            Err(CoreError::InsufficientBalance {
                field: BalanceField::Usdt
            })
        );
        assert!(!ledger.store().account("u1").unwrap().is_founder);
    }

    #[test]
    fn trading_join_credits_gift_once() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 0);
        let first = ledger.join_trading_hub("u1").unwrap();
        assert!(first.joined_now);
        assert_eq!(first.gift, Decimal::from(5));
        assert_eq!(ledger.store().account("u1").unwrap().balances.trading, Decimal::from(5));

        let second = ledger.join_trading_hub("u1").unwrap();
        assert!(!second.joined_now);
        assert_eq!(ledger.store().account("u1").unwrap().balances.trading, Decimal::from(5));
    }

    #[test]
    fn bet_requires_open_session_and_balance() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 0);
        ledger.store().seed_session(TradingSession {
            id: "s1".into(),
            status: SessionStatus::Closed,
            opened_at: now_ms(),
        });
        assert_eq!(
            ledger.place_bet("u1", "s1", BetDirection::Rise, Decimal::ONE),
            Err(CoreError::SessionClosed)
        );
        assert_eq!(
            ledger.place_bet("u1", "nope", BetDirection::Rise, Decimal::ONE),
            Err(CoreError::SessionNotFound("nope".into()))
        );

        ledger.store().seed_session(TradingSession {
            id: "s2".into(),
            status: SessionStatus::Open,
            opened_at: now_ms(),
        });
        assert_eq!(
            ledger.place_bet("u1", "s2", BetDirection::Rise, Decimal::from(10)),
            Err(CoreError::InsufficientBalance {
                field: BalanceField::Trading
            })
        );
    }

    #[test]
    fn second_bet_in_session_overwrites_position() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 0);
        ledger.join_trading_hub("u1").unwrap(); // trading = 5
        ledger.store().seed_session(TradingSession {
            id: "s1".into(),
            status: SessionStatus::Open,
            opened_at: now_ms(),
        });

        ledger
            .place_bet("u1", "s1", BetDirection::Rise, Decimal::from(2))
            .unwrap();
        ledger
            .place_bet("u1", "s1", BetDirection::Fall, Decimal::from(3))
            .unwrap();

        // single live position with the latest direction/amount
        let bet = ledger.store().bet("s1", "u1").unwrap();
        assert_eq!(bet.direction, BetDirection::Fall);
        assert_eq!(bet.amount, Decimal::from(3));
        // both deductions applied, as in the source platform
        assert_eq!(ledger.store().account("u1").unwrap().balances.trading, Decimal::ZERO);
    }

    #[test]
    fn withdrawal_deducts_and_logs_reviewing_entry() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 100);
        ledger
            .request_withdrawal("u1", Decimal::from(40), Currency::Usdt)
            .unwrap();
        assert_eq!(ledger.store().account("u1").unwrap().balances.usdt, Decimal::from(60));
        let entries = ledger.store().entries_for_user("u1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Withdrawal);
        assert_eq!(entries[0].status, EntryStatus::Reviewing);
        assert_eq!(entries[0].amount, Decimal::from(-40));

        assert_eq!(
            ledger.request_withdrawal("u1", Decimal::from(100), Currency::Usdt),
            Err(CoreError::InsufficientBalance {
                field: BalanceField::Usdt
            })
        );
    }

    #[test]
    fn deposit_request_logs_without_crediting() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 0);
        ledger
            .request_deposit("u1", Decimal::from(250), Currency::Usdt, "0xabc")
            .unwrap();
        assert_eq!(ledger.store().account("u1").unwrap().balances.usdt, Decimal::ZERO);
        let entries = ledger.store().entries_with_reference("0xabc");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, EntryStatus::Reviewing);
    }

    #[test]
    fn daily_accrual_credits_reward_and_upline() {
        let ledger = ledger();
        seed_user(&ledger, "a", 0);
        seed_chain(&ledger, "u1", 1000, &["a"]);
        let opened = ledger
            .open_stake("u1", Decimal::from(1000), "Proportion", false)
            .unwrap();

        let outcome = ledger.accrue_stake_daily(&opened.stake_id).unwrap();
        // 1000 × 0.5%
        assert_eq!(outcome.accrued, Decimal::from(5));
        assert!(!outcome.compounded);
        // l1 of the staking-reward table is 2%
        assert_eq!(outcome.commission_total, Decimal::new(10, 2));

        let store = ledger.store();
        assert_eq!(store.account("u1").unwrap().balances.reward, Decimal::from(5));
        let stake = store.stake(&opened.stake_id).unwrap();
        assert_eq!(stake.total_accrued, Decimal::from(5));
        assert_eq!(stake.amount, Decimal::from(1000)); // not compounded
        // one spot payout from the open, one daily payout from the accrual
        assert_eq!(store.payouts_to_user("a").len(), 2);
    }

    #[test]
    fn accrual_uses_rate_locked_at_stake_creation() {
        let ledger = ledger();
        seed_user(&ledger, "u1", 1000);
        let opened = ledger
            .open_stake("u1", Decimal::from(1000), "Proportion", false)
            .unwrap();

        // repricing the package after the fact must not retouch the stake
        let mut settings = ledger.store().settings();
        settings
            .staking
            .packages
            .get_mut("Proportion")
            .unwrap()
            .daily_pct = Decimal::new(9, 2);
        ledger.store().set_settings(settings);

        let outcome = ledger.accrue_stake_daily(&opened.stake_id).unwrap();
        // still 1000 × 0.5%, not 1000 × 9%
        assert_eq!(outcome.accrued, Decimal::from(5));
        assert_eq!(
            ledger.store().stake(&opened.stake_id).unwrap().daily_pct,
            Decimal::new(5, 3)
        );
        assert_eq!(ledger.store().account("u1").unwrap().balances.reward, Decimal::from(5));
    }

    #[test]
    fn auto_compound_accrual_grows_principal_not_reward() {
        let ledger = ledger();
        seed_chain(&ledger, "u1", 1000, &[]);
        let opened = ledger
            .open_stake("u1", Decimal::from(1000), "Proportion", true)
            .unwrap();
        let outcome = ledger.accrue_stake_daily(&opened.stake_id).unwrap();
        assert!(outcome.compounded);
        let store = ledger.store();
        assert_eq!(store.account("u1").unwrap().balances.reward, Decimal::ZERO);
        assert_eq!(store.stake(&opened.stake_id).unwrap().amount, Decimal::from(1005));
    }
}
