//! # StakeHub Core
//!
//! Ledger and commission transaction core for the StakeHub platform: the
//! server-side operations that mutate user balances, create stakes, fan out
//! multi-level affiliate commissions, and process deposit webhooks — all as
//! atomic units against a document store.
//!
//! ## Modules
//! - `types`: domain records (accounts, stakes, ledger entries, payouts)
//! - `settings`: the read-only global configuration singleton
//! - `store`: document store and the atomic-unit primitive
//! - `ledger`: the operations that move money
//! - `commission`: multi-level fanout over materialized sponsor paths
//! - `webhook`: deposit webhook verification and crediting
//! - `error`: the operation error taxonomy with stable wire codes
//!
//! ## Guarantees
//! - balances never go negative after a committed unit
//! - one confirmed ledger entry per external reference (idempotent deposits)
//! - commission totals are exact: `amount × Σ(level rates present)`, capped
//!   at the configured depth
//! - any failure inside a unit discards the whole unit; partial writes are
//!   never visible

pub mod commission;
pub mod error;
pub mod ledger;
pub mod settings;
pub mod store;
pub mod types;
pub mod webhook;

pub use error::CoreError;
pub use ledger::{AccrualOutcome, JoinOutcome, Ledger, NewAccount, OpenedStake};
pub use settings::GlobalSettings;
pub use store::{Store, StoreView, WriteBatch};
pub use webhook::{TokenRegistry, WebhookOutcome, WebhookProcessor};
