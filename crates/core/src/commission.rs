//! Multi-level commission fanout over a materialized sponsor path.
//!
//! The path is stored denormalized on each account at signup, nearest
//! ancestor first, so distribution is a straight walk over a list — no graph
//! traversal happens at payout time. Rates come from the settings snapshot of
//! the enclosing atomic unit; a concurrent settings change cannot skew one
//! distribution.

use crate::error::CoreError;
use crate::settings::RateTable;
use crate::store::{StoreView, WriteBatch};
use crate::types::{new_id, now_ms, BalanceField, Payout, PayoutSource};
use rust_decimal::Decimal;
use tracing::debug;

/// Credit `base_amount × rate(level)` to each sponsor on the path and append
/// one [`Payout`] per qualifying level. Returns the total credited.
///
/// Levels with a zero/absent rate or an empty sponsor id are skipped
/// silently; short chains are normal. A sponsor id that resolves to no
/// account is an error and aborts the whole enclosing unit — a partial fanout
/// would break the commission-total invariant.
///
/// At most `max_levels` levels are processed (5 for spot and staking-reward
/// commission, 6 for the trading hub), however long the chain is.
#[allow(clippy::too_many_arguments)]
pub fn distribute(
    view: &StoreView<'_>,
    batch: &mut WriteBatch,
    source_user_id: &str,
    base_amount: Decimal,
    sponsor_path: &[String],
    rates: &RateTable,
    source: PayoutSource,
    max_levels: u8,
    stake_id: Option<&str>,
) -> Result<Decimal, CoreError> {
    let mut total = Decimal::ZERO;
    let depth = sponsor_path.len().min(max_levels as usize);

    for (idx, sponsor_id) in sponsor_path.iter().take(depth).enumerate() {
        let level = (idx + 1) as u8;
        let rate = rates.level(level);
        if sponsor_id.is_empty() || rate <= Decimal::ZERO {
            continue;
        }
        if view.account(sponsor_id).is_none() {
            return Err(CoreError::SponsorMissing(sponsor_id.clone()));
        }

        let amount = base_amount * rate;
        batch.adjust_balance(sponsor_id, BalanceField::Commission, amount);
        batch.insert_payout(Payout {
            id: new_id(),
            to_user_id: sponsor_id.clone(),
            from_user_id: source_user_id.to_string(),
            source,
            level,
            amount,
            stake_id: stake_id.map(str::to_string),
            created_at: now_ms(),
        });
        debug!(
            sponsor = %sponsor_id,
            level,
            %amount,
            source = ?source,
            "commission credited"
        );
        total += amount;
    }

    Ok(total)
}
