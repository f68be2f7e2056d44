//! Global platform settings: staking packages, affiliate rate tables,
//! trading-hub parameters.
//!
//! This is a read-only singleton from the ledger's point of view. Every
//! operation reads it inside its own atomic unit so a concurrent settings
//! change can never mix "old balance, new rate" within one unit. Stakes copy
//! `daily_pct` out of the package at creation time, so changing a package
//! later never retouches existing stakes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One staking package tier. `max` absent means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePackage {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub daily_pct: Decimal,
}

/// Per-level commission rates, 1-indexed up to 6 levels. Absent levels
/// default to zero and are skipped by the fanout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub l1: Decimal,
    #[serde(default)]
    pub l2: Decimal,
    #[serde(default)]
    pub l3: Decimal,
    #[serde(default)]
    pub l4: Decimal,
    #[serde(default)]
    pub l5: Decimal,
    #[serde(default)]
    pub l6: Decimal,
}

impl RateTable {
    /// Rate for a 1-indexed level; zero for anything out of range.
    pub fn level(&self, level: u8) -> Decimal {
        match level {
            1 => self.l1,
            2 => self.l2,
            3 => self.l3,
            4 => self.l4,
            5 => self.l5,
            6 => self.l6,
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingSettings {
    /// Tier name -> package bounds and locked-in daily percentage.
    pub packages: BTreeMap<String, StakePackage>,
    pub term_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingHubSettings {
    /// One-time credit granted on first join.
    pub free_join_gift: Decimal,
    pub profit_share_pct: Decimal,
    pub loss_share_pct: Decimal,
    /// 6-level split of the shared profit/loss portion.
    pub split: RateTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateSettings {
    /// One-time commission on stake opening, 5 levels.
    pub spot: RateTable,
    /// Daily commission on staking rewards, 5 levels.
    pub staking: RateTable,
    pub trading_hub: TradingHubSettings,
}

/// The settings singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub staking: StakingSettings,
    pub affiliate: AffiliateSettings,
    pub founder_cost: Decimal,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        let mut packages = BTreeMap::new();
        packages.insert(
            "Harmony".to_string(),
            StakePackage {
                min: Decimal::from(50),
                max: Some(Decimal::from(499)),
                daily_pct: Decimal::new(3, 3), // 0.3% / day
            },
        );
        packages.insert(
            "Proportion".to_string(),
            StakePackage {
                min: Decimal::from(500),
                max: Some(Decimal::from(1999)),
                daily_pct: Decimal::new(5, 3),
            },
        );
        packages.insert(
            "Divine".to_string(),
            StakePackage {
                min: Decimal::from(2000),
                max: Some(Decimal::from(4999)),
                daily_pct: Decimal::new(8, 3),
            },
        );
        packages.insert(
            "Infinity".to_string(),
            StakePackage {
                min: Decimal::from(5000),
                max: None,
                daily_pct: Decimal::new(12, 3),
            },
        );

        GlobalSettings {
            staking: StakingSettings {
                packages,
                term_days: 365,
            },
            affiliate: AffiliateSettings {
                spot: RateTable {
                    l1: Decimal::new(10, 2),
                    l2: Decimal::new(6, 2),
                    l3: Decimal::new(4, 2),
                    l4: Decimal::new(2, 2),
                    l5: Decimal::new(1, 2),
                    l6: Decimal::ZERO,
                },
                staking: RateTable {
                    l1: Decimal::new(2, 2),
                    l2: Decimal::new(1, 2),
                    l3: Decimal::new(5, 3),
                    l4: Decimal::new(3, 3),
                    l5: Decimal::new(2, 3),
                    l6: Decimal::ZERO,
                },
                trading_hub: TradingHubSettings {
                    free_join_gift: Decimal::from(5),
                    profit_share_pct: Decimal::new(4, 2),
                    loss_share_pct: Decimal::new(6, 2),
                    split: RateTable {
                        l1: Decimal::new(40, 2),
                        l2: Decimal::new(25, 2),
                        l3: Decimal::new(15, 2),
                        l4: Decimal::new(10, 2),
                        l5: Decimal::new(6, 2),
                        l6: Decimal::new(4, 2),
                    },
                },
            },
            founder_cost: Decimal::from(5000),
        }
    }
}
