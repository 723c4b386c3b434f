//! Shared domain types: currencies, identifiers, production units.
use std::fmt;

use serde::{Deserialize, Serialize};

pub type GoalId = String;
pub type SkillId = String;

/// Kinds of currency tracked by the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CurrencyKind {
    /// Primary currency, earned by every roll.
    Money,
    /// Secondary currency, spent on skills.
    DarkMatter,
    /// Meta-currency granted by Time Fracture and overclock destruction.
    TimeShards,
}

impl CurrencyKind {
    /// All currency kinds in display order.
    pub fn all() -> &'static [CurrencyKind] {
        &[
            CurrencyKind::Money,
            CurrencyKind::DarkMatter,
            CurrencyKind::TimeShards,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            CurrencyKind::Money => "Money",
            CurrencyKind::DarkMatter => "Dark Matter",
            CurrencyKind::TimeShards => "Time Shards",
        }
    }

    /// Whether a Time Fracture zeroes this currency.
    pub fn resets_on_prestige(&self) -> bool {
        !matches!(self, CurrencyKind::TimeShards)
    }
}

/// Identifier of an owned production unit. Never reused within a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single die on the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionUnit {
    pub id: UnitId,
    /// 1-based tier; higher tiers yield more and pay more when destroyed.
    pub tier: u8,
    /// Money per roll before any multiplier.
    pub base_yield: f64,
    /// Dark matter per roll before any multiplier.
    pub secondary_yield: f64,
    /// Per-unit multiplier (default 1.0).
    pub multiplier: f64,
}

impl ProductionUnit {
    pub fn new(id: UnitId, tier: u8) -> Self {
        let tier = tier.max(1);
        Self {
            id,
            tier,
            base_yield: Self::tier_base_yield(tier),
            secondary_yield: Self::tier_secondary_yield(tier),
            multiplier: 1.0,
        }
    }

    /// Money per roll for a fresh unit of `tier`.
    pub fn tier_base_yield(tier: u8) -> f64 {
        // Each tier is worth five of the previous one.
        5.0_f64.powi(tier.saturating_sub(1) as i32)
    }

    /// Dark matter per roll for a fresh unit of `tier`. Tier 1 yields none.
    pub fn tier_secondary_yield(tier: u8) -> f64 {
        if tier <= 1 {
            0.0
        } else {
            0.1 * 3.0_f64.powi(tier as i32 - 2)
        }
    }

    /// Money yielded by one roll, before global multipliers.
    pub fn primary_value(&self, flat_bonus: f64) -> f64 {
        (self.base_yield + flat_bonus) * self.multiplier
    }

    /// Dark matter yielded by one roll, before global multipliers.
    pub fn secondary_value(&self) -> f64 {
        self.secondary_yield * self.multiplier
    }
}
