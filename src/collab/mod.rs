//! Collaborator contracts consumed by the core, plus the in-memory
//! implementations the [`Session`](crate::session::Session) runs on.
//!
//! The prestige reset is written against the traits only, so a host with its
//! own currency or unit storage can plug that in instead.

pub mod helpers;
pub mod roster;
pub mod skills;
pub mod wallet;

use crate::state::{CurrencyKind, ProductionUnit, SkillId, UnitId};

pub use helpers::HelperPool;
pub use roster::UnitRoster;
pub use skills::{default_skills, SkillDefinition, SkillEffect, SkillTree};
pub use wallet::Wallet;

/// Currency balances.
pub trait CurrencyStore {
    fn amount(&self, kind: CurrencyKind) -> f64;

    /// Credit earnings. Counts toward the lifetime total.
    fn add(&mut self, kind: CurrencyKind, amount: f64);

    /// Debit `amount` if the balance covers it. Returns false and leaves the
    /// balance untouched otherwise.
    fn spend(&mut self, kind: CurrencyKind, amount: f64) -> bool;

    /// Zero the balance. Lifetime totals are kept.
    fn reset(&mut self, kind: CurrencyKind);

    fn lifetime_earned(&self, kind: CurrencyKind) -> f64;

    /// Give back a previous spend. Stores that track lifetime totals should
    /// not count this as earned.
    fn refund(&mut self, kind: CurrencyKind, amount: f64) {
        self.add(kind, amount);
    }
}

/// Owned production units.
pub trait UnitRegistry {
    fn units(&self) -> &[ProductionUnit];

    fn remove_unit(&mut self, id: UnitId) -> Option<ProductionUnit>;

    /// Drop everything except a single baseline unit.
    fn reset_to_baseline(&mut self);

    fn unit(&self, id: UnitId) -> Option<&ProductionUnit> {
        self.units().iter().find(|u| u.id == id)
    }
}

/// Unlocked skills. Modifier bookkeeping lives in the aggregator; this
/// registry only tracks which sources are unlocked.
pub trait SkillRegistry {
    fn unlocked(&self) -> Vec<SkillId>;

    /// Forget one unlock. Returns false if it was not unlocked.
    fn revoke(&mut self, id: &str) -> bool;

    /// Forget every unlock without refunding anything.
    fn clear(&mut self);
}

/// Session-local auxiliary producers.
pub trait HelperRegistry {
    fn count(&self) -> u32;

    /// Drop every helper and any cap raised this session.
    fn clear_all(&mut self);
}
