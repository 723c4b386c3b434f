//! In-memory currency balances with lifetime totals.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::CurrencyStore;
use crate::state::CurrencyKind;

#[derive(Debug, Default, Clone)]
pub struct Wallet {
    balances: BTreeMap<CurrencyKind, f64>,
    lifetime: BTreeMap<CurrencyKind, f64>,
}

/// Persisted form: one entry per currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub kind: CurrencyKind,
    pub balance: f64,
    pub lifetime: f64,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<WalletEntry> {
        CurrencyKind::all()
            .iter()
            .map(|kind| WalletEntry {
                kind: *kind,
                balance: self.amount(*kind),
                lifetime: self.lifetime_earned(*kind),
            })
            .collect()
    }

    pub fn restore(&mut self, entries: &[WalletEntry]) {
        self.balances.clear();
        self.lifetime.clear();
        for e in entries {
            self.balances.insert(e.kind, sanitize(e.balance));
            // Lifetime can never be below what is on hand.
            self.lifetime
                .insert(e.kind, sanitize(e.lifetime).max(sanitize(e.balance)));
        }
    }
}

fn sanitize(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

impl CurrencyStore for Wallet {
    fn amount(&self, kind: CurrencyKind) -> f64 {
        self.balances.get(&kind).copied().unwrap_or(0.0)
    }

    fn add(&mut self, kind: CurrencyKind, amount: f64) {
        let amount = sanitize(amount);
        if amount == 0.0 {
            return;
        }
        *self.balances.entry(kind).or_insert(0.0) += amount;
        *self.lifetime.entry(kind).or_insert(0.0) += amount;
    }

    fn spend(&mut self, kind: CurrencyKind, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let balance = self.amount(kind);
        if balance < amount {
            return false;
        }
        self.balances.insert(kind, balance - amount);
        true
    }

    fn reset(&mut self, kind: CurrencyKind) {
        self.balances.insert(kind, 0.0);
    }

    fn lifetime_earned(&self, kind: CurrencyKind) -> f64 {
        self.lifetime.get(&kind).copied().unwrap_or(0.0)
    }

    fn refund(&mut self, kind: CurrencyKind, amount: f64) {
        *self.balances.entry(kind).or_insert(0.0) += sanitize(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_tracks_lifetime() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, 10.0);
        w.add(CurrencyKind::Money, 5.0);
        assert!((w.amount(CurrencyKind::Money) - 15.0).abs() < 0.001);
        assert!((w.lifetime_earned(CurrencyKind::Money) - 15.0).abs() < 0.001);
    }

    #[test]
    fn negative_and_nan_adds_ignored() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, -10.0);
        w.add(CurrencyKind::Money, f64::NAN);
        assert!((w.amount(CurrencyKind::Money) - 0.0).abs() < 0.001);
    }

    #[test]
    fn spend_success() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::DarkMatter, 100.0);
        assert!(w.spend(CurrencyKind::DarkMatter, 40.0));
        assert!((w.amount(CurrencyKind::DarkMatter) - 60.0).abs() < 0.001);
        // Spending does not touch lifetime.
        assert!((w.lifetime_earned(CurrencyKind::DarkMatter) - 100.0).abs() < 0.001);
    }

    #[test]
    fn spend_insufficient_leaves_balance() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, 10.0);
        assert!(!w.spend(CurrencyKind::Money, 10.5));
        assert!((w.amount(CurrencyKind::Money) - 10.0).abs() < 0.001);
    }

    #[test]
    fn spend_negative_rejected() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, 10.0);
        assert!(!w.spend(CurrencyKind::Money, -5.0));
        assert!((w.amount(CurrencyKind::Money) - 10.0).abs() < 0.001);
    }

    #[test]
    fn reset_keeps_lifetime() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, 500.0);
        w.reset(CurrencyKind::Money);
        assert!((w.amount(CurrencyKind::Money) - 0.0).abs() < 0.001);
        assert!((w.lifetime_earned(CurrencyKind::Money) - 500.0).abs() < 0.001);
    }

    #[test]
    fn refund_is_not_earnings() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::DarkMatter, 50.0);
        w.spend(CurrencyKind::DarkMatter, 50.0);
        w.refund(CurrencyKind::DarkMatter, 50.0);
        assert!((w.amount(CurrencyKind::DarkMatter) - 50.0).abs() < 0.001);
        assert!((w.lifetime_earned(CurrencyKind::DarkMatter) - 50.0).abs() < 0.001);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut w = Wallet::new();
        w.add(CurrencyKind::Money, 123.0);
        w.spend(CurrencyKind::Money, 23.0);
        w.add(CurrencyKind::TimeShards, 4.0);

        let mut restored = Wallet::new();
        restored.restore(&w.snapshot());
        for kind in CurrencyKind::all() {
            assert!((restored.amount(*kind) - w.amount(*kind)).abs() < 0.001);
            assert!((restored.lifetime_earned(*kind) - w.lifetime_earned(*kind)).abs() < 0.001);
        }
    }

    #[test]
    fn corrupt_snapshot_values_are_zeroed() {
        let mut w = Wallet::new();
        w.restore(&[WalletEntry {
            kind: CurrencyKind::Money,
            balance: f64::NAN,
            lifetime: -3.0,
        }]);
        assert!((w.amount(CurrencyKind::Money) - 0.0).abs() < 0.001);
        assert!((w.lifetime_earned(CurrencyKind::Money) - 0.0).abs() < 0.001);
    }
}
