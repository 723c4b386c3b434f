//! Hired helpers: extra rollers that live for one prestige run.
use super::{CurrencyStore, HelperRegistry};
use crate::config::HelperConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::state::CurrencyKind;

#[derive(Debug, Default, Clone)]
pub struct HelperPool {
    count: u32,
}

impl HelperPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Helpers allowed with `cap_bonus` (the aggregated `HelperCap` stat).
    pub fn cap(config: &HelperConfig, cap_bonus: f64) -> u32 {
        let bonus = if cap_bonus.is_finite() {
            cap_bonus.max(0.0).floor() as u32
        } else {
            0
        };
        config.base_cap.saturating_add(bonus)
    }

    /// Money price of the next helper.
    pub fn next_cost(&self, config: &HelperConfig) -> f64 {
        config.base_cost * config.cost_growth.powi(self.count as i32)
    }

    /// Hire one helper. Returns the new helper count.
    pub fn hire(
        &mut self,
        wallet: &mut dyn CurrencyStore,
        config: &HelperConfig,
        cap_bonus: f64,
    ) -> EconomyResult<u32> {
        let cap = Self::cap(config, cap_bonus);
        if self.count >= cap {
            return Err(EconomyError::HelperCapReached { cap });
        }
        let cost = self.next_cost(config);
        if !wallet.spend(CurrencyKind::Money, cost) {
            return Err(EconomyError::InsufficientFunds {
                kind: CurrencyKind::Money,
                required: cost,
                available: wallet.amount(CurrencyKind::Money),
            });
        }
        self.count += 1;
        Ok(self.count)
    }

    pub fn restore(&mut self, count: u32) {
        self.count = count;
    }
}

impl HelperRegistry for HelperPool {
    fn count(&self) -> u32 {
        self.count
    }

    fn clear_all(&mut self) {
        self.count = 0;
    }
}
