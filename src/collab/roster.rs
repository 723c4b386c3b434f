//! In-memory registry of owned dice.
use super::UnitRegistry;
use crate::config::ProductionConfig;
use crate::state::{ProductionUnit, UnitId};

#[derive(Debug, Clone)]
pub struct UnitRoster {
    units: Vec<ProductionUnit>,
    next_id: u32,
}

impl Default for UnitRoster {
    fn default() -> Self {
        Self::with_baseline()
    }
}

impl UnitRoster {
    /// A roster holding the single tier-1 die every run starts with.
    pub fn with_baseline() -> Self {
        let mut roster = Self {
            units: Vec::new(),
            next_id: 1,
        };
        roster.add_unit(1);
        roster
    }

    /// Add a fresh die of `tier` and return its id.
    pub fn add_unit(&mut self, tier: u8) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.push(ProductionUnit::new(id, tier));
        id
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut ProductionUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn count_of_tier(&self, tier: u8) -> usize {
        self.units.iter().filter(|u| u.tier == tier).count()
    }

    /// Price of the next die of `tier`.
    pub fn purchase_cost(&self, tier: u8, cost_reduction: f64, config: &ProductionConfig) -> f64 {
        let tier = tier.max(1);
        let owned = self.count_of_tier(tier) as i32;
        let discount = cost_reduction.clamp(0.0, config.max_cost_reduction);
        config.unit_base_cost
            * config.tier_cost_factor.powi(tier as i32 - 1)
            * config.unit_cost_growth.powi(owned)
            * (1.0 - discount)
    }

    /// Rebuild from persisted units. An empty list falls back to the baseline.
    pub fn restore(&mut self, units: Vec<ProductionUnit>) {
        if units.is_empty() {
            *self = Self::with_baseline();
            return;
        }
        let max_id = units.iter().map(|u| u.id.0).max().unwrap_or(0);
        self.units = units;
        self.next_id = max_id + 1;
    }
}

impl UnitRegistry for UnitRoster {
    fn units(&self) -> &[ProductionUnit] {
        &self.units
    }

    fn remove_unit(&mut self, id: UnitId) -> Option<ProductionUnit> {
        let idx = self.units.iter().position(|u| u.id == id)?;
        Some(self.units.remove(idx))
    }

    fn reset_to_baseline(&mut self) {
        self.units.clear();
        // Ids keep counting so a removed die can never be confused with a new one.
        self.add_unit(1);
    }
}
