//! Runtime economy tuning.
//!
//! [`EconomyConfig`] mirrors every balance constant the core uses. Hosts
//! hand [`EconomyConfig::from_toml_str`] the contents of their tuning file;
//! missing keys fall back to the compiled defaults, so a minimal TOML can
//! override just the values being tuned:
//!
//! ```toml
//! [prestige]
//! money_multiplier_per_level = 0.15
//!
//! [offline]
//! max_seconds = 43200.0
//! ```
//!
//! The core never touches the filesystem; reading the file is the host's job.

use serde::Deserialize;

use crate::error::EconomyResult;

/// Top-level tuning, one section per subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub production: ProductionConfig,
    pub offline: OfflineConfig,
    pub overclock: OverclockConfig,
    pub prestige: PrestigeConfig,
    pub missions: MissionConfig,
    pub helpers: HelperConfig,
}

impl EconomyConfig {
    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(source: &str) -> EconomyResult<Self> {
        let config: EconomyConfig = toml::from_str(source)?;
        Ok(config.sanitized())
    }

    /// Clamp values that would break the formulas instead of rejecting the
    /// whole file.
    fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.offline.efficiency) {
            log::warn!(
                "offline.efficiency {} outside [0, 1], clamping",
                self.offline.efficiency
            );
            self.offline.efficiency = self.offline.efficiency.clamp(0.0, 1.0);
        }
        if self.overclock.heat_per_roll <= 0.0 {
            log::warn!(
                "overclock.heat_per_roll {} must be positive, using default",
                self.overclock.heat_per_roll
            );
            self.overclock.heat_per_roll = OverclockConfig::default().heat_per_roll;
        }
        if self.production.base_cycle_seconds <= 0.0 {
            log::warn!(
                "production.base_cycle_seconds {} must be positive, using default",
                self.production.base_cycle_seconds
            );
            self.production.base_cycle_seconds = ProductionConfig::default().base_cycle_seconds;
        }
        self
    }
}

// ── Production ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Seconds between rolls for every producer, before `CycleSpeed`.
    pub base_cycle_seconds: f64,
    /// Dice each producer rolls per cycle, before `BonusUnitsPerCycle`.
    pub base_units_per_cycle: u32,
    /// Price of the first tier-1 die.
    pub unit_base_cost: f64,
    /// Price growth per die already owned.
    pub unit_cost_growth: f64,
    /// Price multiplier per tier above 1.
    pub tier_cost_factor: f64,
    /// Cap on `CostReduction` as seen by purchases.
    pub max_cost_reduction: f64,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            base_cycle_seconds: 4.0,
            base_units_per_cycle: 1,
            unit_base_cost: 10.0,
            unit_cost_growth: 1.15,
            tier_cost_factor: 8.0,
            max_cost_reduction: 0.9,
        }
    }
}

// ── Offline ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Longest absence that still pays out.
    pub max_seconds: f64,
    /// Share of online throughput earned while away, in [0, 1].
    pub efficiency: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            max_seconds: 24.0 * 60.0 * 60.0,
            efficiency: 0.5,
        }
    }
}

// ── Overclock ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverclockConfig {
    pub heat_per_roll: f64,
    /// Yield multiplier while overclocked; the bonus is `yield × (m − 1)`.
    pub yield_multiplier: f64,
    /// Heat from which the presentation layer shows a warning.
    pub warning_heat: f64,
    /// Time shards granted on destruction, per tier of the destroyed die.
    pub reward_per_tier: f64,
}

impl Default for OverclockConfig {
    fn default() -> Self {
        Self {
            heat_per_roll: 0.1,
            yield_multiplier: 3.0,
            warning_heat: 0.9,
            reward_per_tier: 5.0,
        }
    }
}

// ── Prestige ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrestigeConfig {
    /// Money required at level 0; grows by `primary_growth` per level.
    pub primary_base: f64,
    pub primary_growth: f64,
    /// Dark matter required at level 0; grows linearly.
    pub secondary_base: f64,
    pub secondary_linear_factor: f64,

    pub base_reward: f64,
    pub per_level_reward: f64,
    /// Time shards per unit of dark matter on hand.
    pub conversion_rate: f64,
    /// Time shards per unit of lifetime money.
    pub lifetime_factor: f64,

    /// Money granted right after the reset, per level.
    pub starting_money_per_level: f64,
    pub money_multiplier_per_level: f64,
    pub dark_matter_multiplier_per_level: f64,
    pub flat_value_per_level: f64,
    pub cost_reduction_per_level: f64,
    pub max_cost_reduction: f64,
}

impl Default for PrestigeConfig {
    fn default() -> Self {
        Self {
            primary_base: 1_000_000.0,
            primary_growth: 10.0,
            secondary_base: 100.0,
            secondary_linear_factor: 0.5,
            base_reward: 1.0,
            per_level_reward: 1.0,
            conversion_rate: 0.01,
            lifetime_factor: 0.000_001,
            starting_money_per_level: 100.0,
            money_multiplier_per_level: 0.1,
            dark_matter_multiplier_per_level: 0.05,
            flat_value_per_level: 1.0,
            cost_reduction_per_level: 0.02,
            max_cost_reduction: 0.5,
        }
    }
}

// ── Missions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Daily missions drawn at each local-midnight crossing.
    pub daily_count: usize,
    /// Weekly missions drawn at each Monday crossing.
    pub weekly_count: usize,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            daily_count: 3,
            weekly_count: 2,
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Helpers allowed before any `HelperCap` bonus.
    pub base_cap: u32,
    pub base_cost: f64,
    pub cost_growth: f64,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            base_cap: 3,
            base_cost: 50.0,
            cost_growth: 2.0,
        }
    }
}
