//! Earnings projection for time spent away.
//!
//! Pure calculation: the caller builds a [`ProductionContext`] from live
//! state, runs [`simulate`], then credits the result and publishes it.

use crate::config::OfflineConfig;
use crate::state::ProductionUnit;

/// Everything the projection needs, captured at resume time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionContext {
    pub base_cycle_seconds: f64,
    /// Aggregated `CycleSpeed`.
    pub speed_multiplier: f64,
    /// The player plus hired helpers.
    pub producers: u32,
    pub base_units_per_cycle: u32,
    /// Aggregated `BonusUnitsPerCycle`.
    pub bonus_units: f64,
    pub available_units: usize,
    /// Fraction of live production earned while away, in `[0, 1]`.
    pub efficiency: f64,
    pub average_primary_yield: f64,
    pub average_secondary_yield: f64,
    pub primary_multiplier: f64,
    pub secondary_multiplier: f64,
}

impl ProductionContext {
    /// Mean primary and secondary yield across `units`, assuming every unit
    /// is equally likely to be picked for a cycle.
    pub fn average_yields(units: &[ProductionUnit], flat_bonus: f64) -> (f64, f64) {
        if units.is_empty() {
            return (0.0, 0.0);
        }
        let n = units.len() as f64;
        let primary: f64 = units.iter().map(|u| u.primary_value(flat_bonus)).sum();
        let secondary: f64 = units.iter().map(|u| u.secondary_value()).sum();
        (primary / n, secondary / n)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OfflineEarnings {
    pub primary: f64,
    pub secondary: f64,
    /// Elapsed time after clamping to the offline cap.
    pub elapsed_seconds: f64,
}

impl OfflineEarnings {
    pub fn is_empty(&self) -> bool {
        self.primary <= 0.0 && self.secondary <= 0.0
    }
}

/// Project earnings for `elapsed_seconds` away, capped at
/// `config.max_seconds`.
pub fn simulate(
    elapsed_seconds: f64,
    ctx: &ProductionContext,
    config: &OfflineConfig,
) -> OfflineEarnings {
    let elapsed = if elapsed_seconds.is_finite() {
        elapsed_seconds.clamp(0.0, config.max_seconds.max(0.0))
    } else {
        0.0
    };
    let mut earnings = OfflineEarnings {
        elapsed_seconds: elapsed,
        ..OfflineEarnings::default()
    };
    if ctx.base_cycle_seconds <= 0.0 || ctx.speed_multiplier <= 0.0 || elapsed == 0.0 {
        return earnings;
    }

    let effective_cycle = ctx.base_cycle_seconds / ctx.speed_multiplier;
    let cycles = elapsed / effective_cycle;
    let per_cycle = (ctx.base_units_per_cycle as f64 + ctx.bonus_units.max(0.0))
        .min(ctx.available_units as f64);
    let efficiency = ctx.efficiency.clamp(0.0, 1.0);
    let units_processed = cycles * ctx.producers as f64 * per_cycle * efficiency;

    earnings.primary = units_processed * ctx.average_primary_yield * ctx.primary_multiplier;
    earnings.secondary = units_processed * ctx.average_secondary_yield * ctx.secondary_multiplier;
    if !earnings.primary.is_finite() || !earnings.secondary.is_finite() {
        log::warn!("offline projection overflowed, discarding");
        earnings.primary = 0.0;
        earnings.secondary = 0.0;
    }
    log::debug!(
        "offline {:.0}s: {:.2} cycles, {:.2} units, +{:.2} / +{:.4}",
        elapsed,
        cycles,
        units_processed,
        earnings.primary,
        earnings.secondary
    );
    earnings
}
