//! Overclocking: a die rolls for boosted yield while heating up, and burns
//! out for a Time Shard payout when the heat reaches 1.
//!
//! Nothing here is persisted. A reloaded session starts with every die in
//! the normal phase.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::OverclockConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::state::{ProductionUnit, UnitId};

/// Heat within this distance of 1 counts as full. Keeps `10 × 0.1` from
/// landing a hair short.
const HEAT_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverclockPhase {
    Normal,
    Overclocked,
    Destroyed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverclockState {
    pub unit: UnitId,
    pub rolls: u32,
    pub bonus_earned: f64,
}

impl OverclockState {
    /// Heat in `[0, 1]`, derived from the roll count.
    pub fn heat(&self, heat_per_roll: f64) -> f64 {
        (self.rolls as f64 * heat_per_roll).min(1.0)
    }
}

/// Result of one production event for a unit.
#[derive(Clone, Debug, PartialEq)]
pub enum OverclockOutcome {
    /// The unit is not overclocked.
    Idle,
    Heated {
        heat: f64,
        /// Extra yield from this roll.
        bonus: f64,
        /// Heat is past the warning threshold. Display only.
        warning: bool,
    },
    /// The unit burned out on this roll and must be removed.
    Destroyed {
        bonus: f64,
        /// Time Shards owed for the burnout.
        reward: f64,
        bonus_total: f64,
    },
}

#[derive(Debug, Default, Clone)]
pub struct OverclockMachine {
    running: BTreeMap<UnitId, OverclockState>,
    destroyed: BTreeSet<UnitId>,
}

impl OverclockMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, unit: UnitId) -> OverclockPhase {
        if self.destroyed.contains(&unit) {
            OverclockPhase::Destroyed
        } else if self.running.contains_key(&unit) {
            OverclockPhase::Overclocked
        } else {
            OverclockPhase::Normal
        }
    }

    pub fn state(&self, unit: UnitId) -> Option<&OverclockState> {
        self.running.get(&unit)
    }

    pub fn running(&self) -> impl Iterator<Item = &OverclockState> {
        self.running.values()
    }

    pub fn start(&mut self, unit: UnitId) -> EconomyResult<()> {
        match self.phase(unit) {
            OverclockPhase::Destroyed => Err(EconomyError::UnitDestroyed(unit)),
            OverclockPhase::Overclocked => Err(EconomyError::AlreadyOverclocked(unit)),
            OverclockPhase::Normal => {
                self.running.insert(
                    unit,
                    OverclockState {
                        unit,
                        rolls: 0,
                        bonus_earned: 0.0,
                    },
                );
                log::debug!("unit {unit} overclocked");
                Ok(())
            }
        }
    }

    /// Advance `unit`'s overclock by one roll that earned `earned` before
    /// the overclock bonus.
    pub fn on_unit_produced(
        &mut self,
        unit: &ProductionUnit,
        earned: f64,
        config: &OverclockConfig,
    ) -> OverclockOutcome {
        let Some(state) = self.running.get_mut(&unit.id) else {
            return OverclockOutcome::Idle;
        };

        let bonus = (earned * (config.yield_multiplier - 1.0)).max(0.0);
        state.rolls += 1;
        state.bonus_earned += bonus;
        let heat = state.heat(config.heat_per_roll);

        if heat >= 1.0 - HEAT_EPSILON {
            let bonus_total = state.bonus_earned;
            self.running.remove(&unit.id);
            self.destroyed.insert(unit.id);
            let reward = config.reward_per_tier * unit.tier as f64;
            log::info!(
                "unit {} burned out after overclock: +{reward} shards, {bonus_total:.2} bonus",
                unit.id
            );
            return OverclockOutcome::Destroyed {
                bonus,
                reward,
                bonus_total,
            };
        }

        OverclockOutcome::Heated {
            heat,
            bonus,
            warning: heat >= config.warning_heat,
        }
    }

    /// Stop every running overclock without destroying anything.
    pub fn abandon_all(&mut self) {
        self.running.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(tier: u8) -> ProductionUnit {
        ProductionUnit::new(UnitId(3), tier)
    }

    #[test]
    fn start_from_normal() {
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        assert_eq!(m.phase(UnitId(3)), OverclockPhase::Overclocked);
        assert!((m.state(UnitId(3)).unwrap().heat(0.1) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn start_twice_rejected() {
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        assert!(matches!(m.start(UnitId(3)), Err(EconomyError::AlreadyOverclocked(_))));
    }

    #[test]
    fn idle_unit_is_untouched() {
        let mut m = OverclockMachine::new();
        let out = m.on_unit_produced(&unit(1), 5.0, &OverclockConfig::default());
        assert_eq!(out, OverclockOutcome::Idle);
    }

    #[test]
    fn heat_and_bonus_accrue() {
        let config = OverclockConfig::default();
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        let out = m.on_unit_produced(&unit(2), 5.0, &config);
        // yield 5 × (3 − 1)
        assert_eq!(
            out,
            OverclockOutcome::Heated {
                heat: 0.1,
                bonus: 10.0,
                warning: false
            }
        );
    }

    #[test]
    fn warning_before_destruction() {
        let config = OverclockConfig::default();
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        let mut warned = false;
        for _ in 0..9 {
            if let OverclockOutcome::Heated { warning, .. } = m.on_unit_produced(&unit(1), 1.0, &config) {
                warned = warning;
            }
        }
        assert!(warned);
        assert_eq!(m.phase(UnitId(3)), OverclockPhase::Overclocked);
    }

    #[test]
    fn tenth_roll_destroys_with_tier_reward() {
        let config = OverclockConfig::default();
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        let mut last = OverclockOutcome::Idle;
        for _ in 0..10 {
            last = m.on_unit_produced(&unit(3), 1.0, &config);
        }
        match last {
            OverclockOutcome::Destroyed {
                reward,
                bonus_total,
                ..
            } => {
                assert!((reward - 15.0).abs() < 0.001);
                assert!((bonus_total - 20.0).abs() < 0.001);
            }
            other => panic!("expected destruction, got {other:?}"),
        }
        assert_eq!(m.phase(UnitId(3)), OverclockPhase::Destroyed);
    }

    #[test]
    fn destroyed_unit_cannot_restart() {
        let config = OverclockConfig {
            heat_per_roll: 1.0,
            ..OverclockConfig::default()
        };
        let mut m = OverclockMachine::new();
        m.start(UnitId(3)).unwrap();
        m.on_unit_produced(&unit(1), 1.0, &config);
        assert!(matches!(m.start(UnitId(3)), Err(EconomyError::UnitDestroyed(_))));
        // Further rolls for the removed id do nothing.
        assert_eq!(m.on_unit_produced(&unit(1), 1.0, &config), OverclockOutcome::Idle);
    }

    #[test]
    fn abandon_all_returns_units_to_normal() {
        let mut m = OverclockMachine::new();
        m.start(UnitId(1)).unwrap();
        m.start(UnitId(2)).unwrap();
        m.abandon_all();
        assert_eq!(m.phase(UnitId(1)), OverclockPhase::Normal);
        assert_eq!(m.running().count(), 0);
    }
}
