//! Time Fracture: trade the current run for Time Shards and a permanent,
//! level-scaled bonus.
//!
//! [`PrestigeOrchestrator::perform`] is the only operation in the crate that
//! mutates several collaborators at once. It works on a [`ResetTargets`]
//! bundle, so the currency store, unit registry and skill registry are
//! guaranteed present by the type system. Helpers are optional and the step
//! is skipped with a warning when the host has none.

use serde::{Deserialize, Serialize};

use crate::collab::{CurrencyStore, HelperRegistry, SkillRegistry, UnitRegistry};
use crate::config::PrestigeConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierAggregator, ModifierSource, Stat, StatModifier};
use crate::state::CurrencyKind;

/// Survives every reset. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestigeState {
    pub level: u32,
    pub total_prestiges: u32,
    pub lifetime_meta_earned: f64,
}

/// Currency on hand needed to fracture at the current level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirements {
    pub primary: f64,
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeOutcome {
    pub new_level: u32,
    /// Time Shards granted.
    pub reward: f64,
    /// Money granted right after the currencies were zeroed.
    pub starting_money: f64,
}

/// Collaborators touched by a reset.
pub struct ResetTargets<'a> {
    pub wallet: &'a mut dyn CurrencyStore,
    pub units: &'a mut dyn UnitRegistry,
    pub skills: &'a mut dyn SkillRegistry,
    pub helpers: Option<&'a mut dyn HelperRegistry>,
    pub modifiers: &'a mut ModifierAggregator,
}

#[derive(Debug, Clone)]
pub struct PrestigeOrchestrator {
    state: PrestigeState,
    config: PrestigeConfig,
}

impl PrestigeOrchestrator {
    pub fn new(config: PrestigeConfig) -> Self {
        Self {
            state: PrestigeState::default(),
            config,
        }
    }

    pub fn state(&self) -> &PrestigeState {
        &self.state
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn requirements(&self) -> Requirements {
        let level = self.state.level as f64;
        Requirements {
            primary: self.config.primary_base * self.config.primary_growth.powf(level),
            secondary: self.config.secondary_base
                * (1.0 + level * self.config.secondary_linear_factor),
        }
    }

    pub fn can_prestige(&self, wallet: &dyn CurrencyStore) -> bool {
        let req = self.requirements();
        wallet.amount(CurrencyKind::Money) >= req.primary
            && wallet.amount(CurrencyKind::DarkMatter) >= req.secondary
    }

    /// Time Shards a fracture would grant right now.
    pub fn preview_reward(&self, wallet: &dyn CurrencyStore) -> f64 {
        let c = &self.config;
        (c.base_reward
            + self.state.level as f64 * c.per_level_reward
            + wallet.amount(CurrencyKind::DarkMatter) * c.conversion_rate
            + wallet.lifetime_earned(CurrencyKind::Money) * c.lifetime_factor)
            .floor()
            .max(0.0)
    }

    /// Permanent bonuses for `level`, all tagged [`ModifierSource::Prestige`].
    /// Level 0 has none.
    pub fn bonuses_for(&self, level: u32) -> Vec<StatModifier> {
        if level == 0 {
            return Vec::new();
        }
        let c = &self.config;
        let l = level as f64;
        vec![
            StatModifier::multiplicative(
                ModifierSource::Prestige,
                Stat::GlobalMoneyMultiplier,
                1.0 + l * c.money_multiplier_per_level,
            ),
            StatModifier::multiplicative(
                ModifierSource::Prestige,
                Stat::DarkMatterMultiplier,
                1.0 + l * c.dark_matter_multiplier_per_level,
            ),
            StatModifier::additive(
                ModifierSource::Prestige,
                Stat::FlatValueBonus,
                l * c.flat_value_per_level,
            ),
            StatModifier::additive(
                ModifierSource::Prestige,
                Stat::CostReduction,
                (l * c.cost_reduction_per_level).min(c.max_cost_reduction),
            ),
        ]
    }

    /// Replace whatever prestige modifiers are active with the set for the
    /// current level.
    pub fn apply_bonuses(&self, modifiers: &mut ModifierAggregator) {
        modifiers.remove_all_from_source(&ModifierSource::Prestige);
        for m in self.bonuses_for(self.state.level) {
            modifiers.apply(m);
        }
    }

    /// Run the full reset. Rejected, with nothing changed, unless
    /// [`can_prestige`](Self::can_prestige) holds.
    pub fn perform(&mut self, targets: ResetTargets<'_>) -> EconomyResult<PrestigeOutcome> {
        let ResetTargets {
            wallet,
            units,
            skills,
            helpers,
            modifiers,
        } = targets;

        if !self.can_prestige(wallet) {
            let req = self.requirements();
            return Err(EconomyError::PrestigeLocked {
                primary_required: req.primary,
                secondary_required: req.secondary,
            });
        }

        // Reward is priced on pre-reset totals.
        let reward = self.preview_reward(wallet);
        wallet.add(CurrencyKind::TimeShards, reward);
        self.state.lifetime_meta_earned += reward;

        self.state.level += 1;
        self.state.total_prestiges += 1;
        let new_level = self.state.level;

        for kind in CurrencyKind::all() {
            if kind.resets_on_prestige() {
                wallet.reset(*kind);
            }
        }
        let starting_money = new_level as f64 * self.config.starting_money_per_level;
        wallet.add(CurrencyKind::Money, starting_money);

        units.reset_to_baseline();

        // No refunds: the skill cost is part of what the fracture consumes.
        for id in skills.unlocked() {
            modifiers.remove_all_from_source(&ModifierSource::Skill(id));
        }
        skills.clear();

        match helpers {
            Some(helpers) => helpers.clear_all(),
            None => log::warn!("no helper registry attached, skipping helper reset"),
        }

        self.apply_bonuses(modifiers);

        log::info!("Time Fracture to level {new_level}: +{reward} shards");
        Ok(PrestigeOutcome {
            new_level,
            reward,
            starting_money,
        })
    }

    pub fn snapshot(&self) -> PrestigeState {
        self.state.clone()
    }

    /// Reinstate persisted counters and re-push the matching bonuses.
    pub fn restore(&mut self, state: PrestigeState, modifiers: &mut ModifierAggregator) {
        self.state = state;
        if !self.state.lifetime_meta_earned.is_finite() || self.state.lifetime_meta_earned < 0.0 {
            self.state.lifetime_meta_earned = 0.0;
        }
        self.apply_bonuses(modifiers);
    }
}
