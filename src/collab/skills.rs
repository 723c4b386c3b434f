//! Skill tree: unlockable nodes paid in dark matter, each contributing
//! modifiers under its own [`ModifierSource::Skill`] tag.
//!
//! Unlock and refund are player actions and settle currency and modifiers
//! together. The [`SkillRegistry`] side (`revoke`, `clear`) only forgets
//! unlocks; the prestige reset strips the modifiers itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{CurrencyStore, SkillRegistry};
use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierAggregator, ModifierMode, ModifierSource, Stat, StatModifier};
use crate::state::{CurrencyKind, SkillId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    /// Dark matter cost.
    pub cost: f64,
    /// Skill that must be unlocked first.
    #[serde(default)]
    pub requires: Option<SkillId>,
    pub effects: Vec<SkillEffect>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillEffect {
    pub stat: Stat,
    pub mode: ModifierMode,
    pub magnitude: f64,
}

impl SkillDefinition {
    fn modifiers(&self) -> impl Iterator<Item = StatModifier> + '_ {
        self.effects.iter().map(|e| StatModifier {
            source: ModifierSource::Skill(self.id.clone()),
            stat: e.stat,
            mode: e.mode,
            magnitude: e.magnitude,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct SkillTree {
    definitions: BTreeMap<SkillId, SkillDefinition>,
    unlocked: BTreeSet<SkillId>,
}

impl SkillTree {
    pub fn new(definitions: Vec<SkillDefinition>) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self {
            definitions,
            unlocked: BTreeSet::new(),
        }
    }

    pub fn definition(&self, id: &str) -> Option<&SkillDefinition> {
        self.definitions.get(id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.definitions.values()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    /// Pay for `id` and push its modifiers.
    pub fn unlock(
        &mut self,
        id: &str,
        wallet: &mut dyn CurrencyStore,
        modifiers: &mut ModifierAggregator,
    ) -> EconomyResult<()> {
        let def = self
            .definitions
            .get(id)
            .ok_or_else(|| EconomyError::UnknownSkill(id.to_string()))?;
        if self.unlocked.contains(id) {
            return Err(EconomyError::SkillAlreadyUnlocked(id.to_string()));
        }
        if let Some(req) = &def.requires {
            if !self.unlocked.contains(req) {
                return Err(EconomyError::SkillPrerequisite {
                    skill: id.to_string(),
                    requires: req.clone(),
                });
            }
        }
        if !wallet.spend(CurrencyKind::DarkMatter, def.cost) {
            return Err(EconomyError::InsufficientFunds {
                kind: CurrencyKind::DarkMatter,
                required: def.cost,
                available: wallet.amount(CurrencyKind::DarkMatter),
            });
        }

        for m in def.modifiers() {
            modifiers.apply(m);
        }
        self.unlocked.insert(id.to_string());
        log::debug!("skill '{id}' unlocked for {:.2} dark matter", def.cost);
        Ok(())
    }

    /// Undo an unlock: strip its modifiers and give the cost back.
    /// Returns the refunded amount.
    pub fn refund(
        &mut self,
        id: &str,
        wallet: &mut dyn CurrencyStore,
        modifiers: &mut ModifierAggregator,
    ) -> EconomyResult<f64> {
        let def = self
            .definitions
            .get(id)
            .ok_or_else(|| EconomyError::UnknownSkill(id.to_string()))?;
        if !self.unlocked.contains(id) {
            return Err(EconomyError::SkillNotUnlocked(id.to_string()));
        }
        let dependent = self.unlocked.iter().find(|other| {
            self.definitions
                .get(other.as_str())
                .and_then(|d| d.requires.as_deref())
                == Some(id)
        });
        if let Some(dependent) = dependent {
            return Err(EconomyError::SkillHasDependents {
                skill: id.to_string(),
                dependent: dependent.clone(),
            });
        }

        let cost = def.cost;
        modifiers.remove_all_from_source(&ModifierSource::Skill(id.to_string()));
        self.unlocked.remove(id);
        wallet.refund(CurrencyKind::DarkMatter, cost);
        Ok(cost)
    }

    /// Reinstate persisted unlocks. Unknown ids are dropped.
    pub fn restore(&mut self, unlocked: &[SkillId]) {
        self.unlocked.clear();
        for id in unlocked {
            if self.definitions.contains_key(id) {
                self.unlocked.insert(id.clone());
            } else {
                log::warn!("dropping unknown skill '{id}' from save");
            }
        }
    }
}

impl SkillRegistry for SkillTree {
    fn unlocked(&self) -> Vec<SkillId> {
        self.unlocked.iter().cloned().collect()
    }

    fn revoke(&mut self, id: &str) -> bool {
        self.unlocked.remove(id)
    }

    fn clear(&mut self) {
        self.unlocked.clear();
    }
}

/// The stock tree shipped with the game.
pub fn default_skills() -> Vec<SkillDefinition> {
    use ModifierMode::{Additive, Multiplicative};

    fn skill(
        id: &str,
        name: &str,
        cost: f64,
        requires: Option<&str>,
        effects: Vec<SkillEffect>,
    ) -> SkillDefinition {
        SkillDefinition {
            id: id.into(),
            name: name.into(),
            cost,
            requires: requires.map(Into::into),
            effects,
        }
    }
    fn effect(stat: Stat, mode: ModifierMode, magnitude: f64) -> SkillEffect {
        SkillEffect {
            stat,
            mode,
            magnitude,
        }
    }

    vec![
        skill(
            "loaded_dice",
            "Loaded Dice",
            5.0,
            None,
            vec![effect(Stat::GlobalMoneyMultiplier, Multiplicative, 1.5)],
        ),
        skill(
            "quick_hands",
            "Quick Hands",
            10.0,
            None,
            vec![effect(Stat::CycleSpeed, Multiplicative, 1.25)],
        ),
        skill(
            "void_tap",
            "Void Tap",
            20.0,
            Some("loaded_dice"),
            vec![effect(Stat::DarkMatterMultiplier, Multiplicative, 2.0)],
        ),
        skill(
            "extra_throw",
            "Extra Throw",
            40.0,
            Some("quick_hands"),
            vec![effect(Stat::BonusUnitsPerCycle, Additive, 1.0)],
        ),
        skill(
            "dream_rolls",
            "Dream Rolls",
            60.0,
            None,
            vec![effect(Stat::OfflineEfficiency, Additive, 0.2)],
        ),
        skill(
            "guild_charter",
            "Guild Charter",
            80.0,
            Some("extra_throw"),
            vec![
                effect(Stat::HelperCap, Additive, 2.0),
                effect(Stat::GlobalMoneyMultiplier, Multiplicative, 1.2),
            ],
        ),
    ]
}
