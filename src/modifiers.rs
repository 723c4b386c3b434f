//! Stat modifiers and their aggregation.
//!
//! Every unlocked skill, claimed goal reward and the current prestige level
//! contributes tagged [`StatModifier`]s. The aggregator keeps the active set
//! keyed by stat and source, and recomputes a stat from that whole set on
//! every mutation:
//!
//! ```text
//! value = base × Π(multiplicative) + Σ(additive)
//! ```
//!
//! Removal never divides a running product back out, so a magnitude of zero
//! is as removable as any other and the cached value is always what a replay
//! of the active set from the neutral base would produce.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{GoalId, SkillId};

/// Named numeric stats fed by modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Applied to every money payout.
    GlobalMoneyMultiplier,
    /// Applied to every dark matter payout.
    DarkMatterMultiplier,
    /// Divides the production cycle time.
    CycleSpeed,
    /// Extra dice each producer rolls per cycle.
    BonusUnitsPerCycle,
    /// Flat money added to every die before its own multiplier.
    FlatValueBonus,
    /// Fractional discount on die purchases.
    CostReduction,
    /// Added to the configured offline efficiency.
    OfflineEfficiency,
    /// Extra helper slots.
    HelperCap,
}

impl Stat {
    pub fn all() -> &'static [Stat] {
        &[
            Stat::GlobalMoneyMultiplier,
            Stat::DarkMatterMultiplier,
            Stat::CycleSpeed,
            Stat::BonusUnitsPerCycle,
            Stat::FlatValueBonus,
            Stat::CostReduction,
            Stat::OfflineEfficiency,
            Stat::HelperCap,
        ]
    }

    /// Value of the stat when no modifier is active.
    pub fn neutral_base(&self) -> f64 {
        match self {
            Stat::GlobalMoneyMultiplier | Stat::DarkMatterMultiplier | Stat::CycleSpeed => 1.0,
            Stat::BonusUnitsPerCycle
            | Stat::FlatValueBonus
            | Stat::CostReduction
            | Stat::OfflineEfficiency
            | Stat::HelperCap => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierMode {
    /// ×magnitude
    Multiplicative,
    /// +magnitude
    Additive,
}

/// Who owns a modifier. Ordering is part of the aggregation contract: the
/// active set is always folded in this order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModifierSource {
    Skill(SkillId),
    Milestone(GoalId),
    Mission(GoalId),
    Prestige,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub source: ModifierSource,
    pub stat: Stat,
    pub mode: ModifierMode,
    pub magnitude: f64,
}

impl StatModifier {
    pub fn multiplicative(source: ModifierSource, stat: Stat, magnitude: f64) -> Self {
        Self {
            source,
            stat,
            mode: ModifierMode::Multiplicative,
            magnitude,
        }
    }

    pub fn additive(source: ModifierSource, stat: Stat, magnitude: f64) -> Self {
        Self {
            source,
            stat,
            mode: ModifierMode::Additive,
            magnitude,
        }
    }
}

/// Fold a set of modifiers for `stat` from its neutral base.
///
/// Callers must pass the modifiers in canonical source order for the result
/// to be reproducible bit for bit; [`ModifierAggregator`] always does.
pub fn aggregate<'a>(stat: Stat, modifiers: impl IntoIterator<Item = &'a StatModifier>) -> f64 {
    let mut product = 1.0;
    let mut sum = 0.0;
    for m in modifiers {
        match m.mode {
            ModifierMode::Multiplicative => product *= m.magnitude,
            ModifierMode::Additive => sum += m.magnitude,
        }
    }
    stat.neutral_base() * product + sum
}

/// Active modifiers and the stat values derived from them.
#[derive(Debug, Default, Clone)]
pub struct ModifierAggregator {
    active: BTreeMap<Stat, BTreeMap<ModifierSource, StatModifier>>,
    values: BTreeMap<Stat, f64>,
}

impl ModifierAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `modifier` (replacing any entry from the same source for the
    /// same stat) and recompute its stat.
    pub fn apply(&mut self, modifier: StatModifier) {
        let stat = modifier.stat;
        self.active
            .entry(stat)
            .or_default()
            .insert(modifier.source.clone(), modifier);
        self.recompute(stat);
    }

    /// Remove the entry `source` contributes to `stat`, if any.
    pub fn remove(&mut self, source: &ModifierSource, stat: Stat) -> Option<StatModifier> {
        let removed = self.active.get_mut(&stat)?.remove(source);
        if removed.is_some() {
            self.recompute(stat);
        }
        removed
    }

    /// Remove everything `source` contributes, across all stats.
    pub fn remove_all_from_source(&mut self, source: &ModifierSource) -> Vec<StatModifier> {
        let mut removed = Vec::new();
        let stats: Vec<Stat> = self.active.keys().copied().collect();
        for stat in stats {
            if let Some(m) = self.remove(source, stat) {
                removed.push(m);
            }
        }
        removed
    }

    /// Current value of `stat`, or its neutral base when nothing applies.
    pub fn get(&self, stat: Stat) -> f64 {
        self.values
            .get(&stat)
            .copied()
            .unwrap_or_else(|| stat.neutral_base())
    }

    pub fn modifier(&self, source: &ModifierSource, stat: Stat) -> Option<&StatModifier> {
        self.active.get(&stat)?.get(source)
    }

    /// All active modifiers in canonical (stat, source) order.
    pub fn modifiers(&self) -> Vec<StatModifier> {
        self.active
            .values()
            .flat_map(|by_source| by_source.values().cloned())
            .collect()
    }

    pub fn has_source(&self, source: &ModifierSource) -> bool {
        self.active.values().any(|by_source| by_source.contains_key(source))
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.values.clear();
    }

    /// Rebuild from a persisted modifier list.
    pub fn restore(&mut self, modifiers: Vec<StatModifier>) {
        self.clear();
        for m in modifiers {
            self.apply(m);
        }
    }

    fn recompute(&mut self, stat: Stat) {
        match self.active.get(&stat) {
            Some(by_source) if !by_source.is_empty() => {
                let value = aggregate(stat, by_source.values());
                self.values.insert(stat, value);
            }
            _ => {
                self.active.remove(&stat);
                self.values.remove(&stat);
            }
        }
    }
}
