//! Goal definitions, per-goal progress, and the validated catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierMode, Stat};
use crate::state::{CurrencyKind, GoalId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalKind {
    /// Lifetime objective, claimed once per save.
    Milestone,
    /// Time-boxed objective, replaced at its calendar boundary.
    Mission,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GoalScope {
    Permanent,
    Daily,
    Weekly,
}

/// Counters and totals a goal can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    DiceRolled,
    MoneyEarned,
    DarkMatterEarned,
    /// Lifetime money, fed as absolute values.
    LifetimeMoney,
    /// Dice currently owned, fed as absolute values.
    UnitsOwned,
    /// Skills currently unlocked, fed as absolute values.
    SkillsUnlocked,
    UnitsDestroyed,
    PrestigesPerformed,
    HelpersHired,
}

impl Metric {
    /// Whether the metric is reported as a running total rather than as
    /// per-event deltas. Missions only make sense on delta metrics.
    pub fn is_absolute(&self) -> bool {
        matches!(
            self,
            Metric::LifetimeMoney | Metric::UnitsOwned | Metric::SkillsUnlocked
        )
    }
}

/// How a reported value combines with a goal's current amount.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressUpdate {
    Increment(f64),
    Absolute(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Reward {
    Currency { kind: CurrencyKind, amount: f64 },
    /// Applied under the goal's own modifier source.
    Modifier {
        stat: Stat,
        mode: ModifierMode,
        magnitude: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: GoalId,
    pub name: String,
    pub kind: GoalKind,
    pub metric: Metric,
    pub target: f64,
    pub rewards: Vec<Reward>,
    pub scope: GoalScope,
}

/// One-way lifecycle of a goal instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    Active,
    Completed,
    Claimed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: GoalId,
    pub current: f64,
    pub status: GoalStatus,
}

impl GoalProgress {
    pub fn new(goal: GoalId) -> Self {
        Self {
            goal,
            current: 0.0,
            status: GoalStatus::Active,
        }
    }

    pub fn is_claimable(&self) -> bool {
        self.status == GoalStatus::Completed
    }

    /// Fold `update` into the current amount, clamped to `[0, target]`.
    /// Returns true exactly when this update completes the goal.
    pub fn apply(&mut self, update: ProgressUpdate, target: f64) -> bool {
        if self.status != GoalStatus::Active {
            return false;
        }
        let next = match update {
            ProgressUpdate::Increment(delta) => self.current + delta,
            ProgressUpdate::Absolute(value) => value,
        };
        if !next.is_finite() {
            return false;
        }
        self.current = next.clamp(0.0, target);
        if self.current >= target {
            self.status = GoalStatus::Completed;
            return true;
        }
        false
    }
}

/// Validated, immutable set of goal definitions.
#[derive(Debug, Clone, Default)]
pub struct GoalCatalog {
    goals: Vec<GoalDefinition>,
}

impl GoalCatalog {
    pub fn new(goals: Vec<GoalDefinition>) -> EconomyResult<Self> {
        let mut seen = BTreeSet::new();
        for goal in &goals {
            if let Some(reason) = invalid_reason(goal) {
                return Err(EconomyError::InvalidGoal {
                    id: goal.id.clone(),
                    reason,
                });
            }
            if !seen.insert(goal.id.as_str()) {
                return Err(EconomyError::InvalidGoal {
                    id: goal.id.clone(),
                    reason: "duplicate id",
                });
            }
        }
        Ok(Self { goals })
    }

    pub fn get(&self, id: &str) -> Option<&GoalDefinition> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn all(&self) -> &[GoalDefinition] {
        &self.goals
    }

    pub fn milestones(&self) -> impl Iterator<Item = &GoalDefinition> {
        self.goals.iter().filter(|g| g.kind == GoalKind::Milestone)
    }

    /// Mission pool for one calendar scope, in catalog order.
    pub fn mission_pool(&self, scope: GoalScope) -> Vec<&GoalDefinition> {
        self.goals
            .iter()
            .filter(|g| g.kind == GoalKind::Mission && g.scope == scope)
            .collect()
    }
}

fn invalid_reason(goal: &GoalDefinition) -> Option<&'static str> {
    if goal.id.is_empty() {
        return Some("empty id");
    }
    if !goal.target.is_finite() || goal.target <= 0.0 {
        return Some("target must be positive");
    }
    match goal.kind {
        GoalKind::Milestone if goal.scope != GoalScope::Permanent => {
            Some("milestones must be permanent")
        }
        GoalKind::Mission if goal.scope == GoalScope::Permanent => {
            Some("missions must be daily or weekly")
        }
        GoalKind::Mission if goal.metric.is_absolute() => {
            Some("missions must track a per-event metric")
        }
        _ => None,
    }
}

// ── Stock goals ─────────────────────────────────────────────────────────────

fn goal(
    id: &str,
    name: &str,
    kind: GoalKind,
    scope: GoalScope,
    metric: Metric,
    target: f64,
    rewards: Vec<Reward>,
) -> GoalDefinition {
    GoalDefinition {
        id: id.into(),
        name: name.into(),
        kind,
        metric,
        target,
        rewards,
        scope,
    }
}

fn currency(kind: CurrencyKind, amount: f64) -> Reward {
    Reward::Currency { kind, amount }
}

fn multiplier(stat: Stat, magnitude: f64) -> Reward {
    Reward::Modifier {
        stat,
        mode: ModifierMode::Multiplicative,
        magnitude,
    }
}

/// The stock milestones and mission pools shipped with the game.
pub fn default_goals() -> Vec<GoalDefinition> {
    use CurrencyKind::{DarkMatter, Money, TimeShards};
    use GoalKind::{Milestone, Mission};
    use GoalScope::{Daily, Permanent, Weekly};

    vec![
        // Milestones
        goal("first_roll", "First Roll", Milestone, Permanent, Metric::DiceRolled, 1.0,
            vec![currency(Money, 10.0)]),
        goal("roll_1k", "Dice Addict", Milestone, Permanent, Metric::DiceRolled, 1_000.0,
            vec![multiplier(Stat::CycleSpeed, 1.05)]),
        goal("lifetime_1k", "Pocket Change", Milestone, Permanent, Metric::LifetimeMoney, 1_000.0,
            vec![multiplier(Stat::GlobalMoneyMultiplier, 1.05)]),
        goal("lifetime_1m", "Millionaire", Milestone, Permanent, Metric::LifetimeMoney, 1_000_000.0,
            vec![multiplier(Stat::GlobalMoneyMultiplier, 1.1), currency(TimeShards, 1.0)]),
        goal("table_full", "Full Table", Milestone, Permanent, Metric::UnitsOwned, 10.0,
            vec![Reward::Modifier { stat: Stat::FlatValueBonus, mode: ModifierMode::Additive, magnitude: 1.0 }]),
        goal("first_fracture", "Time Fracture", Milestone, Permanent, Metric::PrestigesPerformed, 1.0,
            vec![multiplier(Stat::DarkMatterMultiplier, 1.1)]),
        goal("burnout", "Burnout", Milestone, Permanent, Metric::UnitsDestroyed, 5.0,
            vec![currency(TimeShards, 2.0)]),
        // Daily missions
        goal("daily_roll_200", "Roll 200 dice", Mission, Daily, Metric::DiceRolled, 200.0,
            vec![currency(DarkMatter, 2.0)]),
        goal("daily_earn_5k", "Earn 5,000 money", Mission, Daily, Metric::MoneyEarned, 5_000.0,
            vec![currency(DarkMatter, 3.0)]),
        goal("daily_dm_5", "Gather 5 dark matter", Mission, Daily, Metric::DarkMatterEarned, 5.0,
            vec![currency(Money, 500.0)]),
        goal("daily_overheat", "Burn out a die", Mission, Daily, Metric::UnitsDestroyed, 1.0,
            vec![currency(TimeShards, 1.0)]),
        goal("daily_hire", "Hire a helper", Mission, Daily, Metric::HelpersHired, 1.0,
            vec![currency(DarkMatter, 1.0)]),
        // Weekly missions
        goal("weekly_roll_5k", "Roll 5,000 dice", Mission, Weekly, Metric::DiceRolled, 5_000.0,
            vec![currency(TimeShards, 2.0)]),
        goal("weekly_earn_1m", "Earn 1,000,000 money", Mission, Weekly, Metric::MoneyEarned, 1_000_000.0,
            vec![currency(TimeShards, 3.0)]),
        goal("weekly_fracture", "Fracture time", Mission, Weekly, Metric::PrestigesPerformed, 1.0,
            vec![currency(TimeShards, 5.0)]),
    ]
}
