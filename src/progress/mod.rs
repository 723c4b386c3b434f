//! Goal tracking shared by permanent milestones and calendar missions.
//!
//! Every goal instance moves one way through `Active → Completed → Claimed`.
//! Milestones live for the whole save and survive Time Fracture; missions are
//! thrown away and redrawn from their pool at each daily or weekly boundary.

mod logic;
pub mod save;
pub mod state;

use chrono::NaiveDate;

use crate::config::MissionConfig;
use crate::state::GoalId;
use crate::time;

pub use save::ProgressSnapshot;
pub use state::{
    default_goals, GoalCatalog, GoalDefinition, GoalKind, GoalProgress, GoalScope, GoalStatus,
    Metric, ProgressUpdate, Reward,
};

/// A goal that reached its target during an update.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub goal: GoalId,
    pub kind: GoalKind,
}

/// What a successful claim paid out.
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimReceipt {
    pub goal: GoalId,
    pub kind: GoalKind,
    pub rewards: Vec<Reward>,
}

/// Missions drawn by one calendar rollover.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollover {
    pub scope: GoalScope,
    pub goals: Vec<GoalId>,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    catalog: GoalCatalog,
    daily_count: usize,
    weekly_count: usize,
    /// One entry per catalog milestone, catalog order.
    milestones: Vec<GoalProgress>,
    daily: Vec<GoalProgress>,
    weekly: Vec<GoalProgress>,
    last_daily_reset: NaiveDate,
    last_weekly_reset: NaiveDate,
    /// Mixed with the period start to draw that period's missions.
    seed: u64,
}

impl ProgressTracker {
    /// A fresh tracker. Both calendar stamps start at the epoch, so the
    /// first [`roll_over`](Self::roll_over) draws missions.
    pub fn new(catalog: GoalCatalog, missions: &MissionConfig, seed: u64) -> Self {
        let milestones = catalog
            .milestones()
            .map(|g| GoalProgress::new(g.id.clone()))
            .collect();
        Self {
            catalog,
            daily_count: missions.daily_count,
            weekly_count: missions.weekly_count,
            milestones,
            daily: Vec::new(),
            weekly: Vec::new(),
            last_daily_reset: time::epoch(),
            last_weekly_reset: time::epoch(),
            seed,
        }
    }

    pub fn catalog(&self) -> &GoalCatalog {
        &self.catalog
    }

    pub fn last_daily_reset(&self) -> NaiveDate {
        self.last_daily_reset
    }

    pub fn last_weekly_reset(&self) -> NaiveDate {
        self.last_weekly_reset
    }
}
