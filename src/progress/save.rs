//! Persisted form of the tracker.
//!
//! Progress is stored as an ordered list of `(goal_id, current, status)`
//! tuples rather than a map, so the file stays stable across catalog
//! reorderings. Restore is forgiving: entries for goals the catalog no
//! longer knows are dropped, unreadable dates become the epoch (forcing a
//! rollover), and milestones missing from the save start fresh.

use serde::{Deserialize, Serialize};

use super::state::{GoalKind, GoalProgress, GoalScope, GoalStatus};
use super::ProgressTracker;
use crate::state::GoalId;
use crate::time;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSnapshot {
    /// Milestones first, then active daily and weekly missions.
    pub goals: Vec<(GoalId, f64, GoalStatus)>,
    /// `YYYY-MM-DD`
    pub last_daily_reset: String,
    /// `YYYY-MM-DD`, the Monday of the last weekly draw.
    pub last_weekly_reset: String,
    pub seed: u64,
}

impl ProgressTracker {
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            goals: self
                .all_progress()
                .map(|p| (p.goal.clone(), p.current, p.status))
                .collect(),
            last_daily_reset: time::format_date(self.last_daily_reset),
            last_weekly_reset: time::format_date(self.last_weekly_reset),
            seed: self.seed,
        }
    }

    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        self.milestones = self
            .catalog
            .milestones()
            .map(|g| GoalProgress::new(g.id.clone()))
            .collect();
        self.daily.clear();
        self.weekly.clear();

        for (id, current, status) in &snapshot.goals {
            let Some(def) = self.catalog.get(id) else {
                log::warn!("dropping progress for unknown goal '{id}'");
                continue;
            };
            let current = if current.is_finite() {
                current.clamp(0.0, def.target)
            } else {
                0.0
            };
            let progress = GoalProgress {
                goal: id.clone(),
                current,
                status: *status,
            };
            match (def.kind, def.scope) {
                (GoalKind::Milestone, _) => {
                    if let Some(slot) = self.milestones.iter_mut().find(|p| p.goal == *id) {
                        *slot = progress;
                    }
                }
                (GoalKind::Mission, GoalScope::Daily) => {
                    restore_mission(&mut self.daily, progress, self.daily_count)
                }
                (GoalKind::Mission, GoalScope::Weekly) => {
                    restore_mission(&mut self.weekly, progress, self.weekly_count)
                }
                (GoalKind::Mission, GoalScope::Permanent) => {}
            }
        }

        self.last_daily_reset = time::parse_date_or_epoch(&snapshot.last_daily_reset);
        self.last_weekly_reset = time::parse_date_or_epoch(&snapshot.last_weekly_reset);
        self.seed = snapshot.seed;
    }
}

/// Missions are distinct and at most `limit` per scope; extras are dropped.
fn restore_mission(active: &mut Vec<GoalProgress>, progress: GoalProgress, limit: usize) {
    if active.iter().any(|p| p.goal == progress.goal) {
        log::warn!("dropping duplicate mission '{}'", progress.goal);
    } else if active.len() >= limit {
        log::warn!("dropping mission '{}' past the limit of {limit}", progress.goal);
    } else {
        active.push(progress);
    }
}
