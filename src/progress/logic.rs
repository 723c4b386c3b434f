use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use super::state::{GoalKind, GoalProgress, GoalScope, GoalStatus, Metric, ProgressUpdate, Reward};
use super::{ClaimReceipt, Completion, ProgressTracker, Rollover};
use crate::collab::CurrencyStore;
use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierAggregator, ModifierSource, StatModifier};
use crate::time;

impl ProgressTracker {
    /// Feed one metric update to every active goal tracking `metric`.
    /// Returns the goals this update completed, each reported exactly once.
    pub fn on_event(&mut self, metric: Metric, update: ProgressUpdate) -> Vec<Completion> {
        let mut completed = Vec::new();
        let lists = [&mut self.milestones, &mut self.daily, &mut self.weekly];
        for list in lists {
            for progress in list.iter_mut() {
                let Some(def) = self.catalog.get(&progress.goal) else {
                    continue;
                };
                if def.metric != metric {
                    continue;
                }
                if progress.apply(update, def.target) {
                    log::info!("goal '{}' completed", def.id);
                    completed.push(Completion {
                        goal: def.id.clone(),
                        kind: def.kind,
                    });
                }
            }
        }
        completed
    }

    /// Claim a completed goal: grant its rewards and mark it claimed.
    /// Fails without touching anything unless the goal is completed and
    /// not yet claimed.
    pub fn claim(
        &mut self,
        goal: &str,
        wallet: &mut dyn CurrencyStore,
        modifiers: &mut ModifierAggregator,
    ) -> EconomyResult<ClaimReceipt> {
        let def = self
            .catalog
            .get(goal)
            .ok_or_else(|| EconomyError::UnknownGoal(goal.to_string()))?;
        let (kind, rewards) = (def.kind, def.rewards.clone());

        let progress = self
            .progress_mut(goal)
            .ok_or_else(|| EconomyError::UnknownGoal(goal.to_string()))?;
        match progress.status {
            GoalStatus::Active => return Err(EconomyError::GoalNotCompleted(goal.to_string())),
            GoalStatus::Claimed => return Err(EconomyError::GoalAlreadyClaimed(goal.to_string())),
            GoalStatus::Completed => progress.status = GoalStatus::Claimed,
        }

        let source = match kind {
            GoalKind::Milestone => ModifierSource::Milestone(goal.to_string()),
            GoalKind::Mission => ModifierSource::Mission(goal.to_string()),
        };
        grant(&source, &rewards, wallet, modifiers);
        log::info!("goal '{goal}' claimed ({} rewards)", rewards.len());

        Ok(ClaimReceipt {
            goal: goal.to_string(),
            kind,
            rewards,
        })
    }

    /// Claim every completed goal. Returns one receipt per claim.
    pub fn claim_all(
        &mut self,
        wallet: &mut dyn CurrencyStore,
        modifiers: &mut ModifierAggregator,
    ) -> Vec<ClaimReceipt> {
        let ready: Vec<String> = self
            .all_progress()
            .filter(|p| p.is_claimable())
            .map(|p| p.goal.clone())
            .collect();
        let mut receipts = Vec::with_capacity(ready.len());
        for id in &ready {
            if let Ok(receipt) = self.claim(id, wallet, modifiers) {
                receipts.push(receipt);
            }
        }
        receipts
    }

    /// Regenerate any mission set whose calendar period has ended. Calling
    /// this again within the same period is a no-op.
    pub fn roll_over(&mut self, today: NaiveDate) -> Vec<Rollover> {
        let mut rolled = Vec::new();

        if time::daily_rollover_due(self.last_daily_reset, today) {
            self.daily = self.draw_missions(GoalScope::Daily, today);
            self.last_daily_reset = today;
            rolled.push(Rollover {
                scope: GoalScope::Daily,
                goals: self.daily.iter().map(|p| p.goal.clone()).collect(),
            });
        }

        let week = time::week_start(today);
        if time::weekly_rollover_due(self.last_weekly_reset, today) {
            self.weekly = self.draw_missions(GoalScope::Weekly, week);
            self.last_weekly_reset = week;
            rolled.push(Rollover {
                scope: GoalScope::Weekly,
                goals: self.weekly.iter().map(|p| p.goal.clone()).collect(),
            });
        }

        for r in &rolled {
            log::debug!("{:?} missions regenerated: {:?}", r.scope, r.goals);
        }
        rolled
    }

    /// Draw without replacement from the scope's pool. The draw depends only
    /// on the seed and the period start.
    fn draw_missions(&self, scope: GoalScope, period_start: NaiveDate) -> Vec<GoalProgress> {
        let pool = self.catalog.mission_pool(scope);
        let count = match scope {
            GoalScope::Daily => self.daily_count,
            GoalScope::Weekly => self.weekly_count,
            GoalScope::Permanent => 0,
        }
        .min(pool.len());

        let mut rng = StdRng::seed_from_u64(period_seed(self.seed, scope, period_start));
        sample(&mut rng, pool.len(), count)
            .into_iter()
            .map(|i| GoalProgress::new(pool[i].id.clone()))
            .collect()
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn progress(&self, goal: &str) -> Option<&GoalProgress> {
        self.all_progress().find(|p| p.goal == goal)
    }

    pub fn milestones(&self) -> &[GoalProgress] {
        &self.milestones
    }

    /// Daily missions first, then weekly.
    pub fn active_missions(&self) -> impl Iterator<Item = &GoalProgress> {
        self.daily.iter().chain(self.weekly.iter())
    }

    pub fn claimable_count(&self) -> usize {
        self.all_progress().filter(|p| p.is_claimable()).count()
    }

    pub(super) fn all_progress(&self) -> impl Iterator<Item = &GoalProgress> {
        self.milestones.iter().chain(self.active_missions())
    }

    fn progress_mut(&mut self, goal: &str) -> Option<&mut GoalProgress> {
        self.milestones
            .iter_mut()
            .chain(self.daily.iter_mut())
            .chain(self.weekly.iter_mut())
            .find(|p| p.goal == goal)
    }
}

fn grant(
    source: &ModifierSource,
    rewards: &[Reward],
    wallet: &mut dyn CurrencyStore,
    modifiers: &mut ModifierAggregator,
) {
    for reward in rewards {
        match reward {
            Reward::Currency { kind, amount } => wallet.add(*kind, *amount),
            Reward::Modifier {
                stat,
                mode,
                magnitude,
            } => modifiers.apply(StatModifier {
                source: source.clone(),
                stat: *stat,
                mode: *mode,
                magnitude: *magnitude,
            }),
        }
    }
}

fn period_seed(seed: u64, scope: GoalScope, period_start: NaiveDate) -> u64 {
    let salt = match scope {
        GoalScope::Permanent => 0,
        GoalScope::Daily => 1,
        GoalScope::Weekly => 2,
    };
    let day = period_start.num_days_from_ce() as u64;
    seed ^ day.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::Wallet;
    use crate::config::MissionConfig;
    use crate::modifiers::Stat;
    use crate::progress::state::{default_goals, GoalCatalog};
    use crate::state::CurrencyKind;

    fn tracker() -> ProgressTracker {
        let catalog = GoalCatalog::new(default_goals()).unwrap();
        ProgressTracker::new(catalog, &MissionConfig::default(), 42)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absolute_update_completes_on_reaching_target() {
        let mut t = tracker();
        let first = t.on_event(Metric::LifetimeMoney, ProgressUpdate::Absolute(999.0));
        assert!(first.is_empty());
        assert_eq!(t.progress("lifetime_1k").unwrap().status, GoalStatus::Active);

        let second = t.on_event(Metric::LifetimeMoney, ProgressUpdate::Absolute(1000.0));
        assert_eq!(
            second,
            vec![Completion {
                goal: "lifetime_1k".into(),
                kind: GoalKind::Milestone
            }]
        );
        assert_eq!(t.progress("lifetime_1k").unwrap().status, GoalStatus::Completed);
    }

    #[test]
    fn completion_reported_once() {
        let mut t = tracker();
        assert_eq!(t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(1.0)).len(), 1);
        let again = t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(1.0));
        assert!(again.iter().all(|c| c.goal != "first_roll"));
    }

    #[test]
    fn unrelated_metric_does_nothing() {
        let mut t = tracker();
        t.on_event(Metric::UnitsDestroyed, ProgressUpdate::Increment(3.0));
        assert!((t.progress("first_roll").unwrap().current - 0.0).abs() < 0.001);
    }

    #[test]
    fn claim_grants_currency_and_modifier() {
        let mut t = tracker();
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        t.on_event(Metric::LifetimeMoney, ProgressUpdate::Absolute(2_000_000.0));

        t.claim("lifetime_1m", &mut wallet, &mut mods).unwrap();
        assert!((wallet.amount(CurrencyKind::TimeShards) - 1.0).abs() < 0.001);
        assert!((mods.get(Stat::GlobalMoneyMultiplier) - 1.1).abs() < 1e-12);
        assert!(mods.has_source(&ModifierSource::Milestone("lifetime_1m".into())));
        assert_eq!(t.progress("lifetime_1m").unwrap().status, GoalStatus::Claimed);
    }

    #[test]
    fn claim_twice_fails_and_grants_nothing() {
        let mut t = tracker();
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(1.0));
        t.claim("first_roll", &mut wallet, &mut mods).unwrap();
        let err = t.claim("first_roll", &mut wallet, &mut mods);
        assert!(matches!(err, Err(EconomyError::GoalAlreadyClaimed(_))));
        assert!((wallet.amount(CurrencyKind::Money) - 10.0).abs() < 0.001);
    }

    #[test]
    fn claim_incomplete_fails() {
        let mut t = tracker();
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        let err = t.claim("roll_1k", &mut wallet, &mut mods);
        assert!(matches!(err, Err(EconomyError::GoalNotCompleted(_))));
        assert!((mods.get(Stat::CycleSpeed) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn claim_unknown_or_inactive_mission_fails() {
        let mut t = tracker();
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        assert!(matches!(
            t.claim("nope", &mut wallet, &mut mods),
            Err(EconomyError::UnknownGoal(_))
        ));
        // Known mission, but not drawn yet.
        assert!(matches!(
            t.claim("daily_roll_200", &mut wallet, &mut mods),
            Err(EconomyError::UnknownGoal(_))
        ));
    }

    #[test]
    fn claim_all_claims_every_completed_goal() {
        let mut t = tracker();
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(1_000.0));
        assert_eq!(t.claimable_count(), 2);
        let receipts = t.claim_all(&mut wallet, &mut mods);
        assert_eq!(receipts.len(), 2);
        assert_eq!(t.claimable_count(), 0);
    }

    #[test]
    fn first_rollover_draws_both_scopes() {
        let mut t = tracker();
        let rolled = t.roll_over(date(2024, 3, 6));
        assert_eq!(rolled.len(), 2);
        assert_eq!(t.active_missions().count(), 3 + 2);
        assert_eq!(t.last_weekly_reset(), date(2024, 3, 4));
    }

    #[test]
    fn double_daily_rollover_regenerates_once() {
        let mut t = tracker();
        t.roll_over(date(2024, 3, 6));
        t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(50.0));
        let before: Vec<GoalProgress> = t.active_missions().cloned().collect();

        assert!(t.roll_over(date(2024, 3, 6)).is_empty());
        let after: Vec<GoalProgress> = t.active_missions().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn next_day_replaces_daily_only() {
        let mut t = tracker();
        t.roll_over(date(2024, 3, 6));
        let weekly_before: Vec<String> = t.weekly.iter().map(|p| p.goal.clone()).collect();
        let rolled = t.roll_over(date(2024, 3, 7));
        assert_eq!(rolled.len(), 1);
        assert_eq!(rolled[0].scope, GoalScope::Daily);
        let weekly_after: Vec<String> = t.weekly.iter().map(|p| p.goal.clone()).collect();
        assert_eq!(weekly_before, weekly_after);
    }

    #[test]
    fn sunday_to_monday_rolls_weekly() {
        let mut t = tracker();
        t.roll_over(date(2024, 3, 10)); // Sunday
        let rolled = t.roll_over(date(2024, 3, 11)); // Monday
        assert!(rolled.iter().any(|r| r.scope == GoalScope::Weekly));
    }

    #[test]
    fn draws_are_deterministic_and_distinct() {
        let mut a = tracker();
        let mut b = tracker();
        a.roll_over(date(2024, 3, 6));
        b.roll_over(date(2024, 3, 6));
        let ids_a: Vec<String> = a.active_missions().map(|p| p.goal.clone()).collect();
        let ids_b: Vec<String> = b.active_missions().map(|p| p.goal.clone()).collect();
        assert_eq!(ids_a, ids_b);

        let mut daily: Vec<&String> = ids_a[..3].iter().collect();
        daily.sort();
        daily.dedup();
        assert_eq!(daily.len(), 3);
    }

    #[test]
    fn mission_progress_resets_at_rollover() {
        let mut t = tracker();
        t.roll_over(date(2024, 3, 6));
        t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(150.0));
        t.roll_over(date(2024, 3, 7));
        assert!(t.daily.iter().all(|p| p.current == 0.0 && p.status == GoalStatus::Active));
    }

    #[test]
    fn mission_reward_uses_mission_source() {
        let catalog = GoalCatalog::new(vec![crate::progress::GoalDefinition {
            id: "d".into(),
            name: "d".into(),
            kind: GoalKind::Mission,
            metric: Metric::DiceRolled,
            target: 1.0,
            rewards: vec![Reward::Modifier {
                stat: Stat::CycleSpeed,
                mode: crate::modifiers::ModifierMode::Multiplicative,
                magnitude: 2.0,
            }],
            scope: GoalScope::Daily,
        }])
        .unwrap();
        let mut t = ProgressTracker::new(catalog, &MissionConfig::default(), 1);
        t.roll_over(date(2024, 1, 1));
        t.on_event(Metric::DiceRolled, ProgressUpdate::Increment(1.0));
        let mut wallet = Wallet::new();
        let mut mods = ModifierAggregator::new();
        t.claim("d", &mut wallet, &mut mods).unwrap();
        assert!(mods.has_source(&ModifierSource::Mission("d".into())));
    }
}
