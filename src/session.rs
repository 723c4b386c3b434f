//! The host-facing game session.
//!
//! [`Session`] owns every subsystem and is the only place they meet. Every
//! notification goes through [`Session::publish`], which first turns it into
//! metric updates for the progress tracker and then queues it on the bus.
//! Subsystems never subscribe to one another.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use crate::collab::{
    default_skills, CurrencyStore, HelperPool, HelperRegistry, SkillDefinition, SkillRegistry,
    SkillTree, UnitRegistry, UnitRoster, Wallet,
};
use crate::config::EconomyConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::events::{EventBus, GameEvent};
use crate::modifiers::{ModifierAggregator, Stat};
use crate::offline::{self, OfflineEarnings, ProductionContext};
use crate::overclock::{OverclockMachine, OverclockOutcome, OverclockPhase};
use crate::prestige::{PrestigeOrchestrator, PrestigeOutcome, Requirements, ResetTargets};
use crate::progress::{
    default_goals, ClaimReceipt, GoalCatalog, Metric, ProgressTracker, ProgressUpdate, Reward,
    Rollover,
};
use crate::state::{CurrencyKind, UnitId};
use crate::time::{self, CycleClock};

#[derive(Debug)]
pub struct Session {
    pub(crate) config: EconomyConfig,
    pub(crate) wallet: Wallet,
    pub(crate) roster: UnitRoster,
    pub(crate) skills: SkillTree,
    pub(crate) helpers: HelperPool,
    pub(crate) modifiers: ModifierAggregator,
    pub(crate) tracker: ProgressTracker,
    pub(crate) overclock: OverclockMachine,
    pub(crate) prestige: PrestigeOrchestrator,
    clock: CycleClock,
    bus: EventBus,
    rng: StdRng,
    pub(crate) seed: u64,
    /// Last balance reported per currency, for turning balance changes into
    /// earned deltas.
    previous: BTreeMap<CurrencyKind, f64>,
}

impl Session {
    pub fn new(
        config: EconomyConfig,
        goals: GoalCatalog,
        skills: Vec<SkillDefinition>,
        seed: u64,
    ) -> Self {
        let tracker = ProgressTracker::new(goals, &config.missions, seed);
        let prestige = PrestigeOrchestrator::new(config.prestige.clone());
        Self {
            config,
            wallet: Wallet::new(),
            roster: UnitRoster::with_baseline(),
            skills: SkillTree::new(skills),
            helpers: HelperPool::new(),
            modifiers: ModifierAggregator::new(),
            tracker,
            overclock: OverclockMachine::new(),
            prestige,
            clock: CycleClock::new(),
            bus: EventBus::new(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            previous: BTreeMap::new(),
        }
    }

    /// A session on the stock goals and skill tree.
    pub fn with_defaults(config: EconomyConfig, seed: u64) -> EconomyResult<Self> {
        let goals = GoalCatalog::new(default_goals())?;
        Ok(Self::new(config, goals, default_skills(), seed))
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    pub fn skills(&self) -> &SkillTree {
        &self.skills
    }

    pub fn helpers(&self) -> &HelperPool {
        &self.helpers
    }

    pub fn modifiers(&self) -> &ModifierAggregator {
        &self.modifiers
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn overclock(&self) -> &OverclockMachine {
        &self.overclock
    }

    pub fn prestige(&self) -> &PrestigeOrchestrator {
        &self.prestige
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        self.modifiers.get(stat)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.bus.subscribe(listener);
    }

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.bus.drain()
    }

    // ── Production ──────────────────────────────────────────────────────────

    /// Seconds per production cycle under the current `CycleSpeed`.
    pub fn cycle_seconds(&self) -> f64 {
        let speed = self.stat(Stat::CycleSpeed);
        if speed > 0.0 {
            self.config.production.base_cycle_seconds / speed
        } else {
            f64::INFINITY
        }
    }

    /// Rollers active this run: the player plus every hired helper.
    pub fn producers(&self) -> u32 {
        1 + self.helpers.count()
    }

    fn units_per_cycle(&self) -> usize {
        let bonus = self.stat(Stat::BonusUnitsPerCycle).max(0.0).floor() as usize;
        (self.config.production.base_units_per_cycle as usize + bonus)
            .min(self.roster.units().len())
    }

    /// Feed wall-clock time. Each completed cycle, every producer rolls a
    /// random selection of distinct dice. Returns the cycles completed.
    pub fn advance(&mut self, seconds: f64) -> u32 {
        let cycles = self.clock.advance(seconds, self.cycle_seconds());
        for _ in 0..cycles {
            for _ in 0..self.producers() {
                let count = self.units_per_cycle();
                let owned = self.roster.units().len();
                if count == 0 {
                    break;
                }
                let picks: Vec<UnitId> = sample(&mut self.rng, owned, count)
                    .into_iter()
                    .map(|i| self.roster.units()[i].id)
                    .collect();
                for id in picks {
                    // A die destroyed earlier in this cycle is simply skipped.
                    let _ = self.roll_unit(id);
                }
            }
        }
        cycles
    }

    /// Roll one die. Returns the money it earned, overclock bonus included.
    pub fn roll_unit(&mut self, id: UnitId) -> EconomyResult<f64> {
        let unit = self
            .roster
            .unit(id)
            .cloned()
            .ok_or(EconomyError::UnknownUnit(id))?;

        let earned =
            unit.primary_value(self.stat(Stat::FlatValueBonus)) * self.stat(Stat::GlobalMoneyMultiplier);
        let dark_matter = unit.secondary_value() * self.stat(Stat::DarkMatterMultiplier);
        let outcome = self
            .overclock
            .on_unit_produced(&unit, earned, &self.config.overclock);
        let bonus = match &outcome {
            OverclockOutcome::Idle => 0.0,
            OverclockOutcome::Heated { bonus, .. } | OverclockOutcome::Destroyed { bonus, .. } => {
                *bonus
            }
        };
        let total = earned + bonus;

        self.wallet.add(CurrencyKind::Money, total);
        self.publish(GameEvent::UnitProduced {
            unit: id,
            earned: total,
            bonus_event: outcome != OverclockOutcome::Idle,
        });
        self.publish_balance(CurrencyKind::Money);
        if dark_matter > 0.0 {
            self.wallet.add(CurrencyKind::DarkMatter, dark_matter);
            self.publish_balance(CurrencyKind::DarkMatter);
        }

        match outcome {
            OverclockOutcome::Heated {
                heat,
                warning: true,
                ..
            } => self.publish(GameEvent::OverclockCritical { unit: id, heat }),
            OverclockOutcome::Destroyed {
                reward,
                bonus_total,
                ..
            } => {
                self.roster.remove_unit(id);
                self.wallet.add(CurrencyKind::TimeShards, reward);
                self.publish(GameEvent::UnitDestroyed {
                    unit: id,
                    reward,
                    bonus_total,
                });
                self.publish_balance(CurrencyKind::TimeShards);
            }
            _ => {}
        }
        Ok(total)
    }

    pub fn unit_cost(&self, tier: u8) -> f64 {
        self.roster.purchase_cost(
            tier,
            self.stat(Stat::CostReduction),
            &self.config.production,
        )
    }

    pub fn buy_unit(&mut self, tier: u8) -> EconomyResult<UnitId> {
        let tier = tier.max(1);
        let cost = self.unit_cost(tier);
        if !self.wallet.spend(CurrencyKind::Money, cost) {
            return Err(EconomyError::InsufficientFunds {
                kind: CurrencyKind::Money,
                required: cost,
                available: self.wallet.amount(CurrencyKind::Money),
            });
        }
        let unit = self.roster.add_unit(tier);
        self.publish(GameEvent::UnitPurchased { unit, tier, cost });
        self.publish_balance(CurrencyKind::Money);
        Ok(unit)
    }

    pub fn hire_helper(&mut self) -> EconomyResult<u32> {
        let count = self.helpers.hire(
            &mut self.wallet,
            &self.config.helpers,
            self.modifiers.get(Stat::HelperCap),
        )?;
        self.publish(GameEvent::HelperHired { count });
        self.publish_balance(CurrencyKind::Money);
        Ok(count)
    }

    pub fn start_overclock(&mut self, id: UnitId) -> EconomyResult<()> {
        if self.roster.unit(id).is_none() {
            return Err(match self.overclock.phase(id) {
                OverclockPhase::Destroyed => EconomyError::UnitDestroyed(id),
                _ => EconomyError::UnknownUnit(id),
            });
        }
        self.overclock.start(id)?;
        self.publish(GameEvent::OverclockStarted { unit: id });
        Ok(())
    }

    // ── Skills ──────────────────────────────────────────────────────────────

    pub fn unlock_skill(&mut self, id: &str) -> EconomyResult<()> {
        self.skills.unlock(id, &mut self.wallet, &mut self.modifiers)?;
        self.publish(GameEvent::SkillUnlocked { skill: id.to_string() });
        self.publish_balance(CurrencyKind::DarkMatter);
        Ok(())
    }

    pub fn refund_skill(&mut self, id: &str) -> EconomyResult<f64> {
        let refund = self.skills.refund(id, &mut self.wallet, &mut self.modifiers)?;
        self.publish(GameEvent::SkillRefunded {
            skill: id.to_string(),
            refund,
        });
        self.publish_balance(CurrencyKind::DarkMatter);
        Ok(refund)
    }

    // ── Goals ───────────────────────────────────────────────────────────────

    pub fn claim_goal(&mut self, id: &str) -> EconomyResult<ClaimReceipt> {
        let receipt = self
            .tracker
            .claim(id, &mut self.wallet, &mut self.modifiers)?;
        self.announce_claim(&receipt);
        Ok(receipt)
    }

    pub fn claim_all(&mut self) -> Vec<ClaimReceipt> {
        let receipts = self.tracker.claim_all(&mut self.wallet, &mut self.modifiers);
        for receipt in &receipts {
            self.announce_claim(receipt);
        }
        receipts
    }

    fn announce_claim(&mut self, receipt: &ClaimReceipt) {
        self.publish(GameEvent::GoalClaimed {
            goal: receipt.goal.clone(),
        });
        for reward in &receipt.rewards {
            if let Reward::Currency { kind, .. } = reward {
                self.publish_balance(*kind);
            }
        }
    }

    /// Redraw missions whose period has ended. Safe to call any number of
    /// times; only the first call in a new period does anything.
    pub fn check_calendar(&mut self, today: NaiveDate) -> Vec<Rollover> {
        let rolled = self.tracker.roll_over(today);
        for r in &rolled {
            self.publish(GameEvent::MissionsRegenerated {
                scope: r.scope,
                goals: r.goals.clone(),
            });
        }
        rolled
    }

    // ── Prestige ────────────────────────────────────────────────────────────

    pub fn prestige_requirements(&self) -> Requirements {
        self.prestige.requirements()
    }

    pub fn can_prestige(&self) -> bool {
        self.prestige.can_prestige(&self.wallet)
    }

    pub fn preview_prestige(&self) -> f64 {
        self.prestige.preview_reward(&self.wallet)
    }

    pub fn perform_prestige(&mut self) -> EconomyResult<PrestigeOutcome> {
        let outcome = self.prestige.perform(ResetTargets {
            wallet: &mut self.wallet,
            units: &mut self.roster,
            skills: &mut self.skills,
            helpers: Some(&mut self.helpers),
            modifiers: &mut self.modifiers,
        })?;
        // The old dice are gone, and with them any running overclock.
        self.overclock.abandon_all();
        self.clock.reset();

        self.publish(GameEvent::PrestigePerformed {
            level: outcome.new_level,
            reward: outcome.reward,
        });
        for kind in CurrencyKind::all() {
            self.publish_balance(*kind);
        }
        Ok(outcome)
    }

    // ── Offline ─────────────────────────────────────────────────────────────

    pub fn production_context(&self) -> ProductionContext {
        let (average_primary_yield, average_secondary_yield) = ProductionContext::average_yields(
            self.roster.units(),
            self.stat(Stat::FlatValueBonus),
        );
        ProductionContext {
            base_cycle_seconds: self.config.production.base_cycle_seconds,
            speed_multiplier: self.stat(Stat::CycleSpeed),
            producers: self.producers(),
            base_units_per_cycle: self.config.production.base_units_per_cycle,
            bonus_units: self.stat(Stat::BonusUnitsPerCycle),
            available_units: self.roster.units().len(),
            efficiency: (self.config.offline.efficiency + self.stat(Stat::OfflineEfficiency))
                .clamp(0.0, 1.0),
            average_primary_yield,
            average_secondary_yield,
            primary_multiplier: self.stat(Stat::GlobalMoneyMultiplier),
            secondary_multiplier: self.stat(Stat::DarkMatterMultiplier),
        }
    }

    /// Credit earnings for the time between `last_seen_unix` and `now_unix`.
    pub fn apply_offline(&mut self, last_seen_unix: i64, now_unix: i64) -> OfflineEarnings {
        let elapsed = time::elapsed_between(last_seen_unix, now_unix);
        let earnings = offline::simulate(elapsed, &self.production_context(), &self.config.offline);
        if earnings.is_empty() {
            return earnings;
        }
        self.wallet.add(CurrencyKind::Money, earnings.primary);
        self.wallet.add(CurrencyKind::DarkMatter, earnings.secondary);
        log::info!(
            "offline for {:.0}s: +{:.2} money, +{:.4} dark matter",
            earnings.elapsed_seconds,
            earnings.primary,
            earnings.secondary
        );
        self.publish(GameEvent::OfflineEarningsApplied {
            primary: earnings.primary,
            secondary: earnings.secondary,
            elapsed_seconds: earnings.elapsed_seconds,
        });
        self.publish_balance(CurrencyKind::Money);
        self.publish_balance(CurrencyKind::DarkMatter);
        earnings
    }

    // ── Dispatch ────────────────────────────────────────────────────────────

    pub(crate) fn publish_balance(&mut self, kind: CurrencyKind) {
        let amount = self.wallet.amount(kind);
        self.publish(GameEvent::CurrencyChanged { kind, amount });
    }

    /// Route `event` to the progress tracker, queue it, then queue any goal
    /// completions it caused.
    fn publish(&mut self, event: GameEvent) {
        let updates = self.metric_updates(&event);
        let mut completions = Vec::new();
        for (metric, update) in updates {
            completions.extend(self.tracker.on_event(metric, update));
        }
        self.bus.publish(event);
        for c in completions {
            self.bus.publish(GameEvent::GoalCompleted {
                goal: c.goal,
                kind: c.kind,
            });
        }
    }

    fn metric_updates(&mut self, event: &GameEvent) -> Vec<(Metric, ProgressUpdate)> {
        use ProgressUpdate::{Absolute, Increment};

        match event {
            GameEvent::UnitProduced { .. } => vec![(Metric::DiceRolled, Increment(1.0))],
            GameEvent::CurrencyChanged { kind, amount } => {
                // Only growth counts as earned; spends and resets just move
                // the baseline.
                let previous = self.previous.insert(*kind, *amount).unwrap_or(0.0);
                let delta = amount - previous;
                let mut updates = Vec::new();
                match kind {
                    CurrencyKind::Money => {
                        if delta > 0.0 {
                            updates.push((Metric::MoneyEarned, Increment(delta)));
                        }
                        updates.push((
                            Metric::LifetimeMoney,
                            Absolute(self.wallet.lifetime_earned(CurrencyKind::Money)),
                        ));
                    }
                    CurrencyKind::DarkMatter if delta > 0.0 => {
                        updates.push((Metric::DarkMatterEarned, Increment(delta)));
                    }
                    _ => {}
                }
                updates
            }
            GameEvent::UnitPurchased { .. } => vec![(Metric::UnitsOwned, Absolute(self.units_owned()))],
            GameEvent::UnitDestroyed { .. } => vec![
                (Metric::UnitsDestroyed, Increment(1.0)),
                (Metric::UnitsOwned, Absolute(self.units_owned())),
            ],
            GameEvent::HelperHired { .. } => vec![(Metric::HelpersHired, Increment(1.0))],
            GameEvent::SkillUnlocked { .. } | GameEvent::SkillRefunded { .. } => {
                vec![(Metric::SkillsUnlocked, Absolute(self.skills_unlocked()))]
            }
            GameEvent::PrestigePerformed { .. } => vec![
                (Metric::PrestigesPerformed, Increment(1.0)),
                (Metric::UnitsOwned, Absolute(self.units_owned())),
                (Metric::SkillsUnlocked, Absolute(self.skills_unlocked())),
            ],
            _ => Vec::new(),
        }
    }

    fn units_owned(&self) -> f64 {
        self.roster.units().len() as f64
    }

    fn skills_unlocked(&self) -> f64 {
        self.skills.unlocked().len() as f64
    }

    /// Take the current balances as the baseline for earned deltas. Called
    /// after a load so restored money is not counted as earned.
    /// Restart the live dice selection from `seed`.
    pub(crate) fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub(crate) fn rebase_currency_tracking(&mut self) {
        self.previous = CurrencyKind::all()
            .iter()
            .map(|k| (*k, self.wallet.amount(*k)))
            .collect();
        self.clock.reset();
        self.overclock.abandon_all();
    }
}
