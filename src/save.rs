//! Save/load for a whole [`Session`].
//!
//! ## Versioning
//!
//! - `SAVE_VERSION`: current format version. Bump it when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: oldest version that still loads. Only bump it
//!   for breaking changes (a field changing meaning or disappearing).
//!
//! Anything at or above `MIN_COMPATIBLE_VERSION` loads, with missing fields
//! filled from their defaults. The core only produces and consumes strings;
//! where they are stored is the host's business.

use serde::{Deserialize, Serialize};

use crate::collab::wallet::WalletEntry;
use crate::collab::{HelperRegistry, SkillRegistry, UnitRegistry};
use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierSource, StatModifier};
use crate::prestige::PrestigeState;
use crate::progress::ProgressSnapshot;
use crate::session::Session;
use crate::state::{ProductionUnit, SkillId};

/// Save format version. Bump when fields are added.
pub const SAVE_VERSION: u32 = 1;

/// Oldest version that still loads.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub game: GameSave,
}

/// Everything that survives a reload. Overclocks, the partial production
/// cycle and queued events are session-local and deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSave {
    pub wallet: Vec<WalletEntry>,
    pub units: Vec<ProductionUnit>,
    pub unlocked_skills: Vec<SkillId>,
    pub helpers: u32,
    /// Active modifiers in canonical order.
    pub modifiers: Vec<StatModifier>,
    pub progress: ProgressSnapshot,
    pub prestige: PrestigeState,
    pub seed: u64,
}

impl Session {
    pub fn snapshot(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            game: GameSave {
                wallet: self.wallet.snapshot(),
                units: self.roster.units().to_vec(),
                unlocked_skills: self.skills.unlocked(),
                helpers: self.helpers.count(),
                modifiers: self.modifiers.modifiers(),
                progress: self.tracker.snapshot(),
                prestige: self.prestige.snapshot(),
                seed: self.seed,
            },
        }
    }

    /// Replace the session's persistent state with `save`. Rejects saves
    /// older than [`MIN_COMPATIBLE_VERSION`] and leaves the session as it was.
    pub fn restore(&mut self, save: SaveData) -> EconomyResult<()> {
        if save.version < MIN_COMPATIBLE_VERSION {
            return Err(EconomyError::IncompatibleSave {
                saved: save.version,
                min_compatible: MIN_COMPATIBLE_VERSION,
            });
        }
        if save.version < SAVE_VERSION {
            log::info!(
                "migrating save (saved={}, current={SAVE_VERSION})",
                save.version
            );
        }
        let game = save.game;

        self.wallet.restore(&game.wallet);
        self.roster.restore(game.units);
        self.skills.restore(&game.unlocked_skills);
        self.helpers.restore(game.helpers);

        // Skill modifiers only come back for skills that are still unlocked.
        let unlocked = self.skills.unlocked();
        let modifiers = game
            .modifiers
            .into_iter()
            .filter(|m| match &m.source {
                ModifierSource::Skill(id) => unlocked.contains(id),
                _ => true,
            })
            .filter(|m| m.magnitude.is_finite())
            .collect();
        self.modifiers.restore(modifiers);

        self.tracker.restore(&game.progress);
        // Prestige bonuses are derived from the level, not trusted from disk.
        self.prestige.restore(game.prestige, &mut self.modifiers);
        self.reseed(game.seed);

        self.rebase_currency_tracking();
        log::info!(
            "save restored: prestige level {}, {} units",
            self.prestige.level(),
            self.roster.units().len()
        );
        Ok(())
    }

    pub fn save_to_string(&self) -> EconomyResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn load_from_str(&mut self, json: &str) -> EconomyResult<()> {
        let save: SaveData = serde_json::from_str(json)?;
        self.restore(save)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::collab::{default_skills, CurrencyStore};
    use crate::config::EconomyConfig;
    use crate::modifiers::Stat;
    use crate::progress::{default_goals, GoalCatalog, GoalDefinition, GoalKind, GoalScope, Metric};
    use crate::state::CurrencyKind;

    fn session() -> Session {
        Session::with_defaults(EconomyConfig::default(), 3).unwrap()
    }

    fn played() -> Session {
        let mut s = session();
        s.check_calendar(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        s.wallet.add(CurrencyKind::Money, 1_000_000.0);
        s.wallet.add(CurrencyKind::DarkMatter, 150.0);
        s.perform_prestige().unwrap();
        s.wallet.add(CurrencyKind::Money, 500.0);
        s.wallet.add(CurrencyKind::DarkMatter, 30.0);
        s.buy_unit(2).unwrap();
        s.unlock_skill("loaded_dice").unwrap();
        s.advance(8.0);
        s
    }

    #[test]
    fn extract_and_apply_roundtrip() {
        let original = played();
        let json = original.save_to_string().unwrap();

        let mut loaded = session();
        loaded.load_from_str(&json).unwrap();

        assert_eq!(loaded.snapshot(), original.snapshot());
        assert!(
            (loaded.stat(Stat::GlobalMoneyMultiplier) - original.stat(Stat::GlobalMoneyMultiplier))
                .abs()
                < 1e-12
        );
        assert_eq!(loaded.prestige().level(), 1);
    }

    #[test]
    fn older_compatible_version_loads() {
        let mut save = played().snapshot();
        save.version = MIN_COMPATIBLE_VERSION;
        let mut loaded = session();
        assert!(loaded.restore(save).is_ok());
    }

    #[test]
    fn too_old_version_rejected() {
        let mut save = played().snapshot();
        save.version = 0;
        let mut loaded = session();
        let err = loaded.restore(save);
        assert!(matches!(err, Err(EconomyError::IncompatibleSave { saved: 0, .. })));
        assert_eq!(loaded.prestige().level(), 0);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let json = r#"{"version":1,"game":{"helpers":2}}"#;
        let mut loaded = session();
        loaded.load_from_str(json).unwrap();
        assert_eq!(loaded.helpers().count(), 2);
        assert_eq!(loaded.roster().units().len(), 1);
        assert!((loaded.wallet().amount(CurrencyKind::Money) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_is_an_error() {
        let mut loaded = session();
        assert!(matches!(
            loaded.load_from_str("{not json"),
            Err(EconomyError::Save(_))
        ));
    }

    #[test]
    fn stale_skill_modifiers_dropped() {
        let mut save = session().snapshot();
        save.game.modifiers.push(StatModifier::multiplicative(
            ModifierSource::Skill("ghost".into()),
            Stat::CycleSpeed,
            3.0,
        ));
        let mut loaded = session();
        loaded.restore(save).unwrap();
        assert!((loaded.stat(Stat::CycleSpeed) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prestige_bonus_rederived_from_level() {
        let mut save = played().snapshot();
        for m in &mut save.game.modifiers {
            if m.source == ModifierSource::Prestige && m.stat == Stat::GlobalMoneyMultiplier {
                m.magnitude = 50.0;
            }
        }
        let mut loaded = session();
        loaded.restore(save).unwrap();
        let m = loaded
            .modifiers()
            .modifier(&ModifierSource::Prestige, Stat::GlobalMoneyMultiplier)
            .unwrap();
        assert!((m.magnitude - 1.1).abs() < 1e-12);
    }

    /// Stock goals, but the only daily mission tracks money earned.
    fn earnings_session() -> Session {
        let mut goals = default_goals();
        goals.retain(|g| g.scope != GoalScope::Daily);
        goals.push(GoalDefinition {
            id: "earn".into(),
            name: "Earn money".into(),
            kind: GoalKind::Mission,
            metric: Metric::MoneyEarned,
            target: 10_000_000.0,
            rewards: vec![],
            scope: GoalScope::Daily,
        });
        let catalog = GoalCatalog::new(goals).unwrap();
        Session::new(EconomyConfig::default(), catalog, default_skills(), 3)
    }

    #[test]
    fn restored_balance_is_not_counted_as_earned() {
        let mut original = earnings_session();
        original.check_calendar(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        original.wallet.add(CurrencyKind::Money, 5_000.0);
        original.publish_balance(CurrencyKind::Money);

        let mut loaded = earnings_session();
        loaded.restore(original.snapshot()).unwrap();
        let earned = |s: &Session| s.tracker().progress("earn").unwrap().current;
        assert!((earned(&loaded) - 5_000.0).abs() < 1e-9);

        // One roll of the baseline die, not the restored 5,000 again.
        loaded.advance(4.0);
        assert!((earned(&loaded) - 5_001.0).abs() < 1e-9);
    }

    #[test]
    fn floats_survive_json_bit_for_bit() {
        let mut original = session();
        original.wallet.add(CurrencyKind::Money, 1_000_613.200_000_000_1);
        original.wallet.add(CurrencyKind::DarkMatter, 0.1 + 0.2);
        let json = original.save_to_string().unwrap();

        let mut loaded = session();
        loaded.load_from_str(&json).unwrap();
        for kind in CurrencyKind::all() {
            assert_eq!(
                loaded.wallet().amount(*kind).to_bits(),
                original.wallet().amount(*kind).to_bits()
            );
            assert_eq!(
                loaded.wallet().lifetime_earned(*kind).to_bits(),
                original.wallet().lifetime_earned(*kind).to_bits()
            );
        }
    }

    #[test]
    fn dice_selection_follows_restored_seed() {
        let mut original = played();
        original.wallet.add(CurrencyKind::Money, 1_000.0);
        original.buy_unit(1).unwrap();
        original.buy_unit(3).unwrap();
        let save = original.snapshot();

        // Built on different seeds; both must roll from the saved one.
        let mut a = Session::with_defaults(EconomyConfig::default(), 100).unwrap();
        let mut b = Session::with_defaults(EconomyConfig::default(), 200).unwrap();
        a.restore(save.clone()).unwrap();
        b.restore(save).unwrap();
        for _ in 0..20 {
            a.advance(4.0);
            b.advance(4.0);
        }
        assert_eq!(
            a.wallet().amount(CurrencyKind::Money).to_bits(),
            b.wallet().amount(CurrencyKind::Money).to_bits()
        );
    }
}
