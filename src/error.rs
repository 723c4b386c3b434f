//! Error type shared by every subsystem.
//!
//! Precondition failures are ordinary `Err` values: the operation that
//! returned one has left state exactly as it found it. Nothing in this crate
//! is fatal to the host; the worst outcome is a skipped reward.

use thiserror::Error;

use crate::state::{CurrencyKind, GoalId, SkillId, UnitId};

#[derive(Error, Debug)]
pub enum EconomyError {
    #[error("unknown goal '{0}'")]
    UnknownGoal(GoalId),

    #[error("goal '{0}' is not completed yet")]
    GoalNotCompleted(GoalId),

    #[error("goal '{0}' was already claimed")]
    GoalAlreadyClaimed(GoalId),

    #[error("invalid goal definition '{id}': {reason}")]
    InvalidGoal { id: GoalId, reason: &'static str },

    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error("unit {0} is already overclocked")]
    AlreadyOverclocked(UnitId),

    #[error("unit {0} was destroyed by overclock")]
    UnitDestroyed(UnitId),

    #[error("insufficient {kind:?}: required {required:.2}, available {available:.2}")]
    InsufficientFunds {
        kind: CurrencyKind,
        required: f64,
        available: f64,
    },

    #[error("unknown skill '{0}'")]
    UnknownSkill(SkillId),

    #[error("skill '{0}' is already unlocked")]
    SkillAlreadyUnlocked(SkillId),

    #[error("skill '{0}' is not unlocked")]
    SkillNotUnlocked(SkillId),

    #[error("skill '{skill}' requires '{requires}' first")]
    SkillPrerequisite { skill: SkillId, requires: SkillId },

    #[error("skill '{skill}' is required by unlocked skill '{dependent}'")]
    SkillHasDependents { skill: SkillId, dependent: SkillId },

    #[error("helper cap of {cap} reached")]
    HelperCapReached { cap: u32 },

    #[error(
        "Time Fracture locked: need {primary_required:.0} money and \
         {secondary_required:.0} dark matter"
    )]
    PrestigeLocked {
        primary_required: f64,
        secondary_required: f64,
    },

    #[error("config parse failed: {0}")]
    Config(#[from] toml::de::Error),

    #[error("save data could not be (de)serialized: {0}")]
    Save(#[from] serde_json::Error),

    #[error("save version {saved} is older than the oldest compatible version {min_compatible}")]
    IncompatibleSave { saved: u32, min_compatible: u32 },
}

pub type EconomyResult<T> = Result<T, EconomyError>;
