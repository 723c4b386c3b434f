//! Progression and economy core for an idle dice game.
//!
//! The crate is the engine behind the screens: stat modifiers, milestones
//! and calendar missions, offline earnings, overclocking, and the Time
//! Fracture prestige reset. It performs no I/O and installs no logger; hosts
//! drive it through [`Session`] and render the [`GameEvent`]s it publishes.

pub mod collab;
pub mod config;
pub mod error;
pub mod events;
pub mod modifiers;
pub mod offline;
pub mod overclock;
pub mod prestige;
pub mod progress;
pub mod save;
pub mod session;
mod simulator;
pub mod state;
pub mod time;

pub use config::EconomyConfig;
pub use error::{EconomyError, EconomyResult};
pub use events::{EventBus, GameEvent};
pub use modifiers::{ModifierAggregator, ModifierMode, ModifierSource, Stat, StatModifier};
pub use session::Session;
pub use state::{CurrencyKind, ProductionUnit, UnitId};
