//! Notifications published by the core.
//!
//! Presentation layers either register a listener or drain the queue once per
//! frame. The core never depends on anything listening.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::progress::{GoalKind, GoalScope};
use crate::state::{CurrencyKind, GoalId, SkillId, UnitId};

/// Queue capacity for routine traffic. Past it the oldest routine event is
/// dropped; every other notification is always kept until drained.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CurrencyChanged {
        kind: CurrencyKind,
        amount: f64,
    },
    UnitProduced {
        unit: UnitId,
        earned: f64,
        /// True while the unit is overclocked.
        bonus_event: bool,
    },
    UnitPurchased {
        unit: UnitId,
        tier: u8,
        cost: f64,
    },
    HelperHired {
        count: u32,
    },
    GoalCompleted {
        goal: GoalId,
        kind: GoalKind,
    },
    GoalClaimed {
        goal: GoalId,
    },
    MissionsRegenerated {
        scope: GoalScope,
        goals: Vec<GoalId>,
    },
    SkillUnlocked {
        skill: SkillId,
    },
    SkillRefunded {
        skill: SkillId,
        refund: f64,
    },
    OverclockStarted {
        unit: UnitId,
    },
    /// Heat crossed the warning threshold. Purely presentational.
    OverclockCritical {
        unit: UnitId,
        heat: f64,
    },
    UnitDestroyed {
        unit: UnitId,
        reward: f64,
        bonus_total: f64,
    },
    PrestigePerformed {
        level: u32,
        reward: f64,
    },
    OfflineEarningsApplied {
        primary: f64,
        secondary: f64,
        elapsed_seconds: f64,
    },
}

impl GameEvent {
    /// Per-roll traffic that a host can afford to lose under load.
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            GameEvent::CurrencyChanged { .. } | GameEvent::UnitProduced { .. }
        )
    }
}

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Synchronous bus: listeners run at publish time, then the event is queued.
///
/// Listeners only ever see `&GameEvent`, so they cannot publish back into the
/// bus while it is delivering.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<GameEvent>,
    listeners: Vec<Listener>,
    dropped: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn publish(&mut self, event: GameEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        if self.queue.len() >= EVENT_QUEUE_CAPACITY {
            match self.queue.iter().position(GameEvent::is_routine) {
                Some(oldest) => {
                    self.queue.remove(oldest);
                    self.dropped += 1;
                }
                None if event.is_routine() => {
                    self.dropped += 1;
                    return;
                }
                None => {}
            }
        }
        self.queue.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Routine events lost to the capacity limit since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}
