//! Typed publish/subscribe event bus
//!
//! Subscribers are notified synchronously on publish. Every published event is
//! also queued so the match can react to it once the current command returns.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::hex::HexCoord;
use crate::turn::{GameOutcome, GameState};
use crate::unit::UnitId;

/// Event kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    AbilityActivated,
    AbilityDeactivated,
    CastCompleted,
    HealthChanged,
    ManaChanged,
    UnitDodged,
    UnitAdded,
    UnitRemoved,
    TurnEnded,
    HexClicked,
    UnitSelectionChanged,
    GameStateChanged,
    MoveCompleted,
    MatchFinished,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    AbilityActivated(AbilityId),
    AbilityDeactivated(AbilityId),
    CastCompleted { ability: AbilityId, success: bool },
    HealthChanged { unit: UnitId, delta: i32 },
    ManaChanged { unit: UnitId, delta: i32 },
    UnitDodged(UnitId),
    UnitAdded(UnitId),
    UnitRemoved(UnitId),
    TurnEnded,
    HexClicked(HexCoord),
    UnitSelectionChanged(Option<UnitId>),
    GameStateChanged { old: GameState, new: GameState },
    MoveCompleted(UnitId),
    MatchFinished(GameOutcome),
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::AbilityActivated(_) => Topic::AbilityActivated,
            GameEvent::AbilityDeactivated(_) => Topic::AbilityDeactivated,
            GameEvent::CastCompleted { .. } => Topic::CastCompleted,
            GameEvent::HealthChanged { .. } => Topic::HealthChanged,
            GameEvent::ManaChanged { .. } => Topic::ManaChanged,
            GameEvent::UnitDodged(_) => Topic::UnitDodged,
            GameEvent::UnitAdded(_) => Topic::UnitAdded,
            GameEvent::UnitRemoved(_) => Topic::UnitRemoved,
            GameEvent::TurnEnded => Topic::TurnEnded,
            GameEvent::HexClicked(_) => Topic::HexClicked,
            GameEvent::UnitSelectionChanged(_) => Topic::UnitSelectionChanged,
            GameEvent::GameStateChanged { .. } => Topic::GameStateChanged,
            GameEvent::MoveCompleted(_) => Topic::MoveCompleted,
            GameEvent::MatchFinished(_) => Topic::MatchFinished,
        }
    }
}

pub type Listener = Box<dyn FnMut(&GameEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// None listens to every topic
    topic: Option<Topic>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
    pending: VecDeque<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: Topic, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.add(Some(topic), Box::new(listener))
    }

    pub fn subscribe_all(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(listener))
    }

    fn add(&mut self, topic: Option<Topic>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, topic, listener });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Notify subscribers in subscription order, then queue the event
    pub fn publish(&mut self, event: GameEvent) {
        let topic = event.topic();
        for subscription in &mut self.subscriptions {
            if subscription.topic.map_or(true, |t| t == topic) {
                (subscription.listener)(&event);
            }
        }
        self.pending.push_back(event);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queued events, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &GameEvent> + '_ {
        self.pending.iter()
    }

    pub fn next_pending(&mut self) -> Option<GameEvent> {
        self.pending.pop_front()
    }

    pub fn drain_pending(&mut self) -> Vec<GameEvent> {
        self.pending.drain(..).collect()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("pending", &self.pending)
            .finish()
    }
}
