//! Typed events for the simulation queue
//!
//! One ordered queue per match. Systems claim the kinds they understand;
//! whatever nobody claims stays queued for the next tick, so delivery is
//! at-least-once and in order per kind, never same-tick fan-out.

use std::collections::VecDeque;

use super::entity::EntityId;
use super::paddle::Affectation;
use super::powerup::{PickupCategory, PowerupKind};
use crate::Side;
use crate::error::SimError;

/// Event kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A pickup was touched (`...Powerup`, `...Powerdown`, `...Ball`)
    Pickup(PowerupKind),
    /// Paddle size should return to its base height
    SizeReset,
    /// A projectile struck the paddle on `side`
    ProjectileHit,
    /// `side` scored
    Goal,
    /// A ball bounced off a paddle
    PaddleHit,
    WallHit,
    ObstacleHit,
    /// A shield absorbed a goal
    ShieldBlock,
    /// An affectation was applied to the paddle on `side`
    Affected(Affectation),
    /// An affectation wore off
    Expired(Affectation),
    /// A new ball was served
    Serve,
    MatchOver,
    /// Menu/UI intent, passed through untouched
    Ui(String),
}

impl EventKind {
    /// Whether the core itself consumes this kind
    pub fn is_gameplay(&self) -> bool {
        matches!(
            self,
            EventKind::Pickup(_) | EventKind::SizeReset | EventKind::ProjectileHit | EventKind::Goal
        )
    }

    /// Wire name used by audio/UI subscribers and remote peers
    pub fn type_name(&self) -> String {
        match self {
            EventKind::Pickup(kind) => kind.wire_name().to_string(),
            EventKind::SizeReset => "sizeReset".to_string(),
            EventKind::ProjectileHit => "projectileHit".to_string(),
            EventKind::Goal => "goal".to_string(),
            EventKind::PaddleHit => "paddleHit".to_string(),
            EventKind::WallHit => "wallHit".to_string(),
            EventKind::ObstacleHit => "obstacleHit".to_string(),
            EventKind::ShieldBlock => "shieldBlock".to_string(),
            EventKind::Affected(a) => format!("{}Applied", a.as_str()),
            EventKind::Expired(a) => format!("{}Expired", a.as_str()),
            EventKind::Serve => "serve".to_string(),
            EventKind::MatchOver => "matchOver".to_string(),
            EventKind::Ui(name) => format!("ui:{}", name),
        }
    }

    /// Parse a gameplay wire name; UI names are accepted with a `ui:` prefix
    pub fn parse(name: &str) -> Result<EventKind, SimError> {
        if let Some(kind) = PowerupKind::from_wire_name(name) {
            return Ok(EventKind::Pickup(kind));
        }
        match name {
            "sizeReset" => Ok(EventKind::SizeReset),
            "projectileHit" => Ok(EventKind::ProjectileHit),
            "goal" => Ok(EventKind::Goal),
            "paddleHit" => Ok(EventKind::PaddleHit),
            "wallHit" => Ok(EventKind::WallHit),
            "obstacleHit" => Ok(EventKind::ObstacleHit),
            "shieldBlock" => Ok(EventKind::ShieldBlock),
            "serve" => Ok(EventKind::Serve),
            "matchOver" => Ok(EventKind::MatchOver),
            _ => match name.strip_prefix("ui:") {
                Some(rest) => Ok(EventKind::Ui(rest.to_string())),
                None => Err(SimError::UnknownEvent(name.to_string())),
            },
        }
    }

    pub fn pickup_category(&self) -> Option<PickupCategory> {
        match self {
            EventKind::Pickup(kind) => Some(kind.category()),
            _ => None,
        }
    }
}

/// Participants an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventEntities {
    pub ball: Option<EntityId>,
    pub pickup: Option<EntityId>,
}

/// A queued event
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    pub kind: EventKind,
    pub target: Option<EntityId>,
    pub side: Option<Side>,
    pub entities: Option<EventEntities>,
    pub button_name: Option<String>,
}

impl GameEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            side: None,
            entities: None,
            button_name: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_entities(mut self, entities: EventEntities) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_button(mut self, name: impl Into<String>) -> Self {
        self.button_name = Some(name.into());
        self
    }
}

/// Events held before the oldest non-gameplay ones start being dropped
///
/// Hosts that never call [`EventQueue::drain_external`] would otherwise grow
/// the queue for the whole match.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Single ordered event buffer shared by all systems
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event; gameplay events are never dropped
    pub fn push(&mut self, event: GameEvent) {
        log::trace!("Event queued: {}", event.kind.type_name());
        if self.events.len() >= EVENT_QUEUE_CAPACITY {
            match self.events.iter().position(|e| !e.kind.is_gameplay()) {
                Some(index) => {
                    if let Some(dropped) = self.events.remove(index) {
                        log::debug!("Event queue full, dropped {}", dropped.kind.type_name());
                    }
                }
                None => log::warn!("Event queue holds {} gameplay events", self.events.len()),
            }
        }
        self.events.push_back(event);
    }

    /// Remove and return every event matching `claims`, oldest first
    ///
    /// Unmatched events keep their relative order.
    pub fn claim(&mut self, claims: impl Fn(&GameEvent) -> bool) -> Vec<GameEvent> {
        let mut claimed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.events.len());
        for event in self.events.drain(..) {
            if claims(&event) {
                claimed.push(event);
            } else {
                kept.push_back(event);
            }
        }
        self.events = kept;
        claimed
    }

    /// Hand non-gameplay events to the host (audio, UI, network)
    pub fn drain_external(&mut self) -> Vec<GameEvent> {
        self.claim(|e| !e.kind.is_gameplay())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
