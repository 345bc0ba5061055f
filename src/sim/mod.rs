//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-based timing only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; those are reached through
//!   render handles, the event queue and the outbox

pub mod ball;
pub mod collision;
pub mod component;
pub mod entity;
pub mod events;
pub mod oscillation;
pub mod outbox;
pub mod paddle;
pub mod powerup;
pub mod snapshot;
pub mod state;
pub mod system;
pub mod systems;
pub mod tasks;
pub mod tick;

pub use ball::{Ball, BallKind};
pub use collision::{Aabb, SweptHit, find_exact_collision_position, swept_aabb};
pub use component::{Component, ComponentKind, Input, Physics, RenderHandle};
pub use entity::{ComponentStore, Entities, Entity, EntityId, EntityKind};
pub use events::{EventKind, EventQueue, GameEvent};
pub use outbox::Outbox;
pub use paddle::{Affectation, Controller, Paddle};
pub use powerup::{PickupCategory, Powerup, PowerupKind};
pub use snapshot::ServerGameState;
pub use state::{ContextKind, GamePhase, GameState, Score};
pub use system::{FrameDelta, Scheduler, System};
pub use tasks::{TaskAction, TaskQueue};
pub use tick::{Simulation, TickInput, default_scheduler};
