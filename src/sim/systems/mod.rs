//! Per-frame systems, listed in their default run order

pub mod affectation;
pub mod ball_change;
pub mod lifetime;
pub mod paddle;
pub mod physics;
pub mod render_sync;
pub mod score;
pub mod tasks;

pub use affectation::AffectationSystem;
pub use ball_change::BallChangeSystem;
pub use lifetime::{LifetimeSystem, VfxSystem};
pub use paddle::{InputSystem, PaddleSystem};
pub use physics::PhysicsSystem;
pub use render_sync::RenderSyncSystem;
pub use score::ScoreSystem;
pub use tasks::TasksSystem;

use super::entity::EntityId;
use super::events::GameEvent;
use super::powerup::Powerup;
use super::state::GameState;
use crate::Side;

/// Participants of a pickup event that are still alive
pub(crate) struct PickupTouch {
    pub side: Side,
    pub ball: EntityId,
    pub pickup: EntityId,
    pub powerup: Powerup,
}

/// Check a pickup event against the live entities
///
/// Returns `None` (and logs) when the target side, the ball or the pickup is
/// gone; such events are stale and get dropped.
pub(crate) fn resolve_pickup(state: &GameState, event: &GameEvent) -> Option<PickupTouch> {
    let name = event.kind.type_name();
    let (Some(side), Some(entities)) = (event.side, event.entities) else {
        log::debug!("Dropping {} event without a target", name);
        return None;
    };
    let (Some(ball), Some(pickup)) = (entities.ball, entities.pickup) else {
        log::debug!("Dropping {} event with missing participants", name);
        return None;
    };
    if !state.entities.contains(ball) {
        log::debug!("Dropping stale {} event: ball {} is gone", name, ball);
        return None;
    }
    let Some(powerup) = state
        .entities
        .get(pickup)
        .and_then(|e| e.components.get::<Powerup>())
    else {
        log::debug!("Dropping stale {} event: pickup {} is gone", name, pickup);
        return None;
    };
    Some(PickupTouch {
        side,
        ball,
        pickup,
        powerup: powerup.clone(),
    })
}
