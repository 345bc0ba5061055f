//! Swaps a ball for another variant when it touches a ball pickup

use crate::rotate;
use crate::sim::ball::BallKind;
use crate::sim::component::Physics;
use crate::sim::events::{EventKind, GameEvent};
use crate::sim::powerup::PickupCategory;
use crate::sim::state::GameState;
use crate::sim::system::{FrameDelta, System};
use crate::sim::tasks::TaskAction;

use super::{PickupTouch, resolve_pickup};

/// Angle step between successive decoys (radians)
const FAKE_SPREAD: f32 = 0.26;

pub struct BallChangeSystem;

impl BallChangeSystem {
    fn claims(event: &GameEvent) -> bool {
        event.kind.pickup_category() == Some(PickupCategory::BallChange)
    }
}

impl System for BallChangeSystem {
    fn name(&self) -> &'static str {
        "ball_change"
    }

    fn update(&mut self, state: &mut GameState, _delta: &FrameDelta) {
        for event in state.events.claim(Self::claims) {
            let EventKind::Pickup(kind) = event.kind else {
                continue;
            };
            let Some(new_kind) = kind.ball_kind() else {
                continue;
            };
            if let Some(touch) = resolve_pickup(state, &event) {
                change_ball(state, touch, new_kind);
            }
        }
    }
}

fn change_ball(state: &mut GameState, touch: PickupTouch, kind: BallKind) {
    state.entities.remove(touch.pickup, &mut state.outbox);

    let Some(old) = state.entities.remove(touch.ball, &mut state.outbox) else {
        return;
    };
    let last_hit = old.ball().and_then(|b| b.last_hit);
    let Some(Physics {
        position, velocity, ..
    }) = old.physics().cloned()
    else {
        return;
    };

    let id = state.spawn_ball(kind, position, Some(velocity), last_hit);
    log::debug!("Ball {} became {} ball {}", touch.ball, kind.as_str(), id);

    if kind == BallKind::Multiply {
        let stagger = state.tuning.multiply_stagger;
        for i in 0..state.tuning.multiply_fake_count {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let angle = sign * FAKE_SPREAD * (i / 2 + 1) as f32;
            state.tasks.schedule(
                stagger * (i + 1) as f32,
                TaskAction::SpawnFakeBall {
                    kind,
                    origin: position,
                    velocity: rotate(velocity, angle),
                    last_hit,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::EventEntities;
    use crate::sim::paddle::Controller;
    use crate::sim::powerup::PowerupKind;
    use crate::sim::state::ContextKind;
    use crate::{Side, Tuning};
    use glam::Vec2;

    fn ball_change(state: &mut GameState, kind: PowerupKind) -> GameEvent {
        let ball = state.spawn_ball(
            BallKind::Standard,
            Vec2::new(400.0, 300.0),
            Some(Vec2::new(5.0, 1.0)),
            Some(Side::Right),
        );
        let pickup = state.spawn_pickup(kind, Vec2::new(405.0, 300.0));
        GameEvent::new(EventKind::Pickup(kind))
            .with_side(Side::Right)
            .with_entities(EventEntities {
                ball: Some(ball),
                pickup: Some(pickup),
            })
    }

    fn arena() -> GameState {
        let mut state = GameState::empty(2, Tuning::default(), ContextKind::Match);
        state.spawn_paddle(Side::Left, Controller::Ai);
        state.spawn_paddle(Side::Right, Controller::Ai);
        state
    }

    #[test]
    fn test_spin_pickup_swaps_variant_in_place() {
        let mut state = arena();
        let event = ball_change(&mut state, PowerupKind::SpinBall);
        state.events.push(event);
        BallChangeSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));

        let balls: Vec<_> = state.entities.balls().collect();
        assert_eq!(balls.len(), 1);
        let (entity, ball) = balls[0];
        assert_eq!(ball.kind, BallKind::Spin);
        assert_eq!(ball.last_hit, Some(Side::Right));
        let body = entity.physics().unwrap();
        assert_eq!(body.position, Vec2::new(400.0, 300.0));
        assert_eq!(body.velocity, Vec2::new(5.0, 1.0));
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_multiply_schedules_decoys() {
        let mut state = arena();
        let event = ball_change(&mut state, PowerupKind::MultiplyBall);
        state.events.push(event);
        BallChangeSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));

        let due: Vec<_> = (0..30).flat_map(|_| state.tasks.advance(1.0)).collect();
        assert_eq!(due.len(), 2);
        let velocities: Vec<Vec2> = due
            .iter()
            .filter_map(|a| match a {
                TaskAction::SpawnFakeBall { velocity, .. } => Some(*velocity),
                _ => None,
            })
            .collect();
        assert_eq!(velocities.len(), 2);
        assert!(velocities[0].y > 1.0 && velocities[1].y < 1.0);
    }

    #[test]
    fn test_stale_ball_change_is_dropped() {
        let mut state = arena();
        let event = ball_change(&mut state, PowerupKind::CurveBall);
        if let Some(pickup) = event.entities.and_then(|e| e.pickup) {
            state.entities.remove(pickup, &mut state.outbox);
        }
        state.events.push(event);
        BallChangeSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));

        let (_, ball) = state.entities.balls().next().unwrap();
        assert_eq!(ball.kind, BallKind::Standard);
    }
}
