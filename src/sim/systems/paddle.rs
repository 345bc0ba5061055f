//! Paddle input and movement
//!
//! Local paddles get their `Input` from the host before the tick. AI paddles
//! have theirs filled in here by tracking the most threatening ball.

use glam::Vec2;

use crate::Side;
use crate::sim::component::{Input, Physics};
use crate::sim::paddle::Controller;
use crate::sim::state::{GamePhase, GameState};
use crate::sim::system::{FrameDelta, System};

/// Vertical distance the AI tolerates before moving
const AI_DEAD_ZONE: f32 = 6.0;

/// Fills `Input` for AI-controlled paddles
pub struct InputSystem;

impl System for InputSystem {
    fn name(&self) -> &'static str {
        "input"
    }

    fn update(&mut self, state: &mut GameState, _delta: &FrameDelta) {
        let balls: Vec<(Physics, bool)> = state
            .entities
            .balls()
            .filter_map(|(e, b)| Some((e.physics()?.clone(), b.is_good_ball)))
            .collect();
        let arena_height = state.tuning.arena_height;
        let center_y = arena_height / 2.0;
        let frame = state.frame;

        for side in [Side::Left, Side::Right] {
            let Some(entity) = state.entities.paddle_mut(side) else {
                continue;
            };
            if entity.paddle().is_none_or(|p| p.controller != Controller::Ai) {
                continue;
            }
            let Some(body) = entity.physics().cloned() else {
                continue;
            };

            let target_y = ai_target(side, &body, &balls, center_y, frame, arena_height);
            let diff = target_y - body.position.y;
            let mut input = Input {
                up_pressed: diff < -AI_DEAD_ZONE,
                down_pressed: diff > AI_DEAD_ZONE,
            };
            // The AI knows about its own inversion
            if entity.paddle().is_some_and(|p| p.is_inverted) {
                std::mem::swap(&mut input.up_pressed, &mut input.down_pressed);
            }
            entity.components.replace_component(input.into(), None);
        }
    }
}

/// Where an AI paddle wants to be
///
/// Follows the predicted arrival height of the closest incoming ball, with a
/// slow wobble so rallies do not repeat exactly. Drifts back to the centre
/// when nothing is coming.
fn ai_target(
    side: Side,
    body: &Physics,
    balls: &[(Physics, bool)],
    center_y: f32,
    frame: u64,
    arena_height: f32,
) -> f32 {
    let incoming = balls
        .iter()
        .filter(|(b, _)| b.velocity.x * side.outward() < 0.0)
        .min_by(|(a, a_good), (b, b_good)| {
            // Real balls first, then nearest
            b_good.cmp(a_good).then(
                (a.position.x - body.position.x)
                    .abs()
                    .partial_cmp(&(b.position.x - body.position.x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

    let Some((ball, _)) = incoming else {
        return center_y;
    };

    let frames_away = if ball.velocity.x.abs() > f32::EPSILON {
        (ball.position.x - body.position.x).abs() / ball.velocity.x.abs()
    } else {
        0.0
    };
    let predicted = reflect_into(ball.position.y + ball.velocity.y * frames_away, arena_height);

    let t = frame as f32 * 0.01;
    let wobble = (t.sin() * 0.3 + (t * 0.7).sin() * 0.15) * body.size.y / 2.0;
    predicted + wobble
}

/// Fold a height that overshoots the walls back into the arena
fn reflect_into(y: f32, height: f32) -> f32 {
    if height <= 0.0 {
        return y;
    }
    let period = 2.0 * height;
    let m = y.rem_euclid(period);
    if m > height { period - m } else { m }
}

/// Moves paddles from their input and eases their size
pub struct PaddleSystem;

impl System for PaddleSystem {
    fn name(&self) -> &'static str {
        "paddle"
    }

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta) {
        if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
            return;
        }
        let dt = delta.delta_time;
        let tuning = &state.tuning;

        for entity in state.entities.iter_mut() {
            let Some((paddle, store)) = entity.paddle_parts_mut() else {
                continue;
            };
            let axis = store.get::<Input>().map(Input::axis).unwrap_or(0.0);
            let Some(physics) = store.get_mut::<Physics>() else {
                continue;
            };

            paddle.advance_size(&mut physics.size, tuning.size_ease_rate, dt);

            let before = physics.position.y;
            if paddle.controller != Controller::Remote {
                let speed = physics.speed.unwrap_or(tuning.paddle_speed);
                physics.position.y += axis * speed * paddle.movement_factor() * dt;
            }
            let half = physics.size.y / 2.0;
            physics.position.y = physics
                .position
                .y
                .clamp(half, (tuning.arena_height - half).max(half));

            let moved = physics.position.y - before;
            paddle.velocity_y = if dt > 0.0 { moved / dt } else { 0.0 };
            physics.velocity = Vec2::new(0.0, paddle.velocity_y);
        }
    }
}

/// Copy host input into a local paddle
pub fn set_input(state: &mut GameState, side: Side, input: Input) {
    let Some(entity) = state.entities.paddle_mut(side) else {
        return;
    };
    if entity
        .paddle()
        .is_some_and(|p| p.controller == Controller::Local)
    {
        entity.components.replace_component(input.into(), None);
    }
}
