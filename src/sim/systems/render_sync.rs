//! Mirrors simulation state onto render handles
//!
//! Runs last so the renderer sees the final positions of the frame.

use crate::sim::component::{Physics, RenderHandle, Vfx};
use crate::sim::entity::EntityKind;
use crate::sim::powerup::Powerup;
use crate::sim::state::GameState;
use crate::sim::system::{FrameDelta, System};

/// Alpha of a pickup that has already been consumed this frame
const CONSUMED_ALPHA: f32 = 0.0;

pub struct RenderSyncSystem;

impl System for RenderSyncSystem {
    fn name(&self) -> &'static str {
        "render_sync"
    }

    fn update(&mut self, state: &mut GameState, _delta: &FrameDelta) {
        for entity in state.entities.iter_mut() {
            let paddle_scale = match &entity.kind {
                EntityKind::Paddle(paddle) if paddle.base_height > 0.0 => Some(paddle.base_height),
                _ => None,
            };
            let consumed = entity
                .components
                .get::<Powerup>()
                .is_some_and(|p| p.consumed);
            let vfx = entity.components.get::<Vfx>().map(|v| (v.alpha, v.scale));

            let (render, physics) = entity.components.get_pair_mut::<RenderHandle, Physics>();
            let Some(render) = render else {
                continue;
            };
            if let Some(physics) = physics {
                render.position = physics.position;
                if let Some(base) = paddle_scale {
                    render.scale.y = physics.size.y / base;
                }
            }
            if let Some((alpha, scale)) = vfx {
                render.alpha = alpha;
                render.scale = glam::Vec2::splat(scale);
            }
            if consumed {
                render.alpha = CONSUMED_ALPHA;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ball::BallKind;
    use crate::sim::component::VfxKind;
    use crate::sim::paddle::Controller;
    use crate::sim::state::ContextKind;
    use crate::{Side, Tuning};
    use glam::Vec2;

    fn handle(state: &GameState, id: crate::sim::entity::EntityId) -> RenderHandle {
        state
            .entities
            .get(id)
            .and_then(|e| e.components.get::<RenderHandle>())
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_positions_follow_bodies() {
        let mut state = GameState::empty(1, Tuning::default(), ContextKind::Match);
        let id = state.spawn_ball(BallKind::Standard, Vec2::new(400.0, 300.0), Some(Vec2::X), None);
        if let Some(body) = state.entities.get_mut(id).and_then(|e| e.physics_mut()) {
            body.position = Vec2::new(420.0, 310.0);
        }
        RenderSyncSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));
        assert_eq!(handle(&state, id).position, Vec2::new(420.0, 310.0));
    }

    #[test]
    fn test_paddle_scale_tracks_height() {
        let mut state = GameState::empty(1, Tuning::default(), ContextKind::Match);
        let id = state.spawn_paddle(Side::Left, Controller::Local);
        if let Some(body) = state.entities.get_mut(id).and_then(|e| e.physics_mut()) {
            body.size.y = 120.0;
        }
        RenderSyncSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));
        let render = handle(&state, id);
        assert_eq!(render.scale, Vec2::new(1.0, 1.5));
    }

    #[test]
    fn test_particles_copy_fade() {
        let mut state = GameState::empty(1, Tuning::default(), ContextKind::Match);
        let id = state.spawn_particle(VfxKind::Spark, Vec2::ZERO, Vec2::ZERO, 10.0, 0);
        if let Some(vfx) = state.entities.get_mut(id).and_then(|e| e.components.get_mut::<Vfx>()) {
            vfx.alpha = 0.25;
            vfx.scale = 0.5;
        }
        RenderSyncSystem.update(&mut state, &FrameDelta::new(1.0, 0.0));
        let render = handle(&state, id);
        assert_eq!(render.alpha, 0.25);
        assert_eq!(render.scale, Vec2::splat(0.5));
    }
}
