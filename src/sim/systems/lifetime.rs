//! Lifetime expiry and purely visual updates

use crate::sim::component::{Animation, Despawn, Lifetime, Physics, Vfx};
use crate::sim::entity::EntityId;
use crate::sim::state::GameState;
use crate::sim::system::{FrameDelta, System};

/// Extra room outside the arena before position-bound entities go away
const OFFSCREEN_MARGIN: f32 = 50.0;

pub struct LifetimeSystem;

impl System for LifetimeSystem {
    fn name(&self) -> &'static str {
        "lifetime"
    }

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta) {
        let (width, height) = (state.tuning.arena_width, state.tuning.arena_height);
        let mut expired: Vec<EntityId> = Vec::new();

        for entity in state.entities.iter_mut() {
            let (lifetime, physics) = entity.components.get_pair_mut::<Lifetime, Physics>();
            let Some(lifetime) = lifetime else {
                continue;
            };
            let timed_out = lifetime.tick(delta.delta_time);
            let gone = match lifetime.despawn {
                Despawn::Time => timed_out,
                Despawn::Position => physics.is_some_and(|p| {
                    p.position.x < -OFFSCREEN_MARGIN
                        || p.position.x > width + OFFSCREEN_MARGIN
                        || p.position.y < -OFFSCREEN_MARGIN
                        || p.position.y > height + OFFSCREEN_MARGIN
                }),
                Despawn::Manual => false,
            };
            if gone {
                expired.push(entity.id);
            }
        }

        for id in expired {
            state.entities.remove(id, &mut state.outbox);
        }
    }
}

/// Particle drift, fading and frame animation
pub struct VfxSystem;

impl System for VfxSystem {
    fn name(&self) -> &'static str {
        "vfx"
    }

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta) {
        let dt = delta.delta_time;
        for entity in state.entities.iter_mut() {
            if let Some(animation) = entity.components.get_mut::<Animation>() {
                animation.advance(dt);
            }

            let fraction = entity.components.get::<Lifetime>().map(Lifetime::fraction);
            let (vfx, physics) = entity.components.get_pair_mut::<Vfx, Physics>();
            let Some(vfx) = vfx else {
                continue;
            };
            if let Some(fraction) = fraction {
                vfx.alpha = fraction;
            }
            vfx.scale = (vfx.scale + vfx.growth * dt).max(0.0);
            if let Some(physics) = physics {
                physics.velocity *= vfx.drag.powf(dt);
                physics.position += physics.velocity * dt;
            }
        }
    }
}
