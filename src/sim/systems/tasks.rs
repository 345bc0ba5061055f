//! Runs scheduled tasks that came due this tick

use glam::Vec2;
use rand::Rng;

use crate::sim::component::VfxKind;
use crate::sim::state::{GamePhase, GameState};
use crate::sim::system::{FrameDelta, System};
use crate::sim::tasks::TaskAction;

/// Colours cycled through by successive firework bursts
const FIREWORK_TINTS: [u32; 4] = [0xff5555, 0xffdd44, 0x55ddff, 0xaa66ff];

pub struct TasksSystem;

impl System for TasksSystem {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta) {
        if state.phase == GamePhase::Paused {
            return;
        }
        for action in state.tasks.advance(delta.delta_time) {
            run(state, action);
        }
    }

    fn cleanup(&mut self, state: &mut GameState) {
        state.tasks.cancel_all();
    }
}

fn run(state: &mut GameState, action: TaskAction) {
    match action {
        TaskAction::FireProjectile { side } => {
            if state.spawn_projectile(side).is_none() {
                log::debug!("No {} paddle to fire from", side.as_str());
            }
        }
        TaskAction::Firework { origin, burst } => firework(state, origin, burst),
        TaskAction::SpawnFakeBall {
            kind,
            origin,
            velocity,
            last_hit,
        } => {
            if state.phase == GamePhase::Playing {
                state.spawn_fake_ball(kind, origin, velocity, last_hit);
            }
        }
        TaskAction::Serve { toward } => {
            if state.phase != GamePhase::GameOver {
                state.serve(toward);
            }
        }
        TaskAction::SpawnPickup => {
            if state.phase == GamePhase::Playing {
                state.spawn_random_pickup();
            }
        }
    }
}

fn firework(state: &mut GameState, origin: Vec2, burst: u32) {
    let count = state.tuning.firework_particles;
    let lifetime = state.tuning.firework_lifetime;
    let tint = FIREWORK_TINTS[burst as usize % FIREWORK_TINTS.len()];
    let center = origin + Vec2::new(0.0, state.rng.random_range(-120.0..120.0));

    for i in 0..count {
        let angle = std::f32::consts::TAU * i as f32 / count.max(1) as f32;
        let speed = state.rng.random_range(1.5..4.0);
        let velocity = Vec2::from_angle(angle) * speed;
        state.spawn_particle(VfxKind::Firework, center, velocity, lifetime, tint);
    }
}
