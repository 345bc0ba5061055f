//! Fixed timestep simulation tick
//!
//! Host frames are converted into whole simulation frames, and each frame
//! runs the system schedule once.

use super::component::Input;
use super::paddle::Controller;
use super::state::{GamePhase, GameState};
use super::system::{FrameDelta, Scheduler};
use super::systems::{
    AffectationSystem, BallChangeSystem, InputSystem, LifetimeSystem, PaddleSystem,
    PhysicsSystem, RenderSyncSystem, ScoreSystem, TasksSystem, VfxSystem, paddle::set_input,
};
use crate::Side;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Applied to the left paddle when it is locally controlled
    pub left: Input,
    /// Applied to the right paddle when it is locally controlled
    pub right: Input,
    /// Pause toggle
    pub pause: bool,
}

/// The default schedule
///
/// Input and movement come first so physics sees this frame's paddles;
/// consumers of physics events follow; render sync is last.
pub fn default_scheduler() -> Scheduler {
    let mut scheduler = Scheduler::new();
    scheduler
        .add(InputSystem)
        .add(PaddleSystem)
        .add(PhysicsSystem)
        .add(AffectationSystem)
        .add(BallChangeSystem)
        .add(ScoreSystem)
        .add(TasksSystem)
        .add(LifetimeSystem)
        .add(VfxSystem)
        .add(RenderSyncSystem);
    scheduler
}

/// A game state together with the systems that drive it
pub struct Simulation {
    pub state: GameState,
    pub scheduler: Scheduler,
    /// Unsimulated time, in frames
    accumulator: f32,
    elapsed: f32,
}

impl Simulation {
    pub fn new(state: GameState) -> Self {
        Self::with_scheduler(state, default_scheduler())
    }

    pub fn with_scheduler(state: GameState, scheduler: Scheduler) -> Self {
        Self {
            state,
            scheduler,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Advance by `delta_time` frames (clamped to `MAX_DELTA_TIME`)
    pub fn tick(&mut self, input: &TickInput, delta_time: f32) {
        let state = &mut self.state;
        set_input(state, Side::Left, input.left);
        set_input(state, Side::Right, input.right);

        if input.pause {
            match state.phase {
                GamePhase::Playing | GamePhase::Serve => {
                    state.phase = GamePhase::Paused;
                    log::debug!("Paused at frame {}", state.frame);
                    return;
                }
                GamePhase::Paused => {
                    state.phase = if state.good_ball_count() > 0 {
                        GamePhase::Playing
                    } else {
                        GamePhase::Serve
                    };
                }
                GamePhase::GameOver => {}
            }
        }

        if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
            return;
        }

        let delta_time = delta_time.clamp(0.0, MAX_DELTA_TIME);
        state.frame += 1;
        self.elapsed += delta_time;
        log::trace!("Frame {} (dt {:.3})", state.frame, delta_time);
        self.scheduler
            .tick(state, &FrameDelta::new(delta_time, self.elapsed));
    }

    /// Advance by wall-clock `seconds`, running whole frames
    ///
    /// Returns the number of frames simulated. One-shot input (pause) is only
    /// applied on the first of them.
    pub fn advance(&mut self, input: &TickInput, seconds: f32) -> u32 {
        self.accumulator += seconds.clamp(0.0, 0.1) / FRAME_SECONDS;

        let mut input = input.clone();
        let mut substeps = 0;
        while self.accumulator >= 1.0 && substeps < MAX_SUBSTEPS {
            self.tick(&input, 1.0);
            self.accumulator -= 1.0;
            substeps += 1;
            input.pause = false;
        }
        substeps
    }

    /// Stop all systems and cancel pending work
    pub fn shutdown(&mut self) {
        self.scheduler.cleanup(&mut self.state);
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    /// Whether any paddle is driven by the host
    pub fn has_local_paddle(&self) -> bool {
        [Side::Left, Side::Right].into_iter().any(|side| {
            self.state
                .entities
                .paddle(side)
                .and_then(|e| e.paddle())
                .is_some_and(|p| p.controller == Controller::Local)
        })
    }
}
