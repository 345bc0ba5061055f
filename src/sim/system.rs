//! System trait and ordered scheduler

use super::state::GameState;

/// Time information handed to every system on a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDelta {
    /// Frames elapsed since the previous tick (1.0 at 60 Hz)
    pub delta_time: f32,
    /// Total frames simulated so far
    pub elapsed: f32,
}

impl FrameDelta {
    pub fn new(delta_time: f32, elapsed: f32) -> Self {
        Self {
            delta_time,
            elapsed,
        }
    }
}

/// A unit of per-frame logic
pub trait System {
    fn name(&self) -> &'static str;

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta);

    /// Release anything the system holds onto. May be called more than once.
    fn cleanup(&mut self, _state: &mut GameState) {}
}

/// Runs systems in registration order
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, system: impl System + 'static) -> &mut Self {
        log::debug!("Registered system {}", system.name());
        self.systems.push(Box::new(system));
        self
    }

    /// One update per system; later systems see earlier mutations
    pub fn tick(&mut self, state: &mut GameState, delta: &FrameDelta) {
        for system in &mut self.systems {
            system.update(state, delta);
        }
    }

    /// Clean up every system and cancel pending tasks
    pub fn cleanup(&mut self, state: &mut GameState) {
        for system in &mut self.systems {
            system.cleanup(state);
        }
        state.tasks.cancel_all();
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
