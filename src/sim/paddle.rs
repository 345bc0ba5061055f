//! Paddle state: affectation flags, shared countdown and size easing

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Side;

/// Timed modifiers a paddle can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affectation {
    Enlarged,
    Shrinked,
    Inverted,
    Slowed,
    Flat,
    Magnetized,
    Stunned,
    /// Runs on its own timer
    Shielded,
}

impl Affectation {
    /// Affectations counted down by the shared timer
    pub const TIMED: [Affectation; 7] = [
        Affectation::Enlarged,
        Affectation::Shrinked,
        Affectation::Inverted,
        Affectation::Slowed,
        Affectation::Flat,
        Affectation::Magnetized,
        Affectation::Stunned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Affectation::Enlarged => "enlarged",
            Affectation::Shrinked => "shrinked",
            Affectation::Inverted => "inverted",
            Affectation::Slowed => "slowed",
            Affectation::Flat => "flat",
            Affectation::Magnetized => "magnetized",
            Affectation::Stunned => "stunned",
            Affectation::Shielded => "shielded",
        }
    }

    #[inline]
    pub fn is_size(self) -> bool {
        matches!(self, Affectation::Enlarged | Affectation::Shrinked)
    }
}

/// Who drives the paddle's input component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Local,
    Ai,
    /// Positions come from snapshots
    Remote,
}

/// Where the size animation is heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OvershootPhase {
    /// Easing straight toward `target_height`
    #[default]
    Settled,
    /// Heading to an overshoot below target, then expanding back up
    Expand,
    /// Heading to an overshoot above target, then shrinking back down
    Shrink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub controller: Controller,

    pub is_enlarged: bool,
    pub is_shrinked: bool,
    pub is_inverted: bool,
    pub is_slowed: bool,
    pub is_flat: bool,
    pub is_magnetized: bool,
    pub is_stunned: bool,
    /// Shared countdown for every flag above (frames)
    pub affected_timer: f32,

    /// -1 while inverted
    pub inversion: f32,
    /// Speed multiplier while slowed
    pub slowness: f32,

    pub base_height: f32,
    pub target_height: f32,
    pub overshoot_target: f32,
    pub overshoot_phase: OvershootPhase,
    /// 0 at base height, 1 at target height
    pub enlarge_progress: f32,

    pub is_shielded: bool,
    pub shield_timer: f32,

    /// Vertical velocity from the last movement step, used for swept tests
    pub velocity_y: f32,
}

impl Paddle {
    pub fn new(side: Side, controller: Controller, base_height: f32) -> Self {
        Self {
            side,
            controller,
            is_enlarged: false,
            is_shrinked: false,
            is_inverted: false,
            is_slowed: false,
            is_flat: false,
            is_magnetized: false,
            is_stunned: false,
            affected_timer: 0.0,
            inversion: 1.0,
            slowness: 1.0,
            base_height,
            target_height: base_height,
            overshoot_target: base_height,
            overshoot_phase: OvershootPhase::Settled,
            enlarge_progress: 0.0,
            is_shielded: false,
            shield_timer: 0.0,
            velocity_y: 0.0,
        }
    }

    pub fn is_affected(&self, affectation: Affectation) -> bool {
        match affectation {
            Affectation::Enlarged => self.is_enlarged,
            Affectation::Shrinked => self.is_shrinked,
            Affectation::Inverted => self.is_inverted,
            Affectation::Slowed => self.is_slowed,
            Affectation::Flat => self.is_flat,
            Affectation::Magnetized => self.is_magnetized,
            Affectation::Stunned => self.is_stunned,
            Affectation::Shielded => self.is_shielded,
        }
    }

    /// Flip a flag along with the multiplier it drives
    pub fn set_affected(&mut self, affectation: Affectation, on: bool) {
        match affectation {
            Affectation::Enlarged => self.is_enlarged = on,
            Affectation::Shrinked => self.is_shrinked = on,
            Affectation::Inverted => {
                self.is_inverted = on;
                self.inversion = if on { -1.0 } else { 1.0 };
            }
            Affectation::Slowed => {
                self.is_slowed = on;
                if !on {
                    self.slowness = 1.0;
                }
            }
            Affectation::Flat => self.is_flat = on,
            Affectation::Magnetized => self.is_magnetized = on,
            Affectation::Stunned => self.is_stunned = on,
            Affectation::Shielded => {
                self.is_shielded = on;
                if !on {
                    self.shield_timer = 0.0;
                }
            }
        }
    }

    /// Active flags on the shared timer
    pub fn active_affectations(&self) -> Vec<Affectation> {
        Affectation::TIMED
            .into_iter()
            .filter(|a| self.is_affected(*a))
            .collect()
    }

    pub fn has_timed_affectation(&self) -> bool {
        Affectation::TIMED.iter().any(|a| self.is_affected(*a))
    }

    /// Count down the shared timer; clears and returns every flag once it runs out
    ///
    /// The timer is left at its (non-positive) value so callers can observe
    /// the overrun.
    pub fn tick_affectations(&mut self, dt: f32) -> Vec<Affectation> {
        if !self.has_timed_affectation() {
            return Vec::new();
        }
        self.affected_timer -= dt;
        if self.affected_timer > 0.0 {
            return Vec::new();
        }
        let expired = self.active_affectations();
        for affectation in &expired {
            self.set_affected(*affectation, false);
        }
        expired
    }

    /// Returns true on the tick the shield wears off
    pub fn tick_shield(&mut self, dt: f32) -> bool {
        if !self.is_shielded {
            return false;
        }
        self.shield_timer -= dt;
        if self.shield_timer <= 0.0 {
            self.set_affected(Affectation::Shielded, false);
            return true;
        }
        false
    }

    /// Signed multiplier applied to input; zero while stunned
    #[inline]
    pub fn movement_factor(&self) -> f32 {
        if self.is_stunned {
            0.0
        } else {
            self.inversion * self.slowness
        }
    }

    pub fn begin_enlarge(&mut self, factor: f32) {
        self.is_shrinked = false;
        self.target_height = self.base_height * factor;
        self.overshoot_target = self.target_height * 1.2;
        self.overshoot_phase = OvershootPhase::Shrink;
        self.enlarge_progress = 0.0;
    }

    pub fn begin_shrink(&mut self, factor: f32) {
        self.is_enlarged = false;
        self.target_height = self.base_height * factor;
        self.overshoot_target = self.base_height * 0.4;
        self.overshoot_phase = OvershootPhase::Expand;
        self.enlarge_progress = 0.0;
    }

    /// Head back to the base height
    pub fn reset_size(&mut self) {
        self.target_height = self.base_height;
        self.overshoot_target = self.base_height;
        self.overshoot_phase = OvershootPhase::Settled;
    }

    /// Ease the body height toward the overshoot, then the target
    pub fn advance_size(&mut self, size: &mut Vec2, rate: f32, dt: f32) {
        let goal = match self.overshoot_phase {
            OvershootPhase::Settled => self.target_height,
            OvershootPhase::Expand | OvershootPhase::Shrink => self.overshoot_target,
        };
        let k = (rate * dt).clamp(0.0, 1.0);
        size.y += (goal - size.y) * k;

        if (goal - size.y).abs() < 0.5 {
            size.y = goal;
            self.overshoot_phase = OvershootPhase::Settled;
        }

        let span = self.target_height - self.base_height;
        self.enlarge_progress = if span.abs() > f32::EPSILON {
            ((size.y - self.base_height) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}
