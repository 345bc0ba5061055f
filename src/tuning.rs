//! Data-driven game balance
//!
//! Every gameplay number that a designer might want to tweak lives here.
//! Missing fields in a JSON document fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,

    // === Paddles ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_margin: f32,
    pub paddle_speed: f32,
    /// Per-frame easing rate of paddle height toward its target (0-1)
    pub size_ease_rate: f32,

    // === Balls ===
    pub ball_size: f32,
    pub ball_start_speed: f32,
    /// Multiplicative speed-up on every paddle hit
    pub paddle_speedup: f32,
    /// Maximum deflection (radians) from hitting the paddle off-centre
    pub paddle_deflection: f32,
    /// Minimum fraction of total speed carried horizontally
    pub min_horizontal_fraction: f32,
    /// Velocity samples kept for oscillation detection
    pub oscillation_history: usize,

    // === Affectations ===
    pub affectation_duration: f32,
    pub shield_duration: f32,
    pub stun_duration: f32,
    pub enlarge_factor: f32,
    pub shrink_factor: f32,
    pub slow_factor: f32,

    // === Magnet ===
    pub magnet_strength: f32,
    pub magnet_min_range: f32,
    pub magnet_max_range: f32,

    // === Ball variants ===
    pub spin_factor: f32,
    pub spin_acceleration: f32,
    pub spin_max_angular_velocity: f32,
    pub burst_windup_frames: u32,
    pub burst_windup_speed: f32,
    pub burst_speed: f32,
    pub curve_rate: f32,
    pub multiply_fake_count: u32,
    pub multiply_stagger: f32,

    // === Shooting ===
    pub shot_count: u32,
    pub shot_interval: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,

    // === Pickups ===
    pub pickup_size: f32,
    /// Frames between random pickup drops
    pub pickup_interval: f32,

    // === Match flow ===
    pub serve_delay: f32,
    pub winning_score: u32,
    pub firework_bursts: u32,
    pub firework_stagger: f32,
    pub firework_particles: u32,
    pub firework_lifetime: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_margin: PADDLE_MARGIN,
            paddle_speed: PADDLE_SPEED,
            size_ease_rate: 0.12,

            ball_size: BALL_SIZE,
            ball_start_speed: BALL_START_SPEED,
            paddle_speedup: 1.03,
            paddle_deflection: std::f32::consts::FRAC_PI_4,
            min_horizontal_fraction: 0.3,
            oscillation_history: 6,

            affectation_duration: AFFECTATION_DURATION,
            shield_duration: SHIELD_DURATION,
            stun_duration: 90.0,
            enlarge_factor: 1.5,
            shrink_factor: 0.5,
            slow_factor: 0.5,

            magnet_strength: 0.35,
            magnet_min_range: 60.0,
            magnet_max_range: 420.0,

            spin_factor: 0.6,
            spin_acceleration: 0.002,
            spin_max_angular_velocity: 0.15,
            burst_windup_frames: 45,
            burst_windup_speed: 1.5,
            burst_speed: 14.0,
            curve_rate: 0.012,
            multiply_fake_count: 2,
            multiply_stagger: 10.0,

            shot_count: SHOT_COUNT,
            shot_interval: SHOT_INTERVAL,
            projectile_speed: 12.0,
            projectile_size: 8.0,

            pickup_size: 30.0,
            pickup_interval: 600.0,

            serve_delay: 60.0,
            winning_score: 11,
            firework_bursts: 5,
            firework_stagger: 6.0,
            firework_particles: 8,
            firework_lifetime: 40.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(SimError::Tuning)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning: arena {}x{}, winning score {}",
            tuning.arena_width,
            tuning.arena_height,
            tuning.winning_score
        );
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    ///
    /// The arena must fit a pickup with its margin and a paddle twice over;
    /// sizes, speeds, durations and intervals must be positive.
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| Err(SimError::InvalidTuning(msg));

        if self.arena_width <= 2.0 * self.pickup_size || self.arena_height <= 2.0 * self.pickup_size {
            return invalid(format!(
                "arena {}x{} too small for pickup size {}",
                self.arena_width, self.arena_height, self.pickup_size
            ));
        }
        if self.arena_height <= 2.0 * self.paddle_height {
            return invalid(format!(
                "arena height {} too small for paddle height {}",
                self.arena_height, self.paddle_height
            ));
        }
        if self.paddle_margin < 0.0 || self.paddle_margin >= self.arena_width / 2.0 {
            return invalid(format!("paddle margin {} outside the arena", self.paddle_margin));
        }

        let positive = [
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("paddle_speed", self.paddle_speed),
            ("ball_size", self.ball_size),
            ("ball_start_speed", self.ball_start_speed),
            ("pickup_size", self.pickup_size),
            ("pickup_interval", self.pickup_interval),
            ("affectation_duration", self.affectation_duration),
            ("shield_duration", self.shield_duration),
            ("stun_duration", self.stun_duration),
            ("shot_interval", self.shot_interval),
            ("serve_delay", self.serve_delay),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return invalid(format!("{} must be positive, got {}", name, value));
        }

        if self.winning_score == 0 {
            return invalid("winning_score must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn to_json(&self) -> String {
        // Tuning holds only numbers, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Centre of the arena
    pub fn arena_center(&self) -> glam::Vec2 {
        glam::Vec2::new(self.arena_width / 2.0, self.arena_height / 2.0)
    }

    /// Horizontal centre of a paddle on the given side
    pub fn paddle_x(&self, side: crate::Side) -> f32 {
        match side {
            crate::Side::Left => self.paddle_margin,
            crate::Side::Right => self.arena_width - self.paddle_margin,
        }
    }
}
