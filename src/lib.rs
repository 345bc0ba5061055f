//! Paddle Arena - simulation core for a two-paddle arena game
//!
//! Core modules:
//! - `sim`: Entity/component store, systems, physics, powerups and ball variants
//! - `tuning`: Data-driven game balance
//! - `error`: Error taxonomy for construction and boundary parsing

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
///
/// All velocities are in arena units per frame and all timers count frames,
/// so a `delta_time` of 1.0 is one 60 Hz frame.
pub mod consts {
    /// Nominal frame duration in seconds (delta_time 1.0)
    pub const FRAME_SECONDS: f32 = 1.0 / 60.0;
    /// Maximum frame-delta a single tick will integrate
    pub const MAX_DELTA_TIME: f32 = 3.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 20.0;
    pub const PADDLE_HEIGHT: f32 = 80.0;
    /// Distance from the arena edge to the paddle centre
    pub const PADDLE_MARGIN: f32 = 30.0;
    pub const PADDLE_SPEED: f32 = 8.0;

    /// Ball defaults
    pub const BALL_SIZE: f32 = 16.0;
    pub const BALL_START_SPEED: f32 = 6.0;
    /// Speed cap applied after oscillation breaking (non-burst balls)
    pub const BALL_MAX_SPEED: f32 = 10.0;
    /// Speed cap for burst balls
    pub const BURST_MAX_SPEED: f32 = 17.0;
    /// Global speed clamp after magnetic attraction
    pub const MAGNETIC_MAX_SPEED: f32 = 15.0;

    /// Oscillation breaking
    pub const OSCILLATION_BOOST: f32 = 2.0;
    pub const OSCILLATION_ANGLE_TOLERANCE: f32 = std::f32::consts::PI / 6.0;
    pub const OSCILLATION_AXIS_RATIO: f32 = 0.3;
    pub const OSCILLATION_FLOOR_RATIO: f32 = 0.2;
    pub const OSCILLATION_GROWTH: f32 = 1.1;

    /// Spin ball limits
    pub const SPIN_MAX_DEFLECTION: f32 = std::f32::consts::PI / 7.0;
    pub const SPIN_ANGULAR_VELOCITY_CAP: f32 = 0.3;

    /// Contact refinement
    pub const CONTACT_ITERATIONS: u32 = 7;
    pub const CONTACT_PRECISION: f32 = 0.01;

    /// Affectation durations (frames)
    pub const AFFECTATION_DURATION: f32 = 500.0;
    pub const SHIELD_DURATION: f32 = 1000.0;

    /// Shooting powerup
    pub const SHOT_COUNT: u32 = 3;
    pub const SHOT_INTERVAL: f32 = 15.0;
}

/// Which half of the arena a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }

    /// Horizontal direction pointing away from this side's goal
    #[inline]
    pub fn outward(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Smallest absolute angle between two directions, in [0, π]
#[inline]
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    normalize_angle(b.y.atan2(b.x) - a.y.atan2(a.x)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) + PI).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_angle_between_reversal() {
        let a = Vec2::new(5.0, 0.0);
        let b = Vec2::new(-3.0, 0.0);
        assert!((angle_between(a, b) - PI).abs() < 1e-5);
        assert!((angle_between(a, Vec2::new(0.0, 2.0)) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Left.opponent(), Side::Right);
        assert_eq!(Side::parse("right"), Some(Side::Right));
        assert_eq!(Side::parse(""), None);
    }
}
