//! Corrective velocity adjustments
//!
//! Balls bouncing between parallel surfaces can settle into a straight
//! back-and-forth loop. These routines detect the loop and push the ball out
//! of it, and keep every ball crossing the arena at a useful angle.

use glam::Vec2;

use super::ball::BallKind;
use crate::angle_between;
use crate::consts::*;

/// Dominant direction of a detected oscillation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillationAxis {
    Horizontal,
    Vertical,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillation {
    pub axis: OscillationAxis,
    /// Near-reversals found in the history window
    pub reversals: usize,
}

/// Look for velocity reversals between consecutive samples
///
/// A reversal is a direction change within π/6 of π. Zero-length samples are
/// skipped since they carry no direction.
pub fn detect_oscillation(history: &[Vec2]) -> Option<Oscillation> {
    let reversals = history
        .windows(2)
        .filter(|pair| pair[0].length_squared() > 0.0 && pair[1].length_squared() > 0.0)
        .filter(|pair| {
            angle_between(pair[0], pair[1]) >= std::f32::consts::PI - OSCILLATION_ANGLE_TOLERANCE
        })
        .count();

    if reversals == 0 {
        return None;
    }

    let n = history.len() as f32;
    let avg_x = history.iter().map(|v| v.x.abs()).sum::<f32>() / n;
    let avg_y = history.iter().map(|v| v.y.abs()).sum::<f32>() / n;
    let avg_speed = history.iter().map(|v| v.length()).sum::<f32>() / n;
    let threshold = OSCILLATION_AXIS_RATIO * avg_speed;

    let axis = if avg_y < threshold {
        OscillationAxis::Horizontal
    } else if avg_x < threshold {
        OscillationAxis::Vertical
    } else {
        OscillationAxis::Mixed
    };

    Some(Oscillation { axis, reversals })
}

#[inline]
fn sign_or_positive(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Speed cap for a ball kind
#[inline]
pub fn speed_cap(kind: BallKind) -> f32 {
    match kind {
        BallKind::Burst => BURST_MAX_SPEED,
        _ => BALL_MAX_SPEED,
    }
}

/// Push a ball out of an oscillation loop
///
/// Boosts the under-represented axis, caps total speed for the ball kind,
/// floors both components at 20% of the original speed and finally rescales
/// to `min(1.1 × original, cap)`.
pub fn break_oscillation(velocity: Vec2, kind: BallKind, axis: OscillationAxis) -> Vec2 {
    let prev_speed = velocity.length();
    let cap = speed_cap(kind);
    let mut v = velocity;

    match axis {
        OscillationAxis::Horizontal => v.y += sign_or_positive(v.y) * OSCILLATION_BOOST,
        OscillationAxis::Vertical => v.x += sign_or_positive(v.x) * OSCILLATION_BOOST,
        OscillationAxis::Mixed => {
            if v.x.abs() < v.y.abs() {
                v.x += sign_or_positive(v.x) * OSCILLATION_BOOST;
            } else {
                v.y += sign_or_positive(v.y) * OSCILLATION_BOOST;
            }
        }
    }

    let speed = v.length();
    if speed > cap {
        v *= cap / speed;
    }

    let floor = OSCILLATION_FLOOR_RATIO * prev_speed;
    if v.x.abs() < floor {
        v.x = sign_or_positive(v.x) * floor;
    }
    if v.y.abs() < floor {
        v.y = sign_or_positive(v.y) * floor;
    }

    let target = (OSCILLATION_GROWTH * prev_speed).min(cap);
    let len = v.length();
    if len > 0.0 && target > 0.0 {
        v *= target / len;
    }
    v
}

/// Keep at least `min_fraction` of the speed moving horizontally
///
/// The horizontal direction comes from the current sign, or for a ball with
/// no horizontal motion at all, from the half of the arena it sits in (it
/// heads toward the far side). Total speed is preserved.
pub fn enforce_min_horizontal(velocity: Vec2, x: f32, arena_width: f32, min_fraction: f32) -> Vec2 {
    let speed = velocity.length();
    if speed == 0.0 || velocity.x.abs() / speed >= min_fraction {
        return velocity;
    }

    let dir = if velocity.x > 0.0 {
        1.0
    } else if velocity.x < 0.0 {
        -1.0
    } else if x < arena_width / 2.0 {
        1.0
    } else {
        -1.0
    };

    let vertical = (1.0 - min_fraction * min_fraction).max(0.0).sqrt();
    Vec2::new(
        dir * min_fraction * speed,
        sign_or_positive(velocity.y) * vertical * speed,
    )
}
