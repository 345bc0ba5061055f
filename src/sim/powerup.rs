//! Pickup kinds and the paddle behaviours they trigger
//!
//! A [`Powerup`] component only knows how to flip flags on a target paddle
//! and announce it. Removal, timers and timer bars belong to the affectation
//! system.

use serde::{Deserialize, Serialize};

use super::ball::BallKind;
use super::events::{EventKind, EventQueue, GameEvent};
use super::paddle::{Affectation, Paddle};
use super::state::ContextKind;
use crate::error::SimError;
use crate::tuning::Tuning;

/// Broad class of a pickup, from the suffix of its wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupCategory {
    /// Helps the paddle that last hit the ball
    Powerup,
    /// Hinders the opponent of the paddle that last hit the ball
    Powerdown,
    /// Swaps the ball for another variant
    BallChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Enlarge,
    Shrink,
    Invert,
    Slow,
    Flatten,
    Magnetize,
    Shield,
    Shoot,
    SpinBall,
    BurstBall,
    CurveBall,
    MultiplyBall,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 12] = [
        PowerupKind::Enlarge,
        PowerupKind::Shrink,
        PowerupKind::Invert,
        PowerupKind::Slow,
        PowerupKind::Flatten,
        PowerupKind::Magnetize,
        PowerupKind::Shield,
        PowerupKind::Shoot,
        PowerupKind::SpinBall,
        PowerupKind::BurstBall,
        PowerupKind::CurveBall,
        PowerupKind::MultiplyBall,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            PowerupKind::Enlarge => "enlargePowerup",
            PowerupKind::Shrink => "shrinkPowerdown",
            PowerupKind::Invert => "invertPowerdown",
            PowerupKind::Slow => "slowPowerdown",
            PowerupKind::Flatten => "flattenPowerdown",
            PowerupKind::Magnetize => "magnetizePowerup",
            PowerupKind::Shield => "shieldPowerup",
            PowerupKind::Shoot => "shootPowerup",
            PowerupKind::SpinBall => "spinBall",
            PowerupKind::BurstBall => "burstBall",
            PowerupKind::CurveBall => "curveBall",
            PowerupKind::MultiplyBall => "multiplyBall",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<PowerupKind> {
        PowerupKind::ALL.into_iter().find(|k| k.wire_name() == name)
    }

    pub fn category(self) -> PickupCategory {
        let name = self.wire_name();
        if name.ends_with("Powerdown") {
            PickupCategory::Powerdown
        } else if name.ends_with("Ball") {
            PickupCategory::BallChange
        } else {
            PickupCategory::Powerup
        }
    }

    /// Paddle affectation this pickup applies, if any
    pub fn affectation(self) -> Option<Affectation> {
        match self {
            PowerupKind::Enlarge => Some(Affectation::Enlarged),
            PowerupKind::Shrink => Some(Affectation::Shrinked),
            PowerupKind::Invert => Some(Affectation::Inverted),
            PowerupKind::Slow => Some(Affectation::Slowed),
            PowerupKind::Flatten => Some(Affectation::Flat),
            PowerupKind::Magnetize => Some(Affectation::Magnetized),
            PowerupKind::Shield => Some(Affectation::Shielded),
            _ => None,
        }
    }

    /// Ball variant this pickup swaps in, if any
    pub fn ball_kind(self) -> Option<BallKind> {
        match self {
            PowerupKind::SpinBall => Some(BallKind::Spin),
            PowerupKind::BurstBall => Some(BallKind::Burst),
            PowerupKind::CurveBall => Some(BallKind::Curve),
            PowerupKind::MultiplyBall => Some(BallKind::Multiply),
            _ => None,
        }
    }
}

/// Pickup component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub kind: PowerupKind,
    pub owner: ContextKind,
    /// Set once a ball has touched it; the pickup stops triggering
    pub consumed: bool,
}

impl Powerup {
    pub fn new(kind: PowerupKind, owner: ContextKind) -> Self {
        Self {
            kind,
            owner,
            consumed: false,
        }
    }

    /// Build a pickup for a context named by the host
    pub fn for_context(kind: PowerupKind, context: &str) -> Result<Self, SimError> {
        let owner = ContextKind::parse(context)
            .ok_or_else(|| SimError::InvalidContext(context.to_string()))?;
        Ok(Self::new(kind, owner))
    }

    pub fn enlarge(&self, paddle: &mut Paddle, tuning: &Tuning, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Enlarged, true);
        paddle.begin_enlarge(tuning.enlarge_factor);
        announce(paddle, Affectation::Enlarged, events);
    }

    pub fn shrink(&self, paddle: &mut Paddle, tuning: &Tuning, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Shrinked, true);
        paddle.begin_shrink(tuning.shrink_factor);
        announce(paddle, Affectation::Shrinked, events);
    }

    pub fn invert(&self, paddle: &mut Paddle, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Inverted, true);
        announce(paddle, Affectation::Inverted, events);
    }

    pub fn slow(&self, paddle: &mut Paddle, tuning: &Tuning, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Slowed, true);
        paddle.slowness = tuning.slow_factor;
        announce(paddle, Affectation::Slowed, events);
    }

    pub fn flatten(&self, paddle: &mut Paddle, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Flat, true);
        announce(paddle, Affectation::Flat, events);
    }

    pub fn magnetize(&self, paddle: &mut Paddle, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Magnetized, true);
        announce(paddle, Affectation::Magnetized, events);
    }

    pub fn shield(&self, paddle: &mut Paddle, events: &mut EventQueue) {
        paddle.set_affected(Affectation::Shielded, true);
        announce(paddle, Affectation::Shielded, events);
    }

    /// Apply this pickup's affectation to `paddle`
    ///
    /// Returns the affectation set, or `None` for pickups that do not touch
    /// paddle flags.
    pub fn apply(
        &self,
        paddle: &mut Paddle,
        tuning: &Tuning,
        events: &mut EventQueue,
    ) -> Option<Affectation> {
        match self.kind {
            PowerupKind::Enlarge => self.enlarge(paddle, tuning, events),
            PowerupKind::Shrink => self.shrink(paddle, tuning, events),
            PowerupKind::Invert => self.invert(paddle, events),
            PowerupKind::Slow => self.slow(paddle, tuning, events),
            PowerupKind::Flatten => self.flatten(paddle, events),
            PowerupKind::Magnetize => self.magnetize(paddle, events),
            PowerupKind::Shield => self.shield(paddle, events),
            _ => return None,
        }
        self.kind.affectation()
    }
}

/// Stun a paddle hit by a projectile
pub fn stun(paddle: &mut Paddle, events: &mut EventQueue) {
    paddle.set_affected(Affectation::Stunned, true);
    announce(paddle, Affectation::Stunned, events);
}

fn announce(paddle: &Paddle, affectation: Affectation, events: &mut EventQueue) {
    events.push(GameEvent::new(EventKind::Affected(affectation)).with_side(paddle.side));
}
