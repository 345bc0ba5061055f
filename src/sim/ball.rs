//! Ball variants
//!
//! Every ball carries the same bookkeeping (last hit, magnetism, velocity
//! history) plus per-variant state. Behaviour is dispatched on the closed
//! [`BallKind`] enum.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::component::{Behaviour, GraphicDesc, Physics, RenderHandle, Shape};
use super::paddle::Paddle;
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{Side, rotate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallKind {
    Standard,
    /// Accumulates rotation that deflects bounces
    Spin,
    /// Creeps during a wind-up, then launches at high speed
    Burst,
    /// Heading bends a little every frame
    Curve,
    /// Arrives together with a pair of decoys
    Multiply,
}

impl BallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BallKind::Standard => "ball",
            BallKind::Spin => "spinBall",
            BallKind::Burst => "burstBall",
            BallKind::Curve => "curveBall",
            BallKind::Multiply => "multiplyBall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinState {
    /// Accumulated rotation (radians)
    pub rotation: f32,
    pub angular_velocity: f32,
    /// Per-frame angular velocity ramp
    pub acceleration: f32,
    pub max_angular_velocity: f32,
    /// How strongly rotation deflects a bounce
    pub factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BurstPhase {
    Winding { frames_left: f32 },
    Burst,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstState {
    pub phase: BurstPhase,
    pub windup_frames: f32,
    pub windup_speed: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub kind: BallKind,
    pub last_hit: Option<Side>,
    /// Only good balls score
    pub is_good_ball: bool,
    pub is_fake_ball: bool,
    /// Side whose magnetized paddle may pull this ball
    pub magnetic_influence: Option<Side>,
    /// Recent velocities, newest last
    pub history: VecDeque<Vec2>,
    pub history_len: usize,
    pub spin: SpinState,
    pub burst: BurstState,
    /// Radians per frame; flips sign on every paddle bounce
    pub curve_rate: f32,
}

impl Ball {
    pub fn new(kind: BallKind, tuning: &Tuning) -> Self {
        let windup_frames = tuning.burst_windup_frames as f32;
        Self {
            kind,
            last_hit: None,
            is_good_ball: true,
            is_fake_ball: false,
            magnetic_influence: None,
            history: VecDeque::with_capacity(tuning.oscillation_history),
            history_len: tuning.oscillation_history.max(2),
            spin: SpinState {
                rotation: 0.0,
                angular_velocity: 0.0,
                acceleration: tuning.spin_acceleration,
                max_angular_velocity: tuning
                    .spin_max_angular_velocity
                    .min(SPIN_ANGULAR_VELOCITY_CAP),
                factor: tuning.spin_factor,
            },
            burst: BurstState {
                phase: BurstPhase::Winding {
                    frames_left: windup_frames,
                },
                windup_frames,
                windup_speed: tuning.burst_windup_speed,
                speed: tuning.burst_speed,
            },
            curve_rate: tuning.curve_rate,
        }
    }

    /// A decoy that bounces like a ball but never scores
    pub fn fake(kind: BallKind, tuning: &Tuning) -> Self {
        Self {
            is_good_ball: false,
            is_fake_ball: true,
            ..Self::new(kind, tuning)
        }
    }

    /// Body and launch velocity for a freshly served ball
    pub fn init_physics(kind: BallKind, rng: &mut impl Rng, tuning: &Tuning, position: Vec2) -> Physics {
        let spread = match kind {
            BallKind::Spin => std::f32::consts::FRAC_PI_3,
            _ => std::f32::consts::FRAC_PI_4,
        };
        let angle = rng.random_range(-spread..=spread);
        let dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let velocity = Vec2::new(dir * angle.cos(), angle.sin()) * tuning.ball_start_speed;

        let mut physics = Physics::new(position, Vec2::splat(tuning.ball_size))
            .with_velocity(velocity)
            .with_behaviour(Behaviour::Bounce)
            .with_shape(Shape::Circle);
        physics.speed = Some(tuning.ball_start_speed);
        physics
    }

    pub fn create_graphic(kind: BallKind) -> GraphicDesc {
        let tint = match kind {
            BallKind::Standard => 0xffffff,
            BallKind::Spin => 0x66ccff,
            BallKind::Burst => 0xff6633,
            BallKind::Curve => 0x99ff66,
            BallKind::Multiply => 0xffcc00,
        };
        GraphicDesc {
            texture: kind.as_str(),
            tint,
        }
    }

    /// Integrate one step of motion for this variant
    pub fn move_ball(&mut self, physics: &mut Physics, render: Option<&mut RenderHandle>, dt: f32) {
        match self.kind {
            BallKind::Standard | BallKind::Multiply => {}
            BallKind::Curve => {
                physics.velocity = rotate(physics.velocity, self.curve_rate * dt);
            }
            BallKind::Spin => {
                let spin = &mut self.spin;
                spin.angular_velocity =
                    (spin.angular_velocity + spin.acceleration * dt).min(spin.max_angular_velocity);
                let sign = if physics.velocity.x < 0.0 { -1.0 } else { 1.0 };
                spin.rotation += spin.angular_velocity * sign * dt;
                if let Some(render) = render {
                    render.rotation = spin.rotation;
                }
            }
            BallKind::Burst => {
                let heading = match physics.velocity.try_normalize() {
                    Some(h) => h,
                    None => Vec2::X,
                };
                match &mut self.burst.phase {
                    BurstPhase::Winding { frames_left } => {
                        *frames_left -= dt;
                        if *frames_left <= 0.0 {
                            log::trace!("Burst ball launched");
                            self.burst.phase = BurstPhase::Burst;
                            physics.velocity = heading * self.burst.speed;
                        } else {
                            physics.velocity = heading * self.burst.windup_speed;
                        }
                    }
                    BurstPhase::Burst => {}
                }
            }
        }
        physics.position += physics.velocity * dt;
    }

    /// Back to the slow wind-up
    pub fn reset_windup(&mut self) {
        self.burst.phase = BurstPhase::Winding {
            frames_left: self.burst.windup_frames,
        };
    }

    pub fn is_winding(&self) -> bool {
        matches!(self.burst.phase, BurstPhase::Winding { .. })
    }

    /// Bookkeeping when a paddle returns the ball
    pub fn on_paddle_hit(&mut self, side: Side) {
        self.last_hit = Some(side);
        self.magnetic_influence = Some(side.opponent());
        match self.kind {
            BallKind::Curve => self.curve_rate = -self.curve_rate,
            BallKind::Burst => self.reset_windup(),
            _ => {}
        }
    }

    /// Deflect a fresh bounce by the accumulated spin
    ///
    /// Deflection is `sin(rotation) × factor × (ω / ω_max)`, clamped to π/7.
    /// Every spin bounce also speeds the ball and the spin ramp up slightly.
    pub fn apply_spin_to_bounce(&mut self, physics: &mut Physics) {
        if self.kind != BallKind::Spin {
            return;
        }
        let spin = &mut self.spin;
        let ratio = if spin.max_angular_velocity > 0.0 {
            spin.angular_velocity / spin.max_angular_velocity
        } else {
            0.0
        };
        let deflection = (spin.rotation.sin() * spin.factor * ratio)
            .clamp(-SPIN_MAX_DEFLECTION, SPIN_MAX_DEFLECTION);

        physics.velocity = rotate(physics.velocity, deflection) * 1.01;
        spin.acceleration *= 1.02;
        spin.max_angular_velocity = (spin.max_angular_velocity * 1.01).min(SPIN_ANGULAR_VELOCITY_CAP);
    }

    /// Pull toward the magnetized paddle on the influence side
    ///
    /// Full strength inside the minimum range, fading linearly to nothing at
    /// the maximum range. Returns whether the velocity changed.
    pub fn apply_magnetic_force(
        &self,
        physics: &mut Physics,
        paddles: &[(&Paddle, &Physics)],
        tuning: &Tuning,
        dt: f32,
    ) -> bool {
        let Some(influence) = self.magnetic_influence else {
            return false;
        };
        let Some((paddle, body)) = paddles
            .iter()
            .find(|(p, _)| p.side == influence && p.is_magnetized)
        else {
            return false;
        };

        let edge = Vec2::new(
            body.position.x + paddle.side.outward() * body.size.x / 2.0,
            body.position.y,
        );
        let offset = edge - physics.position;
        let distance = offset.length();
        if distance >= tuning.magnet_max_range || distance == 0.0 {
            return false;
        }

        let falloff = if distance <= tuning.magnet_min_range {
            1.0
        } else {
            (tuning.magnet_max_range - distance) / (tuning.magnet_max_range - tuning.magnet_min_range)
        };
        physics.velocity += offset / distance * tuning.magnet_strength * falloff * dt;

        let speed = physics.velocity.length();
        if speed > MAGNETIC_MAX_SPEED {
            physics.velocity *= MAGNETIC_MAX_SPEED / speed;
        }
        true
    }

    /// Remember a velocity for oscillation detection
    pub fn record_velocity(&mut self, velocity: Vec2) {
        if self.history.len() >= self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(velocity);
    }

    pub fn history_slice(&mut self) -> &[Vec2] {
        self.history.make_contiguous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_between;
    use crate::sim::paddle::Controller;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn body(position: Vec2, velocity: Vec2) -> Physics {
        Physics::new(position, Vec2::splat(16.0)).with_velocity(velocity)
    }

    #[test]
    fn test_magnet_without_influence_is_noop() {
        let tuning = Tuning::default();
        let ball = Ball::new(BallKind::Standard, &tuning);
        let mut left = Paddle::new(Side::Left, Controller::Local, 80.0);
        let mut right = Paddle::new(Side::Right, Controller::Local, 80.0);
        left.is_magnetized = true;
        right.is_magnetized = true;
        let left_body = Physics::new(Vec2::new(30.0, 300.0), Vec2::new(20.0, 80.0));
        let right_body = Physics::new(Vec2::new(770.0, 300.0), Vec2::new(20.0, 80.0));

        let mut physics = body(Vec2::new(100.0, 300.0), Vec2::new(-5.0, 1.0));
        let before = physics.velocity;
        let changed = ball.apply_magnetic_force(
            &mut physics,
            &[(&left, &left_body), (&right, &right_body)],
            &tuning,
            1.0,
        );
        assert!(!changed);
        assert_eq!(physics.velocity, before);
    }

    #[test]
    fn test_magnet_pulls_toward_paddle_edge() {
        let tuning = Tuning::default();
        let mut ball = Ball::new(BallKind::Standard, &tuning);
        ball.on_paddle_hit(Side::Right);
        assert_eq!(ball.magnetic_influence, Some(Side::Left));

        let mut left = Paddle::new(Side::Left, Controller::Local, 80.0);
        left.is_magnetized = true;
        let left_body = Physics::new(Vec2::new(30.0, 300.0), Vec2::new(20.0, 80.0));

        let mut physics = body(Vec2::new(80.0, 270.0), Vec2::new(-5.0, 0.0));
        assert!(ball.apply_magnetic_force(&mut physics, &[(&left, &left_body)], &tuning, 1.0));
        // Inside the minimum range the full strength applies, toward (40, 300)
        assert!(physics.velocity.y > 0.0);
        assert!(physics.velocity.x < -5.0);
    }

    #[test]
    fn test_magnet_clamps_speed() {
        let tuning = Tuning {
            magnet_strength: 50.0,
            ..Tuning::default()
        };
        let mut ball = Ball::new(BallKind::Standard, &tuning);
        ball.magnetic_influence = Some(Side::Left);
        let mut left = Paddle::new(Side::Left, Controller::Local, 80.0);
        left.is_magnetized = true;
        let left_body = Physics::new(Vec2::new(30.0, 300.0), Vec2::new(20.0, 80.0));

        let mut physics = body(Vec2::new(90.0, 300.0), Vec2::new(-10.0, 0.0));
        ball.apply_magnetic_force(&mut physics, &[(&left, &left_body)], &tuning, 1.0);
        assert!((physics.velocity.length() - MAGNETIC_MAX_SPEED).abs() < 1e-3);
    }

    #[test]
    fn test_burst_winds_up_then_launches() {
        let tuning = Tuning {
            burst_windup_frames: 3,
            ..Tuning::default()
        };
        let mut ball = Ball::new(BallKind::Burst, &tuning);
        let mut physics = body(Vec2::new(400.0, 300.0), Vec2::new(3.0, 4.0));

        ball.move_ball(&mut physics, None, 1.0);
        assert!((physics.velocity.length() - tuning.burst_windup_speed).abs() < 1e-4);
        ball.move_ball(&mut physics, None, 1.0);
        ball.move_ball(&mut physics, None, 1.0);
        assert!(!ball.is_winding());
        assert!((physics.velocity.length() - tuning.burst_speed).abs() < 1e-3);
        // Heading survives the wind-up
        assert!((physics.velocity.normalize() - Vec2::new(0.6, 0.8)).length() < 1e-4);

        ball.on_paddle_hit(Side::Left);
        assert!(ball.is_winding());
    }

    #[test]
    fn test_curve_flips_on_paddle_hit() {
        let tuning = Tuning::default();
        let mut ball = Ball::new(BallKind::Curve, &tuning);
        let mut physics = body(Vec2::new(400.0, 300.0), Vec2::new(6.0, 0.0));

        ball.move_ball(&mut physics, None, 1.0);
        assert!(physics.velocity.y > 0.0);
        assert!((physics.velocity.length() - 6.0).abs() < 1e-4);

        ball.on_paddle_hit(Side::Right);
        assert!(ball.curve_rate < 0.0);
    }

    #[test]
    fn test_spin_writes_render_rotation() {
        let tuning = Tuning::default();
        let mut ball = Ball::new(BallKind::Spin, &tuning);
        let mut physics = body(Vec2::new(400.0, 300.0), Vec2::new(-6.0, 0.0));
        let mut render = RenderHandle::new(1, Ball::create_graphic(BallKind::Spin));

        for _ in 0..10 {
            ball.move_ball(&mut physics, Some(&mut render), 1.0);
        }
        assert!(ball.spin.rotation < 0.0);
        assert_eq!(render.rotation, ball.spin.rotation);
    }

    #[test]
    fn test_launch_spread() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let p = Ball::init_physics(BallKind::Spin, &mut rng, &tuning, Vec2::ZERO);
            let angle = (p.velocity.y / p.velocity.length()).asin().abs();
            assert!(angle <= std::f32::consts::FRAC_PI_3 + 1e-4);
            let p = Ball::init_physics(BallKind::Standard, &mut rng, &tuning, Vec2::ZERO);
            let angle = (p.velocity.y / p.velocity.length()).asin().abs();
            assert!(angle <= std::f32::consts::FRAC_PI_4 + 1e-4);
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let tuning = Tuning::default();
        let mut ball = Ball::new(BallKind::Standard, &tuning);
        for i in 0..20 {
            ball.record_velocity(Vec2::new(i as f32, 0.0));
        }
        assert_eq!(ball.history.len(), tuning.oscillation_history);
        assert_eq!(ball.history_slice().last(), Some(&Vec2::new(19.0, 0.0)));
    }

    proptest! {
        #[test]
        fn prop_spin_bounce_bounded(
            frames in proptest::collection::vec(1u32..40, 1..30),
            vx in 1.0f32..8.0,
            vy in -8.0f32..8.0,
        ) {
            let tuning = Tuning::default();
            let mut ball = Ball::new(BallKind::Spin, &tuning);
            let mut physics = body(Vec2::new(400.0, 300.0), Vec2::new(vx, vy));
            let mut prev_max = ball.spin.max_angular_velocity;

            for n in frames {
                for _ in 0..n {
                    ball.move_ball(&mut physics, None, 1.0);
                }
                let before = physics.velocity;
                ball.apply_spin_to_bounce(&mut physics);

                prop_assert!(ball.spin.max_angular_velocity >= prev_max);
                prop_assert!(ball.spin.max_angular_velocity <= SPIN_ANGULAR_VELOCITY_CAP);
                prop_assert!(ball.spin.angular_velocity <= SPIN_ANGULAR_VELOCITY_CAP);
                prop_assert!(angle_between(before, physics.velocity) <= SPIN_MAX_DEFLECTION + 1e-4);
                prev_max = ball.spin.max_angular_velocity;
            }
        }
    }
}
