//! Powerup acquisition and paddle affectation timers
//!
//! Handles `...Powerup`/`...Powerdown` pickups, `SizeReset` and
//! `ProjectileHit`. Timers are counted down before claimed events are
//! applied, so an affectation acquired this tick keeps its full duration.

use crate::Side;
use crate::sim::entity::Entity;
use crate::sim::events::{EventKind, GameEvent};
use crate::sim::outbox::{LayerRemoval, TimerBar};
use crate::sim::paddle::Affectation;
use crate::sim::powerup::{self, PickupCategory, PowerupKind};
use crate::sim::state::GameState;
use crate::sim::system::{FrameDelta, System};
use crate::sim::tasks::TaskAction;

use super::{PickupTouch, resolve_pickup};

pub struct AffectationSystem;

impl AffectationSystem {
    fn claims(event: &GameEvent) -> bool {
        match &event.kind {
            EventKind::Pickup(kind) => kind.category() != PickupCategory::BallChange,
            EventKind::SizeReset | EventKind::ProjectileHit => true,
            _ => false,
        }
    }
}

impl System for AffectationSystem {
    fn name(&self) -> &'static str {
        "affectation"
    }

    fn update(&mut self, state: &mut GameState, delta: &FrameDelta) {
        // Claim first so resets queued by this tick's expiries wait a tick
        let claimed = state.events.claim(Self::claims);
        tick_timers(state, delta.delta_time);

        for event in claimed {
            match event.kind {
                EventKind::Pickup(_) => {
                    if let Some(touch) = resolve_pickup(state, &event) {
                        acquire(state, touch);
                    }
                }
                EventKind::SizeReset => {
                    if let Some(side) = event.side {
                        reset_size(state, side);
                    }
                }
                EventKind::ProjectileHit => {
                    if let Some(side) = event.side {
                        stun(state, side);
                    }
                }
                _ => {}
            }
        }
    }
}

fn tick_timers(state: &mut GameState, dt: f32) {
    for side in [Side::Left, Side::Right] {
        let Some(paddle) = state.entities.paddle_mut(side).and_then(Entity::paddle_mut) else {
            continue;
        };
        let mut expired = paddle.tick_affectations(dt);
        if paddle.tick_shield(dt) {
            expired.push(Affectation::Shielded);
        }

        for affectation in expired {
            log::debug!("{} paddle no longer {}", side.as_str(), affectation.as_str());
            state.outbox.layer_removals.push(LayerRemoval { side, affectation });
            state
                .events
                .push(GameEvent::new(EventKind::Expired(affectation)).with_side(side));
            if affectation.is_size() {
                state
                    .events
                    .push(GameEvent::new(EventKind::SizeReset).with_side(side));
            }
        }
    }
}

fn acquire(state: &mut GameState, touch: PickupTouch) {
    let PickupTouch {
        side,
        pickup,
        powerup,
        ..
    } = touch;
    state.entities.remove(pickup, &mut state.outbox);

    if powerup.kind == PowerupKind::Shoot {
        let interval = state.tuning.shot_interval;
        state.tasks.schedule_repeating(
            interval,
            interval,
            Some(state.tuning.shot_count),
            TaskAction::FireProjectile { side },
        );
        log::debug!("{} paddle armed with {} shots", side.as_str(), state.tuning.shot_count);
        return;
    }

    let Some(affectation) = powerup.kind.affectation() else {
        return;
    };
    let Some(paddle) = state.entities.paddle_mut(side).and_then(Entity::paddle_mut) else {
        log::debug!("No {} paddle for {}", side.as_str(), powerup.kind.wire_name());
        return;
    };

    let duration = if affectation == Affectation::Shielded {
        state.tuning.shield_duration
    } else {
        state.tuning.affectation_duration
    };

    if paddle.is_affected(affectation) {
        log::debug!("{} paddle already {}, timer refreshed", side.as_str(), affectation.as_str());
    } else {
        powerup.apply(paddle, &state.tuning, &mut state.events);
        log::debug!("{} paddle is now {}", side.as_str(), affectation.as_str());
    }
    if affectation == Affectation::Shielded {
        paddle.shield_timer = duration;
    } else {
        paddle.affected_timer = duration;
    }

    if state.shows_timer_bars() {
        state.outbox.timer_bars.push(TimerBar {
            side,
            label: powerup.kind.wire_name(),
            duration,
        });
    }
}

fn reset_size(state: &mut GameState, side: Side) {
    let Some(paddle) = state.entities.paddle_mut(side).and_then(Entity::paddle_mut) else {
        return;
    };
    // A new size change may have landed since the reset was queued
    if !paddle.is_enlarged && !paddle.is_shrinked {
        paddle.reset_size();
    }
}

/// Stun shares the timed-affectation timer: it only lengthens it, so a stun
/// landing on a paddle with a longer affectation running lasts as long as
/// that affectation, and both clear together on expiry.
fn stun(state: &mut GameState, side: Side) {
    let stun_duration = state.tuning.stun_duration;
    let Some(paddle) = state.entities.paddle_mut(side).and_then(Entity::paddle_mut) else {
        return;
    };
    if !paddle.is_stunned {
        powerup::stun(paddle, &mut state.events);
    }
    paddle.affected_timer = paddle.affected_timer.max(stun_duration);
    log::debug!("{} paddle stunned for {} frames", side.as_str(), paddle.affected_timer);
}
