//! Authoritative state exchanged with a remote peer
//!
//! The core does no netcode of its own. It can describe itself as a
//! [`ServerGameState`] and pull its predicted state toward one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Side;
use crate::error::SimError;
use crate::sim::component::Physics;
use crate::sim::entity::{EntityId, EntityKind};
use crate::sim::powerup::{Powerup, PowerupKind};
use crate::sim::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPowerup {
    pub id: u32,
    /// Wire name, e.g. `enlargePowerup`
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Point,
    pub active: bool,
}

/// Snapshot of a match as the server sees it
///
/// `paddle1` is the left paddle and `paddle2` the right one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerGameState {
    pub ball: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_velocity: Option<Point>,
    pub paddle1: Point,
    pub paddle2: Point,
    pub score1: u32,
    pub score2: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerups: Option<Vec<SnapshotPowerup>>,
    pub timestamp: f64,
}

impl ServerGameState {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(SimError::Snapshot)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string(self).map_err(SimError::Snapshot)
    }
}

impl GameState {
    /// The live ball a snapshot describes
    fn primary_ball(&self) -> Option<EntityId> {
        self.entities
            .balls()
            .filter(|(_, b)| b.is_good_ball)
            .map(|(e, _)| e.id)
            .min()
    }

    pub fn snapshot(&self, timestamp: f64) -> ServerGameState {
        let paddle_pos = |side: Side| {
            self.entities
                .paddle(side)
                .and_then(|e| e.physics())
                .map(|p| Point::from(p.position))
                .unwrap_or_default()
        };
        let ball = self
            .primary_ball()
            .and_then(|id| self.entities.get(id))
            .and_then(|e| e.physics());

        let powerups: Vec<SnapshotPowerup> = self
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Pickup))
            .filter_map(|e| {
                let powerup = e.components.get::<Powerup>()?;
                let body = e.physics()?;
                Some(SnapshotPowerup {
                    id: e.id.0,
                    kind: powerup.kind.wire_name().to_string(),
                    position: body.position.into(),
                    active: !powerup.consumed,
                })
            })
            .collect();

        ServerGameState {
            ball: ball
                .map(|b| b.position.into())
                .unwrap_or_else(|| self.tuning.arena_center().into()),
            ball_velocity: ball.map(|b| b.velocity.into()),
            paddle1: paddle_pos(Side::Left),
            paddle2: paddle_pos(Side::Right),
            score1: self.score.left,
            score2: self.score.right,
            powerups: (!powerups.is_empty()).then_some(powerups),
            timestamp,
        }
    }

    /// Pull predicted state toward an authoritative snapshot
    ///
    /// `blend` of 1 snaps to the snapshot, 0 keeps the local prediction.
    /// Scores are always adopted. Pickups the server reports as inactive are
    /// removed; unknown pickups are spawned.
    pub fn reconcile(&mut self, snapshot: &ServerGameState, blend: f32) {
        let blend = blend.clamp(0.0, 1.0);
        let pull = |body: &mut Physics, target: Point| {
            body.position = body.position.lerp(target.into(), blend);
        };

        if let Some(body) = self
            .primary_ball()
            .and_then(|id| self.entities.get_mut(id))
            .and_then(|e| e.physics_mut())
        {
            pull(body, snapshot.ball);
            if let Some(velocity) = snapshot.ball_velocity {
                body.velocity = velocity.into();
            }
        }

        for (side, target) in [(Side::Left, snapshot.paddle1), (Side::Right, snapshot.paddle2)] {
            if let Some(body) = self.entities.paddle_mut(side).and_then(|e| e.physics_mut()) {
                pull(body, target);
            }
        }

        if self.score.left != snapshot.score1 || self.score.right != snapshot.score2 {
            log::debug!(
                "Adopting server score {} - {} (was {} - {})",
                snapshot.score1,
                snapshot.score2,
                self.score.left,
                self.score.right
            );
        }
        self.score.left = snapshot.score1;
        self.score.right = snapshot.score2;

        for remote in snapshot.powerups.iter().flatten() {
            let local = self.local_pickup(remote.id);
            match (local, remote.active) {
                (Some(id), false) => {
                    self.entities.remove(id, &mut self.outbox);
                    self.remote_pickups.remove(&remote.id);
                }
                (Some(id), true) => {
                    if let Some(body) = self.entities.get_mut(id).and_then(|e| e.physics_mut()) {
                        body.position = remote.position.into();
                    }
                }
                (None, true) => match PowerupKind::from_wire_name(&remote.kind) {
                    Some(kind) => {
                        let id = self.spawn_pickup(kind, remote.position.into());
                        self.remote_pickups.insert(remote.id, id);
                    }
                    None => log::debug!("Ignoring unknown pickup type {}", remote.kind),
                },
                (None, false) => {
                    self.remote_pickups.remove(&remote.id);
                }
            }
        }
    }

    /// Local pickup standing in for a remote pickup id
    ///
    /// Pickups spawned by an earlier reconcile are found through the id map;
    /// otherwise the remote id is taken as a local one when it names a pickup
    /// that no other remote id already owns.
    fn local_pickup(&mut self, remote_id: u32) -> Option<EntityId> {
        let is_pickup = |state: &GameState, id: EntityId| {
            state
                .entities
                .get(id)
                .is_some_and(|e| matches!(e.kind, EntityKind::Pickup))
        };

        if let Some(&id) = self.remote_pickups.get(&remote_id) {
            if is_pickup(&*self, id) {
                return Some(id);
            }
            // Expired or collected locally since the last snapshot
            self.remote_pickups.remove(&remote_id);
        }

        let id = EntityId(remote_id);
        let owned = self.remote_pickups.values().any(|&v| v == id);
        (is_pickup(&*self, id) && !owned).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::ball::BallKind;
    use crate::sim::paddle::Controller;
    use crate::sim::state::ContextKind;

    const DOCUMENT: &str = r#"{
        "ball": { "x": 410.0, "y": 290.0 },
        "ballVelocity": { "x": -5.0, "y": 2.0 },
        "paddle1": { "x": 30.0, "y": 250.0 },
        "paddle2": { "x": 770.0, "y": 350.0 },
        "score1": 2,
        "score2": 4,
        "powerups": [
            { "id": 90, "type": "shieldPowerup", "position": { "x": 400.0, "y": 100.0 }, "active": true }
        ],
        "timestamp": 1718000000123
    }"#;

    fn arena() -> GameState {
        let mut state = GameState::empty(5, Tuning::default(), ContextKind::Match);
        state.spawn_paddle(Side::Left, Controller::Local);
        state.spawn_paddle(Side::Right, Controller::Remote);
        state
    }

    #[test]
    fn test_parses_known_document() {
        let snapshot = ServerGameState::from_json(DOCUMENT).unwrap();
        assert_eq!(snapshot.ball, Point { x: 410.0, y: 290.0 });
        assert_eq!(snapshot.ball_velocity, Some(Point { x: -5.0, y: 2.0 }));
        assert_eq!(snapshot.score2, 4);
        let powerups = snapshot.powerups.as_deref().unwrap();
        assert_eq!(powerups[0].kind, "shieldPowerup");

        let again = ServerGameState::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(again, snapshot);
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let json = r#"{"ball":{"x":1,"y":2},"paddle1":{"x":0,"y":0},"paddle2":{"x":0,"y":0},
            "score1":0,"score2":0,"timestamp":0}"#;
        let snapshot = ServerGameState::from_json(json).unwrap();
        assert!(snapshot.ball_velocity.is_none());
        assert!(snapshot.powerups.is_none());
        assert!(!snapshot.to_json().unwrap().contains("ballVelocity"));
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let err = ServerGameState::from_json(r#"{"ball": 3}"#).unwrap_err();
        assert!(matches!(err, SimError::Snapshot(_)));
    }

    #[test]
    fn test_snapshot_describes_state() {
        let mut state = arena();
        state.spawn_ball(BallKind::Standard, Vec2::new(100.0, 200.0), Some(Vec2::new(6.0, 1.0)), None);
        state.score.right = 3;
        let snapshot = state.snapshot(42.0);

        assert_eq!(snapshot.ball, Point { x: 100.0, y: 200.0 });
        assert_eq!(snapshot.ball_velocity, Some(Point { x: 6.0, y: 1.0 }));
        assert_eq!(snapshot.paddle1, Point { x: 30.0, y: 300.0 });
        assert_eq!(snapshot.score2, 3);
        assert!(snapshot.powerups.is_none());
    }

    #[test]
    fn test_reconcile_blends_and_adopts() {
        let mut state = arena();
        let ball = state.spawn_ball(BallKind::Standard, Vec2::new(400.0, 300.0), Some(Vec2::X), None);
        let snapshot = ServerGameState::from_json(DOCUMENT).unwrap();
        state.reconcile(&snapshot, 0.5);

        let body = state.entities.get(ball).unwrap().physics().unwrap();
        assert_eq!(body.position, Vec2::new(405.0, 295.0));
        assert_eq!(body.velocity, Vec2::new(-5.0, 2.0));
        let right = state.entities.paddle(Side::Right).unwrap().physics().unwrap();
        assert_eq!(right.position.y, 325.0);
        assert_eq!((state.score.left, state.score.right), (2, 4));

        let pickups = state
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Pickup))
            .count();
        assert_eq!(pickups, 1);
    }

    #[test]
    fn test_repeated_snapshot_spawns_pickup_once() {
        let mut state = arena();
        let mut snapshot = ServerGameState::from_json(DOCUMENT).unwrap();
        let pickups = |state: &GameState| {
            state
                .entities
                .iter()
                .filter(|e| matches!(e.kind, EntityKind::Pickup))
                .count()
        };

        state.reconcile(&snapshot, 1.0);
        state.reconcile(&snapshot, 1.0);
        assert_eq!(pickups(&state), 1);
        let local = state.remote_pickups[&90];
        assert_ne!(local, EntityId(90));

        if let Some(p) = snapshot.powerups.as_mut().and_then(|p| p.first_mut()) {
            p.active = false;
        }
        state.reconcile(&snapshot, 1.0);
        assert_eq!(pickups(&state), 0);
        assert!(!state.entities.contains(local));
        assert!(state.remote_pickups.is_empty());
    }

    #[test]
    fn test_inactive_pickup_is_removed() {
        let mut state = arena();
        let pickup = state.spawn_pickup(PowerupKind::Enlarge, Vec2::new(400.0, 100.0));
        let mut snapshot = state.snapshot(0.0);
        if let Some(p) = snapshot.powerups.as_mut().and_then(|p| p.first_mut()) {
            p.active = false;
        }
        state.reconcile(&snapshot, 1.0);
        assert!(!state.entities.contains(pickup));
        assert_eq!(state.outbox.detached_graphics.len(), 1);
    }
}
