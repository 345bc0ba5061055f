//! Game state and entity spawners
//!
//! Everything a system may read or mutate during a tick lives here and is
//! passed explicitly; there is no global match context.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallKind};
use super::component::{
    Animation, Behaviour, Despawn, GraphicDesc, Input, Lifetime, Physics, RenderHandle, Shape, Vfx,
    VfxKind,
};
use super::entity::{Entities, Entity, EntityId, EntityKind, Layer};
use super::events::{EventKind, EventQueue, GameEvent};
use super::outbox::Outbox;
use super::paddle::{Controller, Paddle};
use super::powerup::{Powerup, PowerupKind};
use super::tasks::{TaskAction, TaskQueue};
use crate::Side;
use crate::tuning::Tuning;

/// Frames a pickup stays on the field before fading out
const PICKUP_LIFETIME: f32 = 900.0;

/// Which screen owns the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextKind {
    /// A scored match
    Match,
    /// Attract-mode play behind the menu
    Menu,
}

impl ContextKind {
    pub fn parse(name: &str) -> Option<ContextKind> {
        match name {
            "match" | "game" => Some(ContextKind::Match),
            "menu" => Some(ContextKind::Menu),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::Match => "match",
            ContextKind::Menu => "menu",
        }
    }
}

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the next ball to be served
    Serve,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Add a point, returning the new total
    pub fn add(&mut self, side: Side) -> u32 {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *slot += 1;
        *slot
    }
}

/// Complete state of one match
#[derive(Debug, Clone)]
pub struct GameState {
    pub context: ContextKind,
    pub tuning: Tuning,
    /// Seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub entities: Entities,
    pub events: EventQueue,
    pub tasks: TaskQueue,
    pub outbox: Outbox,
    pub score: Score,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub frame: u64,
    /// Local pickup spawned for each remote pickup id seen in a snapshot
    pub remote_pickups: BTreeMap<u32, EntityId>,
    next_entity_id: u32,
    next_graphic_id: u64,
}

impl GameState {
    /// Empty arena with no entities
    pub fn empty(seed: u64, tuning: Tuning, context: ContextKind) -> Self {
        Self {
            context,
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            entities: Entities::new(),
            events: EventQueue::new(),
            tasks: TaskQueue::new(),
            outbox: Outbox::default(),
            score: Score::default(),
            phase: GamePhase::Serve,
            frame: 0,
            remote_pickups: BTreeMap::new(),
            next_entity_id: 1,
            next_graphic_id: 1,
        }
    }

    /// A match with both paddles placed and the first serve scheduled
    pub fn new(seed: u64, tuning: Tuning, left: Controller, right: Controller) -> Self {
        let mut state = Self::empty(seed, tuning, ContextKind::Match);
        state.spawn_paddle(Side::Left, left);
        state.spawn_paddle(Side::Right, right);

        let toward = if state.rng.random_bool(0.5) { Side::Left } else { Side::Right };
        let delay = state.tuning.serve_delay;
        state.tasks.schedule(delay, TaskAction::Serve { toward });
        let interval = state.tuning.pickup_interval;
        state
            .tasks
            .schedule_repeating(interval, interval, None, TaskAction::SpawnPickup);
        log::info!("New match (seed {}), first serve toward {}", seed, toward.as_str());
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    fn next_render(&mut self, graphic: GraphicDesc, position: Vec2) -> RenderHandle {
        let id = self.next_graphic_id;
        self.next_graphic_id += 1;
        let mut handle = RenderHandle::new(id, graphic);
        handle.position = position;
        handle
    }

    pub fn spawn_paddle(&mut self, side: Side, controller: Controller) -> EntityId {
        let id = self.next_entity_id();
        let position = Vec2::new(self.tuning.paddle_x(side), self.tuning.arena_height / 2.0);
        let size = Vec2::new(self.tuning.paddle_width, self.tuning.paddle_height);
        let graphic = GraphicDesc {
            texture: "paddle",
            tint: 0xffffff,
        };
        let render = self.next_render(graphic, position);

        let mut physics = Physics::new(position, size);
        physics.speed = Some(self.tuning.paddle_speed);
        let paddle = Paddle::new(side, controller, size.y);
        let entity = Entity::new(id, Layer::Field, EntityKind::Paddle(paddle))
            .with(physics)
            .with(Input::default())
            .with(render);
        self.entities.insert(entity)
    }

    /// Put a ball in play
    ///
    /// Without an explicit velocity the variant's launch rules pick one.
    pub fn spawn_ball(
        &mut self,
        kind: BallKind,
        position: Vec2,
        velocity: Option<Vec2>,
        last_hit: Option<Side>,
    ) -> EntityId {
        let ball = Ball::new(kind, &self.tuning);
        self.spawn_ball_entity(ball, position, velocity, last_hit)
    }

    /// Decoy ball that never scores
    pub fn spawn_fake_ball(
        &mut self,
        kind: BallKind,
        position: Vec2,
        velocity: Vec2,
        last_hit: Option<Side>,
    ) -> EntityId {
        let ball = Ball::fake(kind, &self.tuning);
        self.spawn_ball_entity(ball, position, Some(velocity), last_hit)
    }

    fn spawn_ball_entity(
        &mut self,
        mut ball: Ball,
        position: Vec2,
        velocity: Option<Vec2>,
        last_hit: Option<Side>,
    ) -> EntityId {
        let id = self.next_entity_id();
        let mut physics = Ball::init_physics(ball.kind, &mut self.rng, &self.tuning, position);
        if let Some(velocity) = velocity {
            physics.velocity = velocity;
        }
        ball.last_hit = last_hit;
        ball.magnetic_influence = last_hit.map(Side::opponent);
        let render = self.next_render(Ball::create_graphic(ball.kind), position);

        let entity = Entity::new(id, Layer::Field, EntityKind::Ball(ball))
            .with(physics)
            .with(render);
        log::trace!("Spawned ball {} at {:?}", id, position);
        self.entities.insert(entity)
    }

    pub fn spawn_pickup(&mut self, kind: PowerupKind, position: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let size = Vec2::splat(self.tuning.pickup_size);
        let physics = Physics::new(position, size)
            .with_behaviour(Behaviour::Trigger)
            .fixed();
        let graphic = GraphicDesc {
            texture: kind.wire_name(),
            tint: 0xffffff,
        };
        let render = self.next_render(graphic, position);

        let entity = Entity::new(id, Layer::Field, EntityKind::Pickup)
            .with(physics)
            .with(Powerup::new(kind, self.context))
            .with(Animation::new(4, 8.0, true))
            .with(Lifetime::new(PICKUP_LIFETIME, Despawn::Time))
            .with(render);
        log::debug!("Spawned {} pickup at {:?}", kind.wire_name(), position);
        self.entities.insert(entity)
    }

    /// Drop a random pickup somewhere in the middle third of the arena
    pub fn spawn_random_pickup(&mut self) -> EntityId {
        let kind = PowerupKind::ALL[self.rng.random_range(0..PowerupKind::ALL.len())];
        let third = self.tuning.arena_width / 3.0;
        let margin = self.tuning.pickup_size;
        let center = self.tuning.arena_center();
        // Hand-built tunings skip validation; collapse empty ranges to the centre
        let x = if third > 0.0 {
            self.rng.random_range(third..2.0 * third)
        } else {
            center.x
        };
        let y = if self.tuning.arena_height - margin > margin {
            self.rng.random_range(margin..self.tuning.arena_height - margin)
        } else {
            center.y
        };
        self.spawn_pickup(kind, Vec2::new(x, y))
    }

    /// Fire from the front face of the paddle on `side`
    pub fn spawn_projectile(&mut self, owner: Side) -> Option<EntityId> {
        let origin = {
            let body = self.entities.paddle(owner)?.physics()?;
            body.position + Vec2::new(owner.outward() * body.size.x, 0.0)
        };
        let id = self.next_entity_id();
        let velocity = Vec2::new(owner.outward() * self.tuning.projectile_speed, 0.0);
        let physics = Physics::new(origin, Vec2::splat(self.tuning.projectile_size))
            .with_velocity(velocity)
            .with_behaviour(Behaviour::Trigger);
        let graphic = GraphicDesc {
            texture: "projectile",
            tint: 0xff3366,
        };
        let render = self.next_render(graphic, origin);

        let entity = Entity::new(id, Layer::Field, EntityKind::Projectile { owner })
            .with(physics)
            .with(Lifetime::new(f32::INFINITY, Despawn::Position))
            .with(render);
        Some(self.entities.insert(entity))
    }

    pub fn spawn_particle(
        &mut self,
        kind: VfxKind,
        origin: Vec2,
        velocity: Vec2,
        lifetime: f32,
        tint: u32,
    ) -> EntityId {
        let id = self.next_entity_id();
        let physics = Physics::new(origin, Vec2::splat(4.0))
            .with_velocity(velocity)
            .with_behaviour(Behaviour::Trigger);
        let render = self.next_render(GraphicDesc { texture: "spark", tint }, origin);

        let entity = Entity::new(id, Layer::Overlay, EntityKind::Particle)
            .with(physics)
            .with(Lifetime::new(lifetime, Despawn::Time))
            .with(Vfx::new(kind))
            .with(render);
        self.entities.insert(entity)
    }

    /// Static polygon; `vertices` are relative to `position`
    pub fn spawn_obstacle(&mut self, position: Vec2, vertices: Vec<Vec2>) -> EntityId {
        let id = self.next_entity_id();
        let (min, max) = vertices.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), v| (lo.min(*v), hi.max(*v)),
        );
        let size = if vertices.is_empty() { Vec2::ZERO } else { max - min };
        let physics = Physics::new(position, size)
            .with_behaviour(Behaviour::Bounce)
            .with_shape(Shape::Polygon(vertices))
            .fixed();
        let graphic = GraphicDesc {
            texture: "obstacle",
            tint: 0x888888,
        };
        let render = self.next_render(graphic, position);

        let entity = Entity::new(id, Layer::Background, EntityKind::Obstacle)
            .with(physics)
            .with(render);
        self.entities.insert(entity)
    }

    /// Serve a fresh standard ball from the centre toward `toward`
    pub fn serve(&mut self, toward: Side) -> EntityId {
        let center = self.tuning.arena_center();
        let id = self.spawn_ball(BallKind::Standard, center, None, None);
        if let Some(physics) = self.entities.get_mut(id).and_then(Entity::physics_mut) {
            // Face the receiving paddle
            let dir = -toward.outward();
            physics.velocity.x = physics.velocity.x.abs() * dir;
        }
        if self.phase == GamePhase::Serve {
            self.phase = GamePhase::Playing;
        }
        self.events
            .push(GameEvent::new(EventKind::Serve).with_side(toward).with_target(id));
        log::debug!("Served ball {} toward {}", id, toward.as_str());
        id
    }

    /// Copies of both paddles with their bodies, for per-ball queries
    pub fn paddle_bodies(&self) -> Vec<(Paddle, Physics)> {
        self.entities
            .iter()
            .filter_map(|e| Some((e.paddle()?.clone(), e.physics()?.clone())))
            .collect()
    }

    pub fn good_ball_count(&self) -> usize {
        self.entities.balls().filter(|(_, b)| b.is_good_ball).count()
    }

    /// Whether presentation requests (timer bars) should be emitted
    pub fn shows_timer_bars(&self) -> bool {
        self.context == ContextKind::Match
    }
}
