//! Component set
//!
//! Components are plain data. The closed [`ComponentKind`] enumeration is the
//! key the entity store indexes on; [`ComponentData`] gives typed access.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::powerup::Powerup;

/// Every kind of component an entity can own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Physics,
    Render,
    Input,
    Lifetime,
    Powerup,
    Animation,
    Vfx,
}

impl ComponentKind {
    pub const COUNT: usize = 7;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Physics => "physics",
            ComponentKind::Render => "render",
            ComponentKind::Input => "input",
            ComponentKind::Lifetime => "lifetime",
            ComponentKind::Powerup => "powerup",
            ComponentKind::Animation => "animation",
            ComponentKind::Vfx => "vfx",
        }
    }
}

/// How a physics body reacts to contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Behaviour {
    /// Stops whatever hits it
    #[default]
    Block,
    /// Reflects whatever hits it
    Bounce,
    /// Reports overlap without any response
    Trigger,
}

/// Collision shape metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Rect,
    Circle,
    /// Vertices relative to the body position
    Polygon(Vec<Vec2>),
}

/// Kinematic body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Centre position
    pub position: Vec2,
    /// Units per frame
    pub velocity: Vec2,
    /// Full width and height
    pub size: Vec2,
    pub is_static: bool,
    pub behaviour: Behaviour,
    pub restitution: f32,
    pub mass: f32,
    /// Nominal speed, if the body has one
    pub speed: Option<f32>,
    pub shape: Shape,
}

impl Physics {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
            is_static: false,
            behaviour: Behaviour::Block,
            restitution: 1.0,
            mass: 1.0,
            speed: None,
            shape: Shape::Rect,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Radius of the inscribed circle (balls are square bodies)
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size.x.min(self.size.y) / 2.0
    }
}

/// Describes which drawable the renderer should create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicDesc {
    pub texture: &'static str,
    pub tint: u32,
}

/// Opaque drawable handle owned by the rendering collaborator
///
/// The core only writes the transform fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderHandle {
    pub id: u64,
    pub graphic: GraphicDesc,
    pub position: Vec2,
    pub rotation: f32,
    pub alpha: f32,
    pub scale: Vec2,
}

impl RenderHandle {
    pub fn new(id: u64, graphic: GraphicDesc) -> Self {
        Self {
            id,
            graphic,
            position: Vec2::ZERO,
            rotation: 0.0,
            alpha: 1.0,
            scale: Vec2::ONE,
        }
    }
}

/// Directional input for a paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Input {
    pub up_pressed: bool,
    pub down_pressed: bool,
}

impl Input {
    /// -1 for up, 1 for down, 0 for neither or both
    #[inline]
    pub fn axis(&self) -> f32 {
        match (self.up_pressed, self.down_pressed) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Rule governing when a lifetime-limited entity goes away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Despawn {
    /// Removed when the remaining time runs out
    Time,
    /// Removed when the entity leaves the arena
    Position,
    /// Never removed by the lifetime system
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub initial: f32,
    pub remaining: f32,
    /// Informational only
    pub duration: f32,
    pub despawn: Despawn,
}

impl Lifetime {
    pub fn new(duration: f32, despawn: Despawn) -> Self {
        Self {
            initial: duration,
            remaining: duration,
            duration,
            despawn,
        }
    }

    /// Count down; returns true once time has run out
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }

    /// Remaining fraction in [0, 1]
    pub fn fraction(&self) -> f32 {
        if self.initial <= 0.0 {
            0.0
        } else {
            (self.remaining / self.initial).clamp(0.0, 1.0)
        }
    }
}

/// Sprite-sheet style frame animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub frame: u32,
    pub frame_count: u32,
    /// Frames of simulation per animation frame
    pub frame_time: f32,
    pub elapsed: f32,
    pub looping: bool,
}

impl Animation {
    pub fn new(frame_count: u32, frame_time: f32, looping: bool) -> Self {
        Self {
            frame: 0,
            frame_count: frame_count.max(1),
            frame_time: frame_time.max(f32::EPSILON),
            elapsed: 0.0,
            looping,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        while self.elapsed >= self.frame_time {
            self.elapsed -= self.frame_time;
            if self.frame + 1 < self.frame_count {
                self.frame += 1;
            } else if self.looping {
                self.frame = 0;
            }
        }
    }

    pub fn finished(&self) -> bool {
        !self.looping && self.frame + 1 >= self.frame_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VfxKind {
    Spark,
    Firework,
    ShieldGlow,
}

/// Purely visual state, never read by gameplay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vfx {
    pub kind: VfxKind,
    pub alpha: f32,
    pub scale: f32,
    /// Per-frame velocity damping
    pub drag: f32,
    /// Per-frame scale change
    pub growth: f32,
}

impl Vfx {
    pub fn new(kind: VfxKind) -> Self {
        Self {
            kind,
            alpha: 1.0,
            scale: 1.0,
            drag: 0.96,
            growth: -0.01,
        }
    }
}

/// Any component instance
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Physics(Physics),
    Render(RenderHandle),
    Input(Input),
    Lifetime(Lifetime),
    Powerup(Powerup),
    Animation(Animation),
    Vfx(Vfx),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Physics(_) => ComponentKind::Physics,
            Component::Render(_) => ComponentKind::Render,
            Component::Input(_) => ComponentKind::Input,
            Component::Lifetime(_) => ComponentKind::Lifetime,
            Component::Powerup(_) => ComponentKind::Powerup,
            Component::Animation(_) => ComponentKind::Animation,
            Component::Vfx(_) => ComponentKind::Vfx,
        }
    }
}

/// Typed view of a [`Component`] variant
pub trait ComponentData: Sized {
    const KIND: ComponentKind;
    fn from_component(component: &Component) -> Option<&Self>;
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
    fn into_component(self) -> Component;
}

macro_rules! component_data {
    ($ty:ty, $variant:ident) => {
        impl ComponentData for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_component(self) -> Component {
                Component::$variant(self)
            }
        }

        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$variant(value)
            }
        }
    };
}

component_data!(Physics, Physics);
component_data!(RenderHandle, Render);
component_data!(Input, Input);
component_data!(Lifetime, Lifetime);
component_data!(Powerup, Powerup);
component_data!(Animation, Animation);
component_data!(Vfx, Vfx);
