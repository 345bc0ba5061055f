//! Collision detection for rectangles, circles and polygons
//!
//! Boxes are centre-based: a body at `position` with `size` spans
//! `position ± size / 2`. Displacements are per frame.

use glam::Vec2;

use super::component::Physics;
use crate::consts::{CONTACT_ITERATIONS, CONTACT_PRECISION};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, max: min + size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Bounding box of a physics body
#[inline]
pub fn bounding_box(physics: &Physics) -> Aabb {
    Aabb::from_center(physics.position, physics.size)
}

/// Coarse overlap test used for triggers and pickups
#[inline]
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Result of a swept box test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptHit {
    pub hit: bool,
    /// Fraction of the frame displacement at first contact, in (0, 1]
    pub time: f32,
    /// Surface normal of the target at the contact face
    pub normal: Vec2,
}

impl SweptHit {
    pub fn miss() -> Self {
        Self {
            hit: false,
            time: 1.0,
            normal: Vec2::ZERO,
        }
    }
}

/// Entry and exit times along one axis
///
/// A zero relative velocity places no time constraint on the axis, but the
/// boxes must already overlap on it or they can never touch.
fn axis_times(a_min: f32, a_max: f32, b_min: f32, b_max: f32, v: f32) -> Option<(f32, f32)> {
    if v == 0.0 {
        if a_max <= b_min || a_min >= b_max {
            None
        } else {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        }
    } else if v > 0.0 {
        Some(((b_min - a_max) / v, (b_max - a_min) / v))
    } else {
        Some(((b_max - a_min) / v, (b_min - a_max) / v))
    }
}

/// Earliest reported time of impact; contacts that begin before the frame
/// are reported just after its start
pub const MIN_IMPACT_TIME: f32 = 1e-4;

/// Time of impact between a moving box and a (possibly moving) target
///
/// Works on the relative displacement. The later per-axis entry picks both
/// the time and the normal. A collision is rejected when the entry/exit
/// intervals do not overlap, when it is already over (negative exit), or when
/// it only starts after this frame's step. Boxes that already overlap at the
/// start report a hit at [`MIN_IMPACT_TIME`].
pub fn swept_aabb(
    moving: &Aabb,
    displacement: Vec2,
    target: &Aabb,
    target_displacement: Vec2,
) -> SweptHit {
    let rel = displacement - target_displacement;

    let Some((x_entry, x_exit)) =
        axis_times(moving.min.x, moving.max.x, target.min.x, target.max.x, rel.x)
    else {
        return SweptHit::miss();
    };
    let Some((y_entry, y_exit)) =
        axis_times(moving.min.y, moving.max.y, target.min.y, target.max.y, rel.y)
    else {
        return SweptHit::miss();
    };

    let entry = x_entry.max(y_entry);
    let exit = x_exit.min(y_exit);

    if entry > exit || exit < 0.0 || entry > 1.0 {
        return SweptHit::miss();
    }

    let normal = if x_entry > y_entry {
        Vec2::new(-rel.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -rel.y.signum())
    };

    SweptHit {
        hit: true,
        time: entry.clamp(MIN_IMPACT_TIME, 1.0),
        normal,
    }
}

/// Result of a circle/segment test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub intersects: bool,
    /// Closest point on the segment
    pub point: Vec2,
    /// Unit vector from the closest point toward the circle centre
    pub normal: Vec2,
    pub distance: f32,
}

/// Circle vs line segment using the clamped projection of the centre
///
/// Degenerate (zero-length) segments behave like a point.
pub fn circle_intersects_segment(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> SegmentHit {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 {
        ((center - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = a + ab * t;
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    SegmentHit {
        intersects: dist_sq <= radius * radius,
        point: closest,
        normal: delta.normalize_or_zero(),
        distance: dist_sq.sqrt(),
    }
}

/// Ray-crossing point-in-polygon test with `offset` added to every vertex
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2], offset: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i] + offset;
        let pj = polygon[j] + offset;
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Where a ball first touches a box along its frame step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRefinement {
    /// Last travel fraction known to be clear of the target
    pub fraction: f32,
    pub position: Vec2,
}

/// Bisect the travel fraction to the contact boundary with `target`
///
/// Runs at most [`CONTACT_ITERATIONS`] halvings, stopping early once the
/// bracket is narrower than [`CONTACT_PRECISION`]. The returned position is
/// the last clear one, so the ball ends up touching but not overlapping.
pub fn find_exact_collision_position(
    start: Vec2,
    displacement: Vec2,
    ball_size: Vec2,
    target: &Aabb,
) -> ContactRefinement {
    let mut low = 0.0_f32;
    let mut high = 1.0_f32;

    for _ in 0..CONTACT_ITERATIONS {
        if high - low <= CONTACT_PRECISION {
            break;
        }
        let mid = (low + high) / 2.0;
        let test = Aabb::from_center(start + displacement * mid, ball_size);
        if test.overlaps(target) {
            high = mid;
        } else {
            low = mid;
        }
    }

    ContactRefinement {
        fraction: low,
        position: start + displacement * low,
    }
}
