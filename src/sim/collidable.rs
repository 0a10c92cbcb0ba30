//! Rigid-body collision response
//!
//! Bodies carry a velocity, a mass, an elasticity and two side masks:
//! `allow_collisions` (sides that may register contact) and `touching`
//! (sides in contact during the last resolution).

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::bounds::Bounded;
use super::collision::rectangular;
use crate::vector::{Vector2, VectorExt};

bitflags! {
    /// Sides of a body
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u32 {
        const LEFT = 0x0001;
        const RIGHT = 0x0010;
        const UP = 0x0100;
        const DOWN = 0x1000;

        const FLOOR = Self::DOWN.bits();
        const WALL = Self::LEFT.bits() | Self::RIGHT.bits();
        const CEILING = Self::UP.bits();
        const ANY = Self::LEFT.bits() | Self::RIGHT.bits() | Self::UP.bits() | Self::DOWN.bits();
    }
}

impl CollisionFlags {
    pub const NONE: Self = Self::empty();
}

impl Default for CollisionFlags {
    fn default() -> Self {
        CollisionFlags::NONE
    }
}

// Stored as the raw bit pattern, so data records can use plain numbers
impl Serialize for CollisionFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for CollisionFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(CollisionFlags::from_bits_truncate)
    }
}

/// A bounded object that takes part in collision response
pub trait RigidBody: Bounded {
    fn velocity(&self) -> Vector2;
    fn set_velocity(&mut self, velocity: Vector2);
    fn mass(&self) -> f64;
    fn elasticity(&self) -> f64;
    fn immovable(&self) -> bool;
    fn allow_collisions(&self) -> CollisionFlags;
    fn touching(&self) -> CollisionFlags;
    fn set_touching(&mut self, touching: CollisionFlags);

    /// Mark `sides` as touching, keeping sides already set
    fn touch(&mut self, sides: CollisionFlags) {
        let touching = self.touching() | sides;
        self.set_touching(touching);
    }

    fn allows(&self, sides: CollisionFlags) -> bool {
        self.allow_collisions().contains(sides)
    }
}

/// Overlap along one axis, or zero when the sides involved may not collide.
/// Sets the touching flags on both bodies when the contact is allowed.
fn axis_overlap<A, B>(
    a: &mut A,
    b: &mut B,
    overlap: f64,
    a_side: CollisionFlags,
    b_side: CollisionFlags,
) -> f64
where
    A: RigidBody + ?Sized,
    B: RigidBody + ?Sized,
{
    if a.allows(a_side) && b.allows(b_side) {
        a.touch(a_side);
        b.touch(b_side);
        overlap
    } else {
        0.0
    }
}

/// Push two overlapping bodies apart and exchange momentum
///
/// Returns true when a correction was applied. Bodies whose bounds do not
/// overlap are left untouched, flags included.
///
/// The exchanged impulse is centered on the pair's average, so momentum is
/// only conserved when the pair's total momentum starts at zero. Both masses
/// must be positive.
pub fn separate<A, B>(a: &mut A, b: &mut B) -> bool
where
    A: RigidBody + ?Sized,
    B: RigidBody + ?Sized,
{
    let a_immovable = a.immovable();
    let b_immovable = b.immovable();
    if a_immovable && b_immovable {
        return false;
    }

    let a_bounds = a.bounds();
    let b_bounds = b.bounds();
    if !rectangular(&a_bounds, &b_bounds) {
        return false;
    }

    let a_velocity = a.velocity();
    let b_velocity = b.velocity();
    let delta_velocity = a_velocity - b_velocity;

    let mut overlap = Vector2::ZERO;

    if delta_velocity.x > 0.0 {
        let raw = a_bounds.x + a_bounds.width - b_bounds.x;
        overlap.x = axis_overlap(a, b, raw, CollisionFlags::RIGHT, CollisionFlags::LEFT);
    } else if delta_velocity.x < 0.0 {
        let raw = a_bounds.x - b_bounds.width - b_bounds.x;
        overlap.x = axis_overlap(a, b, raw, CollisionFlags::LEFT, CollisionFlags::RIGHT);
    }

    if delta_velocity.y > 0.0 {
        let raw = a_bounds.y + a_bounds.height - b_bounds.y;
        overlap.y = axis_overlap(a, b, raw, CollisionFlags::DOWN, CollisionFlags::UP);
    } else if delta_velocity.y < 0.0 {
        let raw = a_bounds.y - b_bounds.height - b_bounds.y;
        overlap.y = axis_overlap(a, b, raw, CollisionFlags::UP, CollisionFlags::DOWN);
    }

    if overlap == Vector2::ZERO {
        return false;
    }

    match (a_immovable, b_immovable) {
        (false, false) => {
            a.change_position(-overlap / 2.0);
            b.change_position(overlap / 2.0);

            let relative_velocity = a_velocity - b_velocity;
            let a_mass = a.mass();
            let b_mass = b.mass();
            let total_mass = a_mass + b_mass;
            let normal = overlap.norm(1.0);
            let impact = relative_velocity.dot(normal);

            let push_a = normal * (-2.0 * impact * (b_mass / total_mass));
            let push_b = normal * (2.0 * impact * (a_mass / total_mass));
            let average = (push_a + push_b) / 2.0;

            let push_a = (push_a - average) * a.elasticity();
            let push_b = (push_b - average) * b.elasticity();

            a.set_velocity(average + push_a);
            b.set_velocity(average + push_b);
        }
        (false, true) => {
            a.change_position(-overlap);
            a.set_velocity(b_velocity - a_velocity * a.elasticity());
        }
        (true, false) => {
            b.change_position(overlap);
            b.set_velocity(a_velocity - b_velocity * b.elasticity());
        }
        (true, true) => return false,
    }

    true
}
