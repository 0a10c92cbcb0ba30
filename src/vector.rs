//! 2D vector helpers
//!
//! `Vector2` is glam's double-precision vector. Arithmetic (`+`, `-`, `*`),
//! `dot`, `length`, `distance` and `from_angle` come from glam; this module adds the few
//! operations the collision code relies on with the exact semantics it needs.

use glam::DVec2;

/// A 2D point or vector (IEEE double precision)
pub type Vector2 = DVec2;

/// Extra vector operations used by collision and resolution code
pub trait VectorExt: Sized {
    /// Scalar z-component of the 3D cross product of (x, y, 0) vectors
    fn cross(self, other: Self) -> f64;

    /// Rescale to `length`. A zero-length vector is returned unchanged.
    fn norm(self, length: f64) -> Self;

    /// In-place variant of [`VectorExt::norm`]
    fn norm_mut(&mut self, length: f64) -> &mut Self;

    /// Angle (radians) from `self` toward `other`
    fn direction(self, other: Self) -> f64;

    /// Linear interpolation from `self` to `other`
    fn interpolate(self, other: Self, t: f64) -> Self;
}

impl VectorExt for Vector2 {
    #[inline]
    fn cross(self, other: Self) -> f64 {
        self.x * other.y - other.x * self.y
    }

    fn norm(mut self, length: f64) -> Self {
        self.norm_mut(length);
        self
    }

    fn norm_mut(&mut self, length: f64) -> &mut Self {
        let magnitude = self.length();
        if magnitude != 0.0 {
            *self *= length / magnitude;
        }
        self
    }

    #[inline]
    fn direction(self, other: Self) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    #[inline]
    fn interpolate(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}
