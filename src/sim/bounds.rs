//! Bounding shapes derived from an object's position and size
//!
//! The position of a bounded object is its center; `bounds()` converts it to
//! a top-left rectangle, `centered_bounds()` keeps the center with half-extents.

use serde::{Deserialize, Serialize};

use super::collision::rectangular;
use crate::vector::Vector2;

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn centered(&self) -> CenteredBounds {
        let center = self.center();
        CenteredBounds {
            x: center.x,
            y: center.y,
            xw: self.width / 2.0,
            yw: self.height / 2.0,
        }
    }
}

/// Rectangle given by its center and half-extents
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenteredBounds {
    pub x: f64,
    pub y: f64,
    pub xw: f64,
    pub yw: f64,
}

impl CenteredBounds {
    pub fn new(x: f64, y: f64, xw: f64, yw: f64) -> Self {
        Self { x, y, xw, yw }
    }

    #[inline]
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

/// Circle given by its center and radius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    #[inline]
    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

/// Location and dimensions of an object
///
/// Implementors supply position, size and the optional extras; the derived
/// shapes come for free.
pub trait Bounded {
    fn position(&self) -> Vector2;
    fn set_position(&mut self, position: Vector2);
    /// (width, height)
    fn size(&self) -> Vector2;

    /// Signed margin: positive shrinks the collision area, negative grows it
    fn collision_margin(&self) -> Vector2 {
        Vector2::ZERO
    }

    /// Explicit radius for `circle()`, if the object has one
    fn radius(&self) -> Option<f64> {
        None
    }

    fn center(&self) -> Vector2 {
        self.position()
    }

    fn change_position(&mut self, delta: Vector2) {
        let position = self.position() + delta;
        self.set_position(position);
    }

    fn bounds(&self) -> Bounds {
        self.offset_bounds(Vector2::ZERO)
    }

    /// Bounds shifted by `offset`
    fn offset_bounds(&self, offset: Vector2) -> Bounds {
        let center = self.center();
        let size = self.size();
        Bounds {
            x: center.x - size.x / 2.0 + offset.x,
            y: center.y - size.y / 2.0 + offset.y,
            width: size.x,
            height: size.y,
        }
    }

    fn centered_bounds(&self) -> CenteredBounds {
        let center = self.center();
        let size = self.size();
        CenteredBounds {
            x: center.x,
            y: center.y,
            xw: size.x / 2.0,
            yw: size.y / 2.0,
        }
    }

    fn collision_bounds(&self) -> Bounds {
        self.offset_collision_bounds(Vector2::ZERO)
    }

    /// Collision bounds shifted by `offset`
    fn offset_collision_bounds(&self, offset: Vector2) -> Bounds {
        let margin = self.collision_margin();
        let mut bounds = self.offset_bounds(offset);
        bounds.x += margin.x;
        bounds.y += margin.y;
        bounds.width -= 2.0 * margin.x;
        bounds.height -= 2.0 * margin.y;
        bounds
    }

    /// Bounding circle: explicit radius, else half the width, else half the height.
    /// Zero values fall through to the next candidate.
    fn circle(&self) -> Circle {
        let center = self.center();
        let size = self.size();
        let radius = self
            .radius()
            .filter(|r| *r != 0.0)
            .or(Some(size.x / 2.0).filter(|r| *r != 0.0))
            .unwrap_or(size.y / 2.0);
        Circle {
            x: center.x,
            y: center.y,
            radius,
        }
    }

    /// Whether our bounds overlap `other`
    fn collides(&self, other: &Bounds) -> bool {
        rectangular(&self.bounds(), other)
    }
}
