//! Geometric overlap tests
//!
//! Stateless predicates over rectangles, circles and rays. All comparisons
//! are plain IEEE double comparisons with no epsilon, so exact edge-touching
//! cases are decided by operand order; the tests pin that behavior down.

use super::bounds::{Bounded, Bounds, CenteredBounds, Circle};
use crate::vector::{Vector2, VectorExt};

/// Open-interval AABB overlap. Rectangles that only share an edge do not overlap.
#[inline]
pub fn rectangular(a: &Bounds, b: &Bounds) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Closed circle overlap. Tangent circles collide.
#[inline]
pub fn circular(a: &Circle, b: &Circle) -> bool {
    let r = a.radius + b.radius;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    r * r >= dx * dx + dy * dy
}

/// Cast a ray at a circle
///
/// `direction` is assumed to be unit length. Returns the entry point, or
/// `None` when the circle is behind the source, beyond `max_length` (measured
/// along the ray to the circle's closest approach), or missed entirely.
pub fn ray_circle(
    source: Vector2,
    direction: Vector2,
    target: &Circle,
    max_length: Option<f64>,
) -> Option<Vector2> {
    let radius = target.radius;
    let center = target.position();

    let to_target = center - source;
    let projection_length = direction.dot(to_target);
    if projection_length < 0.0 {
        return None;
    }
    if max_length.is_some_and(|max| projection_length > max) {
        return None;
    }

    let closest = source + direction * projection_length;
    let closest_distance = (center - closest).length();
    if closest_distance < radius {
        let dt = (radius * radius - closest_distance * closest_distance).sqrt();
        Some(source + direction * (projection_length - dt))
    } else {
        None
    }
}

/// Cast a ray at a rectangle
///
/// Picks the near edge on each axis from the side the source is on. Axis
/// aligned rays use that edge directly. Otherwise the horizontal edge is
/// used when its parametric distance is the larger one (or the source already
/// lies within the x-range), unless the source lies within the y-range; the
/// vertical edge is used in every other case. A hit must be in front of the
/// source and strictly between the edge's endpoints, so a ray through an
/// exact corner misses.
pub fn ray_rectangle(
    source: Vector2,
    direction: Vector2,
    target: &CenteredBounds,
) -> Option<Vector2> {
    let xw = target.xw;
    let yw = target.yw;

    let xval = if source.x < target.x {
        target.x - xw
    } else {
        target.x + xw
    };
    let yval = if source.y < target.y {
        target.y - yw
    } else {
        target.y + yw
    };

    let horizontal_edge = || {
        (
            Vector2::new(target.x - xw, yval),
            Vector2::new(target.x + xw, yval),
        )
    };
    let vertical_edge = || {
        (
            Vector2::new(xval, target.y - yw),
            Vector2::new(xval, target.y + yw),
        )
    };

    let ((p0, p1), t) = if direction.x == 0.0 {
        (horizontal_edge(), (yval - source.y) / direction.y)
    } else if direction.y == 0.0 {
        (vertical_edge(), (xval - source.x) / direction.x)
    } else {
        let t_x = (xval - source.x) / direction.x;
        let t_y = (yval - source.y) / direction.y;
        let dx = source.x - target.x;
        let dy = source.y - target.y;
        let inside_x = -xw < dx && dx < xw;
        let inside_y = -yw < dy && dy < yw;

        if (t_x < t_y || inside_x) && !inside_y {
            (horizontal_edge(), t_y)
        } else {
            (vertical_edge(), t_x)
        }
    };

    // A zero direction gives zero cross products, so it never hits
    if t > 0.0 {
        let area0 = direction.cross(p0 - source);
        let area1 = direction.cross(p1 - source);
        if area0 * area1 < 0.0 {
            return Some(source + direction * t);
        }
    }

    None
}

/// Call `callback` for every pair from the two groups whose bounds overlap
pub fn collide<A, B, F>(group_a: &[A], group_b: &[B], mut callback: F) -> usize
where
    A: Bounded,
    B: Bounded,
    F: FnMut(&A, &B),
{
    let mut hits = 0;
    for a in group_a {
        let a_bounds = a.bounds();
        for b in group_b {
            if rectangular(&a_bounds, &b.bounds()) {
                callback(a, b);
                hits += 1;
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Bounds {
        Bounds::new(x, y, w, h)
    }

    #[test]
    fn test_rectangular_overlap() {
        assert!(rectangular(&rect(0.0, 0.0, 10.0, 10.0), &rect(5.0, 5.0, 10.0, 10.0)));
        assert!(!rectangular(&rect(0.0, 0.0, 10.0, 10.0), &rect(50.0, 40.0, 30.0, 30.0)));
    }

    #[test]
    fn test_rectangular_touching_edges_do_not_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(!rectangular(&a, &rect(10.0, 0.0, 10.0, 10.0)));
        assert!(!rectangular(&a, &rect(0.0, 10.0, 10.0, 10.0)));
        assert!(rectangular(&a, &rect(9.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_rectangular_containment() {
        assert!(rectangular(&rect(0.0, 0.0, 100.0, 100.0), &rect(40.0, 40.0, 2.0, 2.0)));
    }

    #[test]
    fn test_circular_tangent_counts() {
        let a = Circle::new(0.0, 0.0, 5.0);
        assert!(circular(&a, &Circle::new(10.0, 0.0, 5.0)));
        assert!(!circular(&a, &Circle::new(10.0001, 0.0, 5.0)));
        assert!(circular(&Circle::new(5.0, 5.0, 10.0), &Circle::new(10.0, 10.0, 10.0)));
        assert!(!circular(&Circle::new(5.0, 5.0, 10.0), &Circle::new(500.0, 500.0, 30.0)));
    }

    #[test]
    fn test_ray_circle_miss_perpendicular_offset() {
        let hit = ray_circle(
            Vector2::ZERO,
            Vector2::X,
            &Circle::new(50.0, 50.0, 10.0),
            None,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_circle_hit_entry_point() {
        let hit = ray_circle(Vector2::ZERO, Vector2::X, &Circle::new(50.0, 0.0, 10.0), None);
        assert_eq!(hit, Some(Vector2::new(40.0, 0.0)));
    }

    #[test]
    fn test_ray_circle_behind_source() {
        let hit = ray_circle(Vector2::ZERO, Vector2::X, &Circle::new(-50.0, 0.0, 10.0), None);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_circle_max_length() {
        let target = Circle::new(50.0, 0.0, 10.0);
        assert_eq!(ray_circle(Vector2::ZERO, Vector2::X, &target, Some(30.0)), None);
        assert_eq!(
            ray_circle(Vector2::ZERO, Vector2::X, &target, Some(60.0)),
            Some(Vector2::new(40.0, 0.0))
        );
    }

    #[test]
    fn test_ray_circle_grazing_is_a_miss() {
        // Closest approach exactly equals the radius
        let hit = ray_circle(Vector2::ZERO, Vector2::X, &Circle::new(50.0, 10.0, 10.0), None);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_rectangle_axis_aligned_x() {
        let target = CenteredBounds::new(50.0, 0.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::ZERO, Vector2::X, &target);
        assert_eq!(hit, Some(Vector2::new(40.0, 0.0)));
    }

    #[test]
    fn test_ray_rectangle_axis_aligned_y() {
        let target = CenteredBounds::new(0.0, -50.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::ZERO, Vector2::NEG_Y, &target);
        assert_eq!(hit, Some(Vector2::new(0.0, -40.0)));
    }

    #[test]
    fn test_ray_rectangle_axis_aligned_pointing_away() {
        let target = CenteredBounds::new(50.0, 0.0, 10.0, 10.0);
        assert_eq!(ray_rectangle(Vector2::new(100.0, 0.0), Vector2::X, &target), None);
    }

    #[test]
    fn test_ray_rectangle_axis_aligned_parallel_miss() {
        let target = CenteredBounds::new(50.0, 30.0, 10.0, 10.0);
        assert_eq!(ray_rectangle(Vector2::ZERO, Vector2::X, &target), None);
    }

    #[test]
    fn test_ray_rectangle_diagonal_enters_vertical_edge() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::ZERO, Vector2::new(0.6, 0.8), &target)
            .expect("ray should enter through the left edge");
        assert!((hit.x - 40.0).abs() < 1e-9);
        assert!((hit.y - 160.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_rectangle_diagonal_enters_horizontal_edge() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::ZERO, Vector2::new(0.8, 0.6), &target);
        // Mirror image of the previous case: enters through the top edge (y = 40)
        let hit = hit.expect("ray should enter through the top edge");
        assert!((hit.y - 40.0).abs() < 1e-9);
        assert!((hit.x - 160.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_rectangle_exact_corner_misses() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        let direction = Vector2::new(1.0, 1.0).norm(1.0);
        assert_eq!(ray_rectangle(Vector2::ZERO, direction, &target), None);
    }

    #[test]
    fn test_ray_rectangle_source_inside_hits_exit_edge() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::new(50.0, 50.0), Vector2::X, &target);
        assert_eq!(hit, Some(Vector2::new(60.0, 50.0)));
    }

    #[test]
    fn test_ray_rectangle_source_in_x_range_diagonal_miss() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        let hit = ray_rectangle(Vector2::new(50.0, 0.0), Vector2::new(0.6, 0.8), &target);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_rectangle_source_in_x_range_diagonal_hit() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        // Steep ray starting under the box: enters through the top edge
        let hit = ray_rectangle(Vector2::new(48.0, 0.0), Vector2::new(0.05, 1.0).norm(1.0), &target)
            .expect("steep ray should hit the top edge");
        assert!((hit.y - 40.0).abs() < 1e-9);
        assert!(hit.x > 40.0 && hit.x < 60.0);
    }

    #[test]
    fn test_ray_rectangle_zero_direction_is_a_miss() {
        let target = CenteredBounds::new(50.0, 50.0, 10.0, 10.0);
        assert_eq!(ray_rectangle(Vector2::ZERO, Vector2::ZERO, &target), None);
    }

    struct Dot(Vector2);

    impl Bounded for Dot {
        fn position(&self) -> Vector2 {
            self.0
        }

        fn set_position(&mut self, position: Vector2) {
            self.0 = position;
        }

        fn size(&self) -> Vector2 {
            Vector2::new(10.0, 10.0)
        }
    }

    #[test]
    fn test_collide_groups() {
        let players = [Dot(Vector2::new(5.0, 5.0))];
        let enemies = [
            Dot(Vector2::new(10.0, 10.0)),
            Dot(Vector2::new(0.0, 0.0)),
            Dot(Vector2::new(100.0, 100.0)),
        ];

        let mut seen = Vec::new();
        let hits = collide(&players, &enemies, |_, e| seen.push(e.0));
        assert_eq!(hits, 2);
        assert_eq!(seen, vec![Vector2::new(10.0, 10.0), Vector2::ZERO]);
    }

    proptest! {
        #[test]
        fn prop_rectangular_is_symmetric(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0, aw in 0.0f64..50.0, ah in 0.0f64..50.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0, bw in 0.0f64..50.0, bh in 0.0f64..50.0,
        ) {
            let a = rect(ax, ay, aw, ah);
            let b = rect(bx, by, bw, bh);
            prop_assert_eq!(rectangular(&a, &b), rectangular(&b, &a));
        }

        #[test]
        fn prop_circular_is_symmetric(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0, ar in 0.0f64..50.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0, br in 0.0f64..50.0,
        ) {
            let a = Circle::new(ax, ay, ar);
            let b = Circle::new(bx, by, br);
            prop_assert_eq!(circular(&a, &b), circular(&b, &a));
        }

        #[test]
        fn prop_ray_circle_hit_is_on_the_circle(
            cx in 20.0f64..200.0, cy in -5.0f64..5.0, r in 6.0f64..20.0,
        ) {
            let target = Circle::new(cx, cy, r);
            let hit = ray_circle(Vector2::ZERO, Vector2::X, &target, None);
            prop_assert!(hit.is_some());
            let hit = hit.unwrap();
            prop_assert!((hit.distance(target.position()) - r).abs() < 1e-6);
        }
    }
}
