//! geometry.rs — Planar ring geometry for the inspected boundary
//!
//! All math happens in the projected frame. A `Ring` always stores its
//! vertices closed (last == first), so edge `i` runs from `vertices[i]` to
//! `vertices[i + 1]`.

use track_types::Point2;

use crate::error::SimError;

/// Closed boundary ring of the inspected area.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    vertices: Vec<Point2>,
}

impl Ring {
    /// Build a ring from an open or closed vertex list.
    ///
    /// Consecutive duplicates (including an explicit closing vertex) are
    /// dropped. Fails with `SimError::InvalidInput` on non-finite coordinates,
    /// fewer than three distinct vertices or a collapsed (zero-area) ring.
    pub fn new(points: &[Point2]) -> Result<Self, SimError> {
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(SimError::InvalidInput(format!("non-finite vertex ({}, {})", p.x, p.y)));
        }

        let mut vertices: Vec<Point2> = Vec::with_capacity(points.len() + 1);
        for p in points {
            if vertices.last() != Some(p) {
                vertices.push(*p);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        // three distinct vertices are enough; stop looking once found
        let mut distinct: Vec<Point2> = Vec::with_capacity(3);
        for p in &vertices {
            if !distinct.contains(p) {
                distinct.push(*p);
                if distinct.len() == 3 {
                    break;
                }
            }
        }
        if distinct.len() < 3 {
            return Err(SimError::InvalidInput(format!(
                "ring needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }
        if polygon_area(&vertices) <= f64::EPSILON {
            return Err(SimError::InvalidInput("ring encloses no area".to_string()));
        }

        vertices.push(vertices[0]);
        Ok(Self { vertices })
    }

    /// Closed vertex list, first vertex repeated at the end.
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// Open vertex list (without the closing repeat).
    pub fn corners(&self) -> &[Point2] {
        &self.vertices[..self.vertices.len() - 1]
    }

    pub fn start(&self) -> Point2 {
        self.vertices[0]
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn area(&self) -> f64 {
        polygon_area(self.corners())
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.dist(&b)).sum()
    }

    /// Closest point on the boundary to `p`.
    pub fn nearest_point(&self, p: Point2) -> Point2 {
        let mut best = self.vertices[0];
        let mut best_d = f64::INFINITY;
        for (a, b) in self.edges() {
            let c = closest_point_on_segment(p, a, b);
            let d = c.dist(&p);
            if d < best_d {
                best_d = d;
                best = c;
            }
        }
        best
    }
}

/// Enclosed area of an implicitly closed vertex sequence (shoelace formula).
///
/// Self-intersecting input yields the net signed area's magnitude; callers
/// treat a non-finite result as malformed geometry.
pub fn polygon_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    (twice / 2.0).abs()
}

/// Projection of `p` onto segment `a→b`, clamped to the segment.
pub fn closest_point_on_segment(p: Point2, a: Point2, b: Point2) -> Point2 {
    let ab = b.sub(&a);
    let len2 = ab.x * ab.x + ab.y * ab.y;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len2).clamp(0.0, 1.0);
    a.add(&ab.scale(t))
}

/// Total length of a polyline.
pub fn path_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| w[0].dist(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(50.0, 50.0),
            Point2::new(0.0, 50.0),
        ]
    }

    #[test]
    fn ring_closes_open_input() {
        let ring = Ring::new(&square()).unwrap();
        assert_eq!(ring.vertices().len(), 5);
        assert_eq!(ring.vertices()[4], ring.start());
        assert_eq!(ring.corners().len(), 4);
        assert!((ring.area() - 2500.0).abs() < 1e-9);
        assert!((ring.perimeter() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_closing_vertex_is_not_duplicated() {
        let mut pts = square();
        pts.push(pts[0]);
        let ring = Ring::new(&pts).unwrap();
        assert_eq!(ring.vertices().len(), 5);
    }

    #[test]
    fn degenerate_rings_are_rejected() {
        let two = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(matches!(Ring::new(&two), Err(SimError::InvalidInput(_))));

        let repeated = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(matches!(Ring::new(&repeated), Err(SimError::InvalidInput(_))));

        let collinear = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(matches!(Ring::new(&collinear), Err(SimError::InvalidInput(_))));

        let nan = [Point2::new(0.0, 0.0), Point2::new(f64::NAN, 0.0), Point2::new(0.0, 1.0)];
        assert!(matches!(Ring::new(&nan), Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn long_inputs_count_distinct_vertices() {
        let back_and_forth: Vec<Point2> =
            (0..20_000).map(|i| if i % 2 == 0 { Point2::new(0.0, 0.0) } else { Point2::new(5.0, 0.0) }).collect();
        assert!(matches!(Ring::new(&back_and_forth), Err(SimError::InvalidInput(_))));

        let circle: Vec<Point2> = (0..20_000)
            .map(|i| {
                let a = i as f64 / 20_000.0 * std::f64::consts::TAU;
                Point2::new(100.0 * a.cos(), 100.0 * a.sin())
            })
            .collect();
        let ring = Ring::new(&circle).unwrap();
        assert_eq!(ring.corners().len(), 20_000);
    }

    #[test]
    fn nearest_point_lies_on_boundary() {
        let ring = Ring::new(&square()).unwrap();
        let inside = Point2::new(10.0, 25.0);
        assert_eq!(ring.nearest_point(inside), Point2::new(0.0, 25.0));
        assert!((ring.nearest_point(inside).dist(&inside) - 10.0).abs() < 1e-12);

        let outside = Point2::new(60.0, 60.0);
        assert_eq!(ring.nearest_point(outside), Point2::new(50.0, 50.0));
    }

    #[test]
    fn segment_projection_clamps() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(Point2::new(-5.0, 3.0), a, b), a);
        assert_eq!(closest_point_on_segment(Point2::new(4.0, 3.0), a, b), Point2::new(4.0, 0.0));
        assert_eq!(closest_point_on_segment(Point2::new(4.0, 3.0), a, a), a);
    }

    #[test]
    fn shoelace_ignores_orientation() {
        let mut pts = square();
        let ccw = polygon_area(&pts);
        pts.reverse();
        assert_eq!(ccw, polygon_area(&pts));
        assert_eq!(polygon_area(&pts[..2]), 0.0);
    }
}
