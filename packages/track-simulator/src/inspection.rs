//! inspection.rs — Progress of one walk around the boundary ring
//!
//! Edge `i` runs from vertex `i` to vertex `i + 1` of the closed ring. The
//! edge counts as walked once a position comes within tolerance of its end
//! vertex. The last edge closes the ring and uses the looser closing distance.

use track_types::Point2;

use crate::geometry::Ring;

#[derive(Debug, Clone)]
pub struct InspectionTask {
    vertices: Vec<Point2>,
    index: usize,
    closing_distance: f64,
}

impl InspectionTask {
    pub fn new(ring: &Ring, closing_distance: f64) -> Self {
        Self {
            vertices: ring.vertices().to_vec(),
            index: 0,
            closing_distance,
        }
    }

    /// Index of the edge currently walked. Never decreases.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.len() - 1
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.edge_count()
    }

    fn is_closing_edge(&self) -> bool {
        self.index + 1 == self.edge_count()
    }

    /// End vertex of the current edge, `None` once the ring is closed.
    pub fn next_target(&self) -> Option<Point2> {
        if self.is_complete() {
            None
        } else {
            Some(self.vertices[self.index + 1])
        }
    }

    /// Whether `point` reached the end of the current edge.
    pub fn is_on_current_edge(&self, point: Point2, tolerance: f64) -> bool {
        let Some(target) = self.next_target() else {
            return false;
        };
        let reach = if self.is_closing_edge() { self.closing_distance } else { tolerance };
        point.dist(&target) < reach
    }

    /// Move on to the next edge. Returns `false` once the ring is closed.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.index += 1;
        !self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(closing: f64) -> InspectionTask {
        let ring = Ring::new(&[Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)]).unwrap();
        InspectionTask::new(&ring, closing)
    }

    #[test]
    fn walks_every_edge_then_completes() {
        let mut t = task(1.0);
        assert_eq!(t.edge_count(), 3);
        assert_eq!(t.next_target(), Some(Point2::new(10.0, 0.0)));
        assert!(t.advance());
        assert_eq!(t.next_target(), Some(Point2::new(10.0, 10.0)));
        assert!(t.advance());
        assert_eq!(t.next_target(), Some(Point2::new(0.0, 0.0)));
        assert!(!t.advance());
        assert!(t.is_complete());
        assert_eq!(t.next_target(), None);

        // terminal state is sticky
        assert!(!t.advance());
        assert_eq!(t.index(), 3);
    }

    #[test]
    fn reach_uses_tolerance_on_inner_edges() {
        let t = task(5.0);
        assert!(t.is_on_current_edge(Point2::new(9.5, 0.0), 1.0));
        assert!(!t.is_on_current_edge(Point2::new(8.5, 0.0), 1.0));
    }

    #[test]
    fn closing_edge_uses_closing_distance() {
        let mut t = task(5.0);
        t.advance();
        t.advance();
        assert!(t.is_on_current_edge(Point2::new(3.0, 3.0), 1.0));
        assert!(!t.is_on_current_edge(Point2::new(4.0, 4.0), 1.0));
    }

    #[test]
    fn complete_task_reaches_nothing() {
        let mut t = task(1.0);
        while t.advance() {}
        assert!(!t.is_on_current_edge(Point2::zero(), 100.0));
    }
}
