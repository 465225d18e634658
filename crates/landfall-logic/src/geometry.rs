//! Polygon primitives for terrain areas.
//!
//! Pure functions over plain structs: point containment, segment/edge
//! crossings and area. Terrain polygons live in map coordinates and never
//! straddle the x seam; callers split paths with
//! [`MapBounds::split_ray`](crate::geography::MapBounds::split_ray) first.

use serde::{Deserialize, Serialize};

use crate::geography::{Point, Segment};

const PARALLEL_EPSILON: f64 = 1e-12;

/// A simple (non self-intersecting) polygon given by its vertex ring.
/// The ring is implicitly closed; the last vertex connects to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle from its lower-left corner and size.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Even-odd containment test. Points exactly on an edge may land on
    /// either side; callers sample interval midpoints to stay off edges.
    pub fn contains(&self, p: Point) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Parameters `t ∈ [0, 1]` along `segment` where it crosses an edge of
    /// this polygon, unsorted. Edges parallel to the segment are skipped.
    pub fn segment_crossings(&self, segment: &Segment) -> Vec<f64> {
        let mut crossings = Vec::new();
        if self.vertices.len() < 3 {
            return crossings;
        }
        let r = (segment.dx(), segment.dy());
        for (a, b) in self.edges() {
            let s = (b.x - a.x, b.y - a.y);
            let denom = cross(r, s);
            if denom.abs() < PARALLEL_EPSILON {
                continue;
            }
            let qp = (a.x - segment.start.x, a.y - segment.start.y);
            let t = cross(qp, s) / denom;
            let u = cross(qp, r) / denom;
            if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
                crossings.push(t);
            }
        }
        crossings
    }

    /// Unsigned area by the shoelace formula.
    pub fn area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let twice: f64 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice.abs() / 2.0
    }
}

fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let square = Polygon::rect(0.0, 0.0, 10.0, 10.0);
        assert!(square.contains(Point::new(5.0, 5.0)));
        assert!(!square.contains(Point::new(15.0, 5.0)));
        assert!(!square.contains(Point::new(5.0, -1.0)));
    }

    #[test]
    fn test_concave_contains() {
        // L-shape: the notch at (7, 7) is outside
        let l = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(l.contains(Point::new(2.0, 8.0)));
        assert!(l.contains(Point::new(8.0, 2.0)));
        assert!(!l.contains(Point::new(7.0, 7.0)));
    }

    #[test]
    fn test_segment_crossings() {
        let square = Polygon::rect(2.0, -1.0, 4.0, 2.0);
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let mut ts = square.segment_crossings(&seg);
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(ts.len(), 2);
        assert!((ts[0] - 0.2).abs() < 1e-9);
        assert!((ts[1] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_segment_inside_has_no_crossings() {
        let square = Polygon::rect(0.0, 0.0, 10.0, 10.0);
        let seg = Segment::new(Point::new(2.0, 2.0), Point::new(8.0, 3.0));
        assert!(square.segment_crossings(&seg).is_empty());
    }

    #[test]
    fn test_area() {
        assert!((Polygon::rect(0.0, 0.0, 4.0, 3.0).area() - 12.0).abs() < 1e-9);
        let triangle = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ]);
        assert!((triangle.area() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(!line.contains(Point::new(0.5, 0.5)));
        assert_eq!(line.area(), 0.0);
    }
}
