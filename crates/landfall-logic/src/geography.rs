//! Distance and bearing on the wrap-around world map.
//!
//! The x axis wraps at the map width. The y axis does not wrap: crossing the
//! top or bottom edge reflects the y coordinate back into the map and shifts
//! x by half the map width (walking over a pole comes down the far side).
//!
//! Rays and segments that cross an edge are split into the physical pieces
//! that lie inside the map, so terrain lookups only ever see in-bounds
//! geometry.

use serde::{Deserialize, Serialize};

use crate::constants::{DISTANCE_EPSILON, MAP_HEIGHT, MAP_WIDTH, MAX_WRAP_SPLITS};

/// A point in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Plain euclidean distance, ignoring map wrap.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// A straight piece of path between two in-bounds points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn dx(&self) -> f64 {
        self.end.x - self.start.x
    }

    pub fn dy(&self) -> f64 {
        self.end.y - self.start.y
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Point at parameter `t` (0 = start, 1 = end).
    pub fn point_at(&self, t: f64) -> Point {
        self.start.offset(self.dx() * t, self.dy() * t)
    }
}

/// Dimensions of the toroidal map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
        }
    }
}

impl MapBounds {
    pub fn new(width: f64, height: f64) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "map bounds must be positive, got {width}x{height}"
        );
        Self { width, height }
    }

    /// `x ∈ [0, width)`, `y ∈ [0, height]`.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Bring an arbitrary point back onto the map.
    ///
    /// y overflow reflects off the edge and shifts x by half the width;
    /// x then wraps into `[0, width)`.
    ///
    /// # Panics
    /// On non-finite coordinates, which only arise from a corrupted world.
    pub fn normalize(&self, p: Point) -> Point {
        assert!(
            p.x.is_finite() && p.y.is_finite(),
            "non-finite map coordinate ({}, {})",
            p.x,
            p.y
        );
        let (width, height) = (self.width, self.height);
        let mut x = p.x;
        let mut y = p.y;
        if y > height || y < 0.0 {
            let reflections = if y > height {
                (y / height).ceil() - 1.0
            } else {
                (-y / height).ceil()
            };
            let folded = y.rem_euclid(2.0 * height);
            y = if folded > height { 2.0 * height - folded } else { folded };
            // an even number of half-width shifts cancels out after wrapping
            if reflections.rem_euclid(2.0) == 1.0 {
                x += width / 2.0;
            }
        }
        let mut x = x.rem_euclid(width);
        if x >= self.width {
            x = 0.0;
        }
        Point::new(x, y)
    }

    /// All positions of `target` as seen from the unwrapped plane around the
    /// map: direct copies one width left and right, plus the copies reflected
    /// over the top and bottom edges.
    fn images(&self, target: Point) -> [Point; 9] {
        let w = self.width;
        let h = self.height;
        let half = w / 2.0;
        [
            Point::new(target.x, target.y),
            Point::new(target.x - w, target.y),
            Point::new(target.x + w, target.y),
            Point::new(target.x + half - w, 2.0 * h - target.y),
            Point::new(target.x + half, 2.0 * h - target.y),
            Point::new(target.x + half + w, 2.0 * h - target.y),
            Point::new(target.x + half - w, -target.y),
            Point::new(target.x + half, -target.y),
            Point::new(target.x + half + w, -target.y),
        ]
    }

    /// Shortest displacement `(dx, dy)` that leads from `from` to `to`,
    /// possibly around the x seam or over a pole.
    pub fn displacement(&self, from: Point, to: Point) -> (f64, f64) {
        let from = self.normalize(from);
        let to = self.normalize(to);
        let mut best = (to.x - from.x, to.y - from.y);
        let mut best_len = best.0 * best.0 + best.1 * best.1;
        for image in self.images(to).iter().skip(1) {
            let d = (image.x - from.x, image.y - from.y);
            let len = d.0 * d.0 + d.1 * d.1;
            if len + DISTANCE_EPSILON < best_len {
                best = d;
                best_len = len;
            }
        }
        best
    }

    /// Length of the shortest path between two map points.
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        let (dx, dy) = self.displacement(a, b);
        (dx * dx + dy * dy).sqrt()
    }

    /// Initial heading from `a` toward `b` in degrees, counter-clockwise from
    /// the +x axis, in `[0, 360)`. Zero when the points coincide.
    pub fn bearing(&self, a: Point, b: Point) -> f64 {
        let (dx, dy) = self.displacement(a, b);
        if dx.abs() < DISTANCE_EPSILON && dy.abs() < DISTANCE_EPSILON {
            return 0.0;
        }
        let deg = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        if deg >= 360.0 {
            0.0
        } else {
            deg
        }
    }

    /// Split the shortest path from `a` to `b` into in-bounds segments.
    ///
    /// One segment when the direct line is shortest, two when the path wraps
    /// on x only or passes over a pole only, three when it does both.
    /// Empty when the points coincide.
    pub fn split_wrapped_segment(&self, a: Point, b: Point) -> Vec<Segment> {
        let (dx, dy) = self.displacement(a, b);
        self.march(self.normalize(a), dx, dy)
    }

    /// Split a ray of `length` from `origin` heading `direction` degrees into
    /// in-bounds segments. Rays longer than the map are split at every edge
    /// they cross.
    ///
    /// # Panics
    /// On a non-finite `length`.
    pub fn split_ray(&self, origin: Point, direction: f64, length: f64) -> Vec<Segment> {
        assert!(length.is_finite(), "non-finite ray length {}", length);
        let rad = direction.to_radians();
        self.march(
            self.normalize(origin),
            length * rad.cos(),
            length * rad.sin(),
        )
    }

    fn march(&self, start: Point, mut dx: f64, mut dy: f64) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut pos = start;
        // x crossings, y reflections and the x shift each reflection adds
        let crossings = (dx.abs() / self.width).ceil() + 2.0 * (dy.abs() / self.height).ceil();
        let limit = MAX_WRAP_SPLITS.max(2 * crossings as usize + 4);

        for _ in 0..limit {
            let tx = if dx > 0.0 {
                (self.width - pos.x) / dx
            } else if dx < 0.0 {
                -pos.x / dx
            } else {
                f64::INFINITY
            };
            let ty = if dy > 0.0 {
                (self.height - pos.y) / dy
            } else if dy < 0.0 {
                -pos.y / dy
            } else {
                f64::INFINITY
            };

            let t = tx.min(ty);
            if t >= 1.0 {
                push_nonzero(&mut segments, Segment::new(pos, pos.offset(dx, dy)));
                return segments;
            }

            let exit = pos.offset(dx * t, dy * t);
            push_nonzero(&mut segments, Segment::new(pos, exit));
            dx *= 1.0 - t;
            dy *= 1.0 - t;

            let mut next = exit;
            if tx <= ty {
                next.x = if dx > 0.0 { 0.0 } else { self.width };
            }
            if ty <= tx {
                next.y = if dy > 0.0 { self.height } else { 0.0 };
                next.x = (next.x + self.width / 2.0).rem_euclid(self.width);
                dy = -dy;
            }
            pos = next;
        }

        panic!(
            "ray ({}, {}) from ({}, {}) still unfinished after {} edge crossings",
            dx, dy, start.x, start.y, limit
        );
    }
}

fn push_nonzero(segments: &mut Vec<Segment>, segment: Segment) {
    if segment.length() > DISTANCE_EPSILON {
        segments.push(segment);
    }
}

/// Total length of a split path.
pub fn path_length(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::length).sum()
}
