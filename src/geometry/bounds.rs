// Axis-aligned bounding boxes used by the broad phase.

use serde::{Deserialize, Serialize};

use crate::geometry::vertices::Vertex;
use crate::math::vec2::Vec2;

/// An axis-aligned bounding box defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Creates a new box, ordering the corners so that `min <= max`.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Bounds {
            min: Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// An inverted box that any `update` call will collapse onto the given points.
    pub fn empty() -> Self {
        Bounds {
            min: Vec2::new(f64::INFINITY, f64::INFINITY),
            max: Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates the tightest box around a vertex set.
    pub fn create(vertices: &[Vertex]) -> Self {
        let mut bounds = Bounds::empty();
        bounds.update(vertices, None);
        bounds
    }

    /// Creates the tightest box around a set of plain points.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds::new(*first, *first);
        for point in points.iter().skip(1) {
            bounds.include(*point);
        }
        Some(bounds)
    }

    /// Recomputes the box from scratch and then applies the velocity bias.
    pub fn fit(vertices: &[Vertex], velocity: Vec2) -> Self {
        let mut bounds = Bounds::empty();
        bounds.update(vertices, Some(velocity));
        bounds
    }

    /// Extends the box to contain every vertex. Never shrinks.
    ///
    /// With a velocity, the leading side on each axis is pushed out by the
    /// velocity component so a fast body is caught one step early.
    pub fn update(&mut self, vertices: &[Vertex], velocity: Option<Vec2>) {
        for vertex in vertices {
            self.include(vertex.point);
        }

        if let Some(velocity) = velocity {
            if velocity.x > 0.0 {
                self.max.x += velocity.x;
            } else {
                self.min.x += velocity.x;
            }

            if velocity.y > 0.0 {
                self.max.y += velocity.y;
            } else {
                self.min.y += velocity.y;
            }
        }
    }

    fn include(&mut self, point: Vec2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Returns true if the point lies inside or on the border.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Returns true if the two boxes overlap. Touching edges count as overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
    }

    /// Moves the box by a vector.
    pub fn translate(&mut self, vector: Vec2) {
        self.min += vector;
        self.max += vector;
    }

    /// Moves the box so that its minimum corner sits at `position`.
    pub fn shift(&mut self, position: Vec2) {
        let size = self.max - self.min;
        self.min = position;
        self.max = position + size;
    }

    /// Expands this box to also cover `other`.
    pub fn merge(&mut self, other: &Bounds) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }
}
