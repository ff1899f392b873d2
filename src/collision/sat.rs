//! Narrow phase: separating axis test between two convex polygons.

use smallvec::SmallVec;

use crate::collision::pair::PairId;
use crate::common::BodyId;
use crate::geometry::vertices::{self, Vertex};
use crate::math::vec2::Vec2;
use crate::objects::convex::Convex;

/// Locates one convex shape in the world's body list: the root hull of
/// `bodies[body]` when `part` is `None`, otherwise one of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartRef {
    pub body: usize,
    pub part: Option<usize>,
}

impl PartRef {
    pub fn root(body: usize) -> Self {
        PartRef { body, part: None }
    }

    pub fn part(body: usize, part: usize) -> Self {
        PartRef {
            body,
            part: Some(part),
        }
    }
}

/// A contact point candidate produced by SAT.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    pub vertex: Vertex,
    /// True if the vertex belongs to shape A of the collision.
    pub on_a: bool,
}

/// Result of one separating axis query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub overlap: f64,
    pub axis: Vec2,
}

/// One step's overlap between two convex shapes.
///
/// Shape A is always the one with the lower id, so the same two shapes give
/// the same record no matter which order the detector visited them in.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub body_a: PartRef,
    pub body_b: PartRef,
    pub id_a: BodyId,
    pub id_b: BodyId,
    /// Vertex count of shape A, used to give B's vertices distinct contact ids.
    pub vertex_count_a: usize,
    pub depth: f64,
    /// Unit normal with `normal . (position_b - position_a) <= 0`.
    pub normal: Vec2,
    pub tangent: Vec2,
    pub penetration: Vec2,
    /// One or two contact points. Never empty.
    pub supports: SmallVec<[Support; 2]>,
}

impl Collision {
    pub fn pair_id(&self) -> PairId {
        PairId::new(self.id_a, self.id_b)
    }
}

/// Tests two convex shapes for overlap.
///
/// Returns `None` if either shape's axes separate them. Touching shapes
/// (zero overlap) do not collide.
pub fn collides(
    shape_a: &dyn Convex,
    ref_a: PartRef,
    shape_b: &dyn Convex,
    ref_b: PartRef,
) -> Option<Collision> {
    let overlap_ab = overlap_axes(shape_a.vertices(), shape_b.vertices(), shape_a.axes());
    if overlap_ab.overlap <= 0.0 {
        return None;
    }

    let overlap_ba = overlap_axes(shape_b.vertices(), shape_a.vertices(), shape_b.axes());
    if overlap_ba.overlap <= 0.0 {
        return None;
    }

    let min_overlap = if overlap_ab.overlap < overlap_ba.overlap {
        overlap_ab
    } else {
        overlap_ba
    };

    let (a, ref_a, b, ref_b) = if shape_a.id() < shape_b.id() {
        (shape_a, ref_a, shape_b, ref_b)
    } else {
        (shape_b, ref_b, shape_a, ref_a)
    };

    let axis = min_overlap.axis;
    let normal = if axis.dot(b.position() - a.position()) < 0.0 {
        axis
    } else {
        -axis
    };
    let depth = min_overlap.overlap;

    Some(Collision {
        body_a: ref_a,
        body_b: ref_b,
        id_a: a.id(),
        id_b: b.id(),
        vertex_count_a: a.vertices().len(),
        depth,
        normal,
        tangent: normal.perpendicular(),
        penetration: normal * depth,
        supports: supports_for(a, b, normal),
    })
}

/// Finds the axis of least overlap between two vertex sets.
///
/// Both sets are projected onto each axis. Ties keep the earliest axis, and
/// the scan stops at the first axis that shows a gap.
pub fn overlap_axes(vertices_a: &[Vertex], vertices_b: &[Vertex], axes: &[Vec2]) -> Overlap {
    let mut result = Overlap {
        overlap: f64::MAX,
        axis: axes.first().copied().unwrap_or(Vec2::ZERO),
    };

    for &axis in axes {
        let (min_a, max_a) = project(vertices_a, axis);
        let (min_b, max_b) = project(vertices_b, axis);

        let overlap = (max_a - min_b).min(max_b - min_a);
        if overlap < result.overlap {
            result.overlap = overlap;
            result.axis = axis;

            if overlap <= 0.0 {
                break;
            }
        }
    }

    result
}

fn project(vertices: &[Vertex], axis: Vec2) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for vertex in vertices {
        let dot = vertex.point.dot(axis);
        min = min.min(dot);
        max = max.max(dot);
    }
    (min, max)
}

/// Picks the vertex of `b` deepest along `normal` relative to `a`'s
/// position, plus whichever neighbour of it is also deeper.
pub fn find_supports(a: &dyn Convex, b: &dyn Convex, normal: Vec2) -> [Vertex; 2] {
    let vertices = b.vertices();
    let position = a.position();
    let distance = |v: &Vertex| normal.dot(position - v.point);

    let mut nearest = 0;
    let mut nearest_distance = f64::MAX;
    for (j, vertex) in vertices.iter().enumerate() {
        let d = distance(vertex);
        if d < nearest_distance {
            nearest_distance = d;
            nearest = j;
        }
    }

    let len = vertices.len();
    let prev = &vertices[(len + nearest - 1) % len];
    let next = &vertices[(nearest + 1) % len];

    if distance(next) < distance(prev) {
        [vertices[nearest], *next]
    } else {
        [vertices[nearest], *prev]
    }
}

fn supports_for(a: &dyn Convex, b: &dyn Convex, normal: Vec2) -> SmallVec<[Support; 2]> {
    let mut supports: SmallVec<[Support; 2]> = SmallVec::new();

    let from_b = find_supports(a, b, normal);
    for vertex in from_b {
        if vertices::contains(a.vertices(), vertex.point) {
            supports.push(Support { vertex, on_a: false });
        }
    }

    if supports.len() < 2 {
        let from_a = find_supports(b, a, -normal);
        for vertex in from_a {
            if supports.len() < 2 && vertices::contains(b.vertices(), vertex.point) {
                supports.push(Support { vertex, on_a: true });
            }
        }
    }

    if supports.is_empty() {
        supports.push(Support {
            vertex: from_b[0],
            on_a: false,
        });
    }

    supports
}
