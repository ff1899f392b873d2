//! Operations on world-space polygon vertex lists.
//!
//! Polygons wind counter-clockwise in a y-up frame, which gives them a
//! positive signed area. Everything here assumes that winding.

use std::cmp::Ordering;

use crate::common::BodyId;
use crate::math::vec2::Vec2;

/// A polygon vertex tagged with its owner and its position in the owner's list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub point: Vec2,
    /// Index within the owning polygon. Stable under translate/rotate.
    pub index: usize,
    /// Id of the body or part this vertex belongs to.
    pub body: BodyId,
    /// Marks an edge that is internal to a compound shape.
    pub is_internal: bool,
}

impl Vertex {
    pub fn new(point: Vec2, index: usize, body: BodyId) -> Self {
        Vertex {
            point,
            index,
            body,
            is_internal: false,
        }
    }
}

/// Builds a vertex list from points, numbering vertices in order.
pub fn create(points: &[Vec2], body: BodyId) -> Vec<Vertex> {
    points
        .iter()
        .enumerate()
        .map(|(index, &point)| Vertex::new(point, index, body))
        .collect()
}

/// Extracts the plain points of a vertex list.
pub fn points(vertices: &[Vertex]) -> Vec<Vec2> {
    vertices.iter().map(|v| v.point).collect()
}

/// Polygon area by the shoelace formula. The signed value is positive for
/// counter-clockwise winding.
pub fn area(vertices: &[Vertex], unsigned: bool) -> f64 {
    let mut area = 0.0;
    let mut j = vertices.len().wrapping_sub(1);

    for i in 0..vertices.len() {
        let prev = vertices[j].point;
        let cur = vertices[i].point;
        area += (prev.x - cur.x) * (prev.y + cur.y);
        j = i;
    }

    if unsigned {
        (area / 2.0).abs()
    } else {
        area / 2.0
    }
}

/// Polygon area as the sum of edge cross products. Agrees with [`area`].
pub fn area2(vertices: &[Vertex], unsigned: bool) -> f64 {
    let mut area = 0.0;
    let mut j = vertices.len().wrapping_sub(1);

    for i in 0..vertices.len() {
        area += vertices[j].point.cross(vertices[i].point);
        j = i;
    }

    if unsigned {
        (area / 2.0).abs()
    } else {
        area / 2.0
    }
}

/// Area-weighted centroid. Zero-area input yields NaN.
pub fn centre(vertices: &[Vertex]) -> Vec2 {
    let area = area(vertices, false);
    let mut centre = Vec2::ZERO;

    for i in 0..vertices.len() {
        let j = (i + 1) % vertices.len();
        let cur = vertices[i].point;
        let next = vertices[j].point;
        centre += (cur + next) * cur.cross(next);
    }

    centre / (6.0 * area)
}

/// Arithmetic mean of the vertex positions.
pub fn mean(vertices: &[Vertex]) -> Vec2 {
    let sum = vertices.iter().fold(Vec2::ZERO, |acc, v| acc + v.point);
    sum / vertices.len() as f64
}

/// Second moment of area scaled by mass.
///
/// The vertices must already be expressed relative to their centroid.
pub fn inertia(vertices: &[Vertex], mass: f64) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for n in 0..vertices.len() {
        let j = (n + 1) % vertices.len();
        let cur = vertices[n].point;
        let next = vertices[j].point;
        let cross = next.cross(cur).abs();
        numerator += cross * (next.dot(next) + next.dot(cur) + cur.dot(cur));
        denominator += cross;
    }

    (mass / 6.0) * (numerator / denominator)
}

/// Moves every vertex by `vector * scalar`.
pub fn translate(vertices: &mut [Vertex], vector: Vec2, scalar: f64) {
    let delta = vector * scalar;
    for vertex in vertices.iter_mut() {
        vertex.point += delta;
    }
}

/// Rotates every vertex by `angle` about `point`.
pub fn rotate(vertices: &mut [Vertex], angle: f64, point: Vec2) {
    if angle == 0.0 {
        return;
    }

    let (sin, cos) = angle.sin_cos();
    for vertex in vertices.iter_mut() {
        let d = vertex.point - point;
        vertex.point = Vec2::new(
            point.x + (d.x * cos - d.y * sin),
            point.y + (d.x * sin + d.y * cos),
        );
    }
}

/// Scales the vertices about `point`, or about their centroid when `None`.
pub fn scale(vertices: &mut [Vertex], scale_x: f64, scale_y: f64, point: Option<Vec2>) {
    if scale_x == 1.0 && scale_y == 1.0 {
        return;
    }

    let point = point.unwrap_or_else(|| centre(vertices));
    for vertex in vertices.iter_mut() {
        let d = vertex.point - point;
        vertex.point = Vec2::new(point.x + d.x * scale_x, point.y + d.y * scale_y);
    }
}

/// Point-in-convex-polygon test. Points on an edge count as inside.
pub fn contains(vertices: &[Vertex], point: Vec2) -> bool {
    let Some(last) = vertices.last() else {
        return false;
    };

    let mut vertex = last.point;
    for next in vertices {
        let edge = next.point - vertex;
        if (point - vertex).cross(edge) > 0.0 {
            return false;
        }
        vertex = next.point;
    }
    true
}

/// Sorts vertices by polar angle about their mean.
pub fn clockwise_sort(vertices: &mut [Vertex]) {
    let centre = mean(vertices);
    vertices.sort_by(|a, b| centre.angle_to(a.point).total_cmp(&centre.angle_to(b.point)));
}

/// Returns true if the polygon turns the same way at every corner.
/// Degenerate input (fewer than three vertices, or all collinear) is not convex.
pub fn is_convex(vertices: &[Vertex]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut flag = 0u8;
    for i in 0..n {
        let a = vertices[i].point;
        let b = vertices[(i + 1) % n].point;
        let c = vertices[(i + 2) % n].point;
        let z = (b - a).cross(c - b);

        if z < 0.0 {
            flag |= 1;
        } else if z > 0.0 {
            flag |= 2;
        }

        if flag == 3 {
            return false;
        }
    }

    flag != 0
}

/// Convex hull by Andrew's monotone chain. Collinear points are dropped.
pub fn hull(vertices: &[Vertex]) -> Vec<Vertex> {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|a, b| match a.point.x.total_cmp(&b.point.x) {
        Ordering::Equal => a.point.y.total_cmp(&b.point.y),
        other => other,
    });

    let mut lower: Vec<Vertex> = Vec::with_capacity(sorted.len());
    for vertex in &sorted {
        while lower.len() >= 2
            && Vec2::cross3(
                lower[lower.len() - 2].point,
                lower[lower.len() - 1].point,
                vertex.point,
            ) <= 0.0
        {
            lower.pop();
        }
        lower.push(*vertex);
    }

    let mut upper: Vec<Vertex> = Vec::with_capacity(sorted.len());
    for vertex in sorted.iter().rev() {
        while upper.len() >= 2
            && Vec2::cross3(
                upper[upper.len() - 2].point,
                upper[upper.len() - 1].point,
                vertex.point,
            ) <= 0.0
        {
            upper.pop();
        }
        upper.push(*vertex);
    }

    // each chain's last point starts the other chain
    upper.pop();
    lower.pop();

    upper.extend(lower);
    upper
}
