use crate::collision::sat::Support;
use crate::geometry::vertices::Vertex;
use crate::math::vec2::Vec2;

/// A persistent contact point with its accumulated impulses.
///
/// The impulses survive from step to step while the contact stays active and
/// are replayed as the solver's starting guess. The vertex is recorded as
/// it was at detection; [`Contact::point`] reads where it is now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub vertex: Vertex,
    /// True if the vertex belongs to shape A of the pair.
    pub on_a: bool,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
}

impl Contact {
    pub fn new(support: &Support) -> Self {
        Contact {
            vertex: support.vertex,
            on_a: support.on_a,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }

    /// Current world position of the vertex, looked up by index in the
    /// geometry of the side it belongs to.
    ///
    /// Falls back to the detected position if the index is out of range.
    pub fn point(&self, vertices_a: &[Vertex], vertices_b: &[Vertex]) -> Vec2 {
        let vertices = if self.on_a { vertices_a } else { vertices_b };
        vertices
            .get(self.vertex.index)
            .map_or(self.vertex.point, |v| v.point)
    }

    /// Stable identity of a support point within its pair: A's vertices keep
    /// their index, B's are offset past the end of A's list.
    pub fn id(support: &Support, vertex_count_a: usize) -> usize {
        if support.on_a {
            support.vertex.index
        } else {
            vertex_count_a + support.vertex.index
        }
    }
}
