use crate::common::BodyId;
use crate::geometry::{Bounds, Vertex};
use crate::math::vec2::Vec2;

/// Read-only view of one convex polygon in world space.
///
/// A simple body is its own convex shape; a compound body exposes each of
/// its parts separately.
pub trait Convex {
    fn id(&self) -> BodyId;
    fn position(&self) -> Vec2;
    fn vertices(&self) -> &[Vertex];
    fn axes(&self) -> &[Vec2];
    fn bounds(&self) -> &Bounds;
}
