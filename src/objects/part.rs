use crate::common::BodyId;
use crate::geometry::{axes, vertices, Bounds, Vertex};
use crate::math::vec2::Vec2;
use crate::objects::convex::Convex;
use crate::objects::rigid_body::{RigidBody, INERTIA_SCALE};

/// One convex piece of a compound body.
///
/// Parts carry their own geometry and mass properties but no kinematic state;
/// they move with their parent body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub(crate) id: BodyId,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) axes: Vec<Vec2>,
    pub(crate) bounds: Bounds,
    pub(crate) position: Vec2,
    pub(crate) angle: f64,
    pub(crate) area: f64,
    pub(crate) mass: f64,
    pub(crate) inertia: f64,
}

impl Part {
    /// Takes over the geometry and mass properties of a standalone body.
    pub fn from_body(body: RigidBody) -> Self {
        Part {
            id: body.id,
            vertices: body.vertices,
            axes: body.axes,
            bounds: body.bounds,
            position: body.position,
            angle: body.angle,
            area: body.area,
            mass: body.mass,
            inertia: body.inertia,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        vertices::translate(&mut self.vertices, delta, 1.0);
    }

    /// Rotates the part about its parent's position.
    pub(crate) fn rotate_about(&mut self, angle: f64, pivot: Vec2) {
        if angle == 0.0 {
            return;
        }
        self.angle += angle;
        vertices::rotate(&mut self.vertices, angle, pivot);
        axes::rotate(&mut self.axes, angle);
        self.position = self.position.rotate_about(angle, pivot);
    }

    pub(crate) fn refit_bounds(&mut self, velocity: Vec2) {
        self.bounds = Bounds::fit(&self.vertices, velocity);
    }

    /// Scales the part about `point` and recomputes its mass properties.
    pub(crate) fn scale(&mut self, scale_x: f64, scale_y: f64, point: Vec2, density: f64) {
        vertices::scale(&mut self.vertices, scale_x, scale_y, Some(point));
        self.position = Vec2::new(
            point.x + (self.position.x - point.x) * scale_x,
            point.y + (self.position.y - point.y) * scale_y,
        );

        self.axes = axes::from_vertices(&self.vertices);
        self.area = vertices::area(&self.vertices, false);
        self.mass = density * self.area;

        vertices::translate(&mut self.vertices, self.position, -1.0);
        self.inertia = INERTIA_SCALE * vertices::inertia(&self.vertices, self.mass);
        vertices::translate(&mut self.vertices, self.position, 1.0);
    }
}

impl Convex for Part {
    fn id(&self) -> BodyId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn axes(&self) -> &[Vec2] {
        &self.axes
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}
