use serde::{Deserialize, Serialize};

use crate::common::{next_id, BodyId, Material};
use crate::geometry::{axes, vertices, Bounds, Vertex};
use crate::math::vec2::Vec2;
use crate::objects::convex::Convex;
use crate::objects::filter::CollisionFilter;
use crate::objects::part::Part;

/// Fixed multiplier applied to the polygon inertia of every body.
pub(crate) const INERTIA_SCALE: f64 = 4.0;

/// Construction options for [`RigidBody::with_options`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    pub label: String,
    /// Initial rotation in radians, applied about the body position.
    pub angle: f64,
    pub density: f64,
    /// Overrides the mass derived from density and area.
    pub mass: Option<f64>,
    /// Overrides the inertia derived from the geometry.
    pub inertia: Option<f64>,
    pub material: Material,
    pub collision_filter: CollisionFilter,
    pub is_static: bool,
    pub is_sensor: bool,
    pub is_sleeping: bool,
    /// Number of consecutive quiet steps before the body falls asleep.
    pub sleep_threshold: u32,
    pub time_scale: f64,
    pub circle_radius: Option<f64>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        BodyOptions {
            label: "Body".to_string(),
            angle: 0.0,
            density: 0.001,
            mass: None,
            inertia: None,
            material: Material::default(),
            collision_filter: CollisionFilter::default(),
            is_static: false,
            is_sensor: false,
            is_sleeping: false,
            sleep_threshold: 60,
            time_scale: 1.0,
            circle_radius: None,
        }
    }
}

/// A positional and angular offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Correction {
    pub offset: Vec2,
    pub angle: f64,
}

impl Correction {
    pub fn is_zero(&self) -> bool {
        self.offset.is_zero() && self.angle == 0.0
    }

    pub fn scaled(&self, factor: f64) -> Correction {
        Correction {
            offset: self.offset * factor,
            angle: self.angle * factor,
        }
    }
}

/// Constraint corrections carried by a body between solver passes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintImpulse {
    /// Decayed correction from the previous pass, replayed before the next solve.
    pub warm_start: Correction,
    /// Correction applied to position/angle during the current pass but not
    /// yet to the geometry.
    pub pending: Correction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StaticSnapshot {
    restitution: f64,
    friction: f64,
    mass: f64,
    inertia: f64,
    density: f64,
    inverse_mass: f64,
    inverse_inertia: f64,
}

/// A rigid convex (or compound) body.
///
/// Vertices live in world space and are moved directly by every mutator.
/// Velocity is never integrated on its own: it is derived each step from
/// `position - position_prev`.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub(crate) id: BodyId,
    pub label: String,

    // Geometry
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) axes: Vec<Vec2>,
    pub(crate) bounds: Bounds,
    pub(crate) circle_radius: Option<f64>,
    /// Convex sub-parts of a compound body. Empty for a simple body.
    pub(crate) parts: Vec<Part>,

    // Kinematic state
    pub(crate) position: Vec2,
    pub(crate) position_prev: Vec2,
    pub(crate) angle: f64,
    pub(crate) angle_prev: f64,
    /// Last velocity written by `integrate`, a setter or the velocity
    /// solver. Only those phases read it; [`RigidBody::velocity`] is the
    /// authoritative value and may differ in between.
    pub(crate) cached_velocity: Vec2,
    pub(crate) cached_angular_velocity: f64,
    pub(crate) speed: f64,
    pub(crate) angular_speed: f64,

    // Dynamics, only changed through the setters
    pub(crate) mass: f64,
    pub(crate) inverse_mass: f64,
    pub(crate) inertia: f64,
    pub(crate) inverse_inertia: f64,
    pub(crate) density: f64,
    pub(crate) area: f64,

    pub material: Material,

    // Accumulators for forces/torques applied during a time step
    pub force: Vec2,
    pub torque: f64,

    // Solver state
    pub(crate) position_impulse: Vec2,
    pub(crate) total_contacts: usize,
    pub(crate) constraint_impulse: ConstraintImpulse,

    // Sleeping
    pub(crate) is_sleeping: bool,
    pub(crate) sleep_counter: u32,
    pub sleep_threshold: u32,
    pub(crate) motion: f64,

    pub(crate) is_static: bool,
    pub is_sensor: bool,
    pub collision_filter: CollisionFilter,
    pub time_scale: f64,

    original: Option<StaticSnapshot>,
}

impl RigidBody {
    /// Creates a body with default options from polygon points.
    ///
    /// The points may be given in any frame; they are recentred so that their
    /// centroid lands on `position`. They must wind counter-clockwise.
    pub fn new(points: &[Vec2], position: Vec2) -> Self {
        Self::with_options(points, position, BodyOptions::default())
    }

    pub fn with_options(points: &[Vec2], position: Vec2, options: BodyOptions) -> Self {
        let mut body = RigidBody {
            id: next_id(),
            label: options.label,
            vertices: Vec::new(),
            axes: Vec::new(),
            bounds: Bounds::empty(),
            circle_radius: options.circle_radius,
            parts: Vec::new(),
            position,
            position_prev: position,
            angle: 0.0,
            angle_prev: 0.0,
            cached_velocity: Vec2::ZERO,
            cached_angular_velocity: 0.0,
            speed: 0.0,
            angular_speed: 0.0,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            density: options.density,
            area: 0.0,
            material: options.material,
            force: Vec2::ZERO,
            torque: 0.0,
            position_impulse: Vec2::ZERO,
            total_contacts: 0,
            constraint_impulse: ConstraintImpulse::default(),
            is_sleeping: false,
            sleep_counter: 0,
            sleep_threshold: options.sleep_threshold,
            motion: 0.0,
            is_static: false,
            is_sensor: options.is_sensor,
            collision_filter: options.collision_filter,
            time_scale: options.time_scale,
            original: None,
        };

        body.set_vertices(points);

        if options.angle != 0.0 {
            body.angle = options.angle;
            body.angle_prev = options.angle;
            vertices::rotate(&mut body.vertices, options.angle, body.position);
            axes::rotate(&mut body.axes, options.angle);
            body.refit_bounds();
        }

        if let Some(mass) = options.mass {
            body.set_mass(mass);
        }
        if let Some(inertia) = options.inertia {
            body.set_inertia(inertia);
        }
        if options.is_static {
            body.set_static(true);
        }
        if options.is_sleeping {
            body.sleep();
        }

        body
    }

    // --- Accessors --- //

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn axes(&self) -> &[Vec2] {
        &self.axes
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_compound(&self) -> bool {
        !self.parts.is_empty()
    }

    pub fn circle_radius(&self) -> Option<f64> {
        self.circle_radius
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn position_prev(&self) -> Vec2 {
        self.position_prev
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn angle_prev(&self) -> f64 {
        self.angle_prev
    }

    /// Displacement over the last step, which is the body's velocity.
    ///
    /// Always derived from `position - position_prev`, so it reflects every
    /// impulse applied so far this step.
    pub fn velocity(&self) -> Vec2 {
        self.position - self.position_prev
    }

    /// Rotation over the last step.
    pub fn angular_velocity(&self) -> f64 {
        self.angle - self.angle_prev
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn angular_speed(&self) -> f64 {
        self.angular_speed
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn inverse_inertia(&self) -> f64 {
        self.inverse_inertia
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }

    pub fn sleep_counter(&self) -> u32 {
        self.sleep_counter
    }

    pub fn motion(&self) -> f64 {
        self.motion
    }

    pub fn position_impulse(&self) -> Vec2 {
        self.position_impulse
    }

    pub fn constraint_impulse(&self) -> &ConstraintImpulse {
        &self.constraint_impulse
    }

    /// Vertices of the root hull (`None`) or of one compound part.
    pub(crate) fn part_vertices(&self, part: Option<usize>) -> &[Vertex] {
        match part {
            None => &self.vertices,
            Some(i) => self.parts.get(i).map_or(&[], |p| p.vertices.as_slice()),
        }
    }

    // --- Mass properties --- //

    /// Sets the mass, rescaling inertia to keep the mass/inertia ratio.
    /// Density follows as `mass / area`.
    pub fn set_mass(&mut self, mass: f64) {
        let moment = self.inertia / (self.mass / 6.0);
        self.inertia = moment * (mass / 6.0);
        self.inverse_inertia = 1.0 / self.inertia;

        self.mass = mass;
        self.inverse_mass = 1.0 / self.mass;
        self.density = self.mass / self.area;
    }

    /// Sets the density and derives mass from the current area.
    pub fn set_density(&mut self, density: f64) {
        self.set_mass(density * self.area);
        self.density = density;
    }

    pub fn set_inertia(&mut self, inertia: f64) {
        self.inertia = inertia;
        self.inverse_inertia = 1.0 / self.inertia;
    }

    /// Replaces the geometry. The points are recentred on the current position
    /// and mass, inertia and bounds are recomputed from them.
    pub fn set_vertices(&mut self, points: &[Vec2]) {
        self.vertices = vertices::create(points, self.id);
        self.axes = axes::from_vertices(&self.vertices);
        self.area = vertices::area(&self.vertices, false);
        self.set_mass(self.density * self.area);

        // inertia must be taken about the centroid
        let centre = vertices::centre(&self.vertices);
        vertices::translate(&mut self.vertices, centre, -1.0);
        self.set_inertia(INERTIA_SCALE * vertices::inertia(&self.vertices, self.mass));
        vertices::translate(&mut self.vertices, self.position, 1.0);

        self.refit_bounds();
    }

    /// Turns this body into a compound of the given bodies.
    ///
    /// With `auto_hull` the root geometry becomes the convex hull of all part
    /// vertices. Mass, area and inertia are summed over the parts and the
    /// position moves to the mass-weighted centre of the parts.
    pub fn set_parts(&mut self, parts: Vec<RigidBody>, auto_hull: bool) {
        self.parts = parts.into_iter().map(Part::from_body).collect();
        if self.parts.is_empty() {
            return;
        }

        if auto_hull {
            let mut all: Vec<Vertex> = self
                .parts
                .iter()
                .flat_map(|p| p.vertices.iter().copied())
                .collect();
            vertices::clockwise_sort(&mut all);
            let hull = vertices::hull(&all);

            self.position = vertices::centre(&hull);
            self.position_prev = self.position;
            self.set_vertices(&vertices::points(&hull));
        }

        let (mass, area, inertia, centre) = self.total_properties();
        self.area = area;
        self.position = centre;
        self.position_prev = centre;
        self.set_mass(mass);
        self.set_inertia(inertia);
        self.refit_bounds();
    }

    fn total_properties(&self) -> (f64, f64, f64, Vec2) {
        let mut mass = 0.0;
        let mut area = 0.0;
        let mut inertia = 0.0;
        let mut centre = Vec2::ZERO;

        for part in &self.parts {
            let m = if self.mass.is_finite() { part.mass } else { 1.0 };
            mass += m;
            area += part.area;
            inertia += part.inertia;
            centre += part.position * m;
        }

        (mass, area, inertia, centre / mass)
    }

    // --- Static / sleeping --- //

    /// Pins or releases the body.
    ///
    /// Pinning stores the current material and mass properties and replaces
    /// them with infinite mass, zero restitution and unit friction. Releasing
    /// restores exactly what was stored.
    pub fn set_static(&mut self, is_static: bool) {
        if is_static {
            if !self.is_static {
                self.original = Some(StaticSnapshot {
                    restitution: self.material.restitution,
                    friction: self.material.friction,
                    mass: self.mass,
                    inertia: self.inertia,
                    density: self.density,
                    inverse_mass: self.inverse_mass,
                    inverse_inertia: self.inverse_inertia,
                });
            }

            self.is_static = true;
            self.material.restitution = 0.0;
            self.material.friction = 1.0;
            self.mass = f64::INFINITY;
            self.inertia = f64::INFINITY;
            self.density = f64::INFINITY;
            self.inverse_mass = 0.0;
            self.inverse_inertia = 0.0;

            self.position_prev = self.position;
            self.angle_prev = self.angle;
            self.cached_velocity = Vec2::ZERO;
            self.cached_angular_velocity = 0.0;
            self.speed = 0.0;
            self.angular_speed = 0.0;
            self.motion = 0.0;
        } else {
            self.is_static = false;
            if let Some(original) = self.original.take() {
                self.material.restitution = original.restitution;
                self.material.friction = original.friction;
                self.mass = original.mass;
                self.inertia = original.inertia;
                self.density = original.density;
                self.inverse_mass = original.inverse_mass;
                self.inverse_inertia = original.inverse_inertia;
            }
        }
    }

    /// Freezes the body in place. Returns true if it was awake.
    pub(crate) fn sleep(&mut self) -> bool {
        let was_sleeping = self.is_sleeping;

        self.is_sleeping = true;
        self.sleep_counter = self.sleep_threshold;
        self.position_impulse = Vec2::ZERO;
        self.position_prev = self.position;
        self.angle_prev = self.angle;
        self.cached_velocity = Vec2::ZERO;
        self.cached_angular_velocity = 0.0;
        self.speed = 0.0;
        self.angular_speed = 0.0;
        self.motion = 0.0;

        !was_sleeping
    }

    /// Returns true if the body was asleep.
    pub(crate) fn wake(&mut self) -> bool {
        let was_sleeping = self.is_sleeping;
        self.is_sleeping = false;
        self.sleep_counter = 0;
        was_sleeping
    }

    // --- Kinematics --- //

    /// Moves the body (and all parts) to `position` without changing velocity.
    pub fn set_position(&mut self, position: Vec2) {
        let delta = position - self.position;
        self.position_prev += delta;
        self.position = position;
        self.translate_geometry(delta);
        self.refit_bounds();
    }

    /// Rotates the body (and all parts) to `angle` without changing angular velocity.
    pub fn set_angle(&mut self, angle: f64) {
        let delta = angle - self.angle;
        self.angle_prev += delta;
        self.angle = angle;
        self.rotate_geometry(delta);
        self.refit_bounds();
    }

    /// Sets the velocity by placing `position_prev` one velocity behind.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.position_prev = self.position - velocity;
        self.cached_velocity = velocity;
        self.speed = velocity.magnitude();
    }

    pub fn set_angular_velocity(&mut self, velocity: f64) {
        self.angle_prev = self.angle - velocity;
        self.cached_angular_velocity = velocity;
        self.angular_speed = velocity.abs();
    }

    /// Moves the centre of mass reference without touching the geometry.
    pub fn set_centre(&mut self, centre: Vec2, relative: bool) {
        if relative {
            self.position_prev += centre;
            self.position += centre;
        } else {
            self.position_prev = centre - (self.position - self.position_prev);
            self.position = centre;
        }
    }

    pub fn translate(&mut self, translation: Vec2) {
        self.set_position(self.position + translation);
    }

    /// Rotates the body by `rotation`, about `point` if given, else about itself.
    pub fn rotate(&mut self, rotation: f64, point: Option<Vec2>) {
        if let Some(point) = point {
            self.set_position(self.position.rotate_about(rotation, point));
        }
        self.set_angle(self.angle + rotation);
    }

    /// Scales the body and all parts about `point` (default: the body position).
    ///
    /// A circle stays a circle only under uniform scaling.
    pub fn scale(&mut self, scale_x: f64, scale_y: f64, point: Option<Vec2>) {
        let point = point.unwrap_or(self.position);

        vertices::scale(&mut self.vertices, scale_x, scale_y, Some(point));
        self.position = Vec2::new(
            point.x + (self.position.x - point.x) * scale_x,
            point.y + (self.position.y - point.y) * scale_y,
        );
        self.position_prev = Vec2::new(
            point.x + (self.position_prev.x - point.x) * scale_x,
            point.y + (self.position_prev.y - point.y) * scale_y,
        );
        self.axes = axes::from_vertices(&self.vertices);
        self.area = vertices::area(&self.vertices, false);

        if !self.is_static {
            self.set_mass(self.density * self.area);
            vertices::translate(&mut self.vertices, self.position, -1.0);
            self.set_inertia(INERTIA_SCALE * vertices::inertia(&self.vertices, self.mass));
            vertices::translate(&mut self.vertices, self.position, 1.0);
        }

        if !self.parts.is_empty() {
            let density = self.density;
            let mut total_area = 0.0;
            let mut total_inertia = 0.0;
            for part in self.parts.iter_mut() {
                part.scale(scale_x, scale_y, point, density);
                total_area += part.area;
                total_inertia += part.inertia;
            }

            self.area = total_area;
            if !self.is_static {
                self.set_mass(density * total_area);
                self.set_inertia(total_inertia);
            }
        }

        self.refit_bounds();

        if let Some(radius) = self.circle_radius {
            self.circle_radius = if scale_x == scale_y {
                Some(radius * scale_x)
            } else {
                None
            };
        }
    }

    // --- Forces --- //

    /// Applies a force at a world point, accumulating force and torque.
    pub fn apply_force(&mut self, point_world: Vec2, force: Vec2) {
        self.force += force;
        let offset = point_world - self.position;
        self.torque += offset.cross(force);
    }

    /// Should be called at the end of each simulation step.
    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    // --- Geometry helpers shared with the solvers --- //

    /// Moves every vertex (root and parts) and every part position by `delta`.
    /// The root position is left to the caller.
    pub(crate) fn translate_geometry(&mut self, delta: Vec2) {
        vertices::translate(&mut self.vertices, delta, 1.0);
        for part in self.parts.iter_mut() {
            part.translate(delta);
        }
    }

    /// Rotates every vertex and axis about the body position and revolves the
    /// parts with it.
    pub(crate) fn rotate_geometry(&mut self, angle: f64) {
        if angle == 0.0 {
            return;
        }
        vertices::rotate(&mut self.vertices, angle, self.position);
        axes::rotate(&mut self.axes, angle);
        let pivot = self.position;
        for part in self.parts.iter_mut() {
            part.rotate_about(angle, pivot);
        }
    }

    /// Recomputes the root and part bounds from scratch.
    pub(crate) fn refit_bounds(&mut self) {
        let velocity = self.cached_velocity;
        self.bounds = Bounds::fit(&self.vertices, velocity);
        for part in self.parts.iter_mut() {
            part.refit_bounds(velocity);
        }
    }
}

impl Convex for RigidBody {
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
