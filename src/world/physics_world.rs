use tracing::{debug, warn};

use crate::common::BodyId;
use crate::constraints::{ConstraintOptions, DistanceConstraint};
use crate::error::PhysicsError;
use crate::geometry::bounds::Bounds;
use crate::objects::rigid_body::RigidBody;

/// The flat list of bodies and constraints a simulation steps over.
///
/// Bodies are addressed by their index in the list. Removing a body shifts
/// every later index down by one; constraints are reindexed to match.
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    bodies: Vec<RigidBody>,
    constraints: Vec<DistanceConstraint>,
}

impl PhysicsWorld {
    /// Creates a new, empty physics world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rigid body to the world and returns its index.
    ///
    /// A body whose id is already present is not added again; the existing
    /// index is returned instead.
    pub fn add_body(&mut self, body: RigidBody) -> usize {
        if let Some(index) = self.find_body(body.id()) {
            warn!(body = body.id(), index, "body is already in the world, skipping");
            return index;
        }

        let index = self.bodies.len();
        debug!(body = body.id(), index, label = %body.label, "body added");
        self.bodies.push(body);
        index
    }

    /// Builds a constraint between bodies already in the world and returns
    /// its index.
    pub fn add_constraint(&mut self, options: ConstraintOptions) -> Result<usize, PhysicsError> {
        let constraint = DistanceConstraint::new(options, &self.bodies)?;
        let index = self.constraints.len();
        debug!(
            constraint = constraint.id(),
            body_a = ?constraint.body_a(),
            body_b = ?constraint.body_b(),
            length = constraint.length,
            "constraint added"
        );
        self.constraints.push(constraint);
        Ok(index)
    }

    /// Takes a body out of the world along with every constraint attached to
    /// it. Returns `None` for an unknown index.
    pub fn remove_body(&mut self, index: usize) -> Option<RigidBody> {
        if index >= self.bodies.len() {
            warn!(index, count = self.bodies.len(), "no body at index, nothing removed");
            return None;
        }

        let body = self.bodies.remove(index);
        let before = self.constraints.len();
        self.constraints.retain(|c| !c.involves(index));
        for constraint in self.constraints.iter_mut() {
            constraint.reindex(index);
        }

        debug!(
            body = body.id(),
            index,
            constraints_removed = before - self.constraints.len(),
            "body removed"
        );
        Some(body)
    }

    /// Removes a constraint by index.
    pub fn remove_constraint(&mut self, index: usize) -> Option<DistanceConstraint> {
        if index >= self.constraints.len() {
            warn!(index, count = self.constraints.len(), "no constraint at index, nothing removed");
            return None;
        }
        Some(self.constraints.remove(index))
    }

    pub fn body(&self, index: usize) -> Result<&RigidBody, PhysicsError> {
        let count = self.bodies.len();
        self.bodies
            .get(index)
            .ok_or(PhysicsError::InvalidBodyIndex { index, count })
    }

    pub fn body_mut(&mut self, index: usize) -> Result<&mut RigidBody, PhysicsError> {
        let count = self.bodies.len();
        self.bodies
            .get_mut(index)
            .ok_or(PhysicsError::InvalidBodyIndex { index, count })
    }

    /// Index of the body with the given id.
    pub fn find_body(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id() == id)
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [RigidBody] {
        &mut self.bodies
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut [DistanceConstraint] {
        &mut self.constraints
    }

    /// Borrows both lists at once, as the step needs.
    pub(crate) fn split_mut(&mut self) -> (&mut [RigidBody], &mut [DistanceConstraint]) {
        (&mut self.bodies, &mut self.constraints)
    }

    /// The box covering every body, or `None` for an empty world.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bodies = self.bodies.iter();
        let mut bounds = *bodies.next()?.bounds();
        for body in bodies {
            bounds.merge(body.bounds());
        }
        Some(bounds)
    }

    /// Removes every body and constraint.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec2::Vec2;
    const EPSILON: f64 = 1e-9;

    fn square(position: Vec2) -> RigidBody {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        RigidBody::new(&points, position)
    }

    fn link(a: usize, b: usize) -> ConstraintOptions {
        ConstraintOptions {
            body_a: Some(a),
            body_b: Some(b),
            ..ConstraintOptions::default()
        }
    }

    #[test]
    fn test_world_new() {
        let world = PhysicsWorld::new();
        assert!(world.bodies().is_empty());
        assert!(world.constraints().is_empty());
        assert!(world.bounds().is_none());
    }

    #[test]
    fn test_add_body() {
        let mut world = PhysicsWorld::new();
        let idx1 = world.add_body(square(Vec2::ZERO));
        let idx2 = world.add_body(square(Vec2::new(5.0, 0.0)));
        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(world.bodies().len(), 2);
    }

    #[test]
    fn test_add_duplicate_body_returns_existing_index() {
        let mut world = PhysicsWorld::new();
        let body = square(Vec2::ZERO);
        let copy = body.clone();
        world.add_body(square(Vec2::new(5.0, 0.0)));
        let idx = world.add_body(body);

        assert_eq!(world.add_body(copy), idx);
        assert_eq!(world.bodies().len(), 2);
    }

    #[test]
    fn test_add_constraints() {
        let mut world = PhysicsWorld::new();
        world.add_body(square(Vec2::ZERO));
        world.add_body(square(Vec2::new(3.0, 4.0)));

        let idx = world.add_constraint(link(0, 1)).unwrap();
        assert_eq!(idx, 0);
        assert!((world.constraints()[0].length - 5.0).abs() < EPSILON);

        let err = world.add_constraint(link(0, 7)).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidBodyIndex { index: 7, count: 2 });
        assert_eq!(world.constraints().len(), 1);
    }

    #[test]
    fn test_remove_body_reindexes_constraints() {
        let mut world = PhysicsWorld::new();
        for i in 0..4 {
            world.add_body(square(Vec2::new(3.0 * i as f64, 0.0)));
        }
        world.add_constraint(link(0, 1)).unwrap();
        world.add_constraint(link(2, 3)).unwrap();
        let removed_id = world.bodies()[1].id();

        let removed = world.remove_body(1).unwrap();
        assert_eq!(removed.id(), removed_id);
        assert_eq!(world.bodies().len(), 3);
        assert_eq!(world.constraints().len(), 1);
        assert_eq!(world.constraints()[0].body_a(), Some(1));
        assert_eq!(world.constraints()[0].body_b(), Some(2));
    }

    #[test]
    fn test_remove_unknown_body() {
        let mut world = PhysicsWorld::new();
        world.add_body(square(Vec2::ZERO));
        assert!(world.remove_body(3).is_none());
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_body_lookup() {
        let mut world = PhysicsWorld::new();
        world.add_body(square(Vec2::ZERO));

        assert!(world.body(0).is_ok());
        assert_eq!(
            world.body(1).unwrap_err(),
            PhysicsError::InvalidBodyIndex { index: 1, count: 1 }
        );
        world.body_mut(0).unwrap().set_position(Vec2::new(1.0, 1.0));
        assert_eq!(world.body(0).unwrap().position(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_world_bounds() {
        let mut world = PhysicsWorld::new();
        world.add_body(square(Vec2::ZERO));
        world.add_body(square(Vec2::new(10.0, 5.0)));

        let bounds = world.bounds().unwrap();
        assert!((bounds.min.x + 1.0).abs() < EPSILON);
        assert!((bounds.min.y + 1.0).abs() < EPSILON);
        assert!((bounds.max.x - 11.0).abs() < EPSILON);
        assert!((bounds.max.y - 6.0).abs() < EPSILON);
    }
}
