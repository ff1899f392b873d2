use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::{next_id, BodyId};
use crate::engine::events::Events;
use crate::engine::sleeping;
use crate::error::PhysicsError;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::{Correction, RigidBody};

const WARMING: f64 = 0.4;
const TORQUE_DAMPEN: f64 = 1.0;
const MIN_LENGTH: f64 = 0.000_000_1;

/// Construction options for [`DistanceConstraint`].
///
/// An endpoint without a body is a fixed world point. Body endpoints are
/// offsets from the body position that turn with the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintOptions {
    pub label: String,
    pub body_a: Option<usize>,
    pub point_a: Vec2,
    pub body_b: Option<usize>,
    pub point_b: Vec2,
    /// Rest length. Taken from the current endpoint distance when `None`.
    pub length: Option<f64>,
    /// Defaults to 1 (rigid) for a positive rest length, else 0.7.
    pub stiffness: Option<f64>,
    pub damping: f64,
    pub angular_stiffness: f64,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        ConstraintOptions {
            label: "Constraint".to_string(),
            body_a: None,
            point_a: Vec2::ZERO,
            body_b: None,
            point_b: Vec2::ZERO,
            length: None,
            stiffness: None,
            damping: 0.0,
            angular_stiffness: 0.0,
        }
    }
}

/// A spring or rod keeping two anchor points at a rest length.
///
/// Stiffness of 1 or more corrects the full error in one solve; softer values
/// are scaled by the time scale and converge over iterations and steps.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    pub(crate) id: BodyId,
    pub label: String,
    pub(crate) body_a: Option<usize>,
    pub(crate) body_b: Option<usize>,
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub length: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub angular_stiffness: f64,
    angle_a: f64,
    angle_b: f64,
}

impl DistanceConstraint {
    pub fn new(options: ConstraintOptions, bodies: &[RigidBody]) -> Result<Self, PhysicsError> {
        if options.body_a.is_none() && options.body_b.is_none() {
            return Err(PhysicsError::InvalidConstraint {
                reason: "at least one endpoint must be attached to a body",
            });
        }
        if options.body_a.is_some() && options.body_a == options.body_b {
            return Err(PhysicsError::InvalidConstraint {
                reason: "both endpoints are attached to the same body",
            });
        }

        let lookup = |index: Option<usize>| match index {
            None => Ok(None),
            Some(i) => bodies
                .get(i)
                .map(Some)
                .ok_or(PhysicsError::InvalidBodyIndex {
                    index: i,
                    count: bodies.len(),
                }),
        };
        let body_a = lookup(options.body_a)?;
        let body_b = lookup(options.body_b)?;

        let world = |body: Option<&RigidBody>, point: Vec2| {
            body.map_or(point, |b| b.position + point)
        };
        let length = options.length.unwrap_or_else(|| {
            (world(body_a, options.point_a) - world(body_b, options.point_b)).magnitude()
        });
        if !length.is_finite() || length < 0.0 {
            return Err(PhysicsError::InvalidConstraint {
                reason: "rest length must be finite and non-negative",
            });
        }

        let stiffness = options
            .stiffness
            .unwrap_or(if length > 0.0 { 1.0 } else { 0.7 });

        Ok(DistanceConstraint {
            id: next_id(),
            label: options.label,
            body_a: options.body_a,
            body_b: options.body_b,
            point_a: options.point_a,
            point_b: options.point_b,
            length,
            stiffness,
            damping: options.damping,
            angular_stiffness: options.angular_stiffness,
            angle_a: body_a.map_or(0.0, |b| b.angle),
            angle_b: body_b.map_or(0.0, |b| b.angle),
        })
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn body_a(&self) -> Option<usize> {
        self.body_a
    }

    pub fn body_b(&self) -> Option<usize> {
        self.body_b
    }

    pub fn involves(&self, index: usize) -> bool {
        self.body_a == Some(index) || self.body_b == Some(index)
    }

    /// World position of endpoint A.
    pub fn point_a_world(&self, bodies: &[RigidBody]) -> Vec2 {
        anchor_world(self.body_a, self.point_a, bodies)
    }

    /// World position of endpoint B.
    pub fn point_b_world(&self, bodies: &[RigidBody]) -> Vec2 {
        anchor_world(self.body_b, self.point_b, bodies)
    }

    /// True if either end is a world point or a static body.
    fn is_anchored(&self, bodies: &[RigidBody]) -> bool {
        let fixed = |index: Option<usize>| {
            index.map_or(true, |i| bodies.get(i).map_or(true, |b| b.is_static))
        };
        fixed(self.body_a) || fixed(self.body_b)
    }

    /// Shifts body indices after a body at `removed` has been taken out.
    pub(crate) fn reindex(&mut self, removed: usize) {
        for index in [&mut self.body_a, &mut self.body_b].into_iter().flatten() {
            if *index > removed {
                *index -= 1;
            }
        }
    }

    /// One Gauss-Seidel correction of this constraint.
    ///
    /// Bodies are moved immediately so that later constraints in the same
    /// pass see the corrected state. The applied move is also recorded in
    /// each body's pending constraint correction.
    pub fn solve(&mut self, bodies: &mut [RigidBody], time_scale: f64) {
        let (body_a, body_b) = match bodies_mut(bodies, self.body_a, self.body_b) {
            Ok(pair) => pair,
            Err(index) => {
                warn!(constraint = self.id, index, "constraint body no longer exists, skipping");
                return;
            }
        };
        if body_a.is_none() && body_b.is_none() {
            return;
        }

        // anchors turn with their bodies
        if let Some(body) = body_a.as_deref() {
            if !body.is_static {
                self.point_a = self.point_a.rotate(body.angle - self.angle_a);
                self.angle_a = body.angle;
            }
        }
        if let Some(body) = body_b.as_deref() {
            if !body.is_static {
                self.point_b = self.point_b.rotate(body.angle - self.angle_b);
                self.angle_b = body.angle;
            }
        }

        let point_a_world = body_a.as_deref().map_or(self.point_a, |b| b.position + self.point_a);
        let point_b_world = body_b.as_deref().map_or(self.point_b, |b| b.position + self.point_b);

        let delta = point_a_world - point_b_world;
        let current_length = delta.magnitude().max(MIN_LENGTH);

        let difference = (current_length - self.length) / current_length;
        let stiffness = if self.stiffness < 1.0 {
            self.stiffness * time_scale
        } else {
            self.stiffness
        };
        let force = delta * (difference * stiffness);

        let inverse_mass = |b: &Option<&mut RigidBody>| b.as_deref().map_or(0.0, |b| b.inverse_mass);
        let inverse_inertia =
            |b: &Option<&mut RigidBody>| b.as_deref().map_or(0.0, |b| b.inverse_inertia);
        let mass_total = inverse_mass(&body_a) + inverse_mass(&body_b);
        let inertia_total = inverse_inertia(&body_a) + inverse_inertia(&body_b);
        let resistance_total = mass_total + inertia_total;

        let mut normal = Vec2::ZERO;
        let mut normal_velocity = 0.0;
        if self.damping > 0.0 {
            normal = delta / current_length;
            let velocity = |b: &Option<&mut RigidBody>| {
                b.as_deref().map_or(Vec2::ZERO, |b| b.position - b.position_prev)
            };
            normal_velocity = normal.dot(velocity(&body_b) - velocity(&body_a));
        }

        if let Some(body) = body_a {
            if !body.is_static {
                let share = body.inverse_mass / mass_total;
                let shared = force * share;
                body.constraint_impulse.pending.offset -= shared;
                body.position -= shared;

                if self.damping > 0.0 {
                    body.position_prev -= normal * (self.damping * normal_velocity * share);
                }

                let torque = (self.point_a.cross(force) / resistance_total)
                    * TORQUE_DAMPEN
                    * body.inverse_inertia
                    * (1.0 - self.angular_stiffness);
                body.constraint_impulse.pending.angle -= torque;
                body.angle -= torque;
            }
        }

        if let Some(body) = body_b {
            if !body.is_static {
                let share = body.inverse_mass / mass_total;
                let shared = force * share;
                body.constraint_impulse.pending.offset += shared;
                body.position += shared;

                if self.damping > 0.0 {
                    body.position_prev += normal * (self.damping * normal_velocity * share);
                }

                let torque = (self.point_b.cross(force) / resistance_total)
                    * TORQUE_DAMPEN
                    * body.inverse_inertia
                    * (1.0 - self.angular_stiffness);
                body.constraint_impulse.pending.angle += torque;
                body.angle += torque;
            }
        }
    }
}

fn anchor_world(body: Option<usize>, point: Vec2, bodies: &[RigidBody]) -> Vec2 {
    body.and_then(|i| bodies.get(i))
        .map_or(point, |b| b.position + point)
}

/// Mutable access to the (optional) endpoint bodies. Errs with the first
/// index that does not resolve.
fn bodies_mut(
    bodies: &mut [RigidBody],
    a: Option<usize>,
    b: Option<usize>,
) -> Result<(Option<&mut RigidBody>, Option<&mut RigidBody>), usize> {
    let count = bodies.len();
    for index in [a, b].into_iter().flatten() {
        if index >= count {
            return Err(index);
        }
    }

    match (a, b) {
        (Some(a), Some(b)) => crate::objects::get_mutable_body_pair(bodies, a, b)
            .map(|(a, b)| (Some(a), Some(b)))
            .ok_or(a),
        (Some(a), None) => Ok((bodies.get_mut(a), None)),
        (None, Some(b)) => Ok((None, bodies.get_mut(b))),
        (None, None) => Ok((None, None)),
    }
}

/// Replays last step's decayed constraint correction on every body.
pub fn pre_solve_all(bodies: &mut [RigidBody]) {
    for body in bodies.iter_mut() {
        let warm = body.constraint_impulse.warm_start;
        if body.is_static || warm.is_zero() {
            continue;
        }

        body.position += warm.offset;
        body.angle += warm.angle;
        body.constraint_impulse.pending = warm;
    }
}

/// Solves constraints with a fixed or static end first, then the rest.
pub fn solve_all(constraints: &mut [DistanceConstraint], bodies: &mut [RigidBody], time_scale: f64) {
    for constraint in constraints.iter_mut() {
        if constraint.is_anchored(bodies) {
            constraint.solve(bodies, time_scale);
        }
    }

    for constraint in constraints.iter_mut() {
        if !constraint.is_anchored(bodies) {
            constraint.solve(bodies, time_scale);
        }
    }
}

/// Moves the geometry of every constrained body to match its corrected
/// position and angle, wakes it, and keeps a decayed copy for warm starting.
pub fn post_solve_all(bodies: &mut [RigidBody], events: &mut Events) {
    for body in bodies.iter_mut() {
        let pending = body.constraint_impulse.pending;
        if body.is_static || pending.is_zero() {
            continue;
        }

        sleeping::set(body, false, events);

        body.translate_geometry(pending.offset);
        body.rotate_geometry(pending.angle);
        body.refit_bounds();

        body.constraint_impulse.warm_start = pending.scaled(WARMING);
        body.constraint_impulse.pending = Correction::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::objects::rigid_body::BodyOptions;
    const EPSILON: f64 = 1e-9;

    fn square(position: Vec2) -> RigidBody {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let options = BodyOptions {
            material: Material::new(0.0, 0.0),
            ..BodyOptions::default()
        };
        RigidBody::with_options(&points, position, options)
    }

    fn link(a: usize, b: usize, length: f64, bodies: &[RigidBody]) -> DistanceConstraint {
        let options = ConstraintOptions {
            body_a: Some(a),
            body_b: Some(b),
            length: Some(length),
            ..ConstraintOptions::default()
        };
        DistanceConstraint::new(options, bodies).unwrap()
    }

    #[test]
    fn test_distance_constraint_new() {
        let bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 4.0))];
        let options = ConstraintOptions {
            body_a: Some(0),
            body_b: Some(1),
            ..ConstraintOptions::default()
        };
        let dc = DistanceConstraint::new(options, &bodies).unwrap();

        assert_eq!(dc.body_a(), Some(0));
        assert_eq!(dc.body_b(), Some(1));
        assert!((dc.length - 5.0).abs() < EPSILON);
        assert_eq!(dc.stiffness, 1.0);
    }

    #[test]
    fn test_zero_length_defaults_to_soft() {
        let bodies = vec![square(Vec2::ZERO)];
        let options = ConstraintOptions {
            body_a: Some(0),
            point_b: Vec2::ZERO,
            ..ConstraintOptions::default()
        };
        let dc = DistanceConstraint::new(options, &bodies).unwrap();
        assert_eq!(dc.length, 0.0);
        assert!((dc.stiffness - 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let bodies = vec![square(Vec2::ZERO)];

        let unattached = DistanceConstraint::new(ConstraintOptions::default(), &bodies);
        assert!(matches!(unattached, Err(PhysicsError::InvalidConstraint { .. })));

        let missing = ConstraintOptions {
            body_a: Some(0),
            body_b: Some(3),
            ..ConstraintOptions::default()
        };
        assert_eq!(
            DistanceConstraint::new(missing, &bodies),
            Err(PhysicsError::InvalidBodyIndex { index: 3, count: 1 })
        );

        let same = ConstraintOptions {
            body_a: Some(0),
            body_b: Some(0),
            ..ConstraintOptions::default()
        };
        assert!(DistanceConstraint::new(same, &bodies).is_err());
    }

    #[test]
    fn test_solve_stretch() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0))];
        let mut constraint = link(0, 1, 5.0, &bodies);

        constraint.solve(&mut bodies, 1.0);

        // equal masses share the 2 unit error evenly
        assert!((bodies[0].position().x + 1.0).abs() < EPSILON);
        assert!((bodies[1].position().x - 4.0).abs() < EPSILON);
        assert!((bodies[0].position().distance(bodies[1].position()) - 5.0).abs() < EPSILON);
        assert!((bodies[0].constraint_impulse().pending.offset.x + 1.0).abs() < EPSILON);
        assert!((bodies[1].constraint_impulse().pending.offset.x - 1.0).abs() < EPSILON);
        // centred anchors apply no torque
        assert_eq!(bodies[0].angle(), 0.0);
    }

    #[test]
    fn test_solve_compress() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(6.0, 0.0))];
        let mut constraint = link(0, 1, 4.0, &bodies);

        constraint.solve(&mut bodies, 1.0);

        assert!((bodies[0].position().x - 1.0).abs() < EPSILON);
        assert!((bodies[1].position().x - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_solve_one_static() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0))];
        bodies[0].set_static(true);
        let mut constraint = link(0, 1, 5.0, &bodies);

        constraint.solve(&mut bodies, 1.0);

        assert_eq!(bodies[0].position(), Vec2::ZERO);
        assert!((bodies[1].position().x - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_solve_world_anchor() {
        let mut bodies = vec![square(Vec2::new(0.0, 10.0))];
        let options = ConstraintOptions {
            point_a: Vec2::ZERO,
            body_b: Some(0),
            length: Some(4.0),
            ..ConstraintOptions::default()
        };
        let mut constraint = DistanceConstraint::new(options, &bodies).unwrap();

        constraint.solve(&mut bodies, 1.0);
        assert!((bodies[0].position().y - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_soft_constraint_is_partial() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0))];
        let mut constraint = link(0, 1, 5.0, &bodies);
        constraint.stiffness = 0.5;

        constraint.solve(&mut bodies, 1.0);

        let distance = bodies[0].position().distance(bodies[1].position());
        assert!((distance - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_offset_anchor_applies_torque() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(6.0, 0.0))];
        let options = ConstraintOptions {
            body_a: Some(0),
            point_a: Vec2::new(0.0, 1.0),
            body_b: Some(1),
            length: Some(4.0),
            ..ConstraintOptions::default()
        };
        let mut constraint = DistanceConstraint::new(options, &bodies).unwrap();

        constraint.solve(&mut bodies, 1.0);
        assert!(bodies[0].angle() != 0.0);
        assert_eq!(bodies[0].angle(), bodies[0].constraint_impulse().pending.angle);
    }

    #[test]
    fn test_post_solve_moves_geometry_and_warms() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0))];
        let mut constraints = vec![link(0, 1, 5.0, &bodies)];
        let mut events = Events::new();

        pre_solve_all(&mut bodies);
        solve_all(&mut constraints, &mut bodies, 1.0);
        post_solve_all(&mut bodies, &mut events);

        assert!((bodies[0].vertices()[0].point.x + 2.0).abs() < EPSILON);
        assert!((bodies[1].bounds().max.x - 5.0).abs() < EPSILON);
        let impulse = bodies[0].constraint_impulse();
        assert!(impulse.pending.is_zero());
        assert!((impulse.warm_start.offset.x + 0.4).abs() < EPSILON);

        // the warm start is replayed before the next solve
        pre_solve_all(&mut bodies);
        assert!((bodies[0].position().x + 1.4).abs() < EPSILON);
        assert!((bodies[0].constraint_impulse().pending.offset.x + 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_reindex() {
        let bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0)), square(Vec2::new(6.0, 0.0))];
        let mut constraint = link(0, 2, 6.0, &bodies);

        constraint.reindex(1);
        assert_eq!(constraint.body_a(), Some(0));
        assert_eq!(constraint.body_b(), Some(1));
        assert!(constraint.involves(1));
    }

    #[test]
    fn test_solve_skips_missing_body() {
        let mut bodies = vec![square(Vec2::ZERO), square(Vec2::new(3.0, 0.0))];
        let mut constraint = link(0, 1, 5.0, &bodies);
        bodies.pop();

        constraint.solve(&mut bodies, 1.0);
        assert_eq!(bodies[0].position(), Vec2::ZERO);
    }
}
