use crate::objects::rigid_body::RigidBody;

/// Advances a body by one step using position-based Verlet integration.
///
/// Velocity is never stored between steps: it is re-derived from
/// `position - position_prev`, damped by the body's friction, scaled by
/// `correction`, and then the accumulated force is added on top.
/// Static and sleeping bodies are left for the caller to skip.
pub fn integrate(body: &mut RigidBody, delta: f64, time_scale: f64, correction: f64) {
    let delta_squared = (delta * time_scale * body.time_scale).powi(2);

    // --- Linear Motion --- //
    let damping = 1.0 - body.material.friction * time_scale * body.time_scale;
    let velocity_prev = body.position - body.position_prev;

    body.cached_velocity =
        velocity_prev * damping * correction + (body.force / body.mass) * delta_squared;
    body.position_prev = body.position;
    body.position += body.cached_velocity;

    // --- Angular Motion --- //
    let angular_velocity_prev = body.angle - body.angle_prev;
    body.cached_angular_velocity = angular_velocity_prev * damping * correction
        + (body.torque / body.inertia) * delta_squared;
    body.angle_prev = body.angle;
    body.angle += body.cached_angular_velocity;

    body.speed = body.cached_velocity.magnitude();
    body.angular_speed = body.cached_angular_velocity.abs();

    // Geometry follows the new state: translate, then rotate about the new position
    let velocity = body.cached_velocity;
    body.translate_geometry(velocity);
    body.rotate_geometry(body.cached_angular_velocity);
    body.refit_bounds();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::math::vec2::Vec2;
    use crate::objects::rigid_body::{BodyOptions, RigidBody};
    const EPSILON: f64 = 1e-9;

    fn frictionless_square() -> RigidBody {
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
        RigidBody::with_options(&points, Vec2::ZERO, options)
    }

    #[test]
    fn test_integrate_linear_motion_no_force() {
        let mut rb = frictionless_square();
        rb.set_velocity(Vec2::new(1.0, -0.5));

        integrate(&mut rb, 1.0, 1.0, 1.0);

        assert!((rb.position().x - 1.0).abs() < EPSILON);
        assert!((rb.position().y + 0.5).abs() < EPSILON);
        assert_eq!(rb.position_prev(), Vec2::ZERO);
        assert_eq!(rb.velocity(), Vec2::new(1.0, -0.5));
        // vertices moved with the body
        assert!((rb.vertices()[0].point.x - 0.0).abs() < EPSILON);
        assert!((rb.vertices()[0].point.y + 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_constant_force_closed_form() {
        let mut rb = frictionless_square();
        let mass = rb.mass();
        let delta = 2.0;

        // x_n = a dt^2 n(n+1)/2 for a force applied every step
        for n in 1..=5 {
            rb.force = Vec2::new(mass * 0.5, 0.0);
            integrate(&mut rb, delta, 1.0, 1.0);
            let expected = 0.5 * delta * delta * (n * (n + 1)) as f64 / 2.0;
            assert!((rb.position().x - expected).abs() < EPSILON);
        }
    }

    #[test]
    fn test_integrate_friction_damps() {
        let mut rb = frictionless_square();
        rb.material.friction = 0.1;
        rb.set_velocity(Vec2::new(10.0, 0.0));

        integrate(&mut rb, 1.0, 1.0, 1.0);

        assert!((rb.velocity().x - 9.0).abs() < EPSILON);
        assert!((rb.speed() - 9.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_correction_scales_velocity() {
        let mut rb = frictionless_square();
        rb.set_velocity(Vec2::new(4.0, 0.0));

        integrate(&mut rb, 1.0, 1.0, 0.5);

        assert!((rb.position().x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_angular_motion() {
        let mut rb = frictionless_square();
        rb.set_angular_velocity(0.1);

        integrate(&mut rb, 1.0, 1.0, 1.0);

        assert!((rb.angle() - 0.1).abs() < EPSILON);
        assert!((rb.angular_speed() - 0.1).abs() < EPSILON);
        let expected = Vec2::new(-1.0, -1.0).rotate(0.1);
        assert!((rb.vertices()[0].point.x - expected.x).abs() < EPSILON);
        assert!((rb.vertices()[0].point.y - expected.y).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_torque() {
        let mut rb = frictionless_square();
        let inertia = rb.inertia();
        rb.torque = inertia * 0.01;

        integrate(&mut rb, 1.0, 1.0, 1.0);

        assert!((rb.angular_velocity() - 0.01).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_body_time_scale() {
        let mut rb = frictionless_square();
        rb.time_scale = 0.5;
        let mass = rb.mass();
        rb.force = Vec2::new(0.0, mass);

        integrate(&mut rb, 2.0, 1.0, 1.0);

        // (2 * 0.5)^2 = 1
        assert!((rb.position().y - 1.0).abs() < EPSILON);
    }
}
