//! Contact resolution: iterative position correction followed by
//! sequential impulses on velocity.
//!
//! Velocity is implicit (`position - position_prev`), so every impulse is
//! applied by moving `position_prev` and `angle_prev`.

use crate::collision::pair::Pair;
use crate::collision::pairs::Pairs;
use crate::math::vec2::Vec2;
use crate::objects::get_mutable_body_pair;
use crate::objects::rigid_body::RigidBody;

const RESTING_THRESH: f64 = 4.0;
const RESTING_THRESH_TANGENT: f64 = 6.0;
const POSITION_DAMPEN: f64 = 0.9;
const POSITION_WARMING: f64 = 0.8;
const FRICTION_NORMAL_MULTIPLIER: f64 = 5.0;

fn is_solvable(pair: &Pair) -> bool {
    pair.is_active && !pair.is_sensor
}

fn is_resting(body: &RigidBody) -> bool {
    body.is_static || body.is_sleeping
}

/// Counts, per body, the active contacts it takes part in.
pub fn pre_solve_position(pairs: &Pairs, bodies: &mut [RigidBody]) {
    for pair in pairs.iter() {
        if !pair.is_active {
            continue;
        }

        let count = pair.active_contacts.len();
        if let Some(body) = bodies.get_mut(pair.body_a) {
            body.total_contacts += count;
        }
        if let Some(body) = bodies.get_mut(pair.body_b) {
            body.total_contacts += count;
        }
    }
}

/// One position iteration: queues a correction on each body's
/// `position_impulse`, split across the contacts it takes part in.
pub fn solve_position(pairs: &mut Pairs, bodies: &mut [RigidBody], time_scale: f64) {
    // separation including corrections already queued this step
    for pair in pairs.iter_mut() {
        if !is_solvable(pair) {
            continue;
        }
        let (Some(a), Some(b)) = (bodies.get(pair.body_a), bodies.get(pair.body_b)) else {
            continue;
        };

        let collision = &pair.collision;
        let offset = b.position_impulse + collision.penetration - a.position_impulse;
        pair.separation = collision.normal.dot(offset);
    }

    for pair in pairs.iter_mut() {
        if !is_solvable(pair) {
            continue;
        }
        let Some((a, b)) = get_mutable_body_pair(bodies, pair.body_a, pair.body_b) else {
            continue;
        };

        let normal = pair.collision.normal;
        let mut impulse = (pair.separation - pair.slop) * time_scale;

        if a.is_static || b.is_static {
            impulse *= 2.0;
        }

        if !is_resting(a) {
            let share = POSITION_DAMPEN / a.total_contacts as f64;
            a.position_impulse += normal * (impulse * share);
        }

        if !is_resting(b) {
            let share = POSITION_DAMPEN / b.total_contacts as f64;
            b.position_impulse -= normal * (impulse * share);
        }
    }
}

/// Applies the queued position corrections to the geometry, keeping
/// velocity unchanged, and carries a decayed part of them into the next step.
pub fn post_solve_position(bodies: &mut [RigidBody]) {
    for body in bodies.iter_mut() {
        body.total_contacts = 0;

        let impulse = body.position_impulse;
        if impulse.is_zero() {
            continue;
        }

        body.position += impulse;
        body.translate_geometry(impulse);
        body.refit_bounds();
        body.position_prev += impulse;

        if impulse.dot(body.cached_velocity) < 0.0 {
            body.position_impulse = Vec2::ZERO;
        } else {
            body.position_impulse = impulse * POSITION_WARMING;
        }
    }
}

/// Replays each active contact's accumulated impulses from the last step.
pub fn pre_solve_velocity(pairs: &Pairs, bodies: &mut [RigidBody]) {
    for pair in pairs.iter() {
        if !is_solvable(pair) {
            continue;
        }
        let Some((a, b)) = get_mutable_body_pair(bodies, pair.body_a, pair.body_b) else {
            continue;
        };

        let normal = pair.collision.normal;
        let tangent = pair.collision.tangent;
        let (part_a, part_b) = (pair.collision.body_a.part, pair.collision.body_b.part);

        for contact in pair.active_contacts() {
            if contact.normal_impulse == 0.0 && contact.tangent_impulse == 0.0 {
                continue;
            }

            let impulse = normal * contact.normal_impulse + tangent * contact.tangent_impulse;
            let point = contact.point(a.part_vertices(part_a), b.part_vertices(part_b));

            if !is_resting(a) {
                let offset = point - a.position;
                a.position_prev += impulse * a.inverse_mass;
                a.angle_prev += offset.cross(impulse) * a.inverse_inertia;
            }

            if !is_resting(b) {
                let offset = point - b.position;
                b.position_prev -= impulse * b.inverse_mass;
                b.angle_prev -= offset.cross(impulse) * b.inverse_inertia;
            }
        }
    }
}

/// One velocity iteration of sequential impulses with Coulomb friction.
///
/// Normal impulses are accumulated per contact and clamped to stay
/// repulsive; tangent impulses are clamped to the friction limit.
pub fn solve_velocity(pairs: &mut Pairs, bodies: &mut [RigidBody], time_scale: f64) {
    let time_scale_squared = time_scale * time_scale;

    for pair in pairs.iter_mut() {
        if !is_solvable(pair) {
            continue;
        }
        let Some((a, b)) = get_mutable_body_pair(bodies, pair.body_a, pair.body_b) else {
            continue;
        };

        let normal = pair.collision.normal;
        let tangent = pair.collision.tangent;
        let contact_share = 1.0 / pair.active_contacts.len() as f64;
        let (part_a, part_b) = (pair.collision.body_a.part, pair.collision.body_b.part);

        a.cached_velocity = a.position - a.position_prev;
        b.cached_velocity = b.position - b.position_prev;
        a.cached_angular_velocity = a.angle - a.angle_prev;
        b.cached_angular_velocity = b.angle - b.angle_prev;

        for id in &pair.active_contacts {
            let Some(contact) = pair.contacts.get_mut(id) else {
                continue;
            };

            let point = contact.point(a.part_vertices(part_a), b.part_vertices(part_b));
            let offset_a = point - a.position;
            let offset_b = point - b.position;
            let velocity_a =
                a.cached_velocity + offset_a.perpendicular() * a.cached_angular_velocity;
            let velocity_b =
                b.cached_velocity + offset_b.perpendicular() * b.cached_angular_velocity;
            let relative = velocity_a - velocity_b;
            let normal_velocity = normal.dot(relative);
            let tangent_velocity = tangent.dot(relative);
            let tangent_speed = tangent_velocity.abs();

            // raw impulses
            let mut normal_impulse = (1.0 + pair.restitution) * normal_velocity;
            let normal_force =
                (pair.separation + normal_velocity).clamp(0.0, 1.0) * FRICTION_NORMAL_MULTIPLIER;

            // coulomb friction
            let mut tangent_impulse = tangent_velocity;
            let mut max_friction = f64::INFINITY;
            if tangent_speed > pair.friction * pair.friction_static * normal_force * time_scale_squared {
                max_friction = tangent_speed;
                tangent_impulse = (pair.friction * tangent_velocity.signum() * time_scale_squared)
                    .clamp(-max_friction, max_friction);
            }

            // effective mass at the contact
            let cross_a = offset_a.cross(normal);
            let cross_b = offset_b.cross(normal);
            let share = contact_share
                / (a.inverse_mass
                    + b.inverse_mass
                    + a.inverse_inertia * cross_a * cross_a
                    + b.inverse_inertia * cross_b * cross_b);
            normal_impulse *= share;
            tangent_impulse *= share;

            if normal_velocity < 0.0 && normal_velocity * normal_velocity > RESTING_THRESH * time_scale_squared {
                // fast approach: no warm start for this contact
                contact.normal_impulse = 0.0;
            } else {
                let accumulated = contact.normal_impulse;
                contact.normal_impulse = (accumulated + normal_impulse).min(0.0);
                normal_impulse = contact.normal_impulse - accumulated;
            }

            if tangent_velocity * tangent_velocity > RESTING_THRESH_TANGENT * time_scale_squared {
                contact.tangent_impulse = 0.0;
            } else {
                let accumulated = contact.tangent_impulse;
                contact.tangent_impulse =
                    (accumulated + tangent_impulse).clamp(-max_friction, max_friction);
                tangent_impulse = contact.tangent_impulse - accumulated;
            }

            let impulse = normal * normal_impulse + tangent * tangent_impulse;

            if !is_resting(a) {
                a.position_prev += impulse * a.inverse_mass;
                a.angle_prev += offset_a.cross(impulse) * a.inverse_inertia;
            }

            if !is_resting(b) {
                b.position_prev -= impulse * b.inverse_mass;
                b.angle_prev -= offset_b.cross(impulse) * b.inverse_inertia;
            }
        }
    }
}
