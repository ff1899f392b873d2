use std::cmp::Ordering;

use crate::collision::sat::{collides, Collision, PartRef};
use crate::objects::convex::Convex;
use crate::objects::filter::can_collide;
use crate::objects::rigid_body::RigidBody;

/// Sweep-and-prune broad phase feeding the SAT narrow phase.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    /// Body indices sorted by left bound, reused between steps.
    order: Vec<usize>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds every overlapping shape pair among `bodies`.
    ///
    /// Bodies are swept along x by `(bounds.min.x, id)`. Candidates must also
    /// overlap on y, must not both be static or asleep, and must pass their
    /// collision filters. The order of the result is not meaningful.
    pub fn collisions(&mut self, bodies: &[RigidBody]) -> Vec<Collision> {
        let mut collisions = Vec::new();

        self.order.clear();
        self.order.extend(0..bodies.len());
        self.order.sort_by(|&a, &b| {
            let (a, b) = (&bodies[a], &bodies[b]);
            match a.bounds.min.x.total_cmp(&b.bounds.min.x) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            }
        });

        for (i, &index_a) in self.order.iter().enumerate() {
            let body_a = &bodies[index_a];
            let bounds_a = body_a.bounds;
            let resting_a = body_a.is_static || body_a.is_sleeping;

            for &index_b in &self.order[i + 1..] {
                let body_b = &bodies[index_b];
                let bounds_b = body_b.bounds;

                if bounds_b.min.x > bounds_a.max.x {
                    break;
                }

                if bounds_a.max.y < bounds_b.min.y || bounds_a.min.y > bounds_b.max.y {
                    continue;
                }

                if resting_a && (body_b.is_static || body_b.is_sleeping) {
                    continue;
                }

                if !can_collide(&body_a.collision_filter, &body_b.collision_filter) {
                    continue;
                }

                collide_parts(body_a, index_a, body_b, index_b, &mut collisions);
            }
        }

        collisions
    }
}

/// Runs SAT on every part combination of two bodies whose bounds overlap.
/// A simple body stands in as its own single part.
fn collide_parts(
    body_a: &RigidBody,
    index_a: usize,
    body_b: &RigidBody,
    index_b: usize,
    collisions: &mut Vec<Collision>,
) {
    if !body_a.is_compound() && !body_b.is_compound() {
        if let Some(collision) = collides(body_a, PartRef::root(index_a), body_b, PartRef::root(index_b)) {
            collisions.push(collision);
        }
        return;
    }

    for (shape_a, ref_a) in shapes(body_a, index_a) {
        for (shape_b, ref_b) in shapes(body_b, index_b) {
            if !shape_a.bounds().overlaps(shape_b.bounds()) {
                continue;
            }
            if let Some(collision) = collides(shape_a, ref_a, shape_b, ref_b) {
                collisions.push(collision);
            }
        }
    }
}

fn shapes(body: &RigidBody, index: usize) -> Vec<(&dyn Convex, PartRef)> {
    if body.is_compound() {
        body.parts
            .iter()
            .enumerate()
            .map(|(i, part)| (part as &dyn Convex, PartRef::part(index, i)))
            .collect()
    } else {
        vec![(body as &dyn Convex, PartRef::root(index))]
    }
}
