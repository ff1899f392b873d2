use std::collections::HashMap;
use std::fmt;

use crate::collision::contact::Contact;
use crate::collision::sat::Collision;
use crate::common::BodyId;
use crate::objects::rigid_body::RigidBody;

/// Canonical identity of two colliding shapes, lower id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairId {
    pub low: BodyId,
    pub high: BodyId,
}

impl PairId {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a < b {
            PairId { low: a, high: b }
        } else {
            PairId { low: b, high: a }
        }
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.low == id || self.high == id
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}B{}", self.low, self.high)
    }
}

/// Persistent record of two shapes in contact.
///
/// Material properties are combined from the two root bodies, so a part of a
/// compound body collides with its parent's friction and restitution.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub(crate) id: PairId,
    /// Index of the root body owning shape A.
    pub(crate) body_a: usize,
    /// Index of the root body owning shape B.
    pub(crate) body_b: usize,
    pub(crate) collision: Collision,
    pub(crate) contacts: HashMap<usize, Contact>,
    pub(crate) active_contacts: Vec<usize>,
    pub(crate) separation: f64,
    pub(crate) is_active: bool,
    pub(crate) confirmed_active: bool,
    pub(crate) is_sensor: bool,
    pub(crate) time_created: f64,
    pub(crate) time_updated: f64,
    pub(crate) inverse_mass: f64,
    pub(crate) friction: f64,
    pub(crate) friction_static: f64,
    pub(crate) restitution: f64,
    pub(crate) slop: f64,
}

impl Pair {
    pub fn new(collision: Collision, bodies: &[RigidBody], timestamp: f64) -> Self {
        let body_a = collision.body_a.body;
        let body_b = collision.body_b.body;
        let is_sensor = bodies.get(body_a).is_some_and(|b| b.is_sensor)
            || bodies.get(body_b).is_some_and(|b| b.is_sensor);

        let mut pair = Pair {
            id: collision.pair_id(),
            body_a,
            body_b,
            collision: collision.clone(),
            contacts: HashMap::new(),
            active_contacts: Vec::with_capacity(2),
            separation: 0.0,
            is_active: true,
            confirmed_active: true,
            is_sensor,
            time_created: timestamp,
            time_updated: timestamp,
            inverse_mass: 0.0,
            friction: 0.0,
            friction_static: 0.0,
            restitution: 0.0,
            slop: 0.0,
        };
        pair.update(collision, bodies, timestamp);
        pair
    }

    /// Takes this step's collision, refreshes the combined material and
    /// rebuilds the active contact list, creating contacts on first sight.
    pub fn update(&mut self, collision: Collision, bodies: &[RigidBody], timestamp: f64) {
        self.body_a = collision.body_a.body;
        self.body_b = collision.body_b.body;

        if let (Some(a), Some(b)) = (bodies.get(self.body_a), bodies.get(self.body_b)) {
            self.inverse_mass = a.inverse_mass + b.inverse_mass;
            self.friction = a.material.friction.min(b.material.friction);
            self.friction_static = a.material.friction_static.max(b.material.friction_static);
            self.restitution = a.material.restitution.max(b.material.restitution);
            self.slop = a.material.slop.max(b.material.slop);
        }

        self.active_contacts.clear();
        for support in &collision.supports {
            let id = Contact::id(support, collision.vertex_count_a);
            self.contacts
                .entry(id)
                .and_modify(|c| {
                    c.vertex = support.vertex;
                    c.on_a = support.on_a;
                })
                .or_insert_with(|| Contact::new(support));
            self.active_contacts.push(id);
        }

        self.separation = collision.depth;
        self.collision = collision;
        self.set_active(true, timestamp);
    }

    pub fn set_active(&mut self, is_active: bool, timestamp: f64) {
        if is_active {
            self.is_active = true;
            self.time_updated = timestamp;
        } else {
            self.is_active = false;
            self.active_contacts.clear();
        }
    }

    pub fn id(&self) -> PairId {
        self.id
    }

    /// Root body indices of the two sides.
    pub fn bodies(&self) -> (usize, usize) {
        (self.body_a, self.body_b)
    }

    pub fn collision(&self) -> &Collision {
        &self.collision
    }

    pub fn contact(&self, id: usize) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    /// Contacts touched this step, in support order.
    pub fn active_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.active_contacts
            .iter()
            .filter_map(|id| self.contacts.get(id))
    }

    pub fn separation(&self) -> f64 {
        self.separation
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    pub fn time_created(&self) -> f64 {
        self.time_created
    }

    pub fn time_updated(&self) -> f64 {
        self.time_updated
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn friction_static(&self) -> f64 {
        self.friction_static
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn slop(&self) -> f64 {
        self.slop
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }
}
