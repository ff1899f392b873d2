use std::collections::BTreeMap;

use tracing::trace;

use crate::collision::pair::{Pair, PairId};
use crate::collision::sat::Collision;
use crate::objects::rigid_body::RigidBody;

/// Registry of every live pair plus this step's start/active/end lists.
///
/// Pairs are keyed and iterated by [`PairId`], which keeps solver order
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Pairs {
    table: BTreeMap<PairId, Pair>,
    collision_start: Vec<PairId>,
    collision_active: Vec<PairId>,
    collision_end: Vec<PairId>,
    /// Pairs that ended this step and left the table, kept until the next
    /// update so the end list still resolves.
    ended: Vec<Pair>,
}

impl Pairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds this step's collisions into the registry.
    ///
    /// A pair that was active but is not seen again is deactivated and ends.
    /// It is dropped unless one of its bodies is asleep, in which case it
    /// stays so that waking up does not lose the contact history. A dropped
    /// pair still resolves through [`Pairs::resolve`] until the next update.
    pub fn update(&mut self, collisions: Vec<Collision>, bodies: &[RigidBody], timestamp: f64) {
        self.collision_start.clear();
        self.collision_active.clear();
        self.collision_end.clear();
        self.ended.clear();

        for pair in self.table.values_mut() {
            pair.confirmed_active = false;
        }

        for collision in collisions {
            let id = collision.pair_id();
            match self.table.get_mut(&id) {
                Some(pair) => {
                    if pair.is_active {
                        self.collision_active.push(id);
                    } else {
                        self.collision_start.push(id);
                    }
                    pair.update(collision, bodies, timestamp);
                    pair.confirmed_active = true;
                }
                None => {
                    self.table.insert(id, Pair::new(collision, bodies, timestamp));
                    self.collision_start.push(id);
                }
            }
        }

        let mut stale = Vec::new();
        for (id, pair) in self.table.iter_mut() {
            if pair.is_active && !pair.confirmed_active {
                pair.set_active(false, timestamp);
                self.collision_end.push(*id);

                let sleeping = |index: usize| bodies.get(index).is_some_and(|b| b.is_sleeping);
                if !sleeping(pair.body_a) && !sleeping(pair.body_b) {
                    stale.push(*id);
                }
            }
        }

        for id in &stale {
            if let Some(pair) = self.table.remove(id) {
                self.ended.push(pair);
            }
        }

        trace!(
            start = self.collision_start.len(),
            active = self.collision_active.len(),
            end = self.collision_end.len(),
            removed = stale.len(),
            "pairs updated"
        );
    }

    /// Drops every pair touching the body at `index` and shifts the indices
    /// of bodies after it down by one.
    pub fn remove_body(&mut self, index: usize) {
        let untouched = |pair: &Pair| pair.body_a != index && pair.body_b != index;
        self.table.retain(|_, pair| untouched(&*pair));
        self.ended.retain(|pair| untouched(pair));

        let shift = |i: &mut usize| {
            if *i > index {
                *i -= 1;
            }
        };
        for pair in self.table.values_mut().chain(self.ended.iter_mut()) {
            shift(&mut pair.body_a);
            shift(&mut pair.body_b);
            shift(&mut pair.collision.body_a.body);
            shift(&mut pair.collision.body_b.body);
        }

        let (table, ended) = (&self.table, &self.ended);
        for list in [
            &mut self.collision_start,
            &mut self.collision_active,
            &mut self.collision_end,
        ] {
            list.retain(|id| table.contains_key(id) || ended.iter().any(|p| p.id == *id));
        }
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.collision_start.clear();
        self.collision_active.clear();
        self.collision_end.clear();
        self.ended.clear();
    }

    pub fn get(&self, id: &PairId) -> Option<&Pair> {
        self.table.get(id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pair> {
        self.table.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pair> {
        self.table.values_mut()
    }

    pub fn collision_start(&self) -> &[PairId] {
        &self.collision_start
    }

    pub fn collision_active(&self) -> &[PairId] {
        &self.collision_active
    }

    pub fn collision_end(&self) -> &[PairId] {
        &self.collision_end
    }

    /// Resolves a list of ids to pairs, including those that ended and were
    /// dropped during the last update.
    pub fn resolve(&self, ids: &[PairId]) -> Vec<&Pair> {
        ids.iter()
            .filter_map(|id| {
                self.table
                    .get(id)
                    .or_else(|| self.ended.iter().find(|pair| pair.id == *id))
            })
            .collect()
    }
}
