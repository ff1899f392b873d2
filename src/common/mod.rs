//! Shared identifiers and material data.

use std::sync::atomic::{AtomicU32, Ordering};

pub mod material;

pub use material::Material;

/// Process-wide identifier for bodies, parts and constraints.
pub type BodyId = u32;

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Hands out the next free id. Ids start at 0 and only grow until reset.
pub fn next_id() -> BodyId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Restarts id allocation at 0 so a scene can be rebuilt with identical ids.
///
/// Bodies created before the reset keep their ids; mixing them with bodies
/// created afterwards can produce duplicates.
pub fn reset_ids() {
    NEXT_ID.store(0, Ordering::Relaxed);
}
