use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Decides which bodies may collide.
///
/// Bodies sharing a non-zero `group` always collide when the group is
/// positive and never collide when it is negative. Otherwise each body's
/// `mask` must accept the other body's `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
    pub group: i32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        CollisionFilter {
            category: 0x0001,
            mask: 0xFFFF_FFFF,
            group: 0,
        }
    }
}

impl CollisionFilter {
    pub fn new(category: u32, mask: u32, group: i32) -> Self {
        CollisionFilter {
            category,
            mask,
            group,
        }
    }
}

/// Returns true if bodies with these filters are allowed to collide.
pub fn can_collide(a: &CollisionFilter, b: &CollisionFilter) -> bool {
    if a.group == b.group && a.group != 0 {
        return a.group > 0;
    }

    (a.mask & b.category) != 0 && (b.mask & a.category) != 0
}

static NEXT_COLLIDING_GROUP: AtomicI32 = AtomicI32::new(1);
static NEXT_NON_COLLIDING_GROUP: AtomicI32 = AtomicI32::new(-1);
static NEXT_CATEGORY: AtomicU32 = AtomicU32::new(0x0001);

/// Allocates a fresh group. Non-colliding groups count down from -1,
/// colliding groups count up from 1.
pub fn next_group(non_colliding: bool) -> i32 {
    if non_colliding {
        NEXT_NON_COLLIDING_GROUP.fetch_sub(1, Ordering::Relaxed)
    } else {
        NEXT_COLLIDING_GROUP.fetch_add(1, Ordering::Relaxed)
    }
}

/// Allocates the next category bit. The first call returns `0x0002`.
pub fn next_category() -> u32 {
    let previous = NEXT_CATEGORY
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some(c << 1))
        .unwrap_or_else(|c| c);
    previous << 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_collide() {
        let a = CollisionFilter::default();
        let b = CollisionFilter::default();
        assert!(can_collide(&a, &b));
    }

    #[test]
    fn test_same_positive_group_always_collides() {
        let a = CollisionFilter::new(0x0002, 0x0000, 3);
        let b = CollisionFilter::new(0x0004, 0x0000, 3);
        assert!(can_collide(&a, &b));
    }

    #[test]
    fn test_same_negative_group_never_collides() {
        let a = CollisionFilter::new(0x0001, 0xFFFF_FFFF, -2);
        let b = CollisionFilter::new(0x0001, 0xFFFF_FFFF, -2);
        assert!(!can_collide(&a, &b));
    }

    #[test]
    fn test_mask_must_accept_both_ways() {
        let a = CollisionFilter::new(0x0002, 0x0004, 0);
        let b = CollisionFilter::new(0x0004, 0x0001, 0);
        assert!(!can_collide(&a, &b));

        let c = CollisionFilter::new(0x0004, 0x0002, 0);
        assert!(can_collide(&a, &c));
    }

    #[test]
    fn test_different_groups_fall_back_to_masks() {
        let a = CollisionFilter::new(0x0001, 0xFFFF_FFFF, 1);
        let b = CollisionFilter::new(0x0001, 0xFFFF_FFFF, -1);
        assert!(can_collide(&a, &b));
    }

    #[test]
    fn test_group_allocators() {
        let a = next_group(false);
        let b = next_group(false);
        assert!(a > 0 && b > a);

        let c = next_group(true);
        let d = next_group(true);
        assert!(c < 0 && d < c);
    }

    #[test]
    fn test_next_category_is_single_bit() {
        let category = next_category();
        assert_eq!(category.count_ones(), 1);
        assert!(category > 1);
    }
}
