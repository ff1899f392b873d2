pub mod distance_constraint;

// Re-export the constraint types for easier access
pub use distance_constraint::{
    post_solve_all, pre_solve_all, solve_all, ConstraintOptions, DistanceConstraint,
};
