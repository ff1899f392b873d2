pub mod collision;
pub mod common;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{Collision, Pair, PairId, Pairs};
pub use common::{next_id, reset_ids, BodyId, Material};
pub use constraints::{ConstraintOptions, DistanceConstraint};
pub use engine::{Engine, EngineConfig, Event, EventKind, Events, Gravity, HandlerId, Timing};
pub use error::PhysicsError;
pub use geometry::{Bounds, Vertex};
pub use math::vec2::Vec2;
pub use objects::{BodyOptions, CollisionFilter, RigidBody};
pub use world::PhysicsWorld;
