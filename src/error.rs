//! Error type for the fallible edges of the engine.
//!
//! The simulation step itself never fails; only lookups, constraint
//! creation, configuration and shape construction return `Result`.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhysicsError {
    /// Body index is out of range.
    InvalidBodyIndex {
        /// The index that was provided
        index: usize,
        /// Number of bodies in the world
        count: usize,
    },
    /// A constraint cannot be built as requested.
    InvalidConstraint { reason: &'static str },
    /// A configuration value is out of its valid range.
    InvalidConfiguration { reason: &'static str },
    /// Polygon input cannot form a body.
    InvalidGeometry { reason: &'static str },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBodyIndex { index, count } => {
                write!(f, "body index {index} out of range (count={count})")
            }
            Self::InvalidConstraint { reason } => write!(f, "invalid constraint: {reason}"),
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
            Self::InvalidGeometry { reason } => write!(f, "invalid geometry: {reason}"),
        }
    }
}

impl std::error::Error for PhysicsError {}
