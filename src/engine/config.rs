use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::math::vec2::Vec2;

/// Gravity direction and strength. The acceleration applied is
/// `(x, y) * scale` per unit of mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gravity {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Gravity {
    pub fn vector(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity {
            x: 0.0,
            y: 1.0,
            scale: 0.001,
        }
    }
}

/// Tunables for an [`Engine`](crate::engine::Engine).
///
/// Missing fields of a partial document take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub position_iterations: usize,
    pub velocity_iterations: usize,
    pub constraint_iterations: usize,
    pub enable_sleeping: bool,
    pub gravity: Gravity,
    pub time_scale: f64,
    /// Step length used by `Engine::step`, in milliseconds.
    pub delta: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            position_iterations: 6,
            velocity_iterations: 4,
            constraint_iterations: 2,
            enable_sleeping: false,
            gravity: Gravity::default(),
            time_scale: 1.0,
            delta: 1000.0 / 60.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.position_iterations == 0
            || self.velocity_iterations == 0
            || self.constraint_iterations == 0
        {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "iteration counts must be at least 1",
            });
        }
        let gravity = self.gravity;
        if !(gravity.x.is_finite() && gravity.y.is_finite() && gravity.scale.is_finite()) {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "gravity must be finite",
            });
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "time scale must be positive and finite",
            });
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "delta must be positive and finite",
            });
        }
        Ok(())
    }
}

/// Simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Accumulated scaled time, in milliseconds.
    pub timestamp: f64,
    pub time_scale: f64,
    pub last_delta: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            timestamp: 0.0,
            time_scale: 1.0,
            last_delta: 0.0,
        }
    }
}
