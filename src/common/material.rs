//! Defines physical material properties.

use serde::{Deserialize, Serialize};

/// Surface properties of a rigid body.
///
/// `friction` also damps a body's own motion every integration step.
///
/// When two bodies touch, friction takes the smaller of the two values while
/// static friction, restitution and slop take the larger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    /// 0 = perfectly inelastic (no bounce), 1 = perfectly elastic.
    pub restitution: f64,
    /// Kinetic friction coefficient. Range [0, infinity).
    pub friction: f64,
    /// Static friction multiplier, applied on top of `friction`.
    pub friction_static: f64,
    /// Penetration depth tolerated at rest before correction kicks in.
    pub slop: f64,
}

impl Material {
    /// Creates a material with the given restitution and friction and default
    /// values for the rest.
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            // Clamp values to reasonable ranges
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
            ..Material::default()
        }
    }

    pub fn with_friction_static(mut self, friction_static: f64) -> Self {
        self.friction_static = friction_static.max(0.0);
        self
    }

    pub fn with_slop(mut self, slop: f64) -> Self {
        self.slop = slop.max(0.0);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Material {
            restitution: 0.0,
            friction: 0.1,
            friction_static: 0.5,
            slop: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_new_clamps() {
        let m = Material::new(1.5, -0.2);
        assert_eq!(m.restitution, 1.0);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.friction_static, 0.5);
    }

    #[test]
    fn test_material_builders() {
        let m = Material::default()
            .with_friction_static(2.0)
            .with_slop(-1.0);
        assert_eq!(m.friction_static, 2.0);
        assert_eq!(m.slop, 0.0);
    }

    #[test]
    fn test_material_partial_json() {
        let m: Material = serde_json::from_str(r#"{ "restitution": 0.8 }"#).unwrap();
        assert_eq!(m.restitution, 0.8);
        assert_eq!(m.friction, 0.1);
        assert_eq!(m.slop, 0.05);
    }
}
