//! Factories for common body shapes.
//!
//! Every factory builds its outline around the origin and hands it to
//! [`RigidBody::with_options`], which recentres it on `position`.

use std::f64::consts::PI;

use tracing::debug;

use crate::error::PhysicsError;
use crate::geometry::vertices;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::{BodyOptions, RigidBody};

const CIRCLE_MIN_SIDES: f64 = 10.0;
const CIRCLE_MAX_SIDES: f64 = 25.0;

/// Gives a body built by a factory a descriptive label unless the caller
/// chose one.
fn labelled(mut options: BodyOptions, label: &str) -> BodyOptions {
    if options.label == BodyOptions::default().label {
        options.label = label.to_string();
    }
    options
}

/// An axis-aligned `width` × `height` box centred on `position`.
pub fn rectangle(position: Vec2, width: f64, height: f64, options: BodyOptions) -> RigidBody {
    let points = [
        Vec2::new(0.0, 0.0),
        Vec2::new(width, 0.0),
        Vec2::new(width, height),
        Vec2::new(0.0, height),
    ];
    RigidBody::with_options(&points, position, labelled(options, "Rectangle Body"))
}

/// A trapezoid whose top edge is narrowed by `slope` on both sides.
///
/// A slope of 1 or more collapses the top edge into a triangle.
pub fn trapezoid(
    position: Vec2,
    width: f64,
    height: f64,
    slope: f64,
    options: BodyOptions,
) -> RigidBody {
    let slope = slope * 0.5;
    let roof = (1.0 - slope * 2.0) * width;

    let x1 = width * slope;
    let x2 = x1 + roof;
    let x3 = x2 + x1;

    let points: Vec<Vec2> = if slope < 0.5 {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(x1, -height),
            Vec2::new(x2, -height),
            Vec2::new(x3, 0.0),
        ]
    } else {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(x2, -height),
            Vec2::new(x3, 0.0),
        ]
    };

    RigidBody::with_options(&points, position, labelled(options, "Trapezoid Body"))
}

/// A regular polygon with `sides` corners on a circle of `radius`.
///
/// Fewer than three sides gives a [`circle`] instead.
pub fn polygon(position: Vec2, sides: usize, radius: f64, options: BodyOptions) -> RigidBody {
    if sides < 3 {
        return circle(position, radius, options);
    }

    let theta = 2.0 * PI / sides as f64;
    let offset = theta * 0.5;

    let points: Vec<Vec2> = (0..sides)
        .map(|i| {
            let angle = offset + i as f64 * theta;
            Vec2::new(round3(angle.cos() * radius), round3(angle.sin() * radius))
        })
        .collect();

    RigidBody::with_options(&points, position, labelled(options, "Polygon Body"))
}

/// A circle approximated by an even-sided polygon. The body remembers the
/// true radius.
pub fn circle(position: Vec2, radius: f64, options: BodyOptions) -> RigidBody {
    let mut sides = radius.min(CIRCLE_MAX_SIDES).max(CIRCLE_MIN_SIDES).ceil() as usize;
    if sides % 2 == 1 {
        sides += 1;
    }

    let options = BodyOptions {
        circle_radius: Some(radius),
        ..labelled(options, "Circle Body")
    };
    polygon(position, sides, radius, options)
}

/// A body from an arbitrary outline.
///
/// Clockwise outlines are reversed and concave ones are replaced by their
/// convex hull.
pub fn from_vertices(
    position: Vec2,
    points: &[Vec2],
    options: BodyOptions,
) -> Result<RigidBody, PhysicsError> {
    if points.len() < 3 {
        return Err(PhysicsError::InvalidGeometry {
            reason: "a body needs at least 3 vertices",
        });
    }
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(PhysicsError::InvalidGeometry {
            reason: "vertices must be finite",
        });
    }

    let mut outline = vertices::create(points, 0);
    if !vertices::is_convex(&outline) {
        debug!(points = points.len(), "outline is not convex, using its hull");
        outline = vertices::hull(&outline);
    } else if vertices::area(&outline, false) < 0.0 {
        outline.reverse();
    }

    if outline.len() < 3 || vertices::area(&outline, true) == 0.0 {
        return Err(PhysicsError::InvalidGeometry {
            reason: "outline has no area",
        });
    }

    Ok(RigidBody::with_options(
        &vertices::points(&outline),
        position,
        options,
    ))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
