use crate::geometry::vertices::Vertex;
use crate::math::vec2::Vec2;

/// Computes one unit edge normal per polygon edge, collapsing parallel edges.
///
/// Normals point outward for counter-clockwise winding. Edges whose normals
/// share a gradient (rounded to three decimals) produce a single axis; the
/// axis keeps the slot of the first such edge and the direction of the last.
pub fn from_vertices(vertices: &[Vertex]) -> Vec<Vec2> {
    let mut keys: Vec<String> = Vec::with_capacity(vertices.len());
    let mut axes: Vec<Vec2> = Vec::with_capacity(vertices.len());

    for i in 0..vertices.len() {
        let cur = vertices[i].point;
        let next = vertices[(i + 1) % vertices.len()].point;
        let normal = Vec2::new(next.y - cur.y, cur.x - next.x).normalize();
        // `+ 0.0` folds -0.0 into 0.0 so both format to the same key
        let gradient = if normal.y == 0.0 {
            f64::INFINITY
        } else {
            normal.x / normal.y + 0.0
        };
        let key = format!("{:.3}", gradient);

        match keys.iter().position(|k| *k == key) {
            Some(slot) => axes[slot] = normal,
            None => {
                keys.push(key);
                axes.push(normal);
            }
        }
    }

    axes
}

/// Rotates every axis by `angle` about the origin.
pub fn rotate(axes: &mut [Vec2], angle: f64) {
    if angle == 0.0 {
        return;
    }

    for axis in axes.iter_mut() {
        *axis = axis.rotate(angle);
    }
}
