use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Twice the signed area of the screen-space triangle (a, b, c).
/// Positive when the triangle winds clockwise on a y-down screen.
#[inline(always)]
pub fn signed_area_x2(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> f32 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Barycentric weights of `p` with respect to triangle (v1, v2, v3).
///
/// Returns `None` for a degenerate triangle.
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    v3: Point2<f32>,
) -> Option<Vector3<f32>> {
    let area = signed_area_x2(v1, v2, v3);
    if area.abs() < EPSILON {
        return None;
    }
    let inv_area = 1.0 / area;

    let beta = signed_area_x2(v1, p, v3) * inv_area;
    let gamma = signed_area_x2(v1, v2, p) * inv_area;
    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// Re-weights screen-space barycentrics by the clip-space `w` of each corner
/// so attributes interpolate correctly under perspective.
pub fn perspective_correct_barycentric(
    bary: Vector3<f32>,
    w1: f32,
    w2: f32,
    w3: f32,
) -> Option<Vector3<f32>> {
    let inv = |w: f32| if w.abs() > EPSILON { 1.0 / w } else { 1.0 };
    let weighted = Vector3::new(bary.x * inv(w1), bary.y * inv(w2), bary.z * inv(w3));

    let sum = weighted.x + weighted.y + weighted.z;
    if sum.abs() < EPSILON {
        return None;
    }
    Some(weighted / sum)
}
