use crate::scene::mesh::Mesh;
use nalgebra::Point3;

/// Translates the mesh so its bounding box is centered at the origin and
/// scales it so the farthest vertex lies at `radius`.
///
/// Returns the original center and the scaling factor used.
pub fn normalize_and_center_mesh(mesh: &mut Mesh, radius: f32) -> (Point3<f32>, f32) {
    let Some(first) = mesh.vertices.first() else {
        return (Point3::origin(), 1.0);
    };

    let mut min_bound = first.position;
    let mut max_bound = first.position;
    for vertex in &mesh.vertices {
        min_bound = min_bound.inf(&vertex.position);
        max_bound = max_bound.sup(&vertex.position);
    }
    let center = nalgebra::center(&min_bound, &max_bound);

    let max_distance = mesh
        .vertices
        .iter()
        .map(|v| (v.position - center).norm())
        .fold(0.0f32, f32::max);
    let scale = if max_distance > 1e-6 {
        radius / max_distance
    } else {
        1.0
    };

    for vertex in &mut mesh.vertices {
        vertex.position = Point3::from((vertex.position - center) * scale);
    }

    (center, scale)
}
