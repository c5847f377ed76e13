use nalgebra::{Point3, Vector2, Vector3};

/// A single mesh vertex: position, normal, one set of texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// Squared distance between the non-positional attributes of two vertices.
    /// Used to pick the closest wedge when vertices share a position.
    pub fn attribute_distance_squared(&self, other: &Vertex) -> f32 {
        (self.normal - other.normal).norm_squared()
            + (self.texcoord - other.texcoord).norm_squared()
    }
}
