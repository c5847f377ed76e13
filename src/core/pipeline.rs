use crate::core::geometry::Vertex;
use nalgebra::{Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Per-vertex data that can be linearly interpolated across a triangle.
///
/// `Send + Sync` because fragments are shaded from rayon workers.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
    /// UV coordinates, if the varying carries them. Used for mip selection.
    fn get_uv(&self) -> Option<Vector2<f32>> {
        None
    }
}

/// Programmable stages of the pipeline.
///
/// The fixed-function device builds one shader per draw call from its bound
/// state, so implementations hold references to material and texture rather
/// than receiving them per fragment.
pub trait Shader: Send + Sync {
    type Varying: Interpolatable;

    /// Transforms a vertex into homogeneous clip space and produces its varying.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Computes the final color of a fragment.
    ///
    /// `uv_density` estimates texels per screen pixel for the whole triangle
    /// (sqrt(Area_uv / Area_screen)); 0.0 means unknown.
    fn fragment(&self, varying: Self::Varying, uv_density: f32) -> Vector3<f32>;
}
