use crate::core::color;
use nalgebra::Vector3;

/// Fixed-function lighting material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub emissive: Vector3<f32>,
    /// Specular exponent.
    pub power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(
            Vector3::new(0.8, 0.8, 0.8),
            Vector3::new(0.8, 0.8, 0.8),
            Vector3::zeros(),
            Vector3::zeros(),
            0.0,
        )
    }
}

impl Material {
    pub fn new(
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        emissive: Vector3<f32>,
        power: f32,
    ) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            emissive,
            power,
        }
    }

    /// Ambient, diffuse and specular all set to `color`, no emission, power 2.
    /// This is the material the wireframe overlay is drawn with.
    pub fn solid(color: Vector3<f32>) -> Self {
        Self::new(color, color, color, Vector3::zeros(), 2.0)
    }

    pub fn yellow() -> Self {
        Self::solid(color::yellow())
    }

    /// Mesh assets author no ambient term; ambient mirrors diffuse.
    pub fn with_ambient_from_diffuse(mut self) -> Self {
        self.ambient = self.diffuse;
        self
    }
}
