use nalgebra::{Point3, Vector3};

/// A fixed-function light source.
///
/// Each light carries separate ambient, diffuse and specular colors, the way
/// the fixed-function lighting equation consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Infinitely far away; all rays are parallel to `direction`.
    Directional {
        /// Direction the light travels.
        direction: Vector3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
    },
    /// Radiates in all directions from `position`.
    Point {
        position: Point3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        /// Attenuation coefficients: (constant, linear, quadratic)
        attenuation: (f32, f32, f32),
    },
}

impl Light {
    /// Directional light whose ambient is 0.4x and specular 0.6x its color.
    pub fn new_directional(direction: Vector3<f32>, color: Vector3<f32>) -> Self {
        Self::Directional {
            direction: direction.normalize(),
            ambient: color * 0.4,
            diffuse: color,
            specular: color * 0.6,
        }
    }

    /// Point light with the same color split as `new_directional`.
    pub fn new_point(position: Point3<f32>, color: Vector3<f32>) -> Self {
        Self::Point {
            position,
            ambient: color * 0.4,
            diffuse: color,
            specular: color * 0.6,
            attenuation: (1.0, 0.09, 0.032),
        }
    }

    /// Unit vector from the surface point towards the light.
    pub fn direction_to_light(&self, surface_point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Light::Directional { direction, .. } => -direction,
            Light::Point { position, .. } => (position - surface_point).normalize(),
        }
    }

    /// Distance falloff at `surface_point`; always 1 for directional lights.
    pub fn attenuation_at(&self, surface_point: &Point3<f32>) -> f32 {
        match self {
            Light::Directional { .. } => 1.0,
            Light::Point {
                position,
                attenuation: (c, l, q),
                ..
            } => {
                let d = (position - surface_point).norm();
                1.0 / (c + l * d + q * d * d).max(1e-6)
            }
        }
    }

    pub fn ambient(&self) -> Vector3<f32> {
        match self {
            Light::Directional { ambient, .. } | Light::Point { ambient, .. } => *ambient,
        }
    }

    pub fn diffuse(&self) -> Vector3<f32> {
        match self {
            Light::Directional { diffuse, .. } | Light::Point { diffuse, .. } => *diffuse,
        }
    }

    pub fn specular(&self) -> Vector3<f32> {
        match self {
            Light::Directional { specular, .. } | Light::Point { specular, .. } => *specular,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn directional_light_points_against_travel_direction() {
        let light = Light::new_directional(Vector3::new(1.0, -1.0, 1.0), Vector3::new(1.0, 1.0, 1.0));
        let to_light = light.direction_to_light(&Point3::origin());
        assert_relative_eq!(to_light, Vector3::new(-1.0, 1.0, -1.0).normalize(), epsilon = 1e-6);
        assert_relative_eq!(light.ambient(), Vector3::new(0.4, 0.4, 0.4));
        assert_relative_eq!(light.specular(), Vector3::new(0.6, 0.6, 0.6));
    }

    #[test]
    fn point_light_attenuates_with_distance() {
        let light = Light::new_point(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let near = light.attenuation_at(&Point3::new(1.0, 0.0, 0.0));
        let far = light.attenuation_at(&Point3::new(10.0, 0.0, 0.0));
        assert!(near > far);
    }
}
