use crate::core::color;
use crate::core::geometry::Vertex;
use crate::core::math::transform::normal_matrix;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::scene::light::Light;
use crate::scene::material::Material;
use crate::scene::texture::{SamplerState, Texture};
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Lit colors and texture coordinates, interpolated Gouraud-style.
#[derive(Clone, Copy, Debug)]
pub struct FixedFunctionVarying {
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Add for FixedFunctionVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            diffuse: self.diffuse + other.diffuse,
            specular: self.specular + other.specular,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for FixedFunctionVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            diffuse: self.diffuse * scalar,
            specular: self.specular * scalar,
            uv: self.uv * scalar,
        }
    }
}

impl Interpolatable for FixedFunctionVarying {
    fn get_uv(&self) -> Option<Vector2<f32>> {
        Some(self.uv)
    }
}

/// Render states the lighting equation depends on.
#[derive(Debug, Clone, Copy)]
pub struct LightingState {
    pub lighting: bool,
    pub specular: bool,
    pub normalize_normals: bool,
    /// Global ambient light, added on top of per-light ambient.
    pub ambient: Vector3<f32>,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            lighting: true,
            specular: false,
            normalize_normals: false,
            ambient: Vector3::zeros(),
        }
    }
}

/// Per-vertex lighting with texture modulation, built from the device's
/// bound state for one draw call.
pub struct FixedFunctionShader<'a> {
    world: Matrix4<f32>,
    view_projection: Matrix4<f32>,
    world_normal: Matrix3<f32>,
    eye: Point3<f32>,
    lights: Vec<&'a Light>,
    material: &'a Material,
    texture: Option<&'a Texture>,
    sampler: SamplerState,
    state: LightingState,
}

impl<'a> FixedFunctionShader<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        world: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
        lights: Vec<&'a Light>,
        material: &'a Material,
        texture: Option<&'a Texture>,
        sampler: SamplerState,
        state: LightingState,
    ) -> Self {
        // Camera position is the translation of the inverse view.
        let eye = view
            .try_inverse()
            .map(|inv| Point3::new(inv[(0, 3)], inv[(1, 3)], inv[(2, 3)]))
            .unwrap_or_else(Point3::origin);

        Self {
            world,
            view_projection: projection * view,
            world_normal: normal_matrix(&world),
            eye,
            lights,
            material,
            texture,
            sampler,
            state,
        }
    }

    fn light_vertex(&self, position: &Point3<f32>, normal: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
        let m = self.material;
        let mut diffuse = m.emissive + self.state.ambient.component_mul(&m.ambient);
        let mut specular = Vector3::zeros();
        let view_dir = (self.eye - position).try_normalize(1e-12).unwrap_or_else(Vector3::zeros);

        for light in &self.lights {
            let to_light = light.direction_to_light(position);
            let attenuation = light.attenuation_at(position);

            diffuse += light.ambient().component_mul(&m.ambient) * attenuation;

            let n_dot_l = normal.dot(&to_light);
            if n_dot_l <= 0.0 {
                continue;
            }
            diffuse += light.diffuse().component_mul(&m.diffuse) * (n_dot_l * attenuation);

            if self.state.specular {
                let halfway = (to_light + view_dir).try_normalize(1e-12).unwrap_or(to_light);
                let n_dot_h = normal.dot(&halfway).max(0.0);
                let spec = if m.power > 0.0 { n_dot_h.powf(m.power) } else { 1.0 };
                specular += light.specular().component_mul(&m.specular) * (spec * attenuation);
            }
        }

        (color::saturate(diffuse), color::saturate(specular))
    }
}

impl Shader for FixedFunctionShader<'_> {
    type Varying = FixedFunctionVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let world_pos = self.world * vertex.position.to_homogeneous();
        let clip_pos = self.view_projection * world_pos;

        let (diffuse, specular) = if self.state.lighting {
            let position = Point3::from(world_pos.xyz());
            let mut normal = self.world_normal * vertex.normal;
            if self.state.normalize_normals {
                normal = normal.try_normalize(1e-12).unwrap_or(normal);
            }
            self.light_vertex(&position, &normal)
        } else {
            (color::white(), Vector3::zeros())
        };

        (
            clip_pos,
            FixedFunctionVarying {
                diffuse,
                specular,
                uv: vertex.texcoord,
            },
        )
    }

    fn fragment(&self, varying: Self::Varying, uv_density: f32) -> Vector3<f32> {
        let base = match self.texture {
            Some(texture) => {
                let texel = texture.sample(varying.uv, uv_density, &self.sampler);
                varying.diffuse.component_mul(&texel)
            }
            None => varying.diffuse,
        };
        if self.state.specular {
            color::saturate(base + varying.specular)
        } else {
            color::saturate(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::TransformFactory;
    use approx::assert_relative_eq;
    use image::{DynamicImage, Rgb, RgbImage};

    fn vertex_facing_camera() -> Vertex {
        // Camera sits on -Z looking towards +Z; this normal points back at it.
        Vertex::new(Point3::origin(), -Vector3::z(), Vector2::new(0.5, 0.5))
    }

    fn camera() -> (Matrix4<f32>, Matrix4<f32>) {
        let view = TransformFactory::view(
            &Point3::new(0.0, 0.0, -15.0),
            &Point3::origin(),
            &Vector3::y(),
        );
        let projection = TransformFactory::perspective(4.0 / 3.0, std::f32::consts::FRAC_PI_2, 1.0, 1000.0);
        (view, projection)
    }

    #[test]
    fn head_on_light_gives_full_diffuse_plus_ambient() {
        let (view, projection) = camera();
        let light = Light::new_directional(Vector3::z(), Vector3::new(1.0, 1.0, 1.0));
        let material = Material::solid(Vector3::new(0.5, 0.25, 0.0));
        let shader = FixedFunctionShader::new(
            Matrix4::identity(),
            view,
            projection,
            vec![&light],
            &material,
            None,
            SamplerState::default(),
            LightingState::default(),
        );

        let (_, varying) = shader.vertex(&vertex_facing_camera());
        // 0.4 ambient + 1.0 diffuse, times the material color.
        assert_relative_eq!(varying.diffuse, Vector3::new(0.7, 0.35, 0.0), epsilon = 1e-5);
        assert_eq!(varying.specular, Vector3::zeros());
    }

    #[test]
    fn unlit_vertices_are_white() {
        let (view, projection) = camera();
        let material = Material::default();
        let shader = FixedFunctionShader::new(
            Matrix4::identity(),
            view,
            projection,
            Vec::new(),
            &material,
            None,
            SamplerState::default(),
            LightingState {
                lighting: false,
                ..LightingState::default()
            },
        );
        let (_, varying) = shader.vertex(&vertex_facing_camera());
        assert_eq!(shader.fragment(varying, 0.0), color::white());
    }

    #[test]
    fn specular_highlight_is_added_after_texture() {
        let (view, projection) = camera();
        let light = Light::new_directional(Vector3::z(), Vector3::new(1.0, 1.0, 1.0));
        let material = Material::solid(Vector3::new(0.5, 0.5, 0.5));
        let black = Texture::from_image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            2,
            2,
            Rgb([0, 0, 0]),
        )));
        let shader = FixedFunctionShader::new(
            Matrix4::identity(),
            view,
            projection,
            vec![&light],
            &material,
            Some(&black),
            SamplerState::default(),
            LightingState {
                specular: true,
                ..LightingState::default()
            },
        );

        let (_, varying) = shader.vertex(&vertex_facing_camera());
        let c = shader.fragment(varying, 0.0);
        // Black texture kills diffuse; the highlight (0.6 * 0.5) survives.
        assert_relative_eq!(c, Vector3::new(0.3, 0.3, 0.3), epsilon = 1e-5);
    }

    #[test]
    fn light_behind_surface_leaves_only_ambient() {
        let (view, projection) = camera();
        let light = Light::new_directional(-Vector3::z(), Vector3::new(1.0, 1.0, 1.0));
        let material = Material::solid(Vector3::new(1.0, 1.0, 1.0));
        let shader = FixedFunctionShader::new(
            Matrix4::identity(),
            view,
            projection,
            vec![&light],
            &material,
            None,
            SamplerState::default(),
            LightingState::default(),
        );
        let (_, varying) = shader.vertex(&vertex_facing_camera());
        assert_relative_eq!(varying.diffuse, Vector3::new(0.4, 0.4, 0.4), epsilon = 1e-5);
    }
}
