//! A fixed-function rendering device on top of the software rasterizer.
//!
//! The device holds the pipeline state that draw calls consume: transforms,
//! lights, the current material and texture, sampler and render states.
//! Each draw call builds a [`FixedFunctionShader`] from that state.

use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::Vertex;
use crate::core::rasterizer::{CullMode, FillMode};
use crate::error::DeviceInitError;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::fixed_function::{FixedFunctionShader, LightingState};
use crate::scene::light::Light;
use crate::scene::material::Material;
use crate::scene::texture::{SamplerState, Texture};
use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use std::sync::Arc;

/// Number of light slots the device exposes.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    World,
    View,
    Projection,
}

/// A single render state assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderState {
    Lighting(bool),
    Specular(bool),
    NormalizeNormals(bool),
    Ambient(Vector3<f32>),
    FillMode(FillMode),
    CullMode(CullMode),
}

pub struct Device {
    renderer: Renderer,
    world: Matrix4<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    lights: [Option<Light>; MAX_LIGHTS],
    enabled: [bool; MAX_LIGHTS],
    material: Material,
    texture: Option<Arc<Texture>>,
    sampler: SamplerState,
    lighting: LightingState,
    in_scene: bool,
    back_buffer: Vec<u32>,
}

impl Device {
    /// Creates a device with a `width` x `height` back buffer, supersampled
    /// `sample_count` x `sample_count` per pixel.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Result<Self, DeviceInitError> {
        if width == 0 || height == 0 {
            return Err(DeviceInitError::InvalidSize { width, height });
        }
        if sample_count == 0 {
            return Err(DeviceInitError::InvalidSampleCount(sample_count));
        }
        debug!("Creating device: {width}x{height}, {sample_count}x{sample_count} SSAA");

        Ok(Self {
            renderer: Renderer::new(width, height, sample_count),
            world: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            lights: Default::default(),
            enabled: [false; MAX_LIGHTS],
            material: Material::default(),
            texture: None,
            sampler: SamplerState::default(),
            lighting: LightingState::default(),
            in_scene: false,
            back_buffer: vec![0; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.renderer.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.renderer.framebuffer.height
    }

    pub fn set_transform(&mut self, state: TransformState, matrix: Matrix4<f32>) {
        match state {
            TransformState::World => self.world = matrix,
            TransformState::View => self.view = matrix,
            TransformState::Projection => self.projection = matrix,
        }
    }

    pub fn transform(&self, state: TransformState) -> Matrix4<f32> {
        match state {
            TransformState::World => self.world,
            TransformState::View => self.view,
            TransformState::Projection => self.projection,
        }
    }

    /// Stores a light in slot `index`. Slots past [`MAX_LIGHTS`] are ignored.
    pub fn set_light(&mut self, index: usize, light: Light) {
        match self.lights.get_mut(index) {
            Some(slot) => *slot = Some(light),
            None => warn!("Light slot {index} out of range, ignoring"),
        }
    }

    /// Enables or disables the light in slot `index`. Enabling an empty slot has no effect.
    pub fn light_enable(&mut self, index: usize, enable: bool) {
        if let Some(flag) = self.enabled.get_mut(index) {
            *flag = enable;
        }
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn set_sampler_state(&mut self, sampler: SamplerState) {
        self.sampler = sampler;
    }

    pub fn set_render_state(&mut self, state: RenderState) {
        match state {
            RenderState::Lighting(on) => self.lighting.lighting = on,
            RenderState::Specular(on) => self.lighting.specular = on,
            RenderState::NormalizeNormals(on) => self.lighting.normalize_normals = on,
            RenderState::Ambient(color) => self.lighting.ambient = color,
            RenderState::FillMode(mode) => self.renderer.rasterizer.set_fill_mode(mode),
            RenderState::CullMode(mode) => self.renderer.rasterizer.set_cull_mode(mode),
        }
    }

    pub fn lighting_state(&self) -> LightingState {
        self.lighting
    }

    pub fn fill_mode(&self) -> FillMode {
        self.renderer.rasterizer.fill_mode
    }

    /// Clears the selected planes of the render target.
    pub fn clear(&mut self, color: Option<Vector3<f32>>, depth: Option<f32>) {
        self.renderer.clear(color, depth);
    }

    /// Opens a scene. Returns false if a scene is already open.
    pub fn begin_scene(&mut self) -> bool {
        if self.in_scene {
            return false;
        }
        self.in_scene = true;
        true
    }

    pub fn end_scene(&mut self) {
        self.in_scene = false;
    }

    /// Draws indexed triangles with the currently bound state.
    /// Ignored outside `begin_scene`/`end_scene`.
    pub fn draw_indexed_triangles<I>(&mut self, vertices: &[Vertex], triangles: I)
    where
        I: IntoIterator<Item = [u32; 3]>,
    {
        if !self.in_scene {
            warn!("Draw call outside of a scene, ignoring");
            return;
        }

        let lights: Vec<&Light> = self
            .lights
            .iter()
            .zip(self.enabled)
            .filter_map(|(light, on)| if on { light.as_ref() } else { None })
            .collect();

        let shader = FixedFunctionShader::new(
            self.world,
            self.view,
            self.projection,
            lights,
            &self.material,
            self.texture.as_deref(),
            self.sampler,
            self.lighting,
        );
        self.renderer.draw_triangles(vertices, triangles, &shader);
    }

    /// Resolves the render target into the back buffer and returns it as
    /// packed 0xAARRGGBB pixels, row-major.
    pub fn present(&mut self) -> &[u32] {
        self.renderer.framebuffer.resolve_into(&mut self.back_buffer);
        &self.back_buffer
    }

    /// Pixels of the last `present`.
    pub fn back_buffer(&self) -> &[u32] {
        &self.back_buffer
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.renderer.framebuffer
    }
}
