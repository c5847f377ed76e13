//! Per-frame procedure: detail keys, rotation and the two-pass subset draw.

use crate::core::color;
use crate::core::math::transform::TransformFactory;
use crate::core::rasterizer::FillMode;
use crate::pipeline::device::{RenderState, TransformState};
use crate::scene::context::RenderContext;
use crate::scene::material::Material;
use crate::scene::progressive::ProgressiveMesh;
use log::{debug, warn};
use nalgebra::Vector3;
use std::f32::consts::TAU;

/// Anything with a settable face count.
pub trait DetailLevel {
    fn num_faces(&self) -> u32;
    fn set_num_faces(&mut self, faces: u32);
}

impl DetailLevel for ProgressiveMesh {
    fn num_faces(&self) -> u32 {
        ProgressiveMesh::num_faces(self)
    }

    fn set_num_faces(&mut self, faces: u32) {
        ProgressiveMesh::set_num_faces(self, faces);
    }
}

/// Held state of the two detail keys, sampled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailInput {
    pub increase: bool,
    pub decrease: bool,
}

/// Applies the detail keys. Both requests are relative to the face count
/// read at the start of the frame.
///
/// Returns the face count afterwards.
pub fn adjust_detail<M: DetailLevel>(mesh: &mut M, input: DetailInput) -> u32 {
    let count = mesh.num_faces();

    if input.increase {
        mesh.set_num_faces(count.saturating_add(1));
        // A single collapse can remove two faces, so +1 may not reach the next level.
        if mesh.num_faces() == count {
            mesh.set_num_faces(count.saturating_add(2));
        }
    }
    if input.decrease {
        mesh.set_num_faces(count.saturating_sub(1));
    }

    let after = mesh.num_faces();
    if after != count {
        debug!("Face count {count} -> {after}");
    }
    after
}

/// Advances `angle` by `elapsed` seconds at one radian per second, wrapped into [0, 2π).
/// Negative elapsed time counts as zero.
pub fn advance_angle(angle: f32, elapsed: f32) -> f32 {
    let wrapped = (angle + elapsed.max(0.0)).rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Clear color and overlay settings for the frame.
#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub clear_color: Vector3<f32>,
    pub wireframe_overlay: bool,
    pub wireframe_material: Material,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            clear_color: color::white(),
            wireframe_overlay: true,
            wireframe_material: Material::yellow(),
        }
    }
}

/// Owns the state that persists between frames.
#[derive(Debug, Clone, Default)]
pub struct FrameRenderer {
    angle: f32,
    settings: FrameSettings,
}

impl FrameRenderer {
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            angle: 0.0,
            settings,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = advance_angle(angle, 0.0);
    }

    /// Runs one frame. Returns true to keep the loop running.
    pub fn render(&mut self, ctx: &mut RenderContext, input: DetailInput, elapsed: f32) -> bool {
        adjust_detail(&mut ctx.scene.mesh, input);
        self.angle = advance_angle(self.angle, elapsed);
        self.draw(ctx);
        true
    }

    /// Clears and draws every subset at the current angle, then presents.
    pub fn draw(&self, ctx: &mut RenderContext) {
        let RenderContext { device, scene } = ctx;

        device.set_transform(TransformState::World, TransformFactory::rotation_y(self.angle));
        device.clear(Some(self.settings.clear_color), Some(1.0));

        if !device.begin_scene() {
            warn!("Scene already in progress, skipping frame");
            return;
        }

        for (i, subset) in scene.subsets.iter().enumerate() {
            device.set_material(subset.material.clone());
            device.set_texture(subset.texture.clone());
            scene.mesh.draw_subset(device, i);

            if self.settings.wireframe_overlay {
                device.set_material(self.settings.wireframe_material.clone());
                device.set_render_state(RenderState::FillMode(FillMode::Wireframe));
                scene.mesh.draw_subset(device, i);
                device.set_render_state(RenderState::FillMode(FillMode::Solid));
            }
        }

        device.end_scene();
        device.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::Config;
    use crate::pipeline::device::Device;
    use crate::scene::loader::{SceneResources, Subset, configure_device};
    use crate::scene::mesh::Mesh;
    use crate::scene::progressive::SimplifyMode;
    use approx::assert_relative_eq;
    use rand::Rng;

    /// Only even face counts between `min` and `max` are reachable.
    struct EvenLevels {
        faces: u32,
        min: u32,
        max: u32,
        requests: Vec<u32>,
    }

    impl DetailLevel for EvenLevels {
        fn num_faces(&self) -> u32 {
            self.faces
        }

        fn set_num_faces(&mut self, faces: u32) {
            self.requests.push(faces);
            let clamped = faces.clamp(self.min, self.max);
            self.faces = clamped - clamped % 2;
        }
    }

    fn even(faces: u32) -> EvenLevels {
        EvenLevels {
            faces,
            min: 2,
            max: 10,
            requests: Vec::new(),
        }
    }

    #[test]
    fn increase_falls_back_to_two_when_one_plateaus() {
        let mut mesh = even(4);
        let after = adjust_detail(&mut mesh, DetailInput { increase: true, decrease: false });
        assert_eq!(after, 6);
        assert_eq!(mesh.requests, vec![5, 6]);
    }

    #[test]
    fn increase_at_maximum_stays_put() {
        let mut mesh = even(10);
        let after = adjust_detail(&mut mesh, DetailInput { increase: true, decrease: false });
        assert_eq!(after, 10);
        assert_eq!(mesh.requests, vec![11, 12]);
    }

    #[test]
    fn decrease_clamps_at_minimum() {
        let mut mesh = even(2);
        let after = adjust_detail(&mut mesh, DetailInput { increase: false, decrease: true });
        assert_eq!(after, 2);
    }

    #[test]
    fn no_keys_no_requests() {
        let mut mesh = even(6);
        adjust_detail(&mut mesh, DetailInput::default());
        assert!(mesh.requests.is_empty());
    }

    #[test]
    fn both_keys_use_the_starting_count() {
        let mut mesh = even(6);
        adjust_detail(&mut mesh, DetailInput { increase: true, decrease: true });
        assert_eq!(mesh.requests, vec![7, 8, 5]);
    }

    #[test]
    fn increase_walks_progressive_mesh_to_full_detail() {
        let mesh = Mesh::create_grid(6, 4.0, 1);
        let adjacency = mesh.generate_adjacency(0.0);
        let mut pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();
        pmesh.set_num_faces(0);

        let up = DetailInput { increase: true, decrease: false };
        for _ in 0..pmesh.levels().len() {
            adjust_detail(&mut pmesh, up);
        }
        assert_eq!(pmesh.num_faces(), pmesh.max_faces());
    }

    #[test]
    fn increase_walks_double_sided_sheet_to_full_detail() {
        let mut mesh = Mesh::create_grid(4, 4.0, 1);
        let back: Vec<u32> = mesh
            .indices
            .chunks_exact(3)
            .flat_map(|f| [f[0], f[2], f[1]])
            .collect();
        mesh.indices.extend(back);
        mesh.attributes.extend(vec![0; mesh.attributes.len()]);
        let adjacency = mesh.generate_adjacency(0.0);
        let mut pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();
        pmesh.set_num_faces(0);

        let up = DetailInput { increase: true, decrease: false };
        for _ in 0..pmesh.max_faces() {
            adjust_detail(&mut pmesh, up);
        }
        assert_eq!(pmesh.num_faces(), 64);
    }

    #[test]
    fn angle_wraps_exactly_at_full_turn() {
        assert_relative_eq!(advance_angle(TAU - 0.25, 0.5), 0.25, epsilon = 1e-5);
        assert_eq!(advance_angle(1.0, -5.0), 1.0);
        // 6.28 is below a full turn and must not wrap.
        assert_relative_eq!(advance_angle(0.0, 6.28), 6.28, epsilon = 1e-6);
    }

    #[test]
    fn angle_tracks_total_time_modulo_full_turn() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let mut angle = 0.0f32;
            let mut total = 0.0f64;
            for _ in 0..500 {
                let dt: f32 = rng.random_range(0.0..0.1);
                angle = advance_angle(angle, dt);
                total += dt as f64;
                assert!((0.0..TAU).contains(&angle));
            }
            let expected = total.rem_euclid(std::f64::consts::TAU) as f32;
            let diff = (angle - expected).abs();
            assert!(diff.min(TAU - diff) < 1e-3, "angle {angle}, expected {expected}");
        }
    }

    #[test]
    fn frame_draws_white_background_and_yellow_overlay() {
        let config = Config::default();
        let mut device = Device::new(64, 48, 1).unwrap();
        configure_device(&mut device, &config);

        let mesh = Mesh::create_grid(4, 8.0, 1);
        let adjacency = mesh.generate_adjacency(0.0);
        let pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();
        let scene = SceneResources {
            mesh: pmesh,
            subsets: vec![Subset {
                material: Material::solid(Vector3::new(0.0, 0.0, 1.0)),
                texture: None,
                texture_path: None,
            }],
        };
        let mut ctx = RenderContext::new(device, scene);
        let mut frame = FrameRenderer::default();

        assert!(frame.render(&mut ctx, DetailInput::default(), 0.0));

        let pixels = ctx.device.present();
        let white = color::pack_argb(color::white());
        let yellow = color::pack_argb(color::yellow());
        assert!(pixels.iter().any(|&p| p == white));
        assert!(pixels.iter().any(|&p| p == yellow));
    }
}
