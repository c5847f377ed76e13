use crate::core::rasterizer::CullMode;
use crate::error::ViewerError;
use crate::io::config::{Config, SceneConfig, parse_cull_mode, parse_simplify_mode};
use crate::io::obj_loader::{LoadedMesh, MaterialRecord, load_obj};
use crate::pipeline::device::{Device, RenderState, TransformState};
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::material::Material;
use crate::scene::progressive::{ProgressiveMesh, SimplifyMode};
use crate::scene::texture::{MipFilter, SamplerState, Texture, TextureFilter};
use crate::scene::utils::normalize_and_center_mesh;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Material and optional texture of one subset; subset `i` draws attribute id `i`.
#[derive(Debug, Clone)]
pub struct Subset {
    pub material: Material,
    pub texture: Option<Arc<Texture>>,
    /// Texture the asset asked for, kept even when loading it failed.
    pub texture_path: Option<PathBuf>,
}

/// Everything loaded from the asset that the frame needs.
pub struct SceneResources {
    pub mesh: ProgressiveMesh,
    pub subsets: Vec<Subset>,
}

/// Loads the asset, its materials and textures, and builds the progressive mesh.
///
/// A texture that fails to load leaves its subset untextured. The full-detail
/// mesh and its adjacency are dropped once the progressive mesh exists.
pub fn load_scene(path: &Path, settings: &SceneConfig) -> Result<SceneResources, ViewerError> {
    let LoadedMesh {
        mut mesh,
        materials,
        adjacency,
    } = load_obj(path)?;

    if settings.normalize {
        let (center, scale) = normalize_and_center_mesh(&mut mesh, settings.normalize_radius);
        info!("Mesh normalized. Center: {:?}, Scale: {:.4}", center, scale);
    }

    if materials.is_empty() {
        warn!("Asset {:?} has no materials; nothing will be drawn", path);
    }

    let mut cache: HashMap<PathBuf, Option<Arc<Texture>>> = HashMap::new();
    let subsets: Vec<Subset> = materials
        .into_iter()
        .map(|record| load_subset(record, &mut cache))
        .collect();

    let mode = parse_simplify_mode(&settings.simplify_mode).unwrap_or(SimplifyMode::Face);
    let mesh = ProgressiveMesh::generate(&mesh, &adjacency, settings.min_faces, mode)?;

    info!(
        "Scene ready: {} subsets, {} vertices, faces {}..={}",
        subsets.len(),
        mesh.max_vertices(),
        mesh.min_faces(),
        mesh.max_faces()
    );

    Ok(SceneResources { mesh, subsets })
}

fn load_subset(
    record: MaterialRecord,
    cache: &mut HashMap<PathBuf, Option<Arc<Texture>>>,
) -> Subset {
    let texture = record.texture_path.as_ref().and_then(|path| {
        cache
            .entry(path.clone())
            .or_insert_with(|| match Texture::load(path) {
                Ok(texture) => Some(Arc::new(texture)),
                Err(e) => {
                    warn!("Material '{}': {}; drawing untextured", record.name, e);
                    None
                }
            })
            .clone()
    });

    Subset {
        material: record.material.with_ambient_from_diffuse(),
        texture,
        texture_path: record.texture_path,
    }
}

/// Builds the light list from config; entries that fail validation are skipped.
pub fn build_lights_from_config(config: &Config) -> Vec<Light> {
    let mut lights = Vec::new();
    for l in &config.lights {
        let color = Vector3::from(l.color);
        match (l.r#type.as_str(), l.direction, l.position) {
            ("directional", Some(dir), _) => {
                lights.push(Light::new_directional(Vector3::from(dir), color));
            }
            ("point", _, Some(pos)) => {
                let mut light = Light::new_point(Point3::from(pos), color);
                if let Light::Point {
                    ref mut attenuation,
                    ..
                } = light
                    && let Some(a) = l.attenuation
                {
                    *attenuation = (a[0], a[1], a[2]);
                }
                lights.push(light);
            }
            (other, ..) => warn!("Skipping light of type '{other}'"),
        }
    }
    lights
}

pub fn camera_from_config(config: &Config, aspect_ratio: f32) -> Camera {
    Camera::new_perspective(
        Point3::from(config.camera.position),
        Point3::from(config.camera.target),
        Vector3::from(config.camera.up),
        config.camera.fov.to_radians(),
        aspect_ratio,
        config.camera.near,
        config.camera.far,
    )
}

/// Sets the sampler, lights, render states and camera transforms the viewer draws with.
pub fn configure_device(device: &mut Device, config: &Config) {
    device.set_sampler_state(SamplerState {
        mag_filter: TextureFilter::Linear,
        min_filter: TextureFilter::Linear,
        mip_filter: MipFilter::Point,
    });

    for (i, light) in build_lights_from_config(config).into_iter().enumerate() {
        device.set_light(i, light);
        device.light_enable(i, true);
    }

    device.set_render_state(RenderState::Lighting(true));
    device.set_render_state(RenderState::NormalizeNormals(config.render.normalize_normals));
    device.set_render_state(RenderState::Specular(config.render.specular));
    device.set_render_state(RenderState::Ambient(Vector3::from(config.render.ambient)));
    device.set_render_state(RenderState::CullMode(
        parse_cull_mode(&config.render.cull_mode).unwrap_or(CullMode::Back),
    ));

    let camera = camera_from_config(config, device.width() as f32 / device.height() as f32);
    device.set_transform(TransformState::View, camera.view_matrix());
    device.set_transform(TransformState::Projection, camera.projection_matrix());
}
