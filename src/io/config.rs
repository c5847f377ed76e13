use crate::core::rasterizer::CullMode;
use crate::error::ConfigError;
use crate::scene::progressive::SimplifyMode;
use crate::ui::input::parse_key;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File read when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "viewer.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default = "default_lights")]
    pub lights: Vec<LightConfig>,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            lights: default_lights(),
            render: RenderConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// Supersampling factor per axis; 1 disables anti-aliasing.
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_target_fps")]
    pub target_fps: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            title: default_title(),
            target_fps: default_target_fps(),
        }
    }
}

fn default_width() -> usize {
    640
}
fn default_height() -> usize {
    480
}
fn default_samples() -> usize {
    1
}
fn default_title() -> String {
    "Progressive Mesh".to_string()
}
fn default_target_fps() -> usize {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Minimum face count requested from progressive mesh generation.
    #[serde(default = "default_min_faces")]
    pub min_faces: u32,
    /// Whether `min_faces` counts faces or welded vertices.
    #[serde(default = "default_simplify_mode")]
    pub simplify_mode: String, // "face", "vertex"
    /// Center the mesh and scale it to `normalize_radius`.
    #[serde(default = "default_false")]
    pub normalize: bool,
    #[serde(default = "default_normalize_radius")]
    pub normalize_radius: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            min_faces: default_min_faces(),
            simplify_mode: default_simplify_mode(),
            normalize: false,
            normalize_radius: default_normalize_radius(),
        }
    }
}

fn default_asset() -> String {
    "assets/ship.obj".to_string()
}
fn default_min_faces() -> u32 {
    1
}
fn default_simplify_mode() -> String {
    "face".to_string()
}
fn default_normalize_radius() -> f32 {
    5.0
}
fn default_false() -> bool {
    false
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            target: [0.0, 0.0, 0.0],
            up: default_up(),
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, -15.0]
}
fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}
fn default_fov() -> f32 {
    90.0
}
fn default_near() -> f32 {
    1.0
}
fn default_far() -> f32 {
    1000.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    /// "directional" or "point".
    pub r#type: String,
    pub direction: Option<[f32; 3]>,
    pub position: Option<[f32; 3]>,
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
    /// (constant, linear, quadratic), point lights only.
    pub attenuation: Option<[f32; 3]>,
}

fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_lights() -> Vec<LightConfig> {
    vec![LightConfig {
        r#type: "directional".to_string(),
        direction: Some([1.0, -1.0, 1.0]),
        position: None,
        color: default_light_color(),
        attenuation: None,
    }]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
    #[serde(default = "default_true")]
    pub wireframe_overlay: bool,
    #[serde(default = "default_wireframe_color")]
    pub wireframe_color: [f32; 3],
    #[serde(default = "default_cull_mode")]
    pub cull_mode: String, // "back", "front", "none"
    #[serde(default = "default_true")]
    pub specular: bool,
    #[serde(default = "default_true")]
    pub normalize_normals: bool,
    /// Global ambient light added to every lit vertex.
    #[serde(default = "default_ambient")]
    pub ambient: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: default_clear_color(),
            wireframe_overlay: true,
            wireframe_color: default_wireframe_color(),
            cull_mode: default_cull_mode(),
            specular: true,
            normalize_normals: true,
            ambient: default_ambient(),
        }
    }
}

fn default_clear_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_wireframe_color() -> [f32; 3] {
    [1.0, 1.0, 0.0]
}
fn default_ambient() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
fn default_cull_mode() -> String {
    "back".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlsConfig {
    #[serde(default = "default_increase_key")]
    pub increase_detail: String,
    #[serde(default = "default_decrease_key")]
    pub decrease_detail: String,
    #[serde(default = "default_screenshot_key")]
    pub screenshot: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            increase_detail: default_increase_key(),
            decrease_detail: default_decrease_key(),
            screenshot: default_screenshot_key(),
        }
    }
}

fn default_increase_key() -> String {
    "A".to_string()
}
fn default_decrease_key() -> String {
    "D".to_string()
}
fn default_screenshot_key() -> String {
    "F12".to_string()
}

pub fn parse_cull_mode(name: &str) -> Option<CullMode> {
    match name.to_ascii_lowercase().as_str() {
        "back" => Some(CullMode::Back),
        "front" => Some(CullMode::Front),
        "none" => Some(CullMode::None),
        _ => None,
    }
}

pub fn parse_simplify_mode(name: &str) -> Option<SimplifyMode> {
    match name.to_ascii_lowercase().as_str() {
        "face" => Some(SimplifyMode::Face),
        "vertex" => Some(SimplifyMode::Vertex),
        _ => None,
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse(_, source) => ConfigError::Parse(path.to_path_buf(), source),
            other => other,
        })?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(Path::new("<inline>").to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else `viewer.toml` if it exists, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let w = &self.window;
        if w.width == 0 || w.height == 0 {
            return invalid(format!("window size {}x{} must be non-zero", w.width, w.height));
        }
        if w.samples == 0 {
            return invalid("window.samples must be at least 1".to_string());
        }
        if w.target_fps == 0 {
            return invalid("window.target_fps must be at least 1".to_string());
        }

        let c = &self.camera;
        if !(c.fov > 0.0 && c.fov < 180.0) {
            return invalid(format!("camera.fov {} must be in (0, 180)", c.fov));
        }
        if !(c.near > 0.0 && c.far > c.near) {
            return invalid(format!(
                "camera clip range {}..{} must satisfy 0 < near < far",
                c.near, c.far
            ));
        }

        if parse_simplify_mode(&self.scene.simplify_mode).is_none() {
            return invalid(format!("unknown simplify mode '{}'", self.scene.simplify_mode));
        }
        if self.scene.normalize && self.scene.normalize_radius <= 0.0 {
            return invalid("scene.normalize_radius must be positive".to_string());
        }

        for (i, light) in self.lights.iter().enumerate() {
            match light.r#type.as_str() {
                "directional" if light.direction.is_none() => {
                    return invalid(format!("lights[{i}]: directional light needs a direction"));
                }
                "point" if light.position.is_none() => {
                    return invalid(format!("lights[{i}]: point light needs a position"));
                }
                "directional" | "point" => {}
                other => return invalid(format!("lights[{i}]: unknown light type '{other}'")),
            }
        }

        if parse_cull_mode(&self.render.cull_mode).is_none() {
            return invalid(format!("unknown cull mode '{}'", self.render.cull_mode));
        }

        for name in [
            &self.controls.increase_detail,
            &self.controls.decrease_detail,
            &self.controls.screenshot,
        ] {
            if parse_key(name).is_none() {
                return invalid(format!("unknown key name '{name}'"));
            }
        }
        Ok(())
    }
}
