use crate::error::ViewerError;
use crate::io::config::Config;
use crate::pipeline::device::Device;
use crate::scene::loader::{SceneResources, configure_device, load_scene};
use std::path::Path;

/// The device and the scene drawn with it, owned by the frame loop.
///
/// Fields drop in declaration order, so the scene is released before the device.
pub struct RenderContext {
    pub scene: SceneResources,
    pub device: Device,
}

impl RenderContext {
    pub fn new(device: Device, scene: SceneResources) -> Self {
        Self { scene, device }
    }

    /// Creates the device, then loads `asset` and configures the device for it.
    pub fn init(config: &Config, asset: &Path) -> Result<Self, ViewerError> {
        let mut device = Device::new(
            config.window.width,
            config.window.height,
            config.window.samples,
        )?;
        let scene = load_scene(asset, &config.scene)?;
        configure_device(&mut device, config);
        Ok(Self::new(device, scene))
    }
}
