use crate::error::{DeviceInitError, ViewerError};
use crate::io::config::Config;
use crate::io::image::save_buffer_to_image;
use crate::io::mesh_dump::dump_all;
use crate::io::obj_loader::load_obj;
use crate::pipeline::frame::{DetailInput, FrameRenderer, FrameSettings};
use crate::scene::context::RenderContext;
use crate::scene::loader::load_scene;
use crate::scene::material::Material;
use crate::ui::input::KeyBindings;
use log::{debug, error, info, warn};
use minifb::{Key, Window, WindowOptions};
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

fn frame_settings(config: &Config) -> FrameSettings {
    FrameSettings {
        clear_color: Vector3::from(config.render.clear_color),
        wireframe_overlay: config.render.wireframe_overlay,
        wireframe_material: Material::solid(Vector3::from(config.render.wireframe_color)),
    }
}

/// Runs the interactive viewer until Escape is pressed or the window closes.
pub fn run_viewer(config: &Config, asset: &Path) -> Result<(), ViewerError> {
    let width = config.window.width;
    let height = config.window.height;
    let bindings = KeyBindings::from_config(&config.controls)?;

    info!("Starting viewer ({}x{})...", width, height);
    info!(
        "Controls: {}=More detail, {}=Less detail, {}=Screenshot, Esc=Quit",
        config.controls.increase_detail,
        config.controls.decrease_detail,
        config.controls.screenshot
    );

    let mut window = Window::new(
        &config.window.title,
        width,
        height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| DeviceInitError::Window(e.to_string()))?;
    window.set_target_fps(config.window.target_fps);

    let mut ctx = RenderContext::init(config, asset)?;
    let mut frame = FrameRenderer::new(frame_settings(config));

    let mut last_frame_time = Instant::now();
    let mut last_fps_update = Instant::now();
    let mut frame_count = 0;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = Instant::now();
        let dt = (now - last_frame_time).as_secs_f32();
        last_frame_time = now;

        let input = bindings.detail_input(&window);
        if !frame.render(&mut ctx, input, dt) {
            break;
        }

        if bindings.screenshot_requested(&window) {
            let path = PathBuf::from(format!(
                "screenshot_{}.png",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ));
            match save_buffer_to_image(ctx.device.back_buffer(), width, height, &path) {
                Ok(()) => info!("Screenshot saved to {:?}", path),
                Err(e) => warn!("{}", e),
            }
        }

        if let Err(e) = window.update_with_buffer(ctx.device.back_buffer(), width, height) {
            error!("Window update failed: {}", e);
            break;
        }

        window.set_title(&format!(
            "{} - {} faces - {:.1} FPS",
            config.window.title,
            ctx.scene.mesh.num_faces(),
            1.0 / dt.max(1e-6)
        ));

        frame_count += 1;
        if last_fps_update.elapsed().as_secs_f32() >= 2.0 {
            info!(
                "Average FPS: {:.1}, faces: {}",
                frame_count as f32 / last_fps_update.elapsed().as_secs_f32(),
                ctx.scene.mesh.num_faces()
            );
            frame_count = 0;
            last_fps_update = Instant::now();
        }
    }

    debug!("Viewer closed");
    Ok(())
}

/// Renders a single frame headless and writes it to `output`.
pub fn run_render(
    config: &Config,
    asset: &Path,
    output: &Path,
    angle_degrees: f32,
    faces: Option<u32>,
) -> Result<(), ViewerError> {
    info!("Starting headless render...");
    let start_time = Instant::now();

    let mut ctx = RenderContext::init(config, asset)?;
    if let Some(faces) = faces {
        ctx.scene.mesh.set_num_faces(faces);
    }

    let mut frame = FrameRenderer::new(frame_settings(config));
    frame.set_angle(angle_degrees.to_radians());
    frame.render(&mut ctx, DetailInput::default(), 0.0);

    info!(
        "Render completed in {:.2?} ({} faces)",
        start_time.elapsed(),
        ctx.scene.mesh.num_faces()
    );

    save_buffer_to_image(
        ctx.device.back_buffer(),
        ctx.device.width(),
        ctx.device.height(),
        output,
    )?;
    info!("Saved output to {:?}", output);
    Ok(())
}

/// Writes the mesh inspector report. Returns the path written.
pub fn run_dump(
    config: &Config,
    asset: &Path,
    output: Option<PathBuf>,
    faces: Option<u32>,
    source: bool,
) -> Result<PathBuf, ViewerError> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "mesh_dump_{}.txt",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    let mesh = if source {
        if let Some(faces) = faces {
            warn!("Ignoring face count {faces}: the source mesh is dumped at full detail");
        }
        load_obj(asset)?.mesh
    } else {
        let mut scene = load_scene(asset, &config.scene)?;
        if let Some(faces) = faces {
            scene.mesh.set_num_faces(faces);
        }
        info!("Dumping progressive mesh at {} faces", scene.mesh.num_faces());
        scene.mesh.to_mesh()
    };

    let io_err = |e| ViewerError::Io(output.clone(), e);
    let file = File::create(&output).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    dump_all(&mut writer, &mesh).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!("Mesh report written to {:?}", output);
    Ok(output)
}
