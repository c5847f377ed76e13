use image::{Rgb, RgbImage};
use pmesh_viewer::app::{run_dump, run_render};
use pmesh_viewer::error::{LoadError, ViewerError};
use pmesh_viewer::io::config::{Config, SceneConfig};
use pmesh_viewer::io::mesh_dump::dump_all;
use pmesh_viewer::scene::loader::load_scene;
use std::fs;
use std::path::{Path, PathBuf};

/// A strip of three quads, one material each.
const STRIP_OBJ: &str = "\
mtllib strip.mtl
v 0 0 0
v 1 0 0
v 2 0 0
v 3 0 0
v 0 1 0
v 1 1 0
v 2 1 0
v 3 1 0
vt 0 0
vt 1 0
vt 0 1
vt 1 1
usemtl painted
f 1/1 2/2 6/4
f 1/1 6/4 5/3
usemtl lost
f 2/1 3/2 7/4
f 2/1 7/4 6/3
usemtl plain
f 3/1 4/2 8/4
f 3/1 8/4 7/3
";

const STRIP_MTL: &str = "\
newmtl painted
Ka 0 0 0
Kd 0.9 0.5 0.1
map_Kd paint.png

newmtl lost
Kd 0.2 0.4 0.6
map_Kd does_not_exist.png

newmtl plain
Kd 0.3 0.3 0.3
";

fn write_strip(dir: &Path) -> PathBuf {
    let obj = dir.join("strip.obj");
    fs::write(&obj, STRIP_OBJ).unwrap();
    fs::write(dir.join("strip.mtl"), STRIP_MTL).unwrap();
    RgbImage::from_pixel(4, 4, Rgb([200, 10, 10]))
        .save(dir.join("paint.png"))
        .unwrap();
    obj
}

fn shipped_asset() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/ship.obj")
}

#[test]
fn missing_texture_degrades_one_subset() {
    let dir = tempfile::tempdir().unwrap();
    let scene = load_scene(&write_strip(dir.path()), &SceneConfig::default()).unwrap();

    assert_eq!(scene.subsets.len(), 3);
    let untextured: Vec<usize> = scene
        .subsets
        .iter()
        .enumerate()
        .filter(|(_, s)| s.texture.is_none() && s.texture_path.is_some())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(untextured.len(), 1);
    assert!(scene.subsets.iter().any(|s| s.texture.is_some()));
    assert!(scene.subsets.iter().any(|s| s.texture_path.is_none()));
}

#[test]
fn every_material_has_ambient_equal_to_diffuse() {
    let dir = tempfile::tempdir().unwrap();
    let scene = load_scene(&write_strip(dir.path()), &SceneConfig::default()).unwrap();
    for subset in &scene.subsets {
        assert_eq!(subset.material.ambient, subset.material.diffuse);
    }
}

#[test]
fn asset_without_materials_has_no_subsets() {
    let dir = tempfile::tempdir().unwrap();
    let obj = dir.path().join("bare.obj");
    fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 4\nf 1 4 3\n").unwrap();

    let scene = load_scene(&obj, &SceneConfig::default()).unwrap();
    assert!(scene.subsets.is_empty());
    assert_eq!(scene.mesh.max_faces(), 2);
}

#[test]
fn missing_asset_is_fatal() {
    let result = load_scene(Path::new("nowhere/ship.obj"), &SceneConfig::default());
    assert!(matches!(
        result,
        Err(ViewerError::Load(LoadError::NotFound(_)))
    ));
}

#[test]
fn shipped_asset_simplifies_and_restores() {
    let mut scene = load_scene(&shipped_asset(), &SceneConfig::default()).unwrap();
    assert_eq!(scene.subsets.len(), 3);

    let mesh = &mut scene.mesh;
    let (min, max) = (mesh.min_faces(), mesh.max_faces());
    assert!(min < max / 4, "only simplified to {min} of {max}");

    for level in mesh.levels().to_vec() {
        mesh.set_num_faces(level);
        assert_eq!(mesh.num_faces(), level);
    }
    mesh.set_num_faces(max + 10);
    assert_eq!(mesh.num_faces(), max);
    mesh.set_num_faces(0);
    assert_eq!(mesh.num_faces(), min);
}

#[test]
fn vertex_mode_keeps_requested_vertices() {
    let settings = SceneConfig {
        min_faces: 60,
        simplify_mode: "vertex".to_string(),
        ..SceneConfig::default()
    };
    let mut scene = load_scene(&shipped_asset(), &settings).unwrap();
    scene.mesh.set_num_faces(0);
    assert!(scene.mesh.num_vertices() >= 60);
}

#[test]
fn progressive_mesh_dump_matches_its_attribute_table() {
    let mut scene = load_scene(&shipped_asset(), &SceneConfig::default()).unwrap();
    scene.mesh.set_num_faces(scene.mesh.max_faces() / 2);
    let mesh = scene.mesh.to_mesh();

    let faces: u32 = mesh.attribute_table().iter().map(|r| r.face_count).sum();
    assert_eq!(faces, scene.mesh.num_faces());

    let mut first = Vec::new();
    let mut second = Vec::new();
    dump_all(&mut first, &mesh).unwrap();
    dump_all(&mut second, &mesh).unwrap();
    assert_eq!(first, second);
}

#[test]
fn headless_render_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("frame.png");
    let mut config = Config::default();
    config.window.width = 96;
    config.window.height = 72;

    run_render(&config, &shipped_asset(), &output, 30.0, None).unwrap();

    let img = image::open(&output).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (96, 72));
    // Corners are background.
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    assert!(img.pixels().any(|p| p.0 != [255, 255, 255]));
}

#[test]
fn dump_subcommand_writes_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.txt");

    let written = run_dump(
        &Config::default(),
        &shipped_asset(),
        Some(output.clone()),
        Some(100),
        false,
    )
    .unwrap();
    assert_eq!(written, output);

    let text = fs::read_to_string(&output).unwrap();
    for title in [
        "Vertices:",
        "Indices:",
        "Triangle lives in subset:",
        "Adjacency Buffer:",
        "Attribute Table:",
    ] {
        assert!(text.contains(&format!("{title}\n----------\n\n")), "missing {title}");
    }
}
