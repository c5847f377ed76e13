use crate::core::geometry::Vertex;
use crate::error::LoadError;
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use log::{debug, info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::{Path, PathBuf};

/// A material as authored in the asset's MTL library.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub name: String,
    pub material: Material,
    /// `map_Kd`, resolved against the OBJ's directory.
    pub texture_path: Option<PathBuf>,
}

/// Full-detail mesh with its materials and adjacency, as read from disk.
///
/// Faces are sorted by subset; attribute id `i` refers to `materials[i]`.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub mesh: Mesh,
    pub materials: Vec<MaterialRecord>,
    pub adjacency: Vec<u32>,
}

/// Loads an OBJ file (and its MTL library) into a single mesh with one
/// attribute id per face.
pub fn load_obj(path: &Path) -> Result<LoadedMesh, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    info!("Loading OBJ file: {:?}", path);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // Unifies indices for Position/Normal/UV
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &load_options)
        .map_err(|e| LoadError::Parse(path.to_path_buf(), e))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            warn!("No usable material library for {:?}: {}", path, e);
            Vec::new()
        }
    };

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let records: Vec<MaterialRecord> = materials
        .iter()
        .map(|m| material_record(m, base_dir))
        .collect();

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut attributes = Vec::new();
    let mut missing_normals = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let offset = vertices.len() as u32;
        let num_vertices = mesh.positions.len() / 3;

        let has_normals = mesh.normals.len() == mesh.positions.len();
        let has_texcoords = mesh.texcoords.len() / 2 == num_vertices;
        if !has_normals {
            debug!("Mesh '{}' has no normals, generating them", model.name);
            missing_normals.push(offset as usize..offset as usize + num_vertices);
        }

        let attrib = match mesh.material_id {
            Some(id) if id < records.len() => id as u32,
            Some(id) => {
                warn!("Mesh '{}' references missing material {}", model.name, id);
                0
            }
            None => 0,
        };

        for i in 0..num_vertices {
            let position = Point3::new(
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            );
            let normal = if has_normals {
                Vector3::new(
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                )
            } else {
                Vector3::zeros()
            };
            let texcoord = if has_texcoords {
                Vector2::new(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1])
            } else {
                Vector2::zeros()
            };
            vertices.push(Vertex::new(position, normal, texcoord));
        }

        indices.extend(mesh.indices.iter().map(|i| i + offset));
        attributes.extend(std::iter::repeat_n(attrib, mesh.indices.len() / 3));
    }

    if indices.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let mut mesh = Mesh::new(vertices, indices, attributes);

    if !missing_normals.is_empty() {
        let mut smoothed = mesh.clone();
        smoothed.compute_smooth_normals();
        for range in missing_normals {
            for i in range {
                mesh.vertices[i].normal = smoothed.vertices[i].normal;
            }
        }
    }

    mesh.optimize_attribute_sort();
    let adjacency = mesh.generate_adjacency(0.0);

    info!(
        "OBJ loaded: {} vertices, {} faces, {} materials",
        mesh.num_vertices(),
        mesh.num_faces(),
        records.len()
    );

    Ok(LoadedMesh {
        mesh,
        materials: records,
        adjacency,
    })
}

fn material_record(m: &tobj::Material, base_dir: &Path) -> MaterialRecord {
    let rgb = |c: Option<[f32; 3]>, fallback: f32| {
        c.map(Vector3::from).unwrap_or_else(|| Vector3::repeat(fallback))
    };

    // Emission is not a first-class MTL field in tobj.
    let emissive = m
        .unknown_param
        .get("Ke")
        .and_then(|v| parse_rgb(v))
        .unwrap_or_else(Vector3::zeros);

    let material = Material::new(
        rgb(m.ambient, 0.0),
        rgb(m.diffuse, 0.8),
        rgb(m.specular, 0.0),
        emissive,
        m.shininess.unwrap_or(0.0),
    );

    let texture_path = m
        .diffuse_texture
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| base_dir.join(name));

    MaterialRecord {
        name: m.name.clone(),
        material,
        texture_path,
    }
}

fn parse_rgb(value: &str) -> Option<Vector3<f32>> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Vector3::new(*r, *g, *b)),
        [v] => Some(Vector3::repeat(*v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TWO_MATERIAL_OBJ: &str = "\
mtllib two.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl blue
f 1/1 2/2 3/3
usemtl red
f 2/2 5/1 3/3
usemtl blue
f 1/1 3/3 4/4
";

    const TWO_MATERIAL_MTL: &str = "\
newmtl red
Kd 1 0 0
Ks 0.5 0.5 0.5
Ns 16
Ke 0.1 0.2 0.3
map_Kd textures/red.png

newmtl blue
Ka 0.2 0.2 0.2
Kd 0 0 1
";

    fn write_asset(dir: &Path) -> PathBuf {
        let obj = dir.join("two.obj");
        fs::write(&obj, TWO_MATERIAL_OBJ).unwrap();
        fs::write(dir.join("two.mtl"), TWO_MATERIAL_MTL).unwrap();
        obj
    }

    #[test]
    fn materials_are_read_from_library() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_obj(&write_asset(dir.path())).unwrap();

        assert_eq!(loaded.materials.len(), 2);
        let red = &loaded.materials[0];
        assert_eq!(red.name, "red");
        assert_eq!(red.material.diffuse, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(red.material.power, 16.0);
        assert_eq!(red.material.emissive, Vector3::new(0.1, 0.2, 0.3));
        assert_eq!(red.texture_path, Some(dir.path().join("textures/red.png")));

        let blue = &loaded.materials[1];
        assert_eq!(blue.material.ambient, Vector3::repeat(0.2));
        assert_eq!(blue.texture_path, None);
    }

    #[test]
    fn faces_are_grouped_by_subset() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_obj(&write_asset(dir.path())).unwrap();

        let mesh = &loaded.mesh;
        assert_eq!(mesh.num_faces(), 3);
        assert!(mesh.attributes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(mesh.attribute_table().len(), 2);
        assert_eq!(loaded.adjacency.len(), 9);
    }

    #[test]
    fn missing_normals_are_generated() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_obj(&write_asset(dir.path())).unwrap();
        for v in &loaded.mesh.vertices {
            assert!((v.normal - Vector3::z()).norm() < 1e-5, "got {:?}", v.normal);
        }
    }

    #[test]
    fn missing_library_yields_no_materials() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("bare.obj");
        fs::write(&obj, "mtllib nowhere.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let loaded = load_obj(&obj).unwrap();
        assert!(loaded.materials.is_empty());
        assert_eq!(loaded.mesh.num_faces(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_obj(Path::new("no/such/ship.obj"));
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn file_without_faces_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("points.obj");
        fs::write(&obj, "v 0 0 0\nv 1 0 0\n").unwrap();
        assert!(matches!(load_obj(&obj), Err(LoadError::Empty(_))));
    }
}
