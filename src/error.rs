use std::path::PathBuf;

/// The rendering device (back buffer or window) could not be created.
#[derive(Debug, thiserror::Error)]
pub enum DeviceInitError {
    #[error("invalid back buffer size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    #[error("invalid sample count {0}, expected at least 1")]
    InvalidSampleCount(usize),

    #[error("failed to create window: {0}")]
    Window(String),
}

/// The mesh asset could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("mesh asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse mesh asset '{0}': {1}")]
    Parse(PathBuf, #[source] tobj::LoadError),

    #[error("mesh asset '{0}' contains no triangles")]
    Empty(PathBuf),
}

/// A single texture failed to load. Never fatal: the subset renders untextured.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to load texture '{0}': {1}")]
    Image(PathBuf, #[source] image::ImageError),

    #[error("texture '{0}' has zero size")]
    Empty(PathBuf),
}

/// Progressive mesh generation failed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimplifyError {
    #[error("cannot simplify a mesh without faces")]
    EmptyMesh,

    #[error("adjacency buffer has {found} entries, expected {expected}")]
    AdjacencySize { expected: usize, found: usize },

    #[error("face {face} lists neighbor {neighbor}, which does not exist or does not list it back")]
    InvalidAdjacency { face: u32, neighbor: u32 },

    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: u32,
        index: u32,
        vertex_count: usize,
    },

    #[error("face {0} is degenerate (two corners share a position)")]
    DegenerateFace(u32),
}

/// The viewer configuration could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error returned by the application entry points.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    DeviceInit(#[from] DeviceInitError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("progressive mesh generation failed: {0}")]
    Simplification(#[from] SimplifyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to save image '{0}': {1}")]
    Image(PathBuf, #[source] image::ImageError),
}
