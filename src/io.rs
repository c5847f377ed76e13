pub mod config;
pub mod image;
pub mod mesh_dump;
pub mod obj_loader;
