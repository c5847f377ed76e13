pub mod device;
pub mod frame;
pub mod renderer;
pub mod shaders;
