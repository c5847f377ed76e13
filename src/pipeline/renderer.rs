use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::Vertex;
use crate::core::pipeline::Shader;
use crate::core::rasterizer::Rasterizer;
use nalgebra::Vector3;

/// Owns the rasterizer and the render target, and drives vertex processing
/// and primitive assembly for indexed triangle lists.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    /// sample_count: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
        }
    }

    pub fn clear(&mut self, color: Option<Vector3<f32>>, depth: Option<f32>) {
        self.framebuffer.clear(color, depth);
    }

    /// Runs `shader` over every triangle. Triangles referencing a vertex
    /// outside `vertices` are skipped.
    pub fn draw_triangles<S, I>(&self, vertices: &[Vertex], triangles: I, shader: &S)
    where
        S: Shader,
        I: IntoIterator<Item = [u32; 3]>,
    {
        for [i0, i1, i2] in triangles {
            let (Some(v0), Some(v1), Some(v2)) = (
                vertices.get(i0 as usize),
                vertices.get(i1 as usize),
                vertices.get(i2 as usize),
            ) else {
                continue;
            };

            let (pos0, var0) = shader.vertex(v0);
            let (pos1, var1) = shader.vertex(v1);
            let (pos2, var2) = shader.vertex(v2);

            self.rasterizer.rasterize_triangle(
                &self.framebuffer,
                shader,
                &[pos0, pos1, pos2],
                &[var0, var1, var2],
            );
        }
    }
}
