use crate::core::framebuffer::FrameBuffer;
use crate::core::math::interpolation::{
    barycentric_coordinates, is_inside_triangle, perspective_correct_barycentric, signed_area_x2,
};
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::core::pipeline::{Interpolatable, Shader};
use nalgebra::{Point2, Vector3, Vector4};
use rayon::prelude::*;

/// Which screen-space winding is discarded.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CullMode {
    Back,
    Front,
    None,
}

/// How a triangle's interior is filled.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum FillMode {
    Solid,
    /// Only pixels within `line_width` of an edge are shaded.
    Wireframe,
}

/// Scan-converts clip-space triangles into a `FrameBuffer`.
pub struct Rasterizer {
    pub cull_mode: CullMode,
    pub fill_mode: FillMode,
    /// Wireframe line width in output pixels.
    pub line_width: f32,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

type ClipVertex<V> = (Vector4<f32>, V);

/// Frustum planes as (axis, sign): inside when `sign * p[axis] <= p.w`.
const CLIP_PLANES: [(usize, f32); 6] = [
    (0, 1.0),
    (0, -1.0),
    (1, 1.0),
    (1, -1.0),
    (2, 1.0),
    (2, -1.0),
];

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            line_width: 1.0,
        }
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    /// Rasterizes one triangle.
    ///
    /// The triangle is clipped against the view frustum in homogeneous clip
    /// space (Sutherland-Hodgman), then the resulting convex polygon is
    /// fanned into triangles.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        // Fast path: fully inside, no clipping needed.
        let all_inside = clip_coords.iter().all(|c| {
            CLIP_PLANES
                .iter()
                .all(|&(axis, sign)| sign * c[axis] <= c.w)
        });
        if all_inside {
            self.rasterize_clipped(framebuffer, shader, clip_coords, varyings);
            return;
        }

        let mut polygon: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        let mut scratch: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        polygon.extend(clip_coords.iter().copied().zip(varyings.iter().copied()));

        for &(axis, sign) in &CLIP_PLANES {
            if polygon.is_empty() {
                return;
            }
            clip_polygon_against_plane(&polygon, &mut scratch, axis, sign);
            std::mem::swap(&mut polygon, &mut scratch);
        }

        if polygon.len() < 3 {
            return;
        }
        let v0 = polygon[0];
        for pair in polygon[1..].windows(2) {
            let (v1, v2) = (pair[0], pair[1]);
            self.rasterize_clipped(
                framebuffer,
                shader,
                &[v0.0, v1.0, v2.0],
                &[v0.1, v1.1, v2.1],
            );
        }
    }

    /// Rasterizes a triangle already inside the frustum: perspective divide,
    /// viewport transform, culling, then a parallel scan over the bounding box rows.
    fn rasterize_clipped<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let width = framebuffer.buffer_width as f32;
        let height = framebuffer.buffer_height as f32;

        let mut screen = [Point2::origin(); 3];
        let mut w_values = [0.0; 3];
        for i in 0..3 {
            if clip_coords[i].w.abs() < 1e-6 {
                return;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            w_values[i] = clip_coords[i].w;
            screen[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
        }

        let signed_area = signed_area_x2(screen[0], screen[1], screen[2]);
        match self.cull_mode {
            CullMode::Back if signed_area >= 0.0 => return,
            CullMode::Front if signed_area <= 0.0 => return,
            _ => {}
        }
        let area_x2 = signed_area.abs();
        if area_x2 < 1e-6 {
            return;
        }

        let uv_density = estimate_uv_density(varyings, area_x2 * 0.5);

        // Pixel distance to an edge = weight of the opposite corner * 2A / |edge|.
        let edge_scale = {
            let len = |a: Point2<f32>, b: Point2<f32>| (b - a).norm().max(1e-6);
            Vector3::new(
                area_x2 / len(screen[1], screen[2]),
                area_x2 / len(screen[2], screen[0]),
                area_x2 / len(screen[0], screen[1]),
            )
        };
        let line_width = self.line_width * framebuffer.sample_count as f32;

        let (min_x, min_y, max_x, max_y) = bounding_box(&screen);
        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.buffer_width as i32
            || min_y >= framebuffer.buffer_height as i32
        {
            return;
        }
        let start_x = min_x.max(0) as usize;
        let end_x = max_x.min(framebuffer.buffer_width as i32 - 1) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = max_y.min(framebuffer.buffer_height as i32 - 1) as usize;

        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(bary) = barycentric_coordinates(center, screen[0], screen[1], screen[2])
                else {
                    continue;
                };
                if !is_inside_triangle(bary) {
                    continue;
                }

                if self.fill_mode == FillMode::Wireframe {
                    let distances = bary.component_mul(&edge_scale);
                    if distances.min() > line_width {
                        continue;
                    }
                }

                let Some(corrected) =
                    perspective_correct_barycentric(bary, w_values[0], w_values[1], w_values[2])
                else {
                    continue;
                };

                let z_ndc = (corrected.x * clip_coords[0].z
                    + corrected.y * clip_coords[1].z
                    + corrected.z * clip_coords[2].z)
                    / (corrected.x * w_values[0]
                        + corrected.y * w_values[1]
                        + corrected.z * w_values[2]);
                let depth = z_ndc * 0.5 + 0.5;

                if framebuffer.depth_test_and_update(x, y, depth) {
                    let varying = varyings[0] * corrected.x
                        + varyings[1] * corrected.y
                        + varyings[2] * corrected.z;
                    let color = shader.fragment(varying, uv_density);
                    framebuffer.set_pixel_safe(x, y, color);
                }
            }
        });
    }
}

/// Clips a polygon against one frustum plane into `output`.
fn clip_polygon_against_plane<V: Interpolatable>(
    input: &[ClipVertex<V>],
    output: &mut Vec<ClipVertex<V>>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };

    let is_inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;
    let mut prev = last;
    let mut prev_inside = is_inside(&prev.0);

    for &curr in input {
        let curr_inside = is_inside(&curr.0);
        if curr_inside != prev_inside {
            if let Some(hit) = intersect_edge_plane(prev, curr, axis, sign) {
                output.push(hit);
            }
        }
        if curr_inside {
            output.push(curr);
        }
        prev = curr;
        prev_inside = curr_inside;
    }
}

/// Intersection of segment a-b with the plane `sign * p[axis] = p.w`.
#[inline(always)]
fn intersect_edge_plane<V: Interpolatable>(
    a: ClipVertex<V>,
    b: ClipVertex<V>,
    axis: usize,
    sign: f32,
) -> Option<ClipVertex<V>> {
    let da = a.0.w - sign * a.0[axis];
    let db = b.0.w - sign * b.0[axis];
    let denom = da - db;
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = da / denom;
    if !t.is_finite() {
        return None;
    }
    Some((a.0 + (b.0 - a.0) * t, a.1 * (1.0 - t) + b.1 * t))
}

/// Triangle-level texel-per-pixel estimate: sqrt(Area_uv / Area_screen).
fn estimate_uv_density<V: Interpolatable>(varyings: &[V; 3], area_screen: f32) -> f32 {
    match (
        varyings[0].get_uv(),
        varyings[1].get_uv(),
        varyings[2].get_uv(),
    ) {
        (Some(uv0), Some(uv1), Some(uv2)) if area_screen > 1e-6 => {
            let area_uv = 0.5
                * ((uv1.x - uv0.x) * (uv2.y - uv0.y) - (uv2.x - uv0.x) * (uv1.y - uv0.y)).abs();
            (area_uv / area_screen).sqrt()
        }
        _ => 0.0,
    }
}

fn bounding_box(points: &[Point2<f32>; 3]) -> (i32, i32, i32, i32) {
    let min_x = points[0].x.min(points[1].x).min(points[2].x).floor() as i32;
    let min_y = points[0].y.min(points[1].y).min(points[2].y).floor() as i32;
    let max_x = points[0].x.max(points[1].x).max(points[2].x).ceil() as i32;
    let max_y = points[0].y.max(points[1].y).max(points[2].y).ceil() as i32;
    (min_x, min_y, max_x, max_y)
}
