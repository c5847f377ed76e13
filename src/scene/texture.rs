use crate::error::TextureLoadError;
use image::DynamicImage;
use image::imageops::FilterType;
use log::info;
use nalgebra::{Vector2, Vector3};
use std::path::Path;

/// Texel filter used within one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Point,
    Linear,
}

/// Filter used between mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipFilter {
    /// Always sample the top level.
    None,
    /// Nearest level.
    Point,
    /// Blend the two nearest levels.
    Linear,
}

/// Sampler stage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mip_filter: MipFilter,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            mag_filter: TextureFilter::Point,
            min_filter: TextureFilter::Point,
            mip_filter: MipFilter::None,
        }
    }
}

#[derive(Debug, Clone)]
struct MipLevel {
    width: u32,
    height: u32,
    texels: Vec<Vector3<f32>>,
}

impl MipLevel {
    fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb32f();
        let texels = rgb
            .pixels()
            .map(|p| Vector3::new(p[0], p[1], p[2]))
            .collect();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            texels,
        }
    }

    /// Texel fetch with repeat addressing.
    fn texel(&self, x: i32, y: i32) -> Vector3<f32> {
        let x = x.rem_euclid(self.width as i32) as u32;
        let y = y.rem_euclid(self.height as i32) as u32;
        self.texels[(y * self.width + x) as usize]
    }

    fn sample(&self, u: f32, v: f32, filter: TextureFilter) -> Vector3<f32> {
        // Image rows run top-down, V runs bottom-up.
        let x = u * self.width as f32;
        let y = (1.0 - v) * self.height as f32;

        match filter {
            TextureFilter::Point => self.texel(x.floor() as i32, y.floor() as i32),
            TextureFilter::Linear => {
                let x = x - 0.5;
                let y = y - 0.5;
                let x0 = x.floor() as i32;
                let y0 = y.floor() as i32;
                let wx = x - x.floor();
                let wy = y - y.floor();

                let top = self.texel(x0, y0) * (1.0 - wx) + self.texel(x0 + 1, y0) * wx;
                let bottom = self.texel(x0, y0 + 1) * (1.0 - wx) + self.texel(x0 + 1, y0 + 1) * wx;
                top * (1.0 - wy) + bottom * wy
            }
        }
    }
}

/// A 2D texture with a full mip chain.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    levels: Vec<MipLevel>,
}

impl Texture {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureLoadError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)
            .map_err(|e| TextureLoadError::Image(path_ref.to_path_buf(), e))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(TextureLoadError::Empty(path_ref.to_path_buf()));
        }

        let texture = Self::from_image(img);
        info!(
            "Loaded texture: {:?} ({}x{}, {} mip levels)",
            path_ref,
            texture.width,
            texture.height,
            texture.mip_levels()
        );
        Ok(texture)
    }

    /// Builds the mip chain down to 1x1 by repeated halving.
    pub fn from_image(img: DynamicImage) -> Self {
        let width = img.width().max(1);
        let height = img.height().max(1);

        let mut levels = vec![MipLevel::from_image(&img)];
        let (mut w, mut h) = (width, height);
        let mut current = img;
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            current = current.resize_exact(w, h, FilterType::Triangle);
            levels.push(MipLevel::from_image(&current));
        }

        Self {
            width,
            height,
            levels,
        }
    }

    pub fn mip_levels(&self) -> usize {
        self.levels.len()
    }

    /// Samples at `uv`.
    ///
    /// `uv_density` is the UV-space distance covered by one screen pixel;
    /// it selects between magnification and minification and picks the mip level.
    pub fn sample(&self, uv: Vector2<f32>, uv_density: f32, sampler: &SamplerState) -> Vector3<f32> {
        let texels_per_pixel = uv_density * self.width.max(self.height) as f32;
        let lod = if texels_per_pixel > 0.0 {
            texels_per_pixel.log2()
        } else {
            0.0
        };

        if lod <= 0.0 {
            return self.levels[0].sample(uv.x, uv.y, sampler.mag_filter);
        }

        let max_level = (self.levels.len() - 1) as f32;
        let lod = lod.min(max_level);
        match sampler.mip_filter {
            MipFilter::None => self.levels[0].sample(uv.x, uv.y, sampler.min_filter),
            MipFilter::Point => {
                self.levels[lod.round() as usize].sample(uv.x, uv.y, sampler.min_filter)
            }
            MipFilter::Linear => {
                let lo = lod.floor() as usize;
                let hi = lod.ceil() as usize;
                let t = lod - lod.floor();
                let a = self.levels[lo].sample(uv.x, uv.y, sampler.min_filter);
                let b = self.levels[hi].sample(uv.x, uv.y, sampler.min_filter);
                a * (1.0 - t) + b * t
            }
        }
    }
}
