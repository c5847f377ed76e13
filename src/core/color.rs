use nalgebra::Vector3;

/// Opaque white, the default clear color.
pub fn white() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

/// Yellow, the default wireframe overlay color.
pub fn yellow() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 0.0)
}

/// Saturates each channel into [0, 1].
pub fn saturate(color: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(
        color.x.clamp(0.0, 1.0),
        color.y.clamp(0.0, 1.0),
        color.z.clamp(0.0, 1.0),
    )
}

/// Packs a [0, 1] RGB color into a 0xAARRGGBB word with full alpha.
/// This is the pixel layout `minifb` expects.
pub fn pack_argb(color: Vector3<f32>) -> u32 {
    let c = saturate(color);
    let r = (c.x * 255.0 + 0.5) as u32;
    let g = (c.y * 255.0 + 0.5) as u32;
    let b = (c.z * 255.0 + 0.5) as u32;
    (255 << 24) | (r << 16) | (g << 8) | b
}

/// Splits a packed 0xAARRGGBB word into 8-bit RGB channels.
pub fn unpack_rgb8(pixel: u32) -> [u8; 3] {
    [
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_packs_to_opaque_white() {
        assert_eq!(pack_argb(white()), 0xFFFF_FFFF);
    }

    #[test]
    fn out_of_range_channels_saturate() {
        let packed = pack_argb(Vector3::new(2.0, -1.0, 0.5));
        assert_eq!(unpack_rgb8(packed), [255, 0, 128]);
    }
}
