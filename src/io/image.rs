use crate::core::color::unpack_rgb8;
use crate::error::ViewerError;
use image::{ImageBuffer, Rgb};
use std::path::Path;

/// Saves a packed 0xAARRGGBB buffer as an RGB image. The format follows the extension.
pub fn save_buffer_to_image(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: &Path,
) -> Result<(), ViewerError> {
    let img_buf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let idx = (y as usize) * width + (x as usize);
        Rgb(buffer.get(idx).map_or([0, 0, 0], |&p| unpack_rgb8(p)))
    });

    img_buf
        .save(path)
        .map_err(|e| ViewerError::Image(path.to_path_buf(), e))
}
