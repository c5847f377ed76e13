use crate::core::color::pack_argb;
use atomic_float::AtomicF32;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

/// Color + depth render target, optionally supersampled.
/// Thread-safe for parallel rendering using atomic depth and striped locking for color.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Color buffer wrapped in UnsafeCell to allow interior mutability.
    /// Writes are guarded by `locks`.
    color_buffer: UnsafeCell<Vec<Vector3<f32>>>,

    /// Depth in [0, 1], 1.0 is the far plane.
    depth_buffer: Vec<AtomicF32>,

    /// Striped locks protecting color writes.
    locks: Vec<Mutex<()>>,
}

// Color writes go through `locks`, depth is atomic.
unsafe impl Sync for FrameBuffer {}

const LOCK_STRIPES: usize = 1024;

impl FrameBuffer {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;
        let size = buffer_width * buffer_height;

        let depth_buffer = (0..size).map(|_| AtomicF32::new(1.0)).collect();
        let locks = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer,
            locks,
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Resets the color and/or depth planes.
    pub fn clear(&mut self, color: Option<Vector3<f32>>, depth: Option<f32>) {
        if let Some(color) = color {
            self.color_buffer.get_mut().fill(color);
        }
        if let Some(depth) = depth {
            for d in &self.depth_buffer {
                d.store(depth, Ordering::Relaxed);
            }
        }
    }

    /// Depth test with a LESS_EQUAL comparison. Updates the stored depth when the test passes.
    ///
    /// LESS_EQUAL lets a second pass over the same geometry (the wireframe overlay)
    /// land on top of the first one.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let slot = &self.depth_buffer[self.index(x, y)];

        let mut current = slot.load(Ordering::Relaxed);
        loop {
            if new_depth > current {
                return false;
            }
            match slot.compare_exchange_weak(current, new_depth, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Writes a color sample. Call only after `depth_test_and_update` passed.
    #[inline]
    pub fn set_pixel_safe(&self, x: usize, y: usize, color: Vector3<f32>) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        let _guard = self.locks[idx % self.locks.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // SAFETY: the stripe lock for `idx` is held.
        unsafe {
            let buffer = &mut *self.color_buffer.get();
            buffer[idx] = color;
        }
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed))
    }

    /// Reads a resolved (box-filtered) output pixel.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // Only called between draws, no writer is active.
        let buffer = unsafe { &*self.color_buffer.get() };

        if self.sample_count == 1 {
            return Some(buffer[self.index(x, y)]);
        }

        let mut sum = Vector3::zeros();
        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;
        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum += buffer[self.index(start_x + dx, start_y + dy)];
            }
        }
        Some(sum / (self.sample_count * self.sample_count) as f32)
    }

    /// Resolves the supersampled color plane into packed 0xAARRGGBB pixels.
    pub fn resolve_into(&self, out: &mut [u32]) {
        out.par_chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = self.get_pixel(x, y).map(pack_argb).unwrap_or(0);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_sets_color_and_depth() {
        let mut fb = FrameBuffer::new(4, 3, 1);
        fb.clear(Some(Vector3::new(1.0, 0.0, 0.0)), Some(0.5));
        assert_eq!(fb.get_pixel(3, 2), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(fb.depth_at(0, 0), Some(0.5));
    }

    #[test]
    fn depth_test_accepts_equal_depth() {
        let fb = FrameBuffer::new(2, 2, 1);
        assert!(fb.depth_test_and_update(1, 1, 0.25));
        assert!(fb.depth_test_and_update(1, 1, 0.25));
        assert!(!fb.depth_test_and_update(1, 1, 0.3));
        assert!(!fb.depth_test_and_update(5, 5, 0.0));
    }

    #[test]
    fn supersampled_pixels_are_averaged() {
        let fb = FrameBuffer::new(1, 1, 2);
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 1.0, 1.0));
        fb.set_pixel_safe(1, 1, Vector3::new(1.0, 1.0, 1.0));
        let resolved = fb.get_pixel(0, 0).unwrap();
        assert!((resolved.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn resolve_packs_rows() {
        let mut fb = FrameBuffer::new(2, 2, 1);
        fb.clear(Some(Vector3::new(1.0, 1.0, 1.0)), None);
        let mut out = vec![0u32; 4];
        fb.resolve_into(&mut out);
        assert!(out.iter().all(|&p| p == 0xFFFF_FFFF));
    }
}
