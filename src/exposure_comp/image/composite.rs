use tracing::trace;

use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::image::accessor::{AccessMode, ImageAccessor, PixelPatch};
use crate::exposure_comp::image::types::{Rect, SENTINEL_PIXEL};

/// In-memory composite buffer: N views stacked vertically, one `u32` per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl CompositeImage {
    /// A composite where every pixel is the sentinel.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, SENTINEL_PIXEL)
    }

    pub fn filled(width: usize, height: usize, value: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(ExpCompError::InvalidDimensions {
                width,
                height,
                views: 0,
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: u32) {
        self.pixels[y * self.width + x] = value;
    }

    /// Fills `rect` with `value`, clipped to the image.
    pub fn fill_rect(&mut self, rect: &Rect, value: u32) {
        let Some(clipped) = rect.intersect(&Rect::full(self.width, self.height)) else {
            return;
        };
        for y in clipped.start_y..clipped.end_y {
            let start = y * self.width;
            self.pixels[start + clipped.start_x..start + clipped.end_x].fill(value);
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

impl ImageAccessor for CompositeImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn acquire(&mut self, rect: &Rect, mode: AccessMode) -> Result<PixelPatch> {
        if rect.is_empty() || !Rect::full(self.width, self.height).contains(rect) {
            return Err(ExpCompError::AcquireFailed(format!(
                "rectangle {:?} is outside the {}x{} image",
                rect, self.width, self.height
            )));
        }
        trace!(?rect, ?mode, "Acquiring composite patch");

        let width = rect.width();
        let mut data = Vec::with_capacity(width * rect.height());
        for y in rect.start_y..rect.end_y {
            let start = y * self.width + rect.start_x;
            data.extend_from_slice(&self.pixels[start..start + width]);
        }
        PixelPatch::new(*rect, width, mode, data)
    }

    fn commit(&mut self, patch: PixelPatch) -> Result<()> {
        if patch.mode() == AccessMode::ReadOnly {
            return Ok(());
        }
        let rect = *patch.rect();
        if !Rect::full(self.width, self.height).contains(&rect) {
            return Err(ExpCompError::CommitFailed(format!(
                "rectangle {:?} is outside the {}x{} image",
                rect, self.width, self.height
            )));
        }
        for (row, y) in (rect.start_y..rect.end_y).enumerate() {
            let start = y * self.width + rect.start_x;
            self.pixels[start..start + rect.width()].copy_from_slice(patch.row(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_commit_round_trip() {
        let mut image = CompositeImage::filled(4, 4, 7);
        let rect = Rect::new(1, 1, 3, 4);
        let mut patch = image.acquire(&rect, AccessMode::WriteOnly).unwrap();
        assert_eq!(patch.width(), 2);
        patch.row_mut(0).fill(9);
        image.commit(patch).unwrap();

        assert_eq!(image.pixel(1, 1), 9);
        assert_eq!(image.pixel(2, 1), 9);
        assert_eq!(image.pixel(1, 2), 7);
        assert_eq!(image.pixel(0, 1), 7);
    }

    #[test]
    fn test_read_only_commit_leaves_image() {
        let mut image = CompositeImage::filled(2, 2, 1);
        let mut patch = image.acquire(&Rect::full(2, 2), AccessMode::ReadOnly).unwrap();
        patch.row_mut(0).fill(5);
        image.commit(patch).unwrap();
        assert!(image.pixels().iter().all(|&p| p == 1));
    }

    #[test]
    fn test_acquire_out_of_bounds() {
        let mut image = CompositeImage::new(4, 4);
        let result = image.acquire(&Rect::new(0, 0, 5, 4), AccessMode::ReadOnly);
        assert!(matches!(result, Err(ExpCompError::AcquireFailed(_))));
    }
}
