use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::image::types::Rect;

/// How a patch is going to be used between acquire and commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
}

/// An owned rectangular patch of packed 32-bit pixels.
///
/// Rows are `stride` pixels apart; only the first `rect.width()` pixels of each
/// row belong to the patch. Coordinates passed to [`PixelPatch::row`] are
/// relative to the patch origin.
#[derive(Debug, Clone)]
pub struct PixelPatch {
    rect: Rect,
    stride: usize,
    mode: AccessMode,
    data: Vec<u32>,
}

impl PixelPatch {
    pub fn new(rect: Rect, stride: usize, mode: AccessMode, data: Vec<u32>) -> Result<Self> {
        let (width, height) = (rect.width(), rect.height());
        if stride < width {
            return Err(ExpCompError::AcquireFailed(format!(
                "row stride {} is smaller than patch width {}",
                stride, width
            )));
        }
        let required = if height == 0 { 0 } else { stride * (height - 1) + width };
        if data.len() < required {
            return Err(ExpCompError::AcquireFailed(format!(
                "patch holds {} pixels, {}x{} with stride {} needs {}",
                data.len(), width, height, stride, required
            )));
        }
        Ok(Self { rect, stride, mode, data })
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn width(&self) -> usize {
        self.rect.width()
    }

    pub fn height(&self) -> usize {
        self.rect.height()
    }

    /// Row pitch in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn row(&self, y: usize) -> &[u32] {
        let start = y * self.stride;
        &self.data[start..start + self.rect.width()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        let start = y * self.stride;
        let width = self.rect.width();
        &mut self.data[start..start + width]
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.stride + x]
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u32> {
        self.data
    }
}

/// Host-side access to a named image buffer.
///
/// The engine acquires the whole composite for reading once per call, then the
/// whole output for writing, and commits both back. Any error returned here
/// aborts the current computation and is surfaced to the caller unchanged.
pub trait ImageAccessor {
    /// Full image size as `(width, height)`.
    fn dimensions(&self) -> (usize, usize);

    fn acquire(&mut self, rect: &Rect, mode: AccessMode) -> Result<PixelPatch>;

    /// Returns a patch to the image; write-only patches are copied back.
    fn commit(&mut self, patch: PixelPatch) -> Result<()>;
}
