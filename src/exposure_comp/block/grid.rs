use crate::exposure_comp::image::types::Rect;

/// Edge length of a refinement tile in pixels.
pub const BLOCK_SIZE: usize = 32;

/// Per-view grids of block gains, stored view-major in one flat buffer.
///
/// Each view owns `ceil(W / 32) * ceil(H / 32)` values in row-major block
/// order, where `H` is the height of one view band.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrid {
    blocks_w: usize,
    blocks_h: usize,
    num_views: usize,
    gains: Vec<f32>,
}

impl BlockGrid {
    pub fn new(width: usize, view_height: usize, num_views: usize) -> Self {
        let blocks_w = width.div_ceil(BLOCK_SIZE);
        let blocks_h = view_height.div_ceil(BLOCK_SIZE);
        Self {
            blocks_w,
            blocks_h,
            num_views,
            gains: vec![1.0; blocks_w * blocks_h * num_views],
        }
    }

    pub fn blocks_w(&self) -> usize {
        self.blocks_w
    }

    pub fn blocks_h(&self) -> usize {
        self.blocks_h
    }

    pub fn num_views(&self) -> usize {
        self.num_views
    }

    pub fn blocks_per_view(&self) -> usize {
        self.blocks_w * self.blocks_h
    }

    pub fn get(&self, view: usize, bx: usize, by: usize) -> f32 {
        self.gains[view * self.blocks_per_view() + by * self.blocks_w + bx]
    }

    pub fn set(&mut self, view: usize, bx: usize, by: usize, gain: f32) {
        let index = view * self.blocks_per_view() + by * self.blocks_w + bx;
        self.gains[index] = gain;
    }

    pub fn view(&self, view: usize) -> &[f32] {
        let len = self.blocks_per_view();
        &self.gains[view * len..(view + 1) * len]
    }

    pub fn view_mut(&mut self, view: usize) -> &mut [f32] {
        let len = self.blocks_per_view();
        &mut self.gains[view * len..(view + 1) * len]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.gains
    }

    pub fn reset(&mut self) {
        self.gains.fill(1.0);
    }

    /// Pixel rectangle `rect` widened to whole blocks and clipped to the grid.
    pub fn block_bounds(&self, rect: &Rect) -> Rect {
        Rect::new(
            (rect.start_x / BLOCK_SIZE).min(self.blocks_w),
            (rect.start_y / BLOCK_SIZE).min(self.blocks_h),
            rect.end_x.div_ceil(BLOCK_SIZE).min(self.blocks_w),
            rect.end_y.div_ceil(BLOCK_SIZE).min(self.blocks_h),
        )
    }
}
