//! Block gain refinement module
//!
//! Spatially local gains: one solved system per 32x32 tile, followed by a
//! plus-shaped smoothing pass over each view's valid tiles.

mod grid;
mod refine;
mod smooth;

pub use grid::{BLOCK_SIZE, BlockGrid};
pub use refine::BlockRefiner;
pub use smooth::{SMOOTHING_KERNEL, smooth_block_gains};
