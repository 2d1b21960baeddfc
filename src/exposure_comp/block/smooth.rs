use tracing::{instrument, trace};

use crate::exposure_comp::block::grid::BlockGrid;
use crate::exposure_comp::geometry::ViewLayout;

/// Weights for the up, left, center, right and down taps.
pub const SMOOTHING_KERNEL: [f32; 5] = [0.125, 0.125, 0.5, 0.125, 0.125];

/// Plus-shaped blur of each view's block gains over its valid rectangle.
///
/// Every tile inside the view's block-aligned valid rectangle is rewritten from
/// a snapshot of the unsmoothed grid, so no tile sees an already smoothed
/// neighbour. A tap that would leave the rectangle reads the center tile's row
/// or column instead. Tiles outside the rectangle are not touched.
#[instrument(skip_all, fields(views = layout.num_views()))]
pub fn smooth_block_gains(grid: &mut BlockGrid, layout: &ViewLayout) {
    let [k_up, k_left, k_center, k_right, k_down] = SMOOTHING_KERNEL;
    let stride = grid.blocks_w();

    for view in 0..layout.num_views() {
        let bounds = grid.block_bounds(layout.valid_rect(view));
        if bounds.is_empty() {
            continue;
        }
        let snapshot = grid.view(view).to_vec();
        let gains = grid.view_mut(view);

        for y in bounds.start_y..bounds.end_y {
            let up = if y > bounds.start_y { y - 1 } else { y };
            let down = if y + 1 < bounds.end_y { y + 1 } else { y };
            for x in bounds.start_x..bounds.end_x {
                let left = if x > bounds.start_x { x - 1 } else { x };
                let right = if x + 1 < bounds.end_x { x + 1 } else { x };

                gains[y * stride + x] = snapshot[up * stride + x] * k_up
                    + snapshot[y * stride + left] * k_left
                    + snapshot[y * stride + x] * k_center
                    + snapshot[y * stride + right] * k_right
                    + snapshot[down * stride + x] * k_down;
            }
        }
        trace!(view, ?bounds, "Smoothed block gains");
    }
}
