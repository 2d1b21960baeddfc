use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::exposure_comp::block::grid::{BLOCK_SIZE, BlockGrid};
use crate::exposure_comp::common::matrix::Matrix;
use crate::exposure_comp::geometry::{OverlapMatrix, ViewLayout};
use crate::exposure_comp::image::PixelPatch;
use crate::exposure_comp::image::types::{Channel, Rect};
use crate::exposure_comp::solver::GainSolver;
use crate::exposure_comp::stats::accumulate_pair;

/// Per-worker statistics for one tile.
struct BlockScratch {
    counts: Matrix<u32>,
    intensity: Matrix<f32>,
    covered: Vec<bool>,
}

impl BlockScratch {
    fn new(num_views: usize) -> Self {
        Self {
            counts: Matrix::new(num_views, num_views, 0),
            intensity: Matrix::new(num_views, num_views, 0.0),
            covered: vec![false; num_views],
        }
    }

    fn reset(&mut self) {
        self.counts.fill(0);
        self.intensity.fill(0.0);
        self.covered.fill(false);
    }
}

/// Solves one gain per view for every 32x32 tile of the view band.
#[derive(Debug, Clone, Copy)]
pub struct BlockRefiner {
    alpha: f32,
    beta: f32,
    channel: Channel,
}

impl BlockRefiner {
    pub fn new(alpha: f32, beta: f32, channel: Channel) -> Self {
        Self { alpha, beta, channel }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Gathers statistics for a single tile over every pair whose block-aligned
    /// overlap covers it.
    fn gather(
        &self,
        src: &PixelPatch,
        layout: &ViewLayout,
        pairs: &[(usize, usize, Rect)],
        bx: usize,
        by: usize,
        scratch: &mut BlockScratch,
    ) {
        scratch.reset();
        let window = Rect::new(
            bx * BLOCK_SIZE,
            by * BLOCK_SIZE,
            ((bx + 1) * BLOCK_SIZE).min(layout.width()),
            ((by + 1) * BLOCK_SIZE).min(layout.view_height()),
        );
        let channel = self.channel;

        for &(i, j, bounds) in pairs {
            if bx < bounds.start_x || bx >= bounds.end_x || by < bounds.start_y || by >= bounds.end_y {
                continue;
            }
            let sums = accumulate_pair(src, layout, i, j, &window, |p| [channel.extract(p)]);
            let nz = sums.count.max(1);
            scratch.counts[(i, j)] = nz;
            scratch.counts[(j, i)] = nz;
            scratch.intensity[(i, j)] = sums.first[0] as f32 / nz as f32;
            if i != j {
                scratch.intensity[(j, i)] = sums.second[0] as f32 / nz as f32;
            }
            scratch.covered[i] = true;
            scratch.covered[j] = true;
        }
    }

    /// Solves the system restricted to the views covering the tile.
    ///
    /// Views that do not reach the tile keep a neutral gain of 1.0, which also
    /// keeps their empty rows out of the elimination.
    fn solve_block(&self, scratch: &BlockScratch) -> Vec<f32> {
        let n = scratch.covered.len();
        let mut gains = vec![1.0f32; n];
        let members: Vec<usize> = (0..n).filter(|&v| scratch.covered[v]).collect();
        if members.is_empty() {
            return gains;
        }

        let m = members.len();
        let mut counts = Matrix::new(m, m, 0u32);
        let mut intensity = Matrix::new(m, m, 0.0f32);
        for (a, &i) in members.iter().enumerate() {
            for (b, &j) in members.iter().enumerate() {
                counts[(a, b)] = scratch.counts[(i, j)];
                intensity[(a, b)] = scratch.intensity[(i, j)];
            }
        }

        let mut solved = vec![0.0f32; m];
        GainSolver::new(m, self.alpha, self.beta).solve(&intensity, &counts, &mut solved);
        for (&view, gain) in members.iter().zip(solved) {
            gains[view] = gain;
        }
        gains
    }

    /// Fills `grid` with unsmoothed per-tile gains.
    ///
    /// Tiles are independent, so they are solved in parallel; each worker keeps
    /// its own scratch matrices.
    #[instrument(skip_all, fields(channel = ?self.channel, blocks = grid.blocks_per_view()))]
    pub fn compute(
        &self,
        src: &PixelPatch,
        layout: &ViewLayout,
        overlaps: &OverlapMatrix,
        grid: &mut BlockGrid,
    ) {
        let num_views = layout.num_views();
        let pairs: Vec<(usize, usize, Rect)> = overlaps
            .pairs()
            .map(|(i, j, rect)| (i, j, grid.block_bounds(&rect)))
            .collect();
        let (blocks_w, blocks_h) = (grid.blocks_w(), grid.blocks_h());

        let solved: Vec<Vec<f32>> = (0..blocks_w * blocks_h)
            .into_par_iter()
            .map_init(
                || BlockScratch::new(num_views),
                |scratch, block| {
                    let (bx, by) = (block % blocks_w, block / blocks_w);
                    self.gather(src, layout, &pairs, bx, by, scratch);
                    self.solve_block(scratch)
                },
            )
            .collect();

        let mut non_finite = 0usize;
        for (block, gains) in solved.iter().enumerate() {
            let (bx, by) = (block % blocks_w, block / blocks_w);
            for (view, &gain) in gains.iter().enumerate() {
                if !gain.is_finite() {
                    non_finite += 1;
                }
                grid.set(view, bx, by, gain);
            }
        }
        if non_finite > 0 {
            warn!(non_finite, "Block systems produced non-finite gains");
        }
        debug!("Solved {} block systems", solved.len());
    }
}
