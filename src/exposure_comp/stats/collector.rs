use tracing::trace;

use crate::exposure_comp::common::matrix::Matrix;
use crate::exposure_comp::geometry::{OverlapMatrix, ViewLayout};
use crate::exposure_comp::image::PixelPatch;
use crate::exposure_comp::image::types::{Channel, Rect, SENTINEL_PIXEL};
use crate::exposure_comp::stats::gamma::GammaTables;

/// Raw sums for one view pair over one window.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairSums<const C: usize> {
    pub count: u32,
    pub first: [u64; C],
    pub second: [u64; C],
}

/// Sums `sample` over `window` (view-local coordinates) for views `i` and `j`.
///
/// For `i != j` a position only counts when neither view holds the sentinel
/// there; for `i == j` only the single source is inspected and `second` stays
/// zero.
pub(crate) fn accumulate_pair<const C: usize, F>(
    src: &PixelPatch,
    layout: &ViewLayout,
    i: usize,
    j: usize,
    window: &Rect,
    sample: F,
) -> PairSums<C>
where
    F: Fn(u32) -> [u32; C],
{
    let mut sums = PairSums {
        count: 0,
        first: [0u64; C],
        second: [0u64; C],
    };
    let (origin_i, origin_j) = (layout.band_origin(i), layout.band_origin(j));
    let columns = window.start_x..window.end_x;

    for y in window.start_y..window.end_y {
        let row_i = &src.row(origin_i + y)[columns.clone()];
        if i == j {
            for &p in row_i.iter().filter(|&&p| p != SENTINEL_PIXEL) {
                sums.count += 1;
                for (acc, v) in sums.first.iter_mut().zip(sample(p)) {
                    *acc += v as u64;
                }
            }
        } else {
            let row_j = &src.row(origin_j + y)[columns.clone()];
            for (&p, &q) in row_i.iter().zip(row_j) {
                if p == SENTINEL_PIXEL || q == SENTINEL_PIXEL {
                    continue;
                }
                sums.count += 1;
                for (acc, v) in sums.first.iter_mut().zip(sample(p)) {
                    *acc += v as u64;
                }
                for (acc, v) in sums.second.iter_mut().zip(sample(q)) {
                    *acc += v as u64;
                }
            }
        }
    }
    sums
}

/// Count matrix `Nz` and up to three intensity matrices `I`.
///
/// `intensity(c)[(i, j)]` is the mean of view `i` over `overlap(i, j)`; it is in
/// general different from `intensity(c)[(j, i)]`. Counts are symmetric and
/// floored at 1, so pairs with no overlap contribute a mean of 0 with weight 1.
#[derive(Debug, Clone)]
pub struct PairStatistics {
    counts: Matrix<u32>,
    intensity: [Matrix<f32>; 3],
}

impl PairStatistics {
    pub fn new(num_views: usize) -> Self {
        Self {
            counts: Matrix::new(num_views, num_views, 1),
            intensity: std::array::from_fn(|_| Matrix::new(num_views, num_views, 0.0)),
        }
    }

    pub fn num_views(&self) -> usize {
        self.counts.rows()
    }

    pub fn counts(&self) -> &Matrix<u32> {
        &self.counts
    }

    pub fn count(&self, i: usize, j: usize) -> u32 {
        self.counts[(i, j)]
    }

    /// Intensity matrix for plane `plane` (0 for single-channel statistics).
    pub fn intensity(&self, plane: usize) -> &Matrix<f32> {
        &self.intensity[plane]
    }

    pub fn mean(&self, plane: usize, i: usize, j: usize) -> f32 {
        self.intensity[plane][(i, j)]
    }

    fn reset(&mut self) {
        self.counts.fill(1);
        for plane in &mut self.intensity {
            plane.fill(0.0);
        }
    }

    fn store<const C: usize>(&mut self, i: usize, j: usize, sums: &PairSums<C>) {
        let nz = sums.count.max(1);
        self.counts[(i, j)] = nz;
        self.counts[(j, i)] = nz;
        for c in 0..C {
            self.intensity[c][(i, j)] = sums.first[c] as f32 / nz as f32;
            if i != j {
                self.intensity[c][(j, i)] = sums.second[c] as f32 / nz as f32;
            }
        }
    }

    /// Single-channel statistics into plane 0.
    pub fn collect_channel(
        &mut self,
        src: &PixelPatch,
        layout: &ViewLayout,
        overlaps: &OverlapMatrix,
        channel: Channel,
    ) {
        self.reset();
        for (i, j, rect) in overlaps.pairs() {
            let sums = accumulate_pair(src, layout, i, j, &rect, |p| [channel.extract(p)]);
            trace!(i, j, count = sums.count, "Pair statistics");
            self.store(i, j, &sums);
        }
    }

    /// Red, green and blue statistics into planes 0, 1 and 2.
    ///
    /// With `linear` set, samples are averaged in linear light.
    pub fn collect_rgb(
        &mut self,
        src: &PixelPatch,
        layout: &ViewLayout,
        overlaps: &OverlapMatrix,
        linear: Option<&GammaTables>,
    ) {
        self.reset();
        for (i, j, rect) in overlaps.pairs() {
            let sums = match linear {
                Some(tables) => accumulate_pair(src, layout, i, j, &rect, |p| {
                    [
                        tables.to_linear(Channel::Red.extract(p) as u8),
                        tables.to_linear(Channel::Green.extract(p) as u8),
                        tables.to_linear(Channel::Blue.extract(p) as u8),
                    ]
                }),
                None => accumulate_pair(src, layout, i, j, &rect, |p| {
                    [
                        Channel::Red.extract(p),
                        Channel::Green.extract(p),
                        Channel::Blue.extract(p),
                    ]
                }),
            };
            trace!(i, j, count = sums.count, "Pair RGB statistics");
            self.store(i, j, &sums);
        }
    }
}
