use crate::exposure_comp::common::matrix::Matrix;
use crate::exposure_comp::image::types::Rect;

/// Symmetric N x N table of pairwise valid-rectangle intersections.
///
/// Entry `(i, i)` is view `i`'s own valid rectangle; `None` marks a pair with
/// no shared pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapMatrix {
    regions: Matrix<Option<Rect>>,
}

impl OverlapMatrix {
    pub fn new(valid: &[Rect]) -> Self {
        let n = valid.len();
        let mut regions = Matrix::new(n, n, None);
        for i in 0..n {
            for j in i..n {
                let shared = valid[i].intersect(&valid[j]);
                regions[(i, j)] = shared;
                regions[(j, i)] = shared;
            }
        }
        Self { regions }
    }

    pub fn num_views(&self) -> usize {
        self.regions.rows()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<Rect> {
        self.regions[(i, j)]
    }

    /// Unordered pairs `i <= j` that share at least one pixel.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, Rect)> + '_ {
        let n = self.num_views();
        (0..n).flat_map(move |i| {
            (i..n).filter_map(move |j| self.get(i, j).map(|rect| (i, j, rect)))
        })
    }
}
