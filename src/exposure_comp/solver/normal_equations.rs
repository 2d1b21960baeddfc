use tracing::{trace, warn};

use crate::exposure_comp::common::matrix::Matrix;
use crate::exposure_comp::solver::gauss::solve_gauss;

/// Assembles the normal equations of
///
/// `E(g) = sum_ij beta*N_ij*(g_i - 1)^2 + sum_{i!=j} alpha*N_ij*(g_i*I_ij - g_j*I_ji)^2`
///
/// into the N x (N+1) augmented matrix `a`, overwriting its previous contents.
pub fn build_normal_equations(
    a: &mut Matrix<f64>,
    intensity: &Matrix<f32>,
    counts: &Matrix<u32>,
    alpha: f32,
    beta: f32,
) {
    let n = counts.rows();
    debug_assert_eq!(a.rows(), n);
    debug_assert_eq!(a.cols(), n + 1);

    let (alpha, beta) = (alpha as f64, beta as f64);
    a.fill(0.0);
    for i in 0..n {
        for j in 0..n {
            let nz = counts[(i, j)] as f64;
            a[(i, n)] += beta * nz;
            a[(i, i)] += beta * nz;
            if j == i {
                continue;
            }
            let i_ij = intensity[(i, j)] as f64;
            let i_ji = intensity[(j, i)] as f64;
            a[(i, i)] += 2.0 * alpha * i_ij * i_ij * nz;
            a[(i, j)] -= 2.0 * alpha * i_ij * i_ji * nz;
        }
    }
}

/// Reusable solver state: the double-precision augmented matrix plus weights.
#[derive(Debug, Clone)]
pub struct GainSolver {
    augmented: Matrix<f64>,
    alpha: f32,
    beta: f32,
}

impl GainSolver {
    pub fn new(num_views: usize, alpha: f32, beta: f32) -> Self {
        Self {
            augmented: Matrix::new(num_views, num_views + 1, 0.0),
            alpha,
            beta,
        }
    }

    pub fn num_views(&self) -> usize {
        self.augmented.rows()
    }

    /// The augmented matrix as left by the last [`GainSolver::solve`] (reduced form).
    pub fn augmented(&self) -> &Matrix<f64> {
        &self.augmented
    }

    /// Builds the system from one intensity plane and solves it into `gains`.
    pub fn solve(&mut self, intensity: &Matrix<f32>, counts: &Matrix<u32>, gains: &mut [f32]) {
        build_normal_equations(&mut self.augmented, intensity, counts, self.alpha, self.beta);
        solve_gauss(&mut self.augmented, gains);

        trace!(?gains, "Solved gains");
        if gains.iter().any(|g| !g.is_finite()) {
            warn!(?gains, "Gain system is singular, non-finite gains produced");
        }
    }
}
