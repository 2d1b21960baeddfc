use tracing::{debug, instrument};

use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::common::matrix::Matrix;
use crate::exposure_comp::solver::normal_equations::GainSolver;
use crate::exposure_comp::stats::GAIN_ENCODE_EXPONENT;

/// Fixed-point scale applied to means derived from accumulated sums.
const MEAN_SCALE: f64 = 16.0;

/// Solves gains from raw pair sums produced outside the engine.
///
/// `counts` is N x N row-major. `sums` is either N x N (one channel) or three
/// consecutive N x N planes (red, green, blue). Sums with a non-zero count are
/// turned into 4-bit fixed-point means `trunc(sum * 16 / count)`; zero counts
/// weigh as 1 in the system.
///
/// Returns N gains, or 3N gains interleaved `[r, g, b]` per view, re-encoded
/// with [`GAIN_ENCODE_EXPONENT`], for per-channel input.
#[instrument(skip(sums, counts), fields(sums = sums.len()))]
pub fn solve_from_accumulated(
    alpha: f32,
    beta: f32,
    sums: &[u32],
    counts: &[u32],
    num_views: usize,
) -> Result<Vec<f32>> {
    if num_views == 0 {
        return Err(ExpCompError::EmptyRegionList);
    }
    let plane_len = num_views * num_views;
    if counts.len() != plane_len {
        return Err(ExpCompError::InvalidConfiguration(format!(
            "expected {} counts for {} views, got {}",
            plane_len, num_views, counts.len()
        )));
    }
    let planes = match sums.len() / plane_len {
        1 | 3 if sums.len() % plane_len == 0 => sums.len() / plane_len,
        _ => {
            return Err(ExpCompError::InvalidConfiguration(format!(
                "expected {} or {} sums for {} views, got {}",
                plane_len, 3 * plane_len, num_views, sums.len()
            )));
        }
    };

    let weights: Vec<u32> = counts.iter().map(|&n| n.max(1)).collect();
    let weights = Matrix::from_vec(num_views, num_views, weights)
        .ok_or_else(|| ExpCompError::InvalidConfiguration("count matrix shape".to_string()))?;

    let mut solver = GainSolver::new(num_views, alpha, beta);
    let mut solved = vec![vec![0.0f32; num_views]; planes];

    for (plane, gains) in sums.chunks_exact(plane_len).zip(solved.iter_mut()) {
        let means: Vec<f32> = plane
            .iter()
            .zip(counts)
            .map(|(&sum, &n)| {
                if n != 0 {
                    (sum as f64 * MEAN_SCALE / n as f64) as u32 as f32
                } else {
                    sum as f32
                }
            })
            .collect();
        let means = Matrix::from_vec(num_views, num_views, means)
            .ok_or_else(|| ExpCompError::InvalidConfiguration("sum matrix shape".to_string()))?;
        solver.solve(&means, &weights, gains);
    }

    if planes == 1 {
        debug!(gains = ?solved[0], "Solved gains from accumulated sums");
        return Ok(solved.swap_remove(0));
    }

    let interleaved: Vec<f32> = (0..num_views)
        .flat_map(|view| {
            solved
                .iter()
                .map(move |plane| plane[view].powf(GAIN_ENCODE_EXPONENT))
                .collect::<Vec<_>>()
        })
        .collect();
    debug!(gains = ?interleaved, "Solved RGB gains from accumulated sums");
    Ok(interleaved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel_matches_direct_solve() {
        // sums of 100 px at mean 100 (view 0) and 150 (view 1) over the overlap
        let sums = [0u32, 10_000, 15_000, 0];
        let counts = [0u32, 100, 100, 0];
        let gains = solve_from_accumulated(0.01, 100.0, &sums, &counts, 2).unwrap();

        assert_eq!(gains.len(), 2);
        assert!(gains[0] > gains[1]);
        assert!(gains.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_rgb_output_is_interleaved_and_encoded() {
        // identical planes solve to identical per-channel gains
        let plane = [0u32, 10_000, 15_000, 0];
        let sums: Vec<u32> = plane.iter().chain(&plane).chain(&plane).copied().collect();
        let counts = [0u32, 100, 100, 0];

        let luma = solve_from_accumulated(0.01, 100.0, &plane, &counts, 2).unwrap();
        let rgb = solve_from_accumulated(0.01, 100.0, &sums, &counts, 2).unwrap();

        assert_eq!(rgb.len(), 6);
        for view in 0..2 {
            let expected = luma[view].powf(GAIN_ENCODE_EXPONENT);
            for c in 0..3 {
                assert!((rgb[view * 3 + c] - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let result = solve_from_accumulated(0.01, 100.0, &[0; 8], &[0; 4], 2);
        assert!(matches!(result, Err(ExpCompError::InvalidConfiguration(_))));
        let result = solve_from_accumulated(0.01, 100.0, &[0; 4], &[0; 3], 2);
        assert!(matches!(result, Err(ExpCompError::InvalidConfiguration(_))));
        let result = solve_from_accumulated(0.01, 100.0, &[], &[], 0);
        assert!(matches!(result, Err(ExpCompError::EmptyRegionList)));
    }
}
