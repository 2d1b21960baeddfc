use crate::exposure_comp::common::matrix::Matrix;

/// Solves the augmented system `[A | b]` in place, writing `x` into `gains`.
///
/// Gaussian elimination with partial pivoting followed by back-substitution.
/// There is no singularity check: a zero pivot divides by zero and the
/// resulting NaN/Inf values flow into `gains` unchanged.
pub fn solve_gauss(a: &mut Matrix<f64>, gains: &mut [f32]) {
    let n = a.rows();
    debug_assert_eq!(a.cols(), n + 1);
    debug_assert!(gains.len() >= n);

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = a[(i, i)].abs();
        for k in i + 1..n {
            if a[(k, i)].abs() > max_val {
                max_val = a[(k, i)].abs();
                max_row = k;
            }
        }
        a.swap_rows(i, max_row);

        let pivot = a[(i, i)];
        for k in i + 1..n {
            let c = -a[(k, i)] / pivot;
            a[(k, i)] = 0.0;
            for j in i + 1..=n {
                let v = a[(i, j)];
                a[(k, j)] += c * v;
            }
        }
    }

    // back substitution, folding each solved unknown into the rows above
    for i in (0..n).rev() {
        let x = a[(i, n)] / a[(i, i)];
        for k in 0..i {
            let v = a[(k, i)];
            a[(k, n)] -= v * x;
        }
        gains[i] = x as f32;
    }
}
