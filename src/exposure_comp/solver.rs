//! Gain solver module
//!
//! Builds the least-squares normal equations from pair statistics and solves
//! them by Gaussian elimination.

mod accumulated;
mod gauss;
mod normal_equations;

pub use accumulated::solve_from_accumulated;
pub use gauss::solve_gauss;
pub use normal_equations::{GainSolver, build_normal_equations};
