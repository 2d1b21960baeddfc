//! Overlap statistics module
//!
//! Per-pair mean intensities and valid-pixel counts gathered over overlap
//! regions, plus the gamma lookup tables used for linear-light averaging.

mod collector;
mod gamma;

pub use collector::PairStatistics;
pub(crate) use collector::{PairSums, accumulate_pair};
pub use gamma::{GAIN_ENCODE_EXPONENT, GAMMA, GammaTables};
