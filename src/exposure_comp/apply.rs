//! Gain application module
//!
//! Multiplies every covered pixel of every view by its solved gain, one worker
//! per view.

mod applicator;
mod gains;

pub use applicator::{apply_gains, saturate_u8};
pub use gains::{Gains, ViewGains};
