//! Exposure compensator module
//!
//! Owns the per-instance state (layout, overlap table, gamma tables, scratch
//! matrices, gains and block grid) and sequences statistics, solve and
//! application over a pair of image accessors.

mod config;
mod engine;
mod timing;

#[cfg(test)]
mod tests;

pub use config::{ChannelMode, CompensationConfig, CompensationConfigBuilder};
pub use engine::ExposureCompensator;
pub use timing::{PipelineTimings, StepTiming, Timer};
