//! Exposure compensation engine
//!
//! Harmonizes brightness and color across the overlapping views of a stitched
//! multi-camera composite. Data flows one way: overlap geometry, pairwise
//! statistics, normal equations, solved gains, and finally gain application.
//! Block refinement repeats statistics and solve per 32x32 tile and smooths
//! the resulting gain grid.

pub mod common;
pub mod image;
pub mod geometry;
pub mod stats;
pub mod solver;
pub mod apply;
pub mod block;
pub mod compensator;

pub use common::{
    ExpCompError,
    Matrix,
    Result,
};

pub use image::{
    AccessMode,
    Channel,
    CompositeImage,
    ImageAccessor,
    PixelPatch,
    Rect,
    SENTINEL_PIXEL,
    TiffCompression,
    decode_composite_tiff,
    encode_composite_tiff,
    pack_pixel,
    read_composite_tiff,
    write_composite_tiff,
};

pub use geometry::{
    OverlapMatrix,
    ViewLayout,
};

pub use stats::{
    GAIN_ENCODE_EXPONENT,
    GAMMA,
    GammaTables,
    PairStatistics,
};

pub use solver::{
    GainSolver,
    build_normal_equations,
    solve_from_accumulated,
    solve_gauss,
};

pub use apply::{
    Gains,
    ViewGains,
    apply_gains,
    saturate_u8,
};

pub use block::{
    BLOCK_SIZE,
    BlockGrid,
    BlockRefiner,
    SMOOTHING_KERNEL,
    smooth_block_gains,
};

pub use compensator::{
    ChannelMode,
    CompensationConfig,
    CompensationConfigBuilder,
    ExposureCompensator,
    PipelineTimings,
    StepTiming,
    Timer,
};
