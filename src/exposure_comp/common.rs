//! Common utilities module
//!
//! Error taxonomy and the owned matrix storage shared by the statistics,
//! solver and block refinement stages.

pub mod error;
pub mod matrix;

pub use error::{ExpCompError, Result};
pub use matrix::Matrix;
