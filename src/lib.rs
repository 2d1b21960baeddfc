pub mod exposure_comp;
pub mod logger;
