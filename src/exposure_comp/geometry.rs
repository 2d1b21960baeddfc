//! View geometry module
//!
//! Where each view sits inside the composite and which regions two views share.

mod layout;
mod overlap;

pub use layout::ViewLayout;
pub use overlap::OverlapMatrix;
