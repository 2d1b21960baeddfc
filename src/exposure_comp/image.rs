//! Composite image access module
//!
//! Pixel model of the stacked multi-view buffer, the patch accessor seam the
//! engine reads and writes through, and TIFF loading/saving of composites.

mod accessor;
mod composite;
mod tiff_io;
pub mod types;

pub use accessor::{AccessMode, ImageAccessor, PixelPatch};
pub use composite::CompositeImage;
pub use tiff_io::{
    TiffCompression,
    decode_composite_tiff,
    encode_composite_tiff,
    read_composite_tiff,
    write_composite_tiff,
};
pub use types::{Channel, Rect, SENTINEL_PIXEL, pack_pixel};
