//! TIFF loading and saving of 8-bit composite buffers.
//!
//! RGBA8 files map byte-for-byte onto the packed pixel layout, so a
//! `(0, 0, 0, 128)` pixel decodes to the sentinel. RGB8 files get a synthesized
//! luma byte.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{Compression, TiffEncoder, colortype, compression::DeflateLevel};
use tracing::{debug, instrument};

use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::image::composite::CompositeImage;
use crate::exposure_comp::image::types::pack_pixel;

/// TIFF compression methods for corrected composites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

impl TiffCompression {
    fn to_encoder(self) -> Compression {
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// BT.601 integer luma used when the source has no fourth channel.
fn synth_luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

pub fn decode_composite_tiff<R: Read + Seek>(reader: R) -> Result<CompositeImage> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| ExpCompError::DecodeError(e.to_string()))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| ExpCompError::DecodeError(e.to_string()))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| ExpCompError::DecodeError(e.to_string()))?;

    debug!("Decoding composite TIFF: {}x{} {:?}", width, height, color_type);

    let channels = match color_type {
        ColorType::RGBA(8) => 4,
        ColorType::RGB(8) => 3,
        other => return Err(ExpCompError::UnsupportedFormat(format!("{:?}", other))),
    };

    let bytes = match decoder
        .read_image()
        .map_err(|e| ExpCompError::DecodeError(e.to_string()))?
    {
        DecodingResult::U8(bytes) => bytes,
        _ => return Err(ExpCompError::UnsupportedFormat("expected 8-bit samples".to_string())),
    };

    let pixels: Vec<u32> = if channels == 4 {
        bytes
            .chunks_exact(4)
            .map(|p| pack_pixel(p[0], p[1], p[2], p[3]))
            .collect()
    } else {
        bytes
            .chunks_exact(3)
            .map(|p| pack_pixel(p[0], p[1], p[2], synth_luma(p[0], p[1], p[2])))
            .collect()
    };

    CompositeImage::from_pixels(width as usize, height as usize, pixels)
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_composite_tiff<P: AsRef<Path>>(path: P) -> Result<CompositeImage> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        ExpCompError::DecodeError(format!("{}: {}", path.display(), e))
    })?;
    decode_composite_tiff(std::io::BufReader::new(file))
}

pub fn encode_composite_tiff(
    image: &CompositeImage,
    output: &mut dyn Write,
    compression: TiffCompression,
) -> Result<()> {
    debug!("Encoding composite TIFF: {}x{}", image.width(), image.height());

    let bytes: Vec<u8> = image.pixels().iter().flat_map(|p| p.to_le_bytes()).collect();

    let mut buffer = Vec::new();
    let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
        .map_err(|e| ExpCompError::EncodeError(e.to_string()))?
        .with_compression(compression.to_encoder());

    encoder
        .write_image::<colortype::RGBA8>(image.width() as u32, image.height() as u32, &bytes)
        .map_err(|e| ExpCompError::EncodeError(e.to_string()))?;

    output.write_all(&buffer)?;
    Ok(())
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_composite_tiff<P: AsRef<Path>>(
    image: &CompositeImage,
    path: P,
    compression: TiffCompression,
) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path).map_err(|e| {
        ExpCompError::EncodeError(format!("{}: {}", path.display(), e))
    })?;
    encode_composite_tiff(image, &mut file, compression)
}
