use std::thread;

use tracing::{debug, instrument};

use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::geometry::ViewLayout;
use crate::exposure_comp::image::PixelPatch;
use crate::exposure_comp::image::types::{Rect, SENTINEL_PIXEL};
use crate::exposure_comp::apply::gains::{Gains, ViewGains};

/// Float to byte conversion with explicit NaN and range handling.
///
/// NaN maps to 0, values are truncated toward zero and clamped to `0..=255`.
#[inline]
pub fn saturate_u8(value: f32) -> u8 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value as u8
    }
}

#[inline]
fn scale_pixel(pixel: u32, gains: &ViewGains) -> u32 {
    let [r, g, b, l] = pixel.to_le_bytes();
    u32::from_le_bytes([
        saturate_u8(r as f32 * gains.red),
        saturate_u8(g as f32 * gains.green),
        saturate_u8(b as f32 * gains.blue),
        saturate_u8(l as f32 * gains.luma),
    ])
}

/// Writes one view's valid rectangle into its destination band.
fn apply_view(
    src: &PixelPatch,
    layout: &ViewLayout,
    view: usize,
    band: &mut [u32],
    dst_stride: usize,
    gains: ViewGains,
) {
    let rect = layout.valid_rect(view);
    if rect.is_empty() {
        return;
    }
    let origin = layout.band_origin(view);
    for y in rect.start_y..rect.end_y {
        let src_row = &src.row(origin + y)[rect.start_x..rect.end_x];
        let row_start = y * dst_stride;
        let dst_row = &mut band[row_start + rect.start_x..row_start + rect.end_x];
        for (d, &s) in dst_row.iter_mut().zip(src_row) {
            *d = if s == SENTINEL_PIXEL { s } else { scale_pixel(s, &gains) };
        }
    }
}

/// Applies `gains` from the full composite `src` into the full composite `dst`.
///
/// Each view's band in `dst` is written by its own worker: views `0..N-1` on
/// scoped threads, the last view on the calling thread. Returns once every
/// worker has finished. Sentinel pixels are copied through unchanged; pixels
/// outside a view's valid rectangle are left as they were in `dst`.
#[instrument(skip_all, fields(views = layout.num_views()))]
pub fn apply_gains(
    src: &PixelPatch,
    dst: &mut PixelPatch,
    layout: &ViewLayout,
    gains: &Gains,
    linearized: bool,
) -> Result<()> {
    let full = Rect::full(layout.width(), layout.composite_height());
    if *src.rect() != full || *dst.rect() != full {
        return Err(ExpCompError::InvalidConfiguration(format!(
            "gain application needs full {}x{} patches, got {:?} and {:?}",
            full.width(), full.height(), src.rect(), dst.rect()
        )));
    }
    let views = layout.num_views();
    if gains.num_views() != views {
        return Err(ExpCompError::InvalidConfiguration(format!(
            "{} gains for {} views",
            gains.num_views(), views
        )));
    }

    let view_gains: Vec<ViewGains> = (0..views).map(|v| gains.for_view(v, linearized)).collect();
    let dst_stride = dst.stride();
    let band_len = layout.view_height() * dst_stride;

    let mut bands: Vec<&mut [u32]> = dst.data_mut().chunks_mut(band_len).take(views).collect();
    let Some(last_band) = bands.pop() else {
        return Ok(());
    };
    let last_view = bands.len();

    thread::scope(|scope| {
        for (view, band) in bands.into_iter().enumerate() {
            let gains = view_gains[view];
            scope.spawn(move || apply_view(src, layout, view, band, dst_stride, gains));
        }
        apply_view(src, layout, last_view, last_band, dst_stride, view_gains[last_view]);
    });

    debug!("Gains applied to {} views", views);
    Ok(())
}
