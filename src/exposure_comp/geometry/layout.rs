use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::image::types::Rect;

/// Placement of N equally sized views stacked vertically in one composite.
///
/// View `i` occupies rows `[i * view_height, (i + 1) * view_height)`. Valid
/// rectangles are expressed in view-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLayout {
    width: usize,
    view_height: usize,
    valid: Vec<Rect>,
}

impl ViewLayout {
    pub fn new(width: usize, composite_height: usize, valid: Vec<Rect>) -> Result<Self> {
        if valid.is_empty() {
            return Err(ExpCompError::EmptyRegionList);
        }
        let views = valid.len();
        if width == 0 || composite_height == 0 || composite_height % views != 0 {
            return Err(ExpCompError::InvalidDimensions {
                width,
                height: composite_height,
                views,
            });
        }
        let view_height = composite_height / views;
        let band = Rect::full(width, view_height);
        if let Some((index, rect)) = valid
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_empty() && !band.contains(r))
        {
            return Err(ExpCompError::InvalidConfiguration(format!(
                "valid rectangle {:?} of view {} exceeds the {}x{} view band",
                rect, index, width, view_height
            )));
        }
        Ok(Self { width, view_height, valid })
    }

    pub fn num_views(&self) -> usize {
        self.valid.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn view_height(&self) -> usize {
        self.view_height
    }

    pub fn composite_height(&self) -> usize {
        self.view_height * self.valid.len()
    }

    pub fn valid_rect(&self, view: usize) -> &Rect {
        &self.valid[view]
    }

    pub fn valid_rects(&self) -> &[Rect] {
        &self.valid
    }

    /// First composite row of `view`'s band.
    pub fn band_origin(&self, view: usize) -> usize {
        view * self.view_height
    }
}
