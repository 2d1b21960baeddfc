//! Pixel and rectangle types

/// Marks a composite pixel that no view covers.
///
/// Sentinel pixels never contribute to statistics and are copied through
/// gain application untouched.
pub const SENTINEL_PIXEL: u32 = 0x8000_0000;

/// Packs four 8-bit channels into the composite's 32-bit layout.
///
/// Byte 0 is red, byte 1 green, byte 2 blue and byte 3 the luma/alpha byte.
pub const fn pack_pixel(r: u8, g: u8, b: u8, luma: u8) -> u32 {
    u32::from_le_bytes([r, g, b, luma])
}

/// Half-open axis-aligned rectangle `[start_x, end_x) x [start_y, end_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

impl Rect {
    pub const fn new(start_x: usize, start_y: usize, end_x: usize, end_y: usize) -> Self {
        Self { start_x, start_y, end_x, end_y }
    }

    /// Rectangle covering a whole `width x height` area from the origin.
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> usize {
        self.end_x.saturating_sub(self.start_x)
    }

    pub fn height(&self) -> usize {
        self.end_y.saturating_sub(self.start_y)
    }

    pub fn is_empty(&self) -> bool {
        self.start_x >= self.end_x || self.start_y >= self.end_y
    }

    /// Axis-aligned intersection, `None` when the rectangles share no pixel.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.start_x.max(other.start_x);
        let y1 = self.start_y.max(other.start_y);
        let x2 = self.end_x.min(other.end_x);
        let y2 = self.end_y.min(other.end_y);
        if x1 < x2 && y1 < y2 {
            Some(Rect::new(x1, y1, x2, y2))
        } else {
            None
        }
    }

    /// True when `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.start_x >= self.start_x
            && other.start_y >= self.start_y
            && other.end_x <= self.end_x
            && other.end_y <= self.end_y
    }

    /// Same rectangle moved down by `dy` rows.
    pub fn offset_y(&self, dy: usize) -> Rect {
        Rect::new(self.start_x, self.start_y + dy, self.end_x, self.end_y + dy)
    }
}

/// Channel selector for statistics gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Top byte, which carries luma in stitched composites.
    #[default]
    Luma,
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Maps the integer channel flag used by stitching hosts (0 luma, 1 red, 2 green, 3 blue).
    pub fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 => Some(Channel::Luma),
            1 => Some(Channel::Red),
            2 => Some(Channel::Green),
            3 => Some(Channel::Blue),
            _ => None,
        }
    }

    const fn shift(self) -> u32 {
        match self {
            Channel::Red => 0,
            Channel::Green => 8,
            Channel::Blue => 16,
            Channel::Luma => 24,
        }
    }

    #[inline]
    pub fn extract(self, pixel: u32) -> u32 {
        (pixel >> self.shift()) & 0xFF
    }
}
