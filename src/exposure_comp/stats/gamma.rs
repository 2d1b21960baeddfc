/// Display gamma assumed for 8-bit composites.
pub const GAMMA: f32 = 2.2;

/// Exponent that re-encodes a gain solved in linear light (approximately `1 / GAMMA`).
pub const GAIN_ENCODE_EXPONENT: f32 = 0.454546;

const LINEAR_ENTRIES: usize = 1024;

/// Gamma <-> linear lookup tables, built once per engine.
///
/// `to_linear` maps an 8-bit encoded value to its linear-light value on the
/// same 0..=255 scale; `to_gamma` maps a 10-bit linear value back to 8-bit.
#[derive(Debug, Clone)]
pub struct GammaTables {
    to_linear: [u32; 256],
    to_gamma: [u8; LINEAR_ENTRIES],
}

impl GammaTables {
    pub fn new() -> Self {
        let mut to_linear = [0u32; 256];
        for (i, entry) in to_linear.iter_mut().enumerate() {
            *entry = (255.0 * (i as f32 / 255.0).powf(GAMMA)) as u32;
        }

        let mut to_gamma = [0u8; LINEAR_ENTRIES];
        let top = (LINEAR_ENTRIES - 1) as f32;
        for (i, entry) in to_gamma.iter_mut().enumerate() {
            let value = 255.75 * (i as f32 / top).powf(1.0 / GAMMA);
            *entry = value.min(255.0) as u8;
        }

        Self { to_linear, to_gamma }
    }

    #[inline]
    pub fn to_linear(&self, encoded: u8) -> u32 {
        self.to_linear[encoded as usize]
    }

    /// Re-encodes a 10-bit linear value; inputs above 1023 clamp to the top entry.
    #[inline]
    pub fn to_gamma(&self, linear: u16) -> u8 {
        self.to_gamma[(linear as usize).min(LINEAR_ENTRIES - 1)]
    }
}

impl Default for GammaTables {
    fn default() -> Self {
        Self::new()
    }
}
