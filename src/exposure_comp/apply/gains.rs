use crate::exposure_comp::stats::GAIN_ENCODE_EXPONENT;

/// Solved gain vector(s), one entry per view.
#[derive(Debug, Clone, PartialEq)]
pub enum Gains {
    /// One gain per view applied to every byte.
    Luma(Vec<f32>),
    /// Independent red, green and blue systems, solved in linear light when
    /// linearization is on.
    PerChannel {
        red: Vec<f32>,
        green: Vec<f32>,
        blue: Vec<f32>,
    },
}

impl Gains {
    pub fn unity_luma(num_views: usize) -> Self {
        Gains::Luma(vec![1.0; num_views])
    }

    pub fn unity_per_channel(num_views: usize) -> Self {
        Gains::PerChannel {
            red: vec![1.0; num_views],
            green: vec![1.0; num_views],
            blue: vec![1.0; num_views],
        }
    }

    pub fn num_views(&self) -> usize {
        match self {
            Gains::Luma(g) => g.len(),
            Gains::PerChannel { red, .. } => red.len(),
        }
    }

    /// Flat view of the solved values: N entries, or `[r, g, b]` per view.
    pub fn to_flat(&self) -> Vec<f32> {
        match self {
            Gains::Luma(g) => g.clone(),
            Gains::PerChannel { red, green, blue } => red
                .iter()
                .zip(green)
                .zip(blue)
                .flat_map(|((&r, &g), &b)| [r, g, b])
                .collect(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_flat().iter().all(|g| g.is_finite())
    }

    /// Multipliers for each byte of `view`'s pixels.
    ///
    /// Per-channel gains are re-encoded with [`GAIN_ENCODE_EXPONENT`] when
    /// `linearized`; the fourth byte always takes the first system's raw gain.
    pub fn for_view(&self, view: usize, linearized: bool) -> ViewGains {
        match self {
            Gains::Luma(g) => ViewGains::uniform(g[view]),
            Gains::PerChannel { red, green, blue } => {
                let encode = |g: f32| if linearized { g.powf(GAIN_ENCODE_EXPONENT) } else { g };
                ViewGains {
                    red: encode(red[view]),
                    green: encode(green[view]),
                    blue: encode(blue[view]),
                    luma: red[view],
                }
            }
        }
    }
}

/// Resolved per-byte multipliers for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGains {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub luma: f32,
}

impl ViewGains {
    pub fn uniform(gain: f32) -> Self {
        Self {
            red: gain,
            green: gain,
            blue: gain,
            luma: gain,
        }
    }
}
