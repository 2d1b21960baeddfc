//! Compensation configuration types

use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::image::types::Channel;

/// Which statistics drive the global gain solve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelMode {
    /// One system on the top (luma) byte, one gain per view for all bytes
    #[default]
    Luma,
    /// Three systems on red, green and blue sharing one count matrix
    PerChannel,
}

/// Configuration for an exposure compensator
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationConfig {
    /// Weight of the overlap consistency term
    pub alpha: f32,
    /// Weight pulling every gain toward 1.0
    pub beta: f32,
    /// Statistics used for the global solve
    pub channel_mode: ChannelMode,
    /// Average per-channel samples in linear light and re-encode the gains.
    /// Ignored in luma mode.
    pub linearize: bool,
    /// Allocate the block gain grid and allow block refinement
    pub block_gains: bool,
    /// Channel sampled by block refinement
    pub block_channel: Channel,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            beta: 100.0,
            channel_mode: ChannelMode::Luma,
            linearize: true,
            block_gains: false,
            block_channel: Channel::Luma,
        }
    }
}

impl CompensationConfig {
    pub fn builder() -> CompensationConfigBuilder {
        CompensationConfigBuilder::default()
    }

    /// Rejects weights that would make the normal equations meaningless.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ExpCompError::InvalidConfiguration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Builder for CompensationConfig
#[derive(Default)]
pub struct CompensationConfigBuilder {
    alpha: Option<f32>,
    beta: Option<f32>,
    channel_mode: Option<ChannelMode>,
    linearize: Option<bool>,
    block_gains: Option<bool>,
    block_channel: Option<Channel>,
}

impl CompensationConfigBuilder {
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn channel_mode(mut self, mode: ChannelMode) -> Self {
        self.channel_mode = Some(mode);
        self
    }

    pub fn linearize(mut self, enable: bool) -> Self {
        self.linearize = Some(enable);
        self
    }

    pub fn block_gains(mut self, enable: bool) -> Self {
        self.block_gains = Some(enable);
        self
    }

    pub fn block_channel(mut self, channel: Channel) -> Self {
        self.block_channel = Some(channel);
        self
    }

    pub fn build(self) -> CompensationConfig {
        let default = CompensationConfig::default();
        CompensationConfig {
            alpha: self.alpha.unwrap_or(default.alpha),
            beta: self.beta.unwrap_or(default.beta),
            channel_mode: self.channel_mode.unwrap_or(default.channel_mode),
            linearize: self.linearize.unwrap_or(default.linearize),
            block_gains: self.block_gains.unwrap_or(default.block_gains),
            block_channel: self.block_channel.unwrap_or(default.block_channel),
        }
    }
}
