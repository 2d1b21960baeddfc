use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use pano_expcomp_rs::exposure_comp::{
    Channel, ChannelMode, CompensationConfig, CompositeImage, ExposureCompensator, Gains, Rect,
    TiffCompression, read_composite_tiff, write_composite_tiff,
};
use pano_expcomp_rs::logger::{self, info, warn};

#[derive(Parser)]
#[command(name = "pano_expcomp")]
#[command(version, about = "Exposure compensation for stacked multi-camera composites", long_about = None)]
struct Cli {
    /// Composite TIFF with all views stacked vertically (RGBA8 or RGB8)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Corrected composite TIFF (RGBA8)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Number of views stacked in the composite
    #[arg(short = 'n', long, value_name = "N")]
    views: usize,

    /// Valid rectangle of one view in view-local coordinates, once per view
    /// in view order. Defaults to each view's full band.
    #[arg(long = "rect", value_name = "X0,Y0,X1,Y1", value_parser = parse_rect)]
    rects: Vec<Rect>,

    /// Overlap consistency weight
    #[arg(long, value_name = "FLOAT", default_value = "0.01")]
    alpha: f32,

    /// Unity gain regularization weight
    #[arg(long, value_name = "FLOAT", default_value = "100.0")]
    beta: f32,

    /// Solve independent red, green and blue gains
    #[arg(long)]
    per_channel: bool,

    /// Average per-channel statistics in encoded rather than linear light
    #[arg(long)]
    no_linearize: bool,

    /// Also compute smoothed 32x32 block gains
    #[arg(long)]
    block_gains: bool,

    /// Channel sampled for block gains
    #[arg(long, value_enum, default_value = "luma")]
    block_channel: ChannelArg,

    /// Output compression
    #[arg(long, value_enum, default_value = "none")]
    compression: CompressionArg,

    /// Log at debug level when RUST_LOG is unset
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Luma,
    Red,
    Green,
    Blue,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Luma => Channel::Luma,
            ChannelArg::Red => Channel::Red,
            ChannelArg::Green => Channel::Green,
            ChannelArg::Blue => Channel::Blue,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    Deflate,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::Deflate => TiffCompression::DeflateFast,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

/// Parse a rectangle in format "x0,y0,x1,y1" (half-open)
fn parse_rect(value: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "rectangle must be in format x0,y0,x1,y1, got: {}",
            value
        ));
    }
    let mut coords = [0usize; 4];
    for (coord, part) in coords.iter_mut().zip(&parts) {
        *coord = part
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid coordinate: {}", part))?;
    }
    let [x0, y0, x1, y1] = coords;
    if x1 < x0 || y1 < y0 {
        return Err(format!("rectangle end precedes start: {}", value));
    }
    Ok(Rect::new(x0, y0, x1, y1))
}

fn valid_rects(cli: &Cli, image: &CompositeImage) -> Result<Vec<Rect>> {
    if cli.views == 0 {
        bail!("--views must be at least 1");
    }
    if cli.rects.is_empty() {
        let band = Rect::full(image.width(), image.height() / cli.views);
        return Ok(vec![band; cli.views]);
    }
    if cli.rects.len() != cli.views {
        bail!(
            "{} --rect values given for {} views",
            cli.rects.len(),
            cli.views
        );
    }
    Ok(cli.rects.clone())
}

fn log_gains(gains: &Gains) {
    match gains {
        Gains::Luma(values) => {
            for (view, gain) in values.iter().enumerate() {
                info!("view {}: gain {:.5}", view, gain);
            }
        }
        Gains::PerChannel { red, green, blue } => {
            for view in 0..red.len() {
                info!(
                    "view {}: gains r={:.5} g={:.5} b={:.5}",
                    view, red[view], green[view], blue[view]
                );
            }
        }
    }
    if !gains.is_finite() {
        warn!("Solved gains contain non-finite values; affected pixels are clamped");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init_with_default("debug");
    } else {
        logger::init();
    }

    info!("Reading composite {}", cli.input.display());
    let input = read_composite_tiff(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let rects = valid_rects(&cli, &input)?;
    let output = input.clone();

    let config = CompensationConfig::builder()
        .alpha(cli.alpha)
        .beta(cli.beta)
        .channel_mode(if cli.per_channel {
            ChannelMode::PerChannel
        } else {
            ChannelMode::Luma
        })
        .linearize(!cli.no_linearize)
        .block_gains(cli.block_gains)
        .block_channel(cli.block_channel.into())
        .build();

    let mut compensator = ExposureCompensator::new(rects, input, output, config)?;
    let gains = compensator.process()?;
    log_gains(&gains);

    if cli.block_gains {
        let blocks = compensator.process_block_gains()?;
        let (min, max) = blocks
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &g| (lo.min(g), hi.max(g)));
        info!("{} block gains in [{:.5}, {:.5}]", blocks.len(), min, max);
    }

    let (_, corrected) = compensator.into_inner();
    write_composite_tiff(&corrected, &cli.output, cli.compression.into())
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("Wrote corrected composite to {}", cli.output.display());

    Ok(())
}
