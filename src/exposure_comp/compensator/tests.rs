use std::sync::{Arc, Mutex};

use crate::exposure_comp::apply::Gains;
use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::compensator::config::{ChannelMode, CompensationConfig};
use crate::exposure_comp::compensator::engine::ExposureCompensator;
use crate::exposure_comp::image::{AccessMode, CompositeImage, ImageAccessor, PixelPatch};
use crate::exposure_comp::image::types::{Channel, Rect, SENTINEL_PIXEL, pack_pixel};

struct MockAccessor {
    image: CompositeImage,
    fail_acquire: bool,
    fail_commit: bool,
    commits: Arc<Mutex<Vec<AccessMode>>>,
}

impl MockAccessor {
    fn new(image: CompositeImage) -> Self {
        Self {
            image,
            fail_acquire: false,
            fail_commit: false,
            commits: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ImageAccessor for MockAccessor {
    fn dimensions(&self) -> (usize, usize) {
        self.image.dimensions()
    }

    fn acquire(&mut self, rect: &Rect, mode: AccessMode) -> Result<PixelPatch> {
        if self.fail_acquire {
            return Err(ExpCompError::AcquireFailed("Mock acquire error".to_string()));
        }
        self.image.acquire(rect, mode)
    }

    fn commit(&mut self, patch: PixelPatch) -> Result<()> {
        if self.fail_commit {
            return Err(ExpCompError::CommitFailed("Mock commit error".to_string()));
        }
        self.commits.lock().unwrap().push(patch.mode());
        self.image.commit(patch)
    }
}

const WIDTH: usize = 96;
const VIEW_HEIGHT: usize = 64;

/// Two views sharing columns 32..64, with a hole in each view's overlap.
fn two_view_composite(left: u32, right: u32) -> (CompositeImage, Vec<Rect>) {
    let mut image = CompositeImage::new(WIDTH, 2 * VIEW_HEIGHT);
    image.fill_rect(&Rect::new(0, 0, 64, VIEW_HEIGHT), left);
    image.fill_rect(&Rect::new(32, VIEW_HEIGHT, WIDTH, 2 * VIEW_HEIGHT), right);
    image.set_pixel(40, 10, SENTINEL_PIXEL);
    image.set_pixel(50, VIEW_HEIGHT + 20, SENTINEL_PIXEL);
    let valid = vec![Rect::new(0, 0, 64, VIEW_HEIGHT), Rect::new(32, 0, WIDTH, VIEW_HEIGHT)];
    (image, valid)
}

fn engine(
    image: CompositeImage,
    valid: Vec<Rect>,
    config: CompensationConfig,
) -> ExposureCompensator<MockAccessor, MockAccessor> {
    let (width, height) = image.dimensions();
    let output = MockAccessor::new(CompositeImage::filled(width, height, 0));
    ExposureCompensator::new(valid, MockAccessor::new(image), output, config).unwrap()
}

fn luma_gains(gains: &Gains) -> &[f32] {
    match gains {
        Gains::Luma(g) => g,
        other => panic!("expected luma gains, got {:?}", other),
    }
}

#[test]
fn test_config_builder() {
    let config = CompensationConfig::builder()
        .alpha(1.0)
        .beta(0.1)
        .channel_mode(ChannelMode::PerChannel)
        .linearize(false)
        .block_gains(true)
        .block_channel(Channel::Green)
        .build();

    assert_eq!(config.alpha, 1.0);
    assert_eq!(config.beta, 0.1);
    assert_eq!(config.channel_mode, ChannelMode::PerChannel);
    assert!(!config.linearize);
    assert!(config.block_gains);
    assert_eq!(config.block_channel, Channel::Green);
}

#[test]
fn test_config_defaults() {
    let config = CompensationConfig::builder().build();
    assert_eq!(config, CompensationConfig::default());
    assert_eq!(config.alpha, 0.01);
    assert_eq!(config.beta, 100.0);
    assert_eq!(config.channel_mode, ChannelMode::Luma);
    assert!(config.linearize);
    assert!(!config.block_gains);
}

#[test]
fn test_invalid_weights_rejected() {
    let (image, valid) = two_view_composite(0, 0);
    for config in [
        CompensationConfig::builder().alpha(-1.0).build(),
        CompensationConfig::builder().beta(f32::NAN).build(),
    ] {
        let output = MockAccessor::new(CompositeImage::new(WIDTH, 2 * VIEW_HEIGHT));
        let result = ExposureCompensator::new(
            valid.clone(),
            MockAccessor::new(image.clone()),
            output,
            config,
        );
        assert!(matches!(result, Err(ExpCompError::InvalidConfiguration(_))));
    }
}

#[test]
fn test_empty_region_list() {
    let input = MockAccessor::new(CompositeImage::new(32, 32));
    let output = MockAccessor::new(CompositeImage::new(32, 32));
    let result = ExposureCompensator::new(Vec::new(), input, output, CompensationConfig::default());
    assert!(matches!(result, Err(ExpCompError::EmptyRegionList)));
}

#[test]
fn test_uneven_bands_rejected() {
    let input = MockAccessor::new(CompositeImage::new(32, 33));
    let output = MockAccessor::new(CompositeImage::new(32, 33));
    let result = ExposureCompensator::new(
        vec![Rect::full(32, 11); 2],
        input,
        output,
        CompensationConfig::default(),
    );
    assert!(matches!(result, Err(ExpCompError::InvalidDimensions { views: 2, .. })));
}

#[test]
fn test_output_size_mismatch() {
    let input = MockAccessor::new(CompositeImage::new(32, 64));
    let output = MockAccessor::new(CompositeImage::new(32, 32));
    let result = ExposureCompensator::new(
        vec![Rect::full(32, 32); 2],
        input,
        output,
        CompensationConfig::default(),
    );
    assert!(matches!(result, Err(ExpCompError::InvalidDimensions { .. })));
}

#[test]
fn test_single_view_gain_is_unity_and_output_matches_input() {
    let mut image = CompositeImage::filled(40, 24, pack_pixel(10, 120, 240, 90));
    image.set_pixel(5, 5, SENTINEL_PIXEL);
    let mut compensator = engine(image.clone(), vec![Rect::full(40, 24)], CompensationConfig::default());

    let gains = compensator.process().unwrap();
    assert_eq!(luma_gains(&gains), &[1.0]);

    let (_, output) = compensator.into_inner();
    assert_eq!(output.image.pixels(), image.pixels());
}

#[test]
fn test_counts_are_symmetric() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let mut compensator = engine(image, valid, CompensationConfig::default());
    compensator.compute_gains().unwrap();

    let stats = compensator.statistics();
    assert_eq!(stats.count(0, 1), stats.count(1, 0));
    // 32x64 overlap minus one hole per view
    assert_eq!(stats.count(0, 1), 32 * 64 - 2);
}

#[test]
fn test_two_views_converge() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let mut compensator = engine(image, valid, CompensationConfig::default());
    let gains = compensator.process().unwrap();
    let g = luma_gains(&gains);

    assert!(g[0] > 1.0);
    assert!(g[1] < 1.0);
    let before = (100.0f32 - 150.0).powi(2);
    let after = (g[0] * 100.0 - g[1] * 150.0).powi(2);
    assert!(after < before);
}

#[test]
fn test_balanced_views_share_gain() {
    let px = pack_pixel(0, 0, 0, 120);
    let (image, valid) = two_view_composite(px, px);
    let mut compensator = engine(image, valid, CompensationConfig::default());
    let gains = compensator.compute_gains().unwrap();
    let g = luma_gains(&gains);
    assert!((g[0] - g[1]).abs() < 1e-5);
}

#[test]
fn test_sentinels_survive_processing() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let mut compensator = engine(image.clone(), valid, CompensationConfig::default());
    compensator.process().unwrap();

    let (_, output) = compensator.into_inner();
    for (i, (&src, &dst)) in image.pixels().iter().zip(output.image.pixels()).enumerate() {
        let (x, y) = (i % WIDTH, i / WIDTH);
        if src == SENTINEL_PIXEL && in_valid_rect(x, y) {
            assert_eq!(dst, SENTINEL_PIXEL, "pixel ({}, {})", x, y);
        }
    }
}

fn in_valid_rect(x: usize, y: usize) -> bool {
    if y < VIEW_HEIGHT { x < 64 } else { x >= 32 }
}

#[test]
fn test_per_channel_mode() {
    let (image, valid) = two_view_composite(
        pack_pixel(100, 120, 120, 120),
        pack_pixel(180, 120, 120, 120),
    );
    let config = CompensationConfig::builder()
        .channel_mode(ChannelMode::PerChannel)
        .build();
    let mut compensator = engine(image, valid, config);
    let gains = compensator.process().unwrap();

    let Gains::PerChannel { red, green, blue } = &gains else {
        panic!("expected per-channel gains");
    };
    assert!(red[0] > red[1]);
    assert!((green[0] - green[1]).abs() < 1e-5);
    assert!((blue[0] - blue[1]).abs() < 1e-5);
    assert_eq!(gains.to_flat().len(), 6);
}

#[test]
fn test_input_acquire_failure() {
    let (image, valid) = two_view_composite(0, 0);
    let mut input = MockAccessor::new(image);
    input.fail_acquire = true;
    let output = MockAccessor::new(CompositeImage::new(WIDTH, 2 * VIEW_HEIGHT));
    let commits = output.commits.clone();
    let mut compensator =
        ExposureCompensator::new(valid, input, output, CompensationConfig::default()).unwrap();

    let result = compensator.process();
    assert!(matches!(result, Err(ExpCompError::AcquireFailed(_))));
    assert!(commits.lock().unwrap().is_empty());
}

#[test]
fn test_output_commit_failure() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let mut output = MockAccessor::new(CompositeImage::filled(WIDTH, 2 * VIEW_HEIGHT, 0));
    output.fail_commit = true;
    let mut compensator =
        ExposureCompensator::new(valid, MockAccessor::new(image), output, CompensationConfig::default())
            .unwrap();

    let result = compensator.process();
    assert!(matches!(result, Err(ExpCompError::CommitFailed(_))));

    let (_, output) = compensator.into_inner();
    assert!(output.image.pixels().iter().all(|&p| p == 0));
}

#[test]
fn test_input_released_when_output_fails() {
    for (fail_acquire, fail_commit) in [(true, false), (false, true)] {
        let (image, valid) =
            two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
        let input = MockAccessor::new(image);
        let input_commits = input.commits.clone();
        let mut output = MockAccessor::new(CompositeImage::filled(WIDTH, 2 * VIEW_HEIGHT, 0));
        output.fail_acquire = fail_acquire;
        output.fail_commit = fail_commit;
        let mut compensator =
            ExposureCompensator::new(valid, input, output, CompensationConfig::default()).unwrap();

        assert!(compensator.process().is_err());
        assert_eq!(*input_commits.lock().unwrap(), vec![AccessMode::ReadOnly]);
    }
}

#[test]
fn test_block_gains_disabled() {
    let (image, valid) = two_view_composite(0, 0);
    let mut compensator = engine(image, valid, CompensationConfig::default());
    assert!(compensator.block_gains().is_none());
    assert!(matches!(
        compensator.process_block_gains(),
        Err(ExpCompError::BlockGainsDisabled)
    ));
}

#[test]
fn test_block_gains_grid() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let config = CompensationConfig::builder().block_gains(true).build();
    let mut compensator = engine(image, valid, config);

    let flat = compensator.process_block_gains().unwrap();
    let per_view = WIDTH.div_ceil(32) * VIEW_HEIGHT.div_ceil(32);
    assert_eq!(flat.len(), 2 * per_view);
    assert!(flat.iter().all(|&g| g.is_finite() && g > 0.0));

    let grid = compensator.block_gains().unwrap();
    // shared column: the darker view is lifted, the brighter one lowered
    assert!(grid.get(0, 1, 0) > 1.0);
    assert!(grid.get(1, 1, 0) < 1.0);

    let timings = compensator.last_timings();
    assert!(timings.step_duration("block_statistics").is_some());
    assert!(timings.step_duration("block_smoothing").is_some());
}

#[test]
fn test_timings_and_releases_recorded() {
    let (image, valid) = two_view_composite(pack_pixel(0, 0, 0, 100), pack_pixel(0, 0, 0, 150));
    let input = MockAccessor::new(image);
    let input_commits = input.commits.clone();
    let output = MockAccessor::new(CompositeImage::new(WIDTH, 2 * VIEW_HEIGHT));
    let output_commits = output.commits.clone();
    let mut compensator =
        ExposureCompensator::new(valid, input, output, CompensationConfig::default()).unwrap();

    compensator.process().unwrap();

    assert_eq!(*input_commits.lock().unwrap(), vec![AccessMode::ReadOnly]);
    assert_eq!(*output_commits.lock().unwrap(), vec![AccessMode::WriteOnly]);
    let timings = compensator.last_timings();
    for step in ["collect_statistics", "solve", "apply_gains"] {
        assert!(timings.step_duration(step).is_some(), "missing {}", step);
    }
}
