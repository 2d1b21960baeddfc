use tracing::{debug, error, info, info_span, instrument, warn};

use crate::exposure_comp::apply::{Gains, apply_gains};
use crate::exposure_comp::block::{BlockGrid, BlockRefiner, smooth_block_gains};
use crate::exposure_comp::common::error::{ExpCompError, Result};
use crate::exposure_comp::compensator::config::{ChannelMode, CompensationConfig};
use crate::exposure_comp::compensator::timing::{PipelineTimings, Timer};
use crate::exposure_comp::geometry::{OverlapMatrix, ViewLayout};
use crate::exposure_comp::image::{AccessMode, ImageAccessor, PixelPatch};
use crate::exposure_comp::image::types::{Channel, Rect};
use crate::exposure_comp::solver::GainSolver;
use crate::exposure_comp::stats::{GammaTables, PairStatistics};

/// Exposure compensation engine bound to an input and an output composite.
///
/// Everything sized by the view count or the image dimensions is allocated in
/// [`ExposureCompensator::new`] and reused by every call; dropping the engine
/// releases it.
pub struct ExposureCompensator<I: ImageAccessor, O: ImageAccessor> {
    input: I,
    output: O,
    config: CompensationConfig,
    layout: ViewLayout,
    overlaps: OverlapMatrix,
    gamma: GammaTables,
    stats: PairStatistics,
    solver: GainSolver,
    gains: Gains,
    block_grid: Option<BlockGrid>,
    timings: PipelineTimings,
}

impl<I: ImageAccessor, O: ImageAccessor> ExposureCompensator<I, O> {
    /// Validates the configuration and geometry and allocates all scratch.
    ///
    /// `valid_rects` holds one view-local rectangle per view; the input height
    /// must split evenly into that many bands and the output must have the
    /// input's dimensions.
    #[instrument(skip_all, fields(views = valid_rects.len()))]
    pub fn new(
        valid_rects: Vec<Rect>,
        input: I,
        output: O,
        config: CompensationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (width, height) = input.dimensions();
        let layout = ViewLayout::new(width, height, valid_rects)?;
        let views = layout.num_views();

        if output.dimensions() != (width, height) {
            let (out_w, out_h) = output.dimensions();
            return Err(ExpCompError::InvalidDimensions {
                width: out_w,
                height: out_h,
                views,
            });
        }

        let overlaps = OverlapMatrix::new(layout.valid_rects());
        let gains = match config.channel_mode {
            ChannelMode::Luma => Gains::unity_luma(views),
            ChannelMode::PerChannel => Gains::unity_per_channel(views),
        };
        let block_grid = config
            .block_gains
            .then(|| BlockGrid::new(width, layout.view_height(), views));

        info!(
            "Exposure compensator ready: {} views of {}x{}, mode {:?}, block gains {}",
            views,
            width,
            layout.view_height(),
            config.channel_mode,
            config.block_gains
        );

        Ok(Self {
            input,
            output,
            stats: PairStatistics::new(views),
            solver: GainSolver::new(views, config.alpha, config.beta),
            gamma: GammaTables::new(),
            config,
            layout,
            overlaps,
            gains,
            block_grid,
            timings: PipelineTimings::new(),
        })
    }

    fn full_rect(&self) -> Rect {
        Rect::full(self.layout.width(), self.layout.composite_height())
    }

    fn acquire_input(&mut self) -> Result<PixelPatch> {
        let rect = self.full_rect();
        self.input
            .acquire(&rect, AccessMode::ReadOnly)
            .inspect_err(|e| error!("Input acquire failed: {}", e))
    }

    fn release_input(&mut self, patch: PixelPatch) -> Result<()> {
        self.input
            .commit(patch)
            .inspect_err(|e| error!("Input release failed: {}", e))
    }

    /// Applies the current gains from `src` into a fresh output patch and commits it.
    fn write_output(&mut self, src: &PixelPatch) -> Result<()> {
        let rect = self.full_rect();
        let mut dst = self
            .output
            .acquire(&rect, AccessMode::WriteOnly)
            .inspect_err(|e| error!("Output acquire failed: {}", e))?;
        apply_gains(src, &mut dst, &self.layout, &self.gains, self.config.linearize)?;
        self.output
            .commit(dst)
            .inspect_err(|e| error!("Output commit failed: {}", e))
    }

    /// Statistics and solve over an already acquired input patch.
    fn solve_from(&mut self, src: &PixelPatch, timings: &mut PipelineTimings) {
        let views = self.layout.num_views();

        let timer = Timer::start("collect_statistics");
        {
            let _span = info_span!("collect_statistics", mode = ?self.config.channel_mode).entered();
            match self.config.channel_mode {
                ChannelMode::Luma => {
                    self.stats
                        .collect_channel(src, &self.layout, &self.overlaps, Channel::Luma)
                }
                ChannelMode::PerChannel => {
                    let linear = self.config.linearize.then_some(&self.gamma);
                    self.stats
                        .collect_rgb(src, &self.layout, &self.overlaps, linear)
                }
            }
        }
        timings.record(timer);

        let timer = Timer::start("solve");
        {
            let _span = info_span!("solve", views).entered();
            let counts = self.stats.counts();
            self.gains = match self.config.channel_mode {
                ChannelMode::Luma => {
                    let mut luma = vec![0.0; views];
                    self.solver.solve(self.stats.intensity(0), counts, &mut luma);
                    Gains::Luma(luma)
                }
                ChannelMode::PerChannel => {
                    let mut planes = [vec![0.0; views], vec![0.0; views], vec![0.0; views]];
                    for (plane, gains) in planes.iter_mut().enumerate() {
                        self.solver.solve(self.stats.intensity(plane), counts, gains);
                    }
                    let [red, green, blue] = planes;
                    Gains::PerChannel { red, green, blue }
                }
            };
        }
        timings.record(timer);
        debug!(gains = ?self.gains.to_flat(), "Solved gains");
    }

    /// Statistics and solve only; the output image is not touched.
    #[instrument(skip(self), fields(views = self.layout.num_views()))]
    pub fn compute_gains(&mut self) -> Result<Gains> {
        let mut timings = PipelineTimings::new();
        let src = self.acquire_input()?;
        self.solve_from(&src, &mut timings);
        self.release_input(src)?;

        timings.log_summary();
        self.timings = timings;
        Ok(self.gains.clone())
    }

    /// Solves the gains and writes the corrected composite to the output.
    ///
    /// The solve completes before the output is acquired. A failing accessor
    /// aborts the call and its error is returned once the input patch has been
    /// released; gains solved before the failure stay readable through
    /// [`ExposureCompensator::gains`] but must not be treated as applied.
    #[instrument(skip(self), fields(views = self.layout.num_views()))]
    pub fn process(&mut self) -> Result<Gains> {
        let mut timings = PipelineTimings::new();
        let src = self.acquire_input()?;
        self.solve_from(&src, &mut timings);

        let timer = Timer::start("apply_gains");
        let applied = {
            let _span = info_span!("apply_gains").entered();
            self.write_output(&src)
        };
        timings.record(timer);
        let released = self.release_input(src);
        applied?;
        released?;

        info!(
            "Compensation complete: {} views in {:.3}ms",
            self.layout.num_views(),
            timings.total_duration().as_secs_f64() * 1000.0
        );
        timings.log_summary();
        self.timings = timings;
        Ok(self.gains.clone())
    }

    /// Per-tile gains for every view, smoothed over each valid rectangle.
    ///
    /// Returns the whole grid as a flat view-major sequence of
    /// `ceil(W / 32) * ceil(H / 32)` values per view.
    #[instrument(skip(self), fields(channel = ?self.config.block_channel))]
    pub fn process_block_gains(&mut self) -> Result<Vec<f32>> {
        if self.block_grid.is_none() {
            warn!("Block gains requested but block refinement is disabled");
            return Err(ExpCompError::BlockGainsDisabled);
        }
        let mut timings = PipelineTimings::new();
        let src = self.acquire_input()?;
        let refiner = BlockRefiner::new(self.config.alpha, self.config.beta, self.config.block_channel);

        let grid = self
            .block_grid
            .as_mut()
            .ok_or(ExpCompError::BlockGainsDisabled)?;
        grid.reset();

        let timer = Timer::start("block_statistics");
        refiner.compute(&src, &self.layout, &self.overlaps, grid);
        timings.record(timer);

        let timer = Timer::start("block_smoothing");
        smooth_block_gains(grid, &self.layout);
        timings.record(timer);

        let flat = grid.as_slice().to_vec();
        self.release_input(src)?;

        info!(
            "Block gains complete: {}x{} blocks per view in {:.3}ms",
            self.block_grid.as_ref().map_or(0, BlockGrid::blocks_w),
            self.block_grid.as_ref().map_or(0, BlockGrid::blocks_h),
            timings.total_duration().as_secs_f64() * 1000.0
        );
        timings.log_summary();
        self.timings = timings;
        Ok(flat)
    }

    /// Gains from the last solve, unity before the first one.
    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    pub fn block_gains(&self) -> Option<&BlockGrid> {
        self.block_grid.as_ref()
    }

    pub fn statistics(&self) -> &PairStatistics {
        &self.stats
    }

    pub fn last_timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn config(&self) -> &CompensationConfig {
        &self.config
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn overlaps(&self) -> &OverlapMatrix {
        &self.overlaps
    }

    pub fn gamma_tables(&self) -> &GammaTables {
        &self.gamma
    }

    /// Releases the engine state and hands back the input and output accessors.
    pub fn into_inner(self) -> (I, O) {
        (self.input, self.output)
    }
}
