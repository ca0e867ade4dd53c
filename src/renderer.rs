//! Incremental skyline rendering.
//!
//! [`RenderTask`] is a plain state machine: every call to
//! [`RenderTask::resume`] draws rows until the frame budget is spent and then
//! hands control back, so any scheduler (a frame callback, a timer, an async
//! loop) can drive it. [`Renderer`] is the async driver used by the binaries:
//! it fetches the region, runs the task on the tokio scheduler and publishes
//! progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::Timing;
use crate::config::{RenderConfig, Settings};
use crate::error::RenderError;
use crate::progress::{Progress, ProgressSink};
use crate::region::{Extremes, Region, RegionIterator, RowPlan, iterator_settings};
use crate::render::{LineStyle, clear_scene, draw_polyline};
use crate::source::{RegionRequest, RegionSource, Viewport};
use crate::surface::{Point, Surface};

/// CPU time one slice may spend before yielding.
pub const FRAME_BUDGET: Duration = Duration::from_millis(2000);

/// Shared cancellation flag for one render pass.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub rows: usize,
    pub polylines: usize,
    pub slices: usize,
    pub timings: Vec<Timing>,
}

/// Result of one [`RenderTask::resume`] call.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// Budget spent; call `resume` again on the next frame.
    Yielded,
    Completed(RenderStats),
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    Rows,
    Finished,
}

/// One render pass over a region, resumable across frames.
pub struct RenderTask<'a> {
    region: RegionIterator<'a>,
    style: LineStyle,
    height_scale: f64,
    extremes: Extremes,
    plan: RowPlan,
    width: usize,
    height: usize,
    next_row: usize,
    run: Vec<Point>,
    budget: Duration,
    token: CancelToken,
    phase: Phase,
    stats: RenderStats,
    row_ms: f64,
}

impl<'a> RenderTask<'a> {
    /// Scan the region and plan rows for a `width` x `height` canvas.
    pub fn new(
        region: &'a Region,
        config: &RenderConfig,
        width: usize,
        height: usize,
        token: CancelToken,
    ) -> Self {
        let iter = RegionIterator::new(region, config.ocean_level);

        let t = Instant::now();
        let extremes = iter.min_max_height();
        let scan_ms = t.elapsed().as_secs_f64() * 1000.0;

        let raster_row = if extremes.min_height < 0.0 {
            extremes.min_row
        } else {
            extremes.max_row
        };
        let anchor = canvas_row(region, raster_row, height);
        let plan = iterator_settings(config.row_count(height), height, anchor);
        debug!(?extremes, ?plan, anchor, "planned rows");

        Self {
            region: iter,
            style: LineStyle::from(config),
            height_scale: config.height_scale,
            extremes,
            plan,
            width,
            height,
            next_row: plan.start,
            run: Vec::with_capacity(width),
            budget: FRAME_BUDGET,
            token,
            phase: Phase::Pending,
            stats: RenderStats {
                timings: vec![Timing {
                    name: "min_max_scan",
                    ms: scan_ms,
                }],
                ..RenderStats::default()
            },
            row_ms: 0.0,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn plan(&self) -> RowPlan {
        self.plan
    }

    pub fn extremes(&self) -> Extremes {
        self.extremes
    }

    /// Canvas y of a sample: the row lifted by its scaled height.
    /// A flat region has no displacement.
    fn sample_y(&self, row: usize, height: f64) -> f32 {
        let range = self.extremes.range();
        if range <= 0.0 {
            return row as f32;
        }
        let lift = (self.height_scale * (height - self.extremes.min_height) / range).floor();
        (row as f64 - lift) as f32
    }

    fn flush(&mut self, surface: &mut dyn Surface) {
        if draw_polyline(surface, &self.run, &self.style) {
            self.stats.polylines += 1;
        }
        self.run.clear();
    }

    fn render_row(&mut self, surface: &mut dyn Surface, row: usize) {
        let ocean = self.region.ocean_level();
        let norm_row = row as f64 / self.height as f64;
        for x in 0..self.width {
            let h = self.region.height_at(norm_row, x as f64 / self.width as f64);
            if h <= ocean {
                self.flush(surface);
            } else {
                let y = self.sample_y(row, h);
                self.run.push(Point::new(x as f32, y));
            }
        }
        self.flush(surface);
        self.stats.rows += 1;
    }

    /// Draw rows until done, cancelled, or the slice budget runs out.
    pub fn resume(&mut self, surface: &mut dyn Surface) -> Step {
        if self.token.is_cancelled() {
            self.phase = Phase::Finished;
            return Step::Cancelled;
        }
        match self.phase {
            Phase::Finished => return Step::Completed(self.stats.clone()),
            Phase::Pending => {
                clear_scene(surface, &self.style);
                self.phase = Phase::Rows;
            }
            Phase::Rows => {}
        }

        self.stats.slices += 1;
        let started = Instant::now();
        let mut row = self.next_row;
        while row < self.plan.stop {
            self.render_row(surface, row);
            row += self.plan.step;
            self.next_row = row;
            if started.elapsed() > self.budget {
                self.row_ms += started.elapsed().as_secs_f64() * 1000.0;
                return Step::Yielded;
            }
        }
        self.row_ms += started.elapsed().as_secs_f64() * 1000.0;

        self.flush(surface);
        self.phase = Phase::Finished;
        self.stats.timings.push(Timing {
            name: "rows",
            ms: self.row_ms,
        });
        Step::Completed(self.stats.clone())
    }
}

/// Canvas row whose sample lands nearest to raster row `raster_row` of the
/// region's crop. Exact when the crop is no taller than the canvas; on a
/// shorter canvas the extreme row may fall between two sampled rows.
fn canvas_row(region: &Region, raster_row: usize, canvas_height: usize) -> usize {
    let crop = region.crop();
    if canvas_height == 0 {
        return 0;
    }
    let offset = raster_row.saturating_sub(crop.top) as f64;
    let row = (offset / crop.height() as f64 * canvas_height as f64).round() as usize;
    row.min(canvas_height - 1)
}

#[derive(Debug, PartialEq)]
pub enum RenderOutcome {
    Completed(RenderStats),
    Cancelled,
}

/// Owns the active pass: starting a render cancels the previous one.
pub struct Renderer<S> {
    source: S,
    progress: ProgressSink,
    active: Mutex<CancelToken>,
    budget: Duration,
}

impl<S: RegionSource> Renderer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            progress: ProgressSink::new(),
            active: Mutex::new(CancelToken::new()),
            budget: FRAME_BUDGET,
        }
    }

    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn progress(&self) -> watch::Receiver<Option<Progress>> {
        self.progress.subscribe()
    }

    pub fn current_progress(&self) -> Option<Progress> {
        self.progress.current()
    }

    /// Stop the active pass. Pixels already drawn stay on the surface.
    pub fn cancel(&self) {
        // clear under the lock so no new pass can start in between
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.cancel();
        self.progress.clear();
    }

    /// Cancel whatever is running and install a fresh token.
    fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        let previous = std::mem::replace(
            &mut *self.active.lock().unwrap_or_else(PoisonError::into_inner),
            token.clone(),
        );
        previous.cancel();
        token
    }

    /// Render `viewport` onto `surface`.
    ///
    /// Errors are only returned for bad settings and failed fetches; the
    /// progress record then carries the failure message. Cancellation,
    /// whether before or after the fetch resolves, is `Ok(Cancelled)`.
    #[instrument(skip_all, fields(w = surface.width(), h = surface.height()))]
    pub async fn render<C>(
        &self,
        viewport: &Viewport,
        settings: &Settings,
        surface: &mut C,
    ) -> Result<RenderOutcome, RenderError>
    where
        C: Surface + Send,
    {
        let token = self.begin();
        let progress = self.progress.scoped(token.clone());
        progress.start();

        let config = match settings.parse() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "rejecting settings");
                progress.fail(format!("Invalid settings: {e}"));
                return Err(e.into());
            }
        };

        let request = RegionRequest::new(viewport, config.height_scale);
        let fetched = self.source.fetch_region(&request, &progress).await;
        if token.is_cancelled() {
            debug!("cancelled while fetching");
            return Ok(RenderOutcome::Cancelled);
        }
        let region = match fetched {
            Ok(region) => region,
            Err(e) => {
                warn!(error = %e, "region fetch failed");
                progress.fail(format!("Failed to load elevation: {e}"));
                return Err(e.into());
            }
        };

        progress.set_message("Rendering...");
        let (w, h) = (surface.width() as usize, surface.height() as usize);
        let mut task = RenderTask::new(&region, &config, w, h, token.clone()).with_budget(self.budget);

        loop {
            match task.resume(surface) {
                Step::Yielded => tokio::task::yield_now().await,
                Step::Cancelled => {
                    debug!("cancelled between frames");
                    return Ok(RenderOutcome::Cancelled);
                }
                Step::Completed(stats) => {
                    info!(
                        rows = stats.rows,
                        polylines = stats.polylines,
                        slices = stats.slices,
                        "render complete"
                    );
                    progress.set_message("Done!");
                    progress.clear();
                    return Ok(RenderOutcome::Completed(stats));
                }
            }
        }
    }
}
