//! [`RenderContext`]: the one object a host talks to.
//!
//! It owns the navigator, the orchestrator, the display surface, the live
//! palette and any poster job, and is driven by calling [`RenderContext::tick`]
//! once per display refresh.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use mandelscope_core::{
    query_point, Complex, Destination, FractalParams, IterationResult, Julia, NavMode, Navigator,
    ParsedPermalink, Permalink, TravelKind, Viewport,
};

use crate::buffer::RenderBuffer;
use crate::compute::compute_segment;
use crate::config::RenderConfig;
use crate::orchestrator::{FrameEvent, FrameOrchestrator, PassState};
use crate::palette::Palette;
use crate::pool::{RenderCancel, WorkerPool};
use crate::poster::{PosterImage, PosterJob};
use crate::segment::Segment;
use crate::surface::SurfaceRenderer;

/// Minimum time between two palette-cycling steps.
pub const ROTATION_INTERVAL: Duration = Duration::from_millis(15);

/// Zoom of the Julia preview, in pixels per unit.
pub const JULIA_PREVIEW_ZOOM: f64 = 200.0;

pub struct RenderContext {
    config: RenderConfig,
    navigator: Navigator,
    orchestrator: FrameOrchestrator,
    surface: Box<dyn SurfaceRenderer>,
    palette: Palette,
    show_axes: bool,
    subscribers: Vec<mpsc::Sender<FrameEvent>>,
    last_rotation: Option<Instant>,
    poster: Option<PosterJob>,
}

impl RenderContext {
    /// Build the worker pool and surface from `config` and queue the first
    /// pass.
    pub fn new(mut config: RenderConfig) -> crate::Result<Self> {
        config.limits = config.limits.sanitized();
        let pool = WorkerPool::new(config.workers)?;
        let navigator = Navigator::new(
            config.initial_view,
            config.limits,
            config.tuning,
            config.width,
            config.height,
            config.startup_animation,
        );
        let (width, height) = navigator.canvas_size();
        let mut orchestrator = FrameOrchestrator::new(
            pool,
            width,
            height,
            *navigator.viewport(),
            navigator.benchmark().max_block_size,
        )?;
        orchestrator.set_refine_delay(config.refine_delay());
        orchestrator.request_recompute(*navigator.viewport());

        let surface = config.backend.create(width, height);
        let palette = Palette::by_id(config.palette_id).unwrap_or_else(|| {
            warn!(palette_id = config.palette_id, "Unknown palette, using default");
            Palette::default()
        });

        info!(
            width,
            height,
            workers = orchestrator.pool().threads(),
            backend = ?config.backend,
            "Render context ready"
        );
        Ok(Self {
            config,
            navigator,
            orchestrator,
            surface,
            palette,
            show_axes: false,
            subscribers: Vec::new(),
            last_rotation: None,
            poster: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        self.navigator.viewport()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn mode(&self) -> NavMode {
        self.navigator.mode()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn show_axes(&self) -> bool {
        self.show_axes
    }

    /// The composite frame.
    pub fn frame(&self) -> &RenderBuffer {
        self.surface.frame()
    }

    pub fn frame_revision(&self) -> u64 {
        self.surface.revision()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.orchestrator.canvas_size()
    }

    pub fn pass_state(&self) -> PassState {
        self.orchestrator.pass_state()
    }

    pub fn generation(&self) -> u64 {
        self.orchestrator.generation()
    }

    /// Whole-frame percentage of full-resolution scanlines done.
    pub fn progress_percent(&self) -> u32 {
        self.orchestrator.progress_percent()
    }

    pub fn is_complete(&self) -> bool {
        self.orchestrator.is_complete()
    }

    /// Receive every [`FrameEvent`] from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::Receiver<FrameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance animations, absorb finished work, dispatch new work and
    /// notify subscribers. Never blocks.
    pub fn tick(&mut self, now: Instant) -> Vec<FrameEvent> {
        let update = self.navigator.tick(now, self.orchestrator.frame_ready());
        if update.startup_finished {
            let bench = self.navigator.benchmark();
            info!(
                frame_ms = bench.frame_ms,
                max_block_size = bench.max_block_size,
                "Startup calibration finished"
            );
            self.orchestrator.set_max_block_size(bench.max_block_size);
        }
        if update.view_changed {
            self.orchestrator.request_recompute(*self.navigator.viewport());
        }

        self.tick_rotation(now);

        let events = self
            .orchestrator
            .tick(now, &self.palette, self.surface.as_mut());
        if !events.is_empty() {
            self.subscribers
                .retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
        }
        events
    }

    /// One palette-cycling step, only on a finished frame with no render in
    /// flight.
    fn tick_rotation(&mut self, now: Instant) {
        if !self.navigator.is_rotating()
            || !self.orchestrator.is_complete()
            || self.orchestrator.pass_state() != PassState::Idle
        {
            return;
        }
        if self
            .last_rotation
            .is_some_and(|last| now.saturating_duration_since(last) < ROTATION_INTERVAL)
        {
            return;
        }
        self.last_rotation = Some(now);
        self.palette.rotate(1);
        self.orchestrator.request_redraw();
    }

    // -----------------------------------------------------------------------
    // View changes
    // -----------------------------------------------------------------------

    fn recompute(&mut self) {
        self.navigator.stop_rotation();
        self.orchestrator
            .request_recompute(*self.navigator.viewport());
    }

    fn recompute_if(&mut self, changed: bool) -> bool {
        if changed {
            self.recompute();
        }
        changed
    }

    /// Replace the view. Ignored during startup calibration.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let accepted = self.navigator.set_viewport(viewport);
        self.recompute_if(accepted)
    }

    /// Start a fresh pass for the current view.
    pub fn request_render(&mut self) {
        self.recompute();
    }

    /// Re-colour the current frame without recomputing.
    pub fn request_redraw(&mut self) {
        self.orchestrator.request_redraw();
    }

    /// Abandon the current pass without starting another.
    pub fn flush(&mut self) {
        self.orchestrator.flush();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let changed = self.navigator.pan_by(dx, dy);
        self.recompute_if(changed)
    }

    pub fn zoom_at(&mut self, px: f64, py: f64, zoom_in: bool) -> bool {
        let changed = self.navigator.zoom_at(px, py, zoom_in);
        self.recompute_if(changed)
    }

    pub fn pinch(&mut self, ratio: f64, px: f64, py: f64) -> bool {
        let changed = self.navigator.pinch(ratio, px, py);
        self.recompute_if(changed)
    }

    pub fn set_iterations(&mut self, iterations: u32) -> bool {
        let changed = self.navigator.set_iterations(iterations);
        self.recompute_if(changed)
    }

    pub fn set_auto_iterations(&mut self, auto: bool) -> bool {
        let changed = self.navigator.set_auto_iterations(auto);
        self.recompute_if(changed)
    }

    pub fn set_smooth(&mut self, smooth: bool) -> bool {
        let changed = self.navigator.set_smooth(smooth);
        self.recompute_if(changed)
    }

    /// Fly to a named destination.
    pub fn jump_to(&mut self, name: &str) -> bool {
        self.navigator.jump_to(name)
    }

    pub fn travel_to(&mut self, dest: Destination) {
        self.navigator.travel_to(dest, TravelKind::Jump);
    }

    /// The host reports a drag or pinch in progress; refinement waits for it
    /// to end.
    pub fn set_interacting(&mut self, interacting: bool) {
        self.orchestrator.set_interacting(interacting);
    }

    /// Change the canvas size and start a coarse pass.
    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        if (width, height) == self.canvas_size() {
            return Ok(());
        }
        self.orchestrator
            .resize(width, height, *self.navigator.viewport())?;
        self.navigator.resize(width, height);
        self.surface.resize(width, height);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Palette and overlays
    // -----------------------------------------------------------------------

    /// Switch to palette `id` at rotation 0. Returns `false` for unknown ids.
    pub fn set_palette(&mut self, id: u8) -> bool {
        let Some(palette) = Palette::by_id(id) else {
            return false;
        };
        self.replace_palette(palette);
        true
    }

    pub fn next_palette(&mut self) {
        self.replace_palette(self.palette.next());
    }

    pub fn previous_palette(&mut self) {
        self.replace_palette(self.palette.previous());
    }

    fn replace_palette(&mut self, palette: Palette) {
        debug!(palette = palette.name(), "Palette changed");
        self.palette = palette;
        self.orchestrator.request_redraw();
    }

    pub fn rotate_palette(&mut self, steps: u32) {
        self.palette.rotate(steps);
        self.orchestrator.request_redraw();
    }

    /// Toggle colour cycling. Returns whether it is now on.
    pub fn toggle_rotation(&mut self) -> bool {
        self.last_rotation = None;
        self.navigator.toggle_rotation()
    }

    pub fn set_show_axes(&mut self, show_axes: bool) {
        if self.show_axes == show_axes {
            return;
        }
        self.show_axes = show_axes;
        self.orchestrator.set_show_axes(show_axes);
        self.orchestrator.request_redraw();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Iterate the single point under canvas position `(px, py)`.
    pub fn point_query(&self, px: f64, py: f64) -> crate::Result<IterationResult> {
        let (width, height) = self.canvas_size();
        Ok(query_point(self.navigator.viewport(), width, height, px, py)?)
    }

    /// Complex coordinate under canvas position `(px, py)`.
    pub fn complex_at(&self, px: f64, py: f64) -> Complex {
        self.navigator.transform().subpixel_to_complex(px, py)
    }

    /// A `size × size` Julia set image for constant `c`, centred on the
    /// origin, in the current palette.
    pub fn julia_preview(&self, c: Complex, size: u32) -> crate::Result<RenderBuffer> {
        let view = self.navigator.viewport();
        let params = FractalParams::new(view.max_iterations, view.smooth)?;
        let transform =
            Viewport::new(0.0, 0.0, JULIA_PREVIEW_ZOOM, params.max_iterations, params.smooth)
                .transform(size, size)?;
        let segment = Segment {
            worker_id: 0,
            y_start: 0,
            height: size,
            block_size: 1,
        };
        let (iterations, smooth) = compute_segment(
            &Julia::new(c, params),
            &transform,
            &segment,
            &RenderCancel::new(),
            0,
            |_| {},
        )
        .ok_or(crate::RenderError::Cancelled)?;
        Ok(self.palette.colorize_segment(&iterations, smooth.as_ref()))
    }

    // -----------------------------------------------------------------------
    // Permalinks
    // -----------------------------------------------------------------------

    /// The current view as a permalink tuple.
    pub fn save_permalink(&self) -> Permalink {
        Permalink::from_view(
            self.navigator.viewport(),
            self.palette.id(),
            self.palette.rotation(),
            self.show_axes,
        )
    }

    /// Apply a permalink query. Palette, rotation, axes and smoothing take
    /// effect at once; the view travels to the saved location. Unusable
    /// fields keep their current value and are returned in
    /// [`ParsedPermalink::rejected`].
    pub fn load_permalink(&mut self, query: &str) -> ParsedPermalink {
        let current = self.save_permalink();
        let parsed = Permalink::parse(query, &current, self.navigator.limits());
        let link = parsed.permalink;

        if link.palette_id != current.palette_id || link.palette_rotation != current.palette_rotation
        {
            let mut palette = Palette::by_id(link.palette_id).unwrap_or_default();
            palette.rotate(u32::from(link.palette_rotation));
            self.replace_palette(palette);
        }
        self.set_show_axes(link.show_axes);
        self.set_smooth(link.smooth);
        self.navigator.travel_to(
            Destination::new(link.real, link.imag, link.zoom, link.iterations),
            TravelKind::Permalink,
        );

        info!(
            query = %link.to_query(),
            rejected = parsed.rejected.len(),
            "Permalink loaded"
        );
        parsed
    }

    // -----------------------------------------------------------------------
    // Poster
    // -----------------------------------------------------------------------

    /// Start a poster render of the current view. Replaces (and cancels) a
    /// poster already running. Live rendering carries on meanwhile.
    pub fn start_poster(&mut self) -> crate::Result<()> {
        if let Some(old) = self.poster.take() {
            debug!("Cancelling previous poster");
            old.cancel();
        }
        let (width, height) = self.canvas_size();
        self.poster = Some(PosterJob::spawn(
            self.orchestrator.pool(),
            self.navigator.viewport(),
            width,
            height,
            self.palette.clone(),
            self.config.poster,
        )?);
        Ok(())
    }

    /// Progress of the running poster, if any.
    pub fn poster_progress(&self) -> Option<u32> {
        self.poster.as_ref().map(PosterJob::progress_percent)
    }

    pub fn cancel_poster(&mut self) {
        if let Some(job) = self.poster.as_ref() {
            job.cancel();
        }
    }

    /// The finished poster, once. `None` while it is still rendering or when
    /// none was started.
    pub fn take_poster(&mut self) -> Option<crate::Result<PosterImage>> {
        let result = self.poster.as_mut()?.try_finish()?;
        self.poster = None;
        Some(result)
    }
}
