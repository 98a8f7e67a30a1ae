//! Frame Orchestrator: drives segments through compute → render → present,
//! coarse to fine, and drops results that a newer pass has superseded.
//!
//! Every segment has a slot with at most one compute and one render task in
//! flight. A slot that is still busy is skipped on a tick; its pending work
//! is coalesced into the next dispatch rather than queued.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use mandelscope_core::{Mandelbrot, ScreenTransform, Viewport};

use crate::compute::compute_segment;
use crate::iteration_buffer::{ComputeKey, SegmentData};
use crate::palette::Palette;
use crate::pool::{RenderCancel, Stage, TaskOrigin, TaskOutcome, WorkerPool};
use crate::segment::{partition_segments, Segment};
use crate::surface::SurfaceRenderer;

/// Default pause after the last recompute request before refinement starts.
pub const DEFAULT_REFINE_DELAY: Duration = Duration::from_millis(200);

/// Where the current pass stands, derived from the slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    ComputePending,
    Computing(usize),
    RenderPending,
    Rendering(usize),
}

/// Notifications for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    SegmentPresented {
        generation: u64,
        worker_id: u32,
        block_size: u32,
    },
    /// Whole-frame percentage of full-resolution scanlines done.
    Progress { generation: u64, percent: u32 },
    /// Every segment has been presented at full resolution.
    PassComplete { generation: u64, elapsed: Duration },
    Failed {
        worker_id: u32,
        stage: Stage,
        message: String,
    },
}

#[derive(Debug)]
struct Slot {
    segment: Segment,
    compute_running: bool,
    render_running: bool,
    /// Generations the running tasks were dispatched with.
    compute_generation: u64,
    render_generation: u64,
    needs_compute: bool,
    needs_render: bool,
    /// Fresh compute output waiting for the render task to free up.
    pending_render: Option<SegmentData>,
    /// Last full-resolution data, kept for redraws. `None` while a redraw
    /// render holds it.
    full_res: Option<SegmentData>,
    /// A coarse render landed; the next finer level is due.
    refine_waiting: bool,
    /// Some render of this pass has been presented.
    presented: bool,
    /// The full-resolution render of this pass has been presented.
    finished: bool,
    progress_lines: u32,
}

impl Slot {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            compute_running: false,
            render_running: false,
            compute_generation: 0,
            render_generation: 0,
            needs_compute: false,
            needs_render: false,
            pending_render: None,
            full_res: None,
            refine_waiting: false,
            presented: false,
            finished: false,
            progress_lines: 0,
        }
    }

    /// Mark the `stage` task dispatched with `generation` as done. Returns
    /// `false` when no such task is running here, which happens for
    /// outcomes from a partition replaced by a resize.
    fn settle(&mut self, stage: Stage, generation: u64) -> bool {
        let (running, dispatched) = match stage {
            Stage::Compute => (&mut self.compute_running, self.compute_generation),
            Stage::Render => (&mut self.render_running, self.render_generation),
        };
        if !*running || dispatched != generation {
            return false;
        }
        *running = false;
        true
    }

    fn percent(&self) -> u32 {
        if self.finished {
            100
        } else if self.segment.block_size == 1 && self.segment.height > 0 {
            self.progress_lines * 100 / self.segment.height
        } else {
            0
        }
    }
}

/// Schedules segment work on a [`WorkerPool`] and composites results into a
/// [`SurfaceRenderer`].
pub struct FrameOrchestrator {
    pool: WorkerPool,
    cancel: Arc<RenderCancel>,
    slots: Vec<Slot>,
    key: ComputeKey,
    generation: u64,
    max_block_size: u32,
    refine_delay: Duration,
    refine_not_before: Instant,
    interacting: bool,
    show_axes: bool,
    pass_started: Instant,
    pass_reported: bool,
    /// The pass in progress only recolours stored data.
    redraw_only: bool,
}

impl FrameOrchestrator {
    /// Create an orchestrator for a `width × height` canvas with one segment
    /// per pool thread. Nothing is computed until
    /// [`request_recompute`](Self::request_recompute).
    pub fn new(
        pool: WorkerPool,
        width: u32,
        height: u32,
        viewport: Viewport,
        max_block_size: u32,
    ) -> crate::Result<Self> {
        // Validates the canvas up front; dispatch relies on it.
        viewport.transform(width, height)?;
        let max_block_size = normalise_block_size(max_block_size);
        let slots = partition_segments(height, pool.threads() as u32, max_block_size)
            .into_iter()
            .map(Slot::new)
            .collect();
        let now = Instant::now();
        Ok(Self {
            pool,
            cancel: Arc::new(RenderCancel::new()),
            slots,
            key: ComputeKey {
                viewport,
                width,
                height,
            },
            generation: 0,
            max_block_size,
            refine_delay: DEFAULT_REFINE_DELAY,
            refine_not_before: now,
            interacting: false,
            show_axes: false,
            pass_started: now,
            pass_reported: true,
            redraw_only: false,
        })
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> &Viewport {
        &self.key.viewport
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.key.width, self.key.height)
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.slots.iter().map(|s| s.segment).collect()
    }

    pub fn max_block_size(&self) -> u32 {
        self.max_block_size
    }

    /// Block size used for the first pass after a recompute. Rounded up to a
    /// power of two.
    pub fn set_max_block_size(&mut self, block_size: u32) {
        self.max_block_size = normalise_block_size(block_size);
    }

    pub fn set_refine_delay(&mut self, delay: Duration) {
        self.refine_delay = delay;
    }

    /// While the host reports a gesture in progress, passes stay coarse.
    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    pub fn set_show_axes(&mut self, show_axes: bool) {
        self.show_axes = show_axes;
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Start a new pass for `viewport`: invalidate in-flight work and compute
    /// every segment again from the coarsest block size.
    pub fn request_recompute(&mut self, viewport: Viewport) {
        self.key.viewport = viewport;
        self.generation = self.cancel.cancel();
        let now = Instant::now();
        self.refine_not_before = now + self.refine_delay;
        self.pass_started = now;
        self.pass_reported = false;
        self.redraw_only = false;

        for slot in &mut self.slots {
            slot.segment.block_size = self.max_block_size;
            slot.needs_compute = true;
            slot.needs_render = false;
            slot.pending_render = None;
            slot.refine_waiting = false;
            slot.presented = false;
            slot.finished = false;
            slot.progress_lines = 0;
        }
        debug!(
            generation = self.generation,
            block_size = self.max_block_size,
            "Recompute requested"
        );
    }

    /// Re-colour every segment from its stored full-resolution data without
    /// recomputing. Segments without usable data fall back to a recompute.
    pub fn request_redraw(&mut self) {
        let mut any = false;
        for slot in &mut self.slots {
            if slot.finished {
                slot.needs_render = true;
                slot.finished = false;
                any = true;
            } else if slot.render_running && slot.segment.block_size == 1 {
                // Already colouring with the old palette; recolour once it lands.
                slot.needs_render = true;
            }
            // Segments still refining pick up the new palette on their next render.
        }
        if any && self.pass_reported {
            self.pass_started = Instant::now();
            self.pass_reported = false;
            self.redraw_only = true;
        }
    }

    /// Abandon the current pass without starting another.
    pub fn flush(&mut self) {
        self.generation = self.cancel.cancel();
        for slot in &mut self.slots {
            slot.needs_compute = false;
            slot.needs_render = false;
            slot.pending_render = None;
            slot.refine_waiting = false;
        }
        self.pass_reported = true;
        debug!(generation = self.generation, "Render flushed");
    }

    /// Change the canvas size. Re-partitions the segments and starts a
    /// coarse recompute.
    pub fn resize(&mut self, width: u32, height: u32, viewport: Viewport) -> crate::Result<()> {
        viewport.transform(width, height)?;
        self.generation = self.cancel.cancel();
        self.key.width = width;
        self.key.height = height;
        self.slots = partition_segments(height, self.pool.threads() as u32, self.max_block_size)
            .into_iter()
            .map(Slot::new)
            .collect();
        info!(width, height, segments = self.slots.len(), "Canvas resized");
        self.request_recompute(viewport);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn pass_state(&self) -> PassState {
        let computing = self.slots.iter().filter(|s| s.compute_running).count();
        if computing > 0 {
            return PassState::Computing(computing);
        }
        if self.slots.iter().any(|s| s.needs_compute || s.refine_waiting) {
            return PassState::ComputePending;
        }
        let rendering = self.slots.iter().filter(|s| s.render_running).count();
        if rendering > 0 {
            return PassState::Rendering(rendering);
        }
        if self
            .slots
            .iter()
            .any(|s| s.needs_render || s.pending_render.is_some())
        {
            return PassState::RenderPending;
        }
        PassState::Idle
    }

    /// Every segment has shown something since the last recompute.
    pub fn frame_ready(&self) -> bool {
        self.slots.iter().all(|s| s.presented)
    }

    /// Every segment is on screen at full resolution.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.finished)
    }

    pub fn renders_in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.render_running).count()
    }

    /// Whole-frame percentage of full-resolution scanlines done.
    pub fn progress_percent(&self) -> u32 {
        if self.slots.is_empty() {
            return 100;
        }
        self.slots.iter().map(Slot::percent).sum::<u32>() / self.slots.len() as u32
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// One scheduling step: absorb finished tasks, schedule refinement and
    /// dispatch whatever each idle slot needs. Never blocks.
    pub fn tick(
        &mut self,
        now: Instant,
        palette: &Palette,
        surface: &mut dyn SurfaceRenderer,
    ) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        for outcome in self.pool.poll() {
            self.handle_outcome(outcome, surface, &mut events);
        }

        if !self.interacting && now >= self.refine_not_before {
            for slot in &mut self.slots {
                if slot.refine_waiting {
                    slot.refine_waiting = false;
                    slot.segment.block_size = (slot.segment.block_size / 2).max(1);
                    slot.needs_compute = true;
                }
            }
        }

        self.dispatch(palette);

        if !self.pass_reported && self.is_complete() && self.pass_state() == PassState::Idle {
            self.pass_reported = true;
            let elapsed = now.saturating_duration_since(self.pass_started);
            let elapsed_ms = elapsed.as_millis() as u64;
            if self.redraw_only {
                debug!(elapsed_ms, generation = self.generation, "Redraw complete");
            } else {
                info!(elapsed_ms, generation = self.generation, "Render complete");
            }
            events.push(FrameEvent::PassComplete {
                generation: self.generation,
                elapsed,
            });
        }
        events
    }

    fn handle_outcome(
        &mut self,
        outcome: TaskOutcome,
        surface: &mut dyn SurfaceRenderer,
        events: &mut Vec<FrameEvent>,
    ) {
        match outcome {
            TaskOutcome::Computed { generation, data } => {
                let Some(slot) = self.slots.get_mut(data.segment.worker_id as usize) else {
                    return;
                };
                if !slot.settle(Stage::Compute, generation) {
                    debug!(
                        worker_id = data.segment.worker_id,
                        generation,
                        "Ignoring compute result from a replaced segment"
                    );
                    return;
                }
                if generation != self.generation {
                    debug!(
                        worker_id = data.segment.worker_id,
                        generation,
                        current = self.generation,
                        "Dropping stale compute result"
                    );
                    return;
                }
                slot.pending_render = Some(data);
            }
            TaskOutcome::Progress {
                generation,
                worker_id,
                lines,
            } => {
                if generation != self.generation {
                    return;
                }
                if let Some(slot) = self.slots.get_mut(worker_id as usize) {
                    slot.progress_lines = lines;
                }
                events.push(FrameEvent::Progress {
                    generation,
                    percent: self.progress_percent(),
                });
            }
            TaskOutcome::Rendered {
                generation,
                pixels,
                data,
            } => {
                let worker_id = data.segment.worker_id;
                let block_size = data.segment.block_size;
                let key = self.key;
                let Some(slot) = self.slots.get_mut(worker_id as usize) else {
                    return;
                };
                if !slot.settle(Stage::Render, generation) {
                    debug!(worker_id, generation, "Ignoring render result from a replaced segment");
                    return;
                }

                if generation != self.generation || data.segment.y_start != slot.segment.y_start
                {
                    debug!(worker_id, generation, "Dropping stale render result");
                    // Hand back full-resolution data a redraw was holding.
                    if block_size == 1 && (slot.full_res.is_none() || data.key == key) {
                        slot.full_res = Some(data);
                    }
                    return;
                }

                let axes = if self.show_axes {
                    key.viewport.transform(key.width, key.height).ok()
                } else {
                    None
                };
                surface.present_segment(&data.segment, &pixels, axes.as_ref());
                slot.presented = true;
                events.push(FrameEvent::SegmentPresented {
                    generation,
                    worker_id,
                    block_size,
                });

                if block_size == 1 {
                    slot.finished = true;
                    slot.progress_lines = slot.segment.height;
                    slot.full_res = Some(data);
                } else {
                    slot.refine_waiting = true;
                }
            }
            TaskOutcome::Stale { origin } => {
                if let Some(slot) = self.slots.get_mut(origin.worker_id as usize) {
                    slot.settle(origin.stage, origin.generation);
                }
            }
            TaskOutcome::Failed { origin, message } => {
                if let Some(slot) = self.slots.get_mut(origin.worker_id as usize) {
                    slot.settle(origin.stage, origin.generation);
                }
                // The segment keeps whatever it last showed.
                error!(
                    worker_id = origin.worker_id,
                    stage = ?origin.stage,
                    generation = origin.generation,
                    %message,
                    "Segment task failed, keeping previous pixels"
                );
                events.push(FrameEvent::Failed {
                    worker_id: origin.worker_id,
                    stage: origin.stage,
                    message,
                });
            }
        }
    }

    fn dispatch(&mut self, palette: &Palette) {
        let Ok(transform) = self.key.viewport.transform(self.key.width, self.key.height) else {
            warn!("Viewport has no valid screen transform, skipping dispatch");
            return;
        };

        let generation = self.generation;
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];

            if slot.needs_compute && !slot.compute_running {
                slot.needs_compute = false;
                slot.compute_running = true;
                slot.compute_generation = generation;
                let segment = slot.segment;
                self.dispatch_compute(segment, transform);
            }

            let slot = &mut self.slots[index];
            if slot.render_running {
                continue;
            }
            if let Some(data) = slot.pending_render.take() {
                slot.render_running = true;
                slot.render_generation = generation;
                self.dispatch_render(data, palette);
            } else if slot.needs_render {
                slot.needs_render = false;
                match slot.full_res.take() {
                    Some(data)
                        if data.key == self.key
                            && data.segment == slot.segment.with_block_size(1) =>
                    {
                        slot.render_running = true;
                        slot.render_generation = generation;
                        self.dispatch_render(data, palette);
                    }
                    stale => {
                        debug!(worker_id = slot.segment.worker_id, "No reusable data, recomputing");
                        slot.full_res = stale;
                        slot.segment.block_size = self.max_block_size;
                        slot.needs_compute = true;
                    }
                }
            }
        }
    }

    fn dispatch_compute(&self, segment: Segment, transform: ScreenTransform) {
        let generation = self.generation;
        let key = self.key;
        let cancel = Arc::clone(&self.cancel);
        let origin = TaskOrigin {
            worker_id: segment.worker_id,
            stage: Stage::Compute,
            generation,
        };
        debug!(
            worker_id = segment.worker_id,
            generation,
            block_size = segment.block_size,
            "Dispatching compute"
        );
        self.pool.submit(origin, move |tx| {
            let fractal = Mandelbrot::new(key.viewport.params());
            let result = compute_segment(&fractal, &transform, &segment, &cancel, generation, |lines| {
                let _ = tx.send(TaskOutcome::Progress {
                    generation,
                    worker_id: segment.worker_id,
                    lines,
                });
            });
            match result {
                Some((iterations, smooth)) => TaskOutcome::Computed {
                    generation,
                    data: SegmentData {
                        segment,
                        key,
                        iterations,
                        smooth,
                    },
                },
                None => TaskOutcome::Stale { origin },
            }
        });
    }

    fn dispatch_render(&self, data: SegmentData, palette: &Palette) {
        let generation = self.generation;
        let origin = TaskOrigin {
            worker_id: data.segment.worker_id,
            stage: Stage::Render,
            generation,
        };
        // Tasks colour from their own copy; rotation never races a render.
        let palette = palette.clone();
        self.pool.submit(origin, move |_| {
            let smooth = if data.segment.block_size == 1 {
                data.smooth.as_ref()
            } else {
                None
            };
            let pixels = palette.colorize_segment(&data.iterations, smooth);
            TaskOutcome::Rendered {
                generation,
                pixels,
                data,
            }
        });
    }
}

fn normalise_block_size(block_size: u32) -> u32 {
    block_size.max(1).next_power_of_two()
}
