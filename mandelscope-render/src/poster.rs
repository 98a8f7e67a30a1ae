//! Poster path: one-shot full-resolution render at a fixed large size,
//! bypassing progressive refinement.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mandelscope_core::{FractalParams, Mandelbrot, ScreenTransform, Viewport};

use crate::buffer::RenderBuffer;
use crate::compute::compute_segment;
use crate::error::RenderError;
use crate::palette::Palette;
use crate::pool::{RenderCancel, WorkerPool};
use crate::segment::partition_segments;

/// Poster size and the factor it is shrunk by for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    pub width: u32,
    pub height: u32,
    pub downsample: u32,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            width: 8000,
            height: 6000,
            downsample: 2,
        }
    }
}

/// A finished poster.
#[derive(Debug, Clone)]
pub struct PosterImage {
    /// Full-resolution raster, for export.
    pub raster: RenderBuffer,
    /// `raster` shrunk by [`PosterConfig::downsample`], for display.
    pub preview: RenderBuffer,
    pub elapsed: Duration,
}

/// Render `transform` at block size 1, split into one segment per pool
/// thread, and merge the coloured segments into one raster.
///
/// Aborts with [`RenderError::Cancelled`] as soon as `cancel` moves past
/// `generation`. Progress is reported in scanlines through `cancel`.
pub fn render_poster(
    pool: &WorkerPool,
    transform: &ScreenTransform,
    params: FractalParams,
    palette: &Palette,
    cancel: &RenderCancel,
    generation: u64,
) -> crate::Result<RenderBuffer> {
    render_segments(
        &pool.handle(),
        pool.threads(),
        transform,
        params,
        palette,
        cancel,
        generation,
    )
}

fn render_segments(
    pool: &rayon::ThreadPool,
    threads: usize,
    transform: &ScreenTransform,
    params: FractalParams,
    palette: &Palette,
    cancel: &RenderCancel,
    generation: u64,
) -> crate::Result<RenderBuffer> {
    let (width, height) = (transform.width(), transform.height());
    let segments = partition_segments(height, threads as u32, 1);
    let fractal = Mandelbrot::new(params);
    cancel.reset_progress(height as usize);

    let bands = pool.install(|| {
        segments
            .par_iter()
            .map(|segment| {
                let mut reported = 0;
                let (iterations, smooth) =
                    compute_segment(&fractal, transform, segment, cancel, generation, |lines| {
                        cancel.add_progress((lines - reported) as usize);
                        reported = lines;
                    })?;
                cancel.add_progress((segment.height - reported) as usize);
                Some((segment.y_start, palette.colorize_segment(&iterations, smooth.as_ref())))
            })
            .collect::<Option<Vec<_>>>()
    });
    let Some(bands) = bands else {
        debug!(generation, "Poster render cancelled");
        return Err(RenderError::Cancelled);
    };

    let mut raster = RenderBuffer::new(width, height);
    for (y_start, band) in &bands {
        raster.blit_rows(*y_start, band);
    }
    Ok(raster)
}

/// Shrink `buffer` by `factor` in both directions. A factor of 0 or 1
/// returns a copy.
pub fn downsample(buffer: &RenderBuffer, factor: u32) -> crate::Result<RenderBuffer> {
    if factor <= 1 {
        return Ok(buffer.clone());
    }
    let (width, height) = (buffer.width, buffer.height);
    let image = RgbaImage::from_raw(width, height, buffer.pixels.clone())
        .ok_or(RenderError::InvalidDimensions { width, height })?;
    let (w, h) = ((width / factor).max(1), (height / factor).max(1));
    let small = imageops::resize(&image, w, h, FilterType::Triangle);
    Ok(RenderBuffer {
        width: w,
        height: h,
        pixels: small.into_raw(),
    })
}

/// A poster render running on its own thread.
///
/// The heavy lifting happens on the shared worker pool; the dedicated thread
/// only waits on it, so the scheduling thread stays free to drive live
/// rendering meanwhile.
pub struct PosterJob {
    cancel: Arc<RenderCancel>,
    rx: mpsc::Receiver<crate::Result<PosterImage>>,
    handle: Option<JoinHandle<()>>,
    size: (u32, u32),
}

impl PosterJob {
    /// Start rendering `viewport` as seen on a `live_width × live_height`
    /// canvas, at poster resolution.
    pub fn spawn(
        pool: &WorkerPool,
        viewport: &Viewport,
        live_width: u32,
        live_height: u32,
        palette: Palette,
        config: PosterConfig,
    ) -> crate::Result<Self> {
        let transform = viewport
            .transform(live_width, live_height)?
            .scaled(config.width, config.height)?;
        let params = viewport.params();
        let threads = pool.threads();
        let rayon_pool = pool.handle();
        let cancel = Arc::new(RenderCancel::new());
        let job_cancel = Arc::clone(&cancel);
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("poster-worker".into())
            .spawn(move || {
                let start = Instant::now();
                let result = render_segments(
                    &rayon_pool,
                    threads,
                    &transform,
                    params,
                    &palette,
                    &job_cancel,
                    0,
                )
                .and_then(|raster| {
                    let preview = downsample(&raster, config.downsample)?;
                    Ok(PosterImage {
                        raster,
                        preview,
                        elapsed: start.elapsed(),
                    })
                });
                match &result {
                    Ok(poster) => info!(
                        width = config.width,
                        height = config.height,
                        elapsed_ms = poster.elapsed.as_millis() as u64,
                        "Poster complete"
                    ),
                    Err(RenderError::Cancelled) => {}
                    Err(e) => warn!("Poster render failed: {e}"),
                }
                let _ = tx.send(result);
            })?;

        info!(width = config.width, height = config.height, "Poster started");
        Ok(Self {
            cancel,
            rx,
            handle: Some(handle),
            size: (config.width, config.height),
        })
    }

    /// Poster raster size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Percentage of poster scanlines done.
    pub fn progress_percent(&self) -> u32 {
        match self.cancel.progress() {
            (_, 0) => 0,
            (done, total) => (done * 100 / total) as u32,
        }
    }

    /// Abort the render. The job then finishes with
    /// [`RenderError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The finished poster, if it is done. Returns `Some` exactly once.
    pub fn try_finish(&mut self) -> Option<crate::Result<PosterImage>> {
        let result = self.rx.try_recv().ok()?;
        self.join();
        Some(result)
    }

    /// Block until the poster is done.
    pub fn wait(mut self) -> crate::Result<PosterImage> {
        let result = self.rx.recv().unwrap_or_else(|_| {
            Err(RenderError::WorkerPanic {
                origin: None,
                message: "poster thread exited without a result".into(),
            })
        });
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PosterJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel();
        }
    }
}
