//! Display surface the orchestrator composites segments into.

use serde::{Deserialize, Serialize};

use mandelscope_core::ScreenTransform;

use crate::buffer::RenderBuffer;
use crate::segment::Segment;

/// Destination for finished segment pixels.
///
/// One backend is chosen from configuration at startup; the orchestrator
/// only talks to this trait.
pub trait SurfaceRenderer: Send {
    /// Drop the current frame and start over at `width × height`, black.
    fn resize(&mut self, width: u32, height: u32);

    /// Replace the rows covered by `segment` with `pixels`, then draw the
    /// axes over those rows when `axes` is given.
    fn present_segment(
        &mut self,
        segment: &Segment,
        pixels: &RenderBuffer,
        axes: Option<&ScreenTransform>,
    );

    /// The composite frame as RGBA.
    fn frame(&self) -> &RenderBuffer;

    /// Increments on every change to the frame, so hosts can skip
    /// re-uploading an unchanged image.
    fn revision(&self) -> u64;
}

/// Which [`SurfaceRenderer`] to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceBackend {
    /// CPU-side RGBA buffer.
    #[default]
    Software,
}

impl SurfaceBackend {
    pub fn create(self, width: u32, height: u32) -> Box<dyn SurfaceRenderer> {
        match self {
            Self::Software => Box::new(SoftwareSurface::new(width, height)),
        }
    }
}

/// A plain in-memory RGBA frame.
#[derive(Debug)]
pub struct SoftwareSurface {
    frame: RenderBuffer,
    revision: u64,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RenderBuffer::new(width, height),
            revision: 0,
        }
    }
}

impl SurfaceRenderer for SoftwareSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.frame = RenderBuffer::new(width, height);
        self.revision += 1;
    }

    fn present_segment(
        &mut self,
        segment: &Segment,
        pixels: &RenderBuffer,
        axes: Option<&ScreenTransform>,
    ) {
        if pixels.width != self.frame.width {
            // Leftover from before a resize.
            return;
        }
        self.frame.blit_rows(segment.y_start, pixels);
        if let Some(t) = axes {
            self.frame.draw_axes(t, segment.y_start, segment.y_end());
        }
        self.revision += 1;
    }

    fn frame(&self) -> &RenderBuffer {
        &self.frame
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
