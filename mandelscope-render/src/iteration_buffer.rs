use mandelscope_core::{Viewport, INTERIOR_INDEX};

use crate::segment::Segment;

/// Per-pixel 8-bit palette indices for one segment.
///
/// `255` marks interior points; everything else is the escape count modulo
/// 255. Keeping indices separate from coloured pixels enables instant palette
/// switching and rotation without recomputing iterations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Per-pixel smooth offsets (`floor(fraction · 255)`), parallel to an
/// [`IterationBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl IterationBuffer {
    /// A buffer with every pixel marked interior.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![INTERIOR_INDEX; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Fill the `size × size` block at `(x, y)`, clipped to the buffer.
    pub fn fill_block(&mut self, x: u32, y: u32, size: u32, value: u8) {
        fill_block(&mut self.data, self.width, self.height, x, y, size, value);
    }
}

impl SmoothBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn fill_block(&mut self, x: u32, y: u32, size: u32, value: u8) {
        fill_block(&mut self.data, self.width, self.height, x, y, size, value);
    }
}

fn fill_block(data: &mut [u8], width: u32, height: u32, x: u32, y: u32, size: u32, value: u8) {
    let x_end = (x + size).min(width) as usize;
    let y_end = (y + size).min(height);
    for row in y..y_end {
        let start = (row * width) as usize;
        data[start + x as usize..start + x_end].fill(value);
    }
}

// ---------------------------------------------------------------------------
// Segment data
// ---------------------------------------------------------------------------

/// Identifies what a set of iteration data was computed for. A redraw may
/// only reuse data whose key matches the current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeKey {
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
}

/// One segment's computed iterations, moved between pipeline stages.
///
/// Exactly one stage owns a `SegmentData` at a time: the compute task
/// produces it, the render task consumes it and hands it back alongside the
/// pixels so the orchestrator can keep the full-resolution copy for redraws.
#[derive(Debug, Clone)]
pub struct SegmentData {
    pub segment: Segment,
    pub key: ComputeKey,
    pub iterations: IterationBuffer,
    pub smooth: Option<SmoothBuffer>,
}
