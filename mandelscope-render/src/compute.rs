//! Segment Compute Engine: fills a segment's iteration (and smooth) buffers
//! at a given sampling stride.

use mandelscope_core::{Fractal, ScreenTransform};

use crate::iteration_buffer::{IterationBuffer, SmoothBuffer};
use crate::pool::RenderCancel;
use crate::segment::Segment;

/// Full-resolution segments report progress every this many scanlines.
pub const PROGRESS_INTERVAL: u32 = 20;

/// Iterate one segment.
///
/// With `block_size > 1` only the top-left pixel of each block is iterated and
/// its value replicated across the block (clipped at the segment edges).
/// The cancellation token is checked before every sampled scanline; `None`
/// is returned as soon as its generation moves past `generation`.
///
/// `on_progress(lines_done)` fires every [`PROGRESS_INTERVAL`] scanlines of a
/// full-resolution segment.
pub fn compute_segment<F: Fractal>(
    fractal: &F,
    transform: &ScreenTransform,
    segment: &Segment,
    cancel: &RenderCancel,
    generation: u64,
    mut on_progress: impl FnMut(u32),
) -> Option<(IterationBuffer, Option<SmoothBuffer>)> {
    let width = transform.width();
    let params = fractal.params();
    let max_iterations = params.max_iterations;
    let escape_radius_sq = params.escape_radius_sq();
    let block = segment.block_size.max(1);

    let mut iterations = IterationBuffer::new(width, segment.height);
    let mut smooth = params.smooth.then(|| SmoothBuffer::new(width, segment.height));

    for y in (0..segment.height).step_by(block as usize) {
        if cancel.generation() != generation {
            return None;
        }
        for x in (0..width).step_by(block as usize) {
            let result = fractal.iterate(transform.pixel_to_complex(x, segment.y_start + y));
            iterations.fill_block(x, y, block, result.encode(max_iterations));
            if let Some(s) = smooth.as_mut() {
                s.fill_block(x, y, block, result.encode_smooth(escape_radius_sq));
            }
        }
        if block == 1 && (y + 1) % PROGRESS_INTERVAL == 0 {
            on_progress(y + 1);
        }
    }

    Some((iterations, smooth))
}
