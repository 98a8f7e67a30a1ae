/// A horizontal band of the canvas owned by one worker slot.
///
/// Segments always span the full canvas width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub worker_id: u32,
    /// First canvas row.
    pub y_start: u32,
    pub height: u32,
    /// Sampling stride: a power of two, 1 for full resolution.
    pub block_size: u32,
}

impl Segment {
    /// One past the last canvas row.
    #[inline]
    pub fn y_end(&self) -> u32 {
        self.y_start + self.height
    }

    /// Number of pixels in this segment for a canvas of `width` columns.
    #[inline]
    pub fn pixel_count(&self, width: u32) -> usize {
        width as usize * self.height as usize
    }

    pub fn with_block_size(self, block_size: u32) -> Self {
        Self { block_size, ..self }
    }
}

/// Split `height` rows into `count` contiguous bands.
///
/// Bands are as even as possible; the first `height % count` get one extra
/// row. `count` is clamped into `1..=height` so no band is empty.
pub fn partition_segments(height: u32, count: u32, block_size: u32) -> Vec<Segment> {
    if height == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, height);
    let base = height / count;
    let extra = height % count;

    let mut segments = Vec::with_capacity(count as usize);
    let mut y = 0;
    for worker_id in 0..count {
        let h = base + u32::from(worker_id < extra);
        segments.push(Segment {
            worker_id,
            y_start: y,
            height: h,
            block_size,
        });
        y += h;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(height: u32, count: u32) {
        let segments = partition_segments(height, count, 1);
        let mut y = 0;
        for (i, s) in segments.iter().enumerate() {
            assert_eq!(s.worker_id, i as u32);
            assert_eq!(s.y_start, y, "gap or overlap before segment {i}");
            assert!(s.height > 0);
            y = s.y_end();
        }
        assert_eq!(y, height, "segments must end at the canvas bottom");
    }

    #[test]
    fn covers_canvas_exactly() {
        for height in [1, 7, 64, 599, 600, 1200, 6000] {
            for count in [1, 2, 3, 7, 8, 16] {
                assert_exact_cover(height, count);
            }
        }
    }

    #[test]
    fn even_split() {
        let segments = partition_segments(1200, 8, 16);
        assert_eq!(segments.len(), 8);
        assert!(segments.iter().all(|s| s.height == 150 && s.block_size == 16));
    }

    #[test]
    fn remainder_goes_to_first_segments() {
        let heights: Vec<_> = partition_segments(10, 4, 1).iter().map(|s| s.height).collect();
        assert_eq!(heights, [3, 3, 2, 2]);
    }

    #[test]
    fn more_workers_than_rows() {
        let segments = partition_segments(3, 16, 1);
        assert_eq!(segments.len(), 3);
        assert!(partition_segments(0, 4, 1).is_empty());
    }
}
