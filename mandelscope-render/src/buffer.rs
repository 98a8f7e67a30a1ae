use mandelscope_core::{Complex, ScreenTransform};

/// An RGBA pixel buffer representing a rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Copy a full-width band into rows starting at `y_start`. Rows that fall
    /// outside the buffer are dropped.
    pub fn blit_rows(&mut self, y_start: u32, band: &RenderBuffer) {
        debug_assert_eq!(band.width, self.width);
        let stride = self.width as usize * 4;
        let rows = band.height.min(self.height.saturating_sub(y_start)) as usize;
        let dst = y_start as usize * stride;
        self.pixels[dst..dst + rows * stride].copy_from_slice(&band.pixels[..rows * stride]);
    }

    /// Rows `y_start..y_start + height` as a new buffer.
    pub fn rows(&self, y_start: u32, height: u32) -> RenderBuffer {
        let stride = self.width as usize * 4;
        let height = height.min(self.height.saturating_sub(y_start));
        let start = y_start as usize * stride;
        RenderBuffer {
            width: self.width,
            height,
            pixels: self.pixels[start..start + height as usize * stride].to_vec(),
        }
    }

    /// Draw the real and imaginary axes in white, limited to rows
    /// `y_start..y_end`.
    pub fn draw_axes(&mut self, transform: &ScreenTransform, y_start: u32, y_end: u32) {
        let (ax, ay) = transform.complex_to_pixel(Complex::ZERO);
        let y_end = y_end.min(self.height);
        let stride = self.width as usize * 4;

        if ay >= y_start as f64 && ay < y_end as f64 {
            let row = ay as usize * stride;
            for px in self.pixels[row..row + stride].chunks_exact_mut(4) {
                px.copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        if ax >= 0.0 && ax < self.width as f64 {
            let col = ax as usize * 4;
            for y in y_start as usize..y_end as usize {
                let i = y * stride + col;
                self.pixels[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelscope_core::Viewport;

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = RenderBuffer::new(4, 4);
        assert_eq!(buf.pixels.len(), 4 * 4 * 4);
        for chunk in buf.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn blit_rows_writes_correct_region() {
        let mut buf = RenderBuffer::new(8, 8);
        let band = RenderBuffer {
            width: 8,
            height: 2,
            pixels: [255, 0, 0, 255].repeat(16),
        };
        buf.blit_rows(3, &band);

        let idx = (3 * 8 + 5) * 4;
        assert_eq!(&buf.pixels[idx..idx + 4], &[255, 0, 0, 255]);
        let idx = (4 * 8 + 7) * 4;
        assert_eq!(&buf.pixels[idx..idx + 4], &[255, 0, 0, 255]);

        // Rows outside the band are still black.
        assert_eq!(&buf.pixels[0..4], &[0, 0, 0, 255]);
        let idx = (5 * 8) * 4;
        assert_eq!(&buf.pixels[idx..idx + 4], &[0, 0, 0, 255]);

        assert_eq!(buf.rows(3, 2), band);
    }

    #[test]
    fn blit_rows_clips_at_bottom() {
        let mut buf = RenderBuffer::new(2, 3);
        let band = RenderBuffer {
            width: 2,
            height: 2,
            pixels: vec![9; 16],
        };
        buf.blit_rows(2, &band);
        assert_eq!(&buf.pixels[16..24], &[9; 8]);
    }

    #[test]
    fn axes_cross_at_origin() {
        let t = Viewport::new(0.0, 0.0, 10.0, 10, false).transform(20, 20).unwrap();
        let mut buf = RenderBuffer::new(20, 20);
        buf.draw_axes(&t, 0, 20);
        let at = |x: usize, y: usize| &buf.pixels[(y * 20 + x) * 4..(y * 20 + x) * 4 + 4];
        assert_eq!(at(3, 10), &[255, 255, 255, 255]);
        assert_eq!(at(10, 17), &[255, 255, 255, 255]);
        assert_eq!(at(3, 3), &[0, 0, 0, 255]);
    }
}
