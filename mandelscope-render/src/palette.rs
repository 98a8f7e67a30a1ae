//! Colour tables and the index → RGBA mapping.
//!
//! A palette holds 256 entries. Entries `0..=254` form the colour ring that
//! rotation cycles through; entry 255 is the interior colour (black) and
//! never moves.

use rayon::prelude::*;

use mandelscope_core::INTERIOR_INDEX;

use crate::buffer::RenderBuffer;
use crate::iteration_buffer::{IterationBuffer, SmoothBuffer};

/// Total entries, including the interior slot.
pub const PALETTE_SIZE: usize = 256;

/// Entries that take part in rotation and interpolation.
pub const RING_SIZE: usize = 255;

const INTERIOR_COLOR: [u8; 3] = [0, 0, 0];

type Generator = fn(u32) -> [u8; 3];

/// Built-in palettes, indexed by palette id.
const GENERATORS: [(&str, Generator); 14] = [
    ("Original", original),
    ("Fire", fire),
    ("Black & white", black_and_white),
    ("Electric blue", electric_blue),
    ("Toon", toon),
    ("Gold", gold),
    ("Classic VGA", vga),
    ("CGA 1", cga1),
    ("CGA 2", cga2),
    ("Primary (RGB)", primary),
    ("Secondary (CMY)", secondary),
    ("Tertiary 1", tertiary1),
    ("Tertiary 2", tertiary2),
    ("Neon", neon),
];

/// Number of built-in palettes.
pub const PALETTE_COUNT: u8 = GENERATORS.len() as u8;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// A 256-entry colour table with its current rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    id: u8,
    name: &'static str,
    colors: [[u8; 3]; PALETTE_SIZE],
    rotation: u8,
}

impl Palette {
    /// Built-in palette `id` (`0..PALETTE_COUNT`) at rotation 0.
    pub fn by_id(id: u8) -> Option<Self> {
        let (name, generator) = *GENERATORS.get(id as usize)?;
        Some(Self::generate(id, name, generator))
    }

    fn generate(id: u8, name: &'static str, generator: Generator) -> Self {
        let mut colors = [INTERIOR_COLOR; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().take(RING_SIZE).enumerate() {
            *c = generator(i as u32);
        }
        Self {
            id,
            name,
            colors,
            rotation: 0,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Accumulated rotation, `0..=254`.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn colors(&self) -> &[[u8; 3]; PALETTE_SIZE] {
        &self.colors
    }

    /// Palette after `self` in id order, wrapping around.
    pub fn next(&self) -> Self {
        Self::by_id((self.id + 1) % PALETTE_COUNT).unwrap_or_default()
    }

    /// Palette before `self` in id order, wrapping around.
    pub fn previous(&self) -> Self {
        Self::by_id((self.id + PALETTE_COUNT - 1) % PALETTE_COUNT).unwrap_or_default()
    }

    /// Cyclically shift the ring by `steps`: entry `i` takes the colour that
    /// was at `i + steps`. Entry 255 is untouched.
    pub fn rotate(&mut self, steps: u32) {
        let steps = steps as usize % RING_SIZE;
        self.colors[..RING_SIZE].rotate_left(steps);
        self.rotation = ((self.rotation as usize + steps) % RING_SIZE) as u8;
    }

    /// Colour for an encoded iteration index.
    ///
    /// With a smooth offset the colour moves from the next ring entry
    /// (offset 0) toward this one (offset 255); index 254 blends with entry 0.
    #[inline]
    pub fn colour_for(&self, index: u8, smooth: Option<u8>) -> [u8; 4] {
        if index == INTERIOR_INDEX {
            let [r, g, b] = INTERIOR_COLOR;
            return [r, g, b, 255];
        }
        let current = self.colors[index as usize];
        let Some(offset) = smooth else {
            return [current[0], current[1], current[2], 255];
        };
        let next = self.colors[(index as usize + 1) % RING_SIZE];
        let t = offset as f64 / 255.0;
        let mix = |c: u8, n: u8| (n as f64 - (n as f64 - c as f64) * t).round() as u8;
        [
            mix(current[0], next[0]),
            mix(current[1], next[1]),
            mix(current[2], next[2]),
            255,
        ]
    }

    /// Colour one segment's indices into RGBA pixels.
    ///
    /// Pass `smooth` only for full-resolution segments; coarse blocks are
    /// drawn flat.
    pub fn colorize_segment(
        &self,
        iterations: &IterationBuffer,
        smooth: Option<&SmoothBuffer>,
    ) -> RenderBuffer {
        let mut pixels = vec![0u8; iterations.data.len() * 4];
        match smooth {
            Some(s) => pixels
                .par_chunks_mut(4)
                .zip(iterations.data.par_iter().zip(s.data.par_iter()))
                .for_each(|(pixel, (&index, &offset))| {
                    pixel.copy_from_slice(&self.colour_for(index, Some(offset)));
                }),
            None => pixels
                .par_chunks_mut(4)
                .zip(iterations.data.par_iter())
                .for_each(|(pixel, &index)| {
                    pixel.copy_from_slice(&self.colour_for(index, None));
                }),
        }
        RenderBuffer {
            width: iterations.width,
            height: iterations.height,
            pixels,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        let (name, generator) = GENERATORS[0];
        Self::generate(0, name, generator)
    }
}

/// Every built-in palette at rotation 0, in id order.
pub fn builtin_palettes() -> Vec<Palette> {
    (0..PALETTE_COUNT).filter_map(Palette::by_id).collect()
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Channels are truncated toward zero.
#[inline]
fn rgb(r: f64, g: f64, b: f64) -> [u8; 3] {
    [r as u8, g as u8, b as u8]
}

/// `0xRRGGBB00` packed colour.
#[inline]
fn unpack(p: u32) -> [u8; 3] {
    [(p >> 24) as u8, (p >> 16) as u8, (p >> 8) as u8]
}

fn original(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 32.0 {
        rgb(i * 8.0, i * 8.0, 127.0 - i * 4.0)
    } else if i < 128.0 {
        rgb(255.0, 255.0 - (i - 32.0) * 8.0 / 3.0, (i - 32.0) * 4.0 / 3.0)
    } else if i < 192.0 {
        rgb(255.0 - (i - 128.0) * 4.0, (i - 128.0) * 3.0, 127.0 - (i - 128.0))
    } else {
        rgb(0.0, 192.0 - (i - 192.0) * 3.0, 64.0 + (i - 192.0))
    }
}

fn fire(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 64.0 {
        rgb(i * 4.0, 0.0, 0.0)
    } else if i < 128.0 {
        rgb(255.0, (i - 64.0) * 2.0, 0.0)
    } else if i < 192.0 {
        rgb(255.0, 128.0 - (i - 128.0) * 2.0, 0.0)
    } else {
        rgb(255.0 - (i - 192.0) * 4.0, 0.0, 0.0)
    }
}

fn black_and_white(i: u32) -> [u8; 3] {
    let v = if i < 128 { 255 - i * 2 } else { (i - 128) * 2 };
    [v as u8; 3]
}

fn electric_blue(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 32.0 {
        rgb(0.0, 0.0, i * 4.0)
    } else if i < 64.0 {
        let d = i - 32.0;
        rgb(d * 8.0, d * 8.0, 127.0 + d * 4.0)
    } else if i < 96.0 {
        let d = i - 64.0;
        rgb(255.0 - d * 8.0, 255.0 - d * 8.0, 255.0 - d * 4.0)
    } else if i < 128.0 {
        rgb(0.0, 0.0, 127.0 - (i - 96.0) * 4.0)
    } else if i < 192.0 {
        rgb(0.0, 0.0, i - 128.0)
    } else {
        rgb(0.0, 0.0, 63.0 - (i - 192.0))
    }
}

fn toon(i: u32) -> [u8; 3] {
    match i % 4 {
        0 => [100, 20, 200],
        1 => [220, 112, 0],
        2 => [230, 120, 0],
        _ => [255, 128, 0],
    }
}

fn gold(i: u32) -> [u8; 3] {
    // Piecewise-linear ramps between stops, rounding down.
    let ramp = |from: i32, delta: i32, pos: i32, span: i32| from + (pos * delta).div_euclid(span);
    let i = i as i32;
    let (r, g, b) = if i < 32 {
        (ramp(54, 170, i, 32), ramp(11, 104, i, 32), ramp(2, 8, i, 32))
    } else if i < 64 {
        let d = i - 32;
        (ramp(224, 31, d, 32), ramp(115, 77, d, 32), ramp(10, 39, d, 32))
    } else if i < 192 {
        let d = i - 64;
        (255, ramp(192, 63, d, 128), ramp(49, 117, d, 128))
    } else if i < 224 {
        let d = i - 192;
        (255, ramp(255, -63, d, 32), ramp(166, -117, d, 32))
    } else {
        let d = i - 224;
        (ramp(255, -201, d, 32), ramp(192, -181, d, 32), ramp(49, -47, d, 32))
    };
    [r as u8, g as u8, b as u8]
}

fn vga(i: u32) -> [u8; 3] {
    unpack(VGA[i as usize])
}

fn cga1(i: u32) -> [u8; 3] {
    unpack([0x0000_0000, 0x55ff_ff00, 0xff55_ff00, 0xffff_ff00][i as usize % 4])
}

fn cga2(i: u32) -> [u8; 3] {
    unpack([0x0000_0000, 0x55ff_5500, 0xff55_5500, 0xffff_5500][i as usize % 4])
}

fn primary(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 85.0 {
        rgb(255.0 - 3.0 * i, 3.0 * i, 0.0)
    } else if i < 170.0 {
        let d = i - 85.0;
        rgb(0.0, 255.0 - 3.0 * d, 3.0 * d)
    } else {
        let d = i - 170.0;
        rgb(3.0 * d, 0.0, 255.0 - 3.0 * d)
    }
}

fn secondary(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 85.0 {
        rgb(3.0 * i, 255.0 - 3.0 * i, 255.0)
    } else if i < 170.0 {
        let d = i - 85.0;
        rgb(255.0, 3.0 * d, 255.0 - 3.0 * d)
    } else {
        let d = i - 170.0;
        rgb(255.0 - 3.0 * d, 255.0, 3.0 * d)
    }
}

fn tertiary1(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 85.0 {
        rgb(255.0 - 1.5 * i, 127.0 - 1.5 * i, 3.0 * i)
    } else if i < 170.0 {
        let d = i - 85.0;
        rgb(127.0 - 1.5 * d, 3.0 * d, 255.0 - 1.5 * d)
    } else {
        let d = i - 170.0;
        rgb(3.0 * d, 255.0 - 1.5 * d, 127.0 - 1.5 * d)
    }
}

fn tertiary2(i: u32) -> [u8; 3] {
    let i = i as f64;
    if i < 85.0 {
        rgb(255.0 - 3.0 * i, 1.5 * i, 127.0 + 1.5 * i)
    } else if i < 170.0 {
        let d = i - 85.0;
        rgb(1.5 * d, 127.0 + 1.5 * d, 255.0 - 3.0 * d)
    } else {
        let d = i - 170.0;
        rgb(127.0 + 1.5 * d, 255.0 - 3.0 * d, 1.5 * d)
    }
}

fn neon(i: u32) -> [u8; 3] {
    let i = i as f64;
    let d = i % 32.0;
    match i as u32 / 32 {
        0 => rgb(4.0 * d, 0.0, 8.0 * d),
        1 => rgb(124.0 - 4.0 * d, 0.0, 248.0 - 8.0 * d),
        2 => rgb(8.0 * d, 4.0 * d, 0.0),
        3 => rgb(248.0 - 8.0 * d, 124.0 - 4.0 * d, 0.0),
        4 => rgb(0.0, 4.0 * d, 8.0 * d),
        5 => rgb(0.0, 124.0 - 4.0 * d, 248.0 - 8.0 * d),
        6 => rgb(4.0 * d, 8.0 * d, 4.0 * d),
        _ => rgb(124.0 - 4.0 * d, 248.0 - 8.0 * d, 124.0 - 4.0 * d),
    }
}

/// The 256-colour VGA mode 13h default palette.
#[rustfmt::skip]
const VGA: [u32; 256] = [
    0x00000000, 0x0000aa00, 0x00aa0000, 0x00aaaa00, 0xaa000000, 0xaa00aa00, 0xaa550000, 0xaaaaaa00,
    0x55555500, 0x5555ff00, 0x55ff5500, 0x55ffff00, 0xff555500, 0xff55ff00, 0xffff5500, 0xffffff00,
    0x00000000, 0x14141400, 0x20202000, 0x2c2c2c00, 0x38383800, 0x45454500, 0x51515100, 0x61616100,
    0x71717100, 0x82828200, 0x92929200, 0xa2a2a200, 0xb6b6b600, 0xcbcbcb00, 0xe3e3e300, 0xffffff00,
    0x0000ff00, 0x4100ff00, 0x7d00ff00, 0xbe00ff00, 0xff00ff00, 0xff00be00, 0xff007d00, 0xff004100,
    0xff000000, 0xff410000, 0xff7d0000, 0xffbe0000, 0xffff0000, 0xbeff0000, 0x7dff0000, 0x41ff0000,
    0x00ff0000, 0x00ff4100, 0x00ff7d00, 0x00ffbe00, 0x00ffff00, 0x00beff00, 0x007dff00, 0x0041ff00,
    0x7d7dff00, 0x9e7dff00, 0xbe7dff00, 0xdf7dff00, 0xff7dff00, 0xff7ddf00, 0xff7dbe00, 0xff7d9e00,
    0xff7d7d00, 0xff9e7d00, 0xffbe7d00, 0xffdf7d00, 0xffff7d00, 0xdfff7d00, 0xbeff7d00, 0x9eff7d00,
    0x7dff7d00, 0x7dff9e00, 0x7dffbe00, 0x7dffdf00, 0x7dffff00, 0x7ddfff00, 0x7dbeff00, 0x7d9eff00,
    0xb6b6ff00, 0xc7b6ff00, 0xdbb6ff00, 0xebb6ff00, 0xffb6ff00, 0xffb6eb00, 0xffb6db00, 0xffb6c700,
    0xffb6b600, 0xffc7b600, 0xffdbb600, 0xffebb600, 0xffffb600, 0xebffb600, 0xdbffb600, 0xc7ffb600,
    0xb6ffb600, 0xb6ffc700, 0xb6ffdb00, 0xb6ffeb00, 0xb6ffff00, 0xb6ebff00, 0xb6dbff00, 0xb6c7ff00,
    0x00007100, 0x1c007100, 0x38007100, 0x55007100, 0x71007100, 0x71005500, 0x71003800, 0x71001c00,
    0x71000000, 0x711c0000, 0x71380000, 0x71550000, 0x71710000, 0x55710000, 0x38710000, 0x1c710000,
    0x00710000, 0x00711c00, 0x00713800, 0x00715500, 0x00717100, 0x00557100, 0x00387100, 0x001c7100,
    0x38387100, 0x45387100, 0x55387100, 0x61387100, 0x71387100, 0x71386100, 0x71385500, 0x71384500,
    0x71383800, 0x71453800, 0x71553800, 0x71613800, 0x71713800, 0x61713800, 0x55713800, 0x45713800,
    0x38713800, 0x38714500, 0x38715500, 0x38716100, 0x38717100, 0x38617100, 0x38557100, 0x38457100,
    0x51517100, 0x59517100, 0x61517100, 0x69517100, 0x71517100, 0x71516900, 0x71516100, 0x71515900,
    0x71515100, 0x71595100, 0x71615100, 0x71695100, 0x71715100, 0x69715100, 0x61715100, 0x59715100,
    0x51715100, 0x51715900, 0x51716100, 0x51716900, 0x51717100, 0x51697100, 0x51617100, 0x51597100,
    0x00004100, 0x10004100, 0x20004100, 0x30004100, 0x41004100, 0x41003000, 0x41002000, 0x41001000,
    0x41000000, 0x41100000, 0x41200000, 0x41300000, 0x41410000, 0x30410000, 0x20410000, 0x10410000,
    0x00410000, 0x00411000, 0x00412000, 0x00413000, 0x00414100, 0x00304100, 0x00204100, 0x00104100,
    0x20204100, 0x28204100, 0x30204100, 0x38204100, 0x41204100, 0x41203800, 0x41203000, 0x41202800,
    0x41202000, 0x41282000, 0x41302000, 0x41382000, 0x41412000, 0x38412000, 0x30412000, 0x28412000,
    0x20412000, 0x20412800, 0x20413000, 0x20413800, 0x20414100, 0x20384100, 0x20304100, 0x20284100,
    0x2c2c4100, 0x302c4100, 0x342c4100, 0x3c2c4100, 0x412c4100, 0x412c3c00, 0x412c3400, 0x412c3000,
    0x412c2c00, 0x41302c00, 0x41342c00, 0x413c2c00, 0x41412c00, 0x3c412c00, 0x34412c00, 0x30412c00,
    0x2c412c00, 0x2c413000, 0x2c413400, 0x2c413c00, 0x2c414100, 0x2c3c4100, 0x2c344100, 0x2c304100,
    0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourteen_palettes_with_black_interior() {
        let all = builtin_palettes();
        assert_eq!(all.len(), 14);
        for (id, p) in all.iter().enumerate() {
            assert_eq!(p.id() as usize, id);
            assert_eq!(p.colors()[255], [0, 0, 0], "{}", p.name());
        }
        assert!(Palette::by_id(PALETTE_COUNT).is_none());
    }

    #[test]
    fn generator_samples() {
        let original = Palette::by_id(0).unwrap();
        assert_eq!(original.colors()[0], [0, 0, 127]);
        assert_eq!(original.colors()[64], [255, 169, 42]);
        assert_eq!(original.colors()[254], [0, 6, 126]);

        let gold = Palette::by_id(5).unwrap();
        assert_eq!(gold.colors()[0], [54, 11, 2]);
        assert_eq!(gold.colors()[224], [255, 192, 49]);
        assert_eq!(gold.colors()[254], [66, 22, 4]);

        assert_eq!(Palette::by_id(6).unwrap().colors()[1], [0, 0, 0xaa]);
        assert_eq!(Palette::by_id(7).unwrap().colors()[5], [0x55, 0xff, 0xff]);
        assert_eq!(Palette::by_id(8).unwrap().colors()[6], [0xff, 0x55, 0x55]);
        assert_eq!(Palette::by_id(4).unwrap().colors()[3], [255, 128, 0]);
    }

    #[test]
    fn next_and_previous_wrap() {
        let last = Palette::by_id(13).unwrap();
        assert_eq!(last.next().id(), 0);
        assert_eq!(Palette::default().previous().id(), 13);
    }

    #[test]
    fn rotate_zero_is_identity() {
        let mut p = Palette::by_id(1).unwrap();
        let before = p.clone();
        p.rotate(0);
        assert_eq!(p, before);
        p.rotate(255);
        assert_eq!(p.colors(), before.colors());
        assert_eq!(p.rotation(), 0);
    }

    #[test]
    fn rotations_compose() {
        for (a, b) in [(1, 1), (100, 200), (254, 3), (17, 0), (600, 77)] {
            let mut stepwise = Palette::by_id(13).unwrap();
            stepwise.rotate(a);
            stepwise.rotate(b);
            let mut once = Palette::by_id(13).unwrap();
            once.rotate((a + b) % 255);
            assert_eq!(stepwise, once, "rotate({a}) then rotate({b})");
        }
    }

    #[test]
    fn rotation_shifts_ring_but_not_interior() {
        let base = Palette::default();
        let mut p = base.clone();
        p.rotate(3);
        assert_eq!(p.colors()[0], base.colors()[3]);
        assert_eq!(p.colors()[252], base.colors()[0]);
        assert_eq!(p.colors()[255], [0, 0, 0]);
        assert_eq!(p.rotation(), 3);
    }

    #[test]
    fn interior_is_black_in_any_mode() {
        let p = Palette::by_id(2).unwrap();
        assert_eq!(p.colour_for(INTERIOR_INDEX, None), [0, 0, 0, 255]);
        assert_eq!(p.colour_for(INTERIOR_INDEX, Some(128)), [0, 0, 0, 255]);
    }

    #[test]
    fn flat_lookup_matches_table() {
        let p = Palette::by_id(3).unwrap();
        for i in 0..255u8 {
            let [r, g, b] = p.colors()[i as usize];
            assert_eq!(p.colour_for(i, None), [r, g, b, 255]);
        }
    }

    #[test]
    fn smooth_interpolates_toward_next_entry() {
        let p = Palette::by_id(0).unwrap();
        let c = p.colors();
        let at = |i: usize| [c[i][0], c[i][1], c[i][2], 255];
        assert_eq!(p.colour_for(10, Some(255)), at(10));
        assert_eq!(p.colour_for(10, Some(0)), at(11));
        // The top of the ring wraps to entry 0.
        assert_eq!(p.colour_for(254, Some(0)), at(0));

        let mid = p.colour_for(100, Some(128));
        for ch in 0..3 {
            let (lo, hi) = (c[100][ch].min(c[101][ch]), c[100][ch].max(c[101][ch]));
            assert!((lo..=hi).contains(&mid[ch]));
        }
    }

    #[test]
    fn colorize_segment_maps_every_pixel() {
        let p = Palette::by_id(9).unwrap();
        let mut iters = IterationBuffer::new(3, 2);
        iters.data.copy_from_slice(&[0, 1, 2, 255, 84, 170]);
        let flat = p.colorize_segment(&iters, None);
        assert_eq!(flat.pixels.len(), 3 * 2 * 4);
        for (i, &index) in iters.data.iter().enumerate() {
            assert_eq!(&flat.pixels[i * 4..i * 4 + 4], &p.colour_for(index, None));
        }

        let mut smooth = SmoothBuffer::new(3, 2);
        smooth.data.fill(0);
        let shaded = p.colorize_segment(&iters, Some(&smooth));
        assert_eq!(&shaded.pixels[0..4], &p.colour_for(1, None), "offset 0 shows the next entry");
        assert_eq!(&shaded.pixels[12..16], &[0, 0, 0, 255]);
    }
}
