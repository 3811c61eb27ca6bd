//! Palette mapper
//!
//! Converts the core's 2-bit colour classes into 32-bit host pixels. The
//! palette is fixed for the life of the process.

use crate::emu_core::{RawFramebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Colour class to pixel mapping, indexed by class 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette([u32; 4]);

impl Palette {
    /// Four grey levels, lightest first
    pub const DMG_GREY: Palette = Palette([0xFFFF_FFFF, 0x9999_9999, 0x4444_4444, 0x0000_0000]);

    pub const fn new(colours: [u32; 4]) -> Self {
        Self(colours)
    }

    /// Pixel for a colour class. Only the low two bits are significant.
    #[inline]
    pub fn colour(&self, class: u8) -> u32 {
        self.0[(class & 3) as usize]
    }

    pub fn colours(&self) -> &[u32; 4] {
        &self.0
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DMG_GREY
    }
}

/// Host-owned 160x144 pixel buffer, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFramebuffer {
    pixels: Vec<u32>,
}

impl MappedFramebuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn width(&self) -> usize {
        SCREEN_WIDTH
    }

    pub fn height(&self) -> usize {
        SCREEN_HEIGHT
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.pixels.chunks_exact(SCREEN_WIDTH)
    }
}

impl Default for MappedFramebuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw frame into a fresh buffer
pub fn map(raw: &RawFramebuffer, palette: &Palette) -> MappedFramebuffer {
    let mut mapped = MappedFramebuffer::new();
    map_into(raw, palette, &mut mapped);
    mapped
}

/// Map a raw frame into an existing buffer
pub fn map_into(raw: &RawFramebuffer, palette: &Palette, out: &mut MappedFramebuffer) {
    for (src, dst) in raw.iter().zip(out.pixels.chunks_exact_mut(SCREEN_WIDTH)) {
        for (&class, px) in src.iter().zip(dst.iter_mut()) {
            *px = palette.colour(class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu_core::blank_framebuffer;

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.colour(0), 0xFFFF_FFFF);
        assert_eq!(palette.colour(1), 0x9999_9999);
        assert_eq!(palette.colour(2), 0x4444_4444);
        assert_eq!(palette.colour(3), 0x0000_0000);
    }

    #[test]
    fn test_map_into_overwrites_previous_frame() {
        let palette = Palette::new([1, 2, 3, 4]);
        let mut raw = blank_framebuffer();
        let mut out = map(&raw, &palette);
        assert!(out.as_slice().iter().all(|&p| p == 1));

        raw[10][20] = 3;
        map_into(&raw, &palette, &mut out);
        assert_eq!(out.pixel(20, 10), 4);
        assert_eq!(out.pixel(21, 10), 1);
    }

    #[test]
    fn test_rows() {
        let out = MappedFramebuffer::new();
        assert_eq!(out.rows().count(), SCREEN_HEIGHT);
        assert!(out.rows().all(|r| r.len() == SCREEN_WIDTH));
    }
}
