//! Presentation sink and event source contracts
//!
//! A frontend supplies both: the session drains its events at the top of
//! every iteration and hands it one mapped frame per iteration.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::palette::MappedFramebuffer;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("display backend error: {0}")]
    Backend(String),
    #[error("presentation sink already released")]
    Released,
}

/// Classified host event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Window closed or quit requested
    Quit,
    /// Anything the loop does not act on
    Other,
}

/// Source of host events, drained once per frame
pub trait EventSource {
    /// Take every pending event
    fn drain_events(&mut self) -> Vec<HostEvent>;
}

/// Display surface receiving one mapped frame per iteration
pub trait PresentationSink {
    /// Copy the frame under whatever drawing lock the surface needs, then
    /// flip it to the visible surface.
    fn present(&mut self, frame: &MappedFramebuffer) -> Result<(), PresentError>;

    /// Tear down display resources. Called once on the clean quit path.
    fn release(&mut self);
}

/// Offscreen sink for headless runs
///
/// Keeps the most recent frame and never reports a quit event; headless
/// sessions end through a frame limit.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    last_frame: Option<MappedFramebuffer>,
    presented: u64,
    released: bool,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&MappedFramebuffer> {
        self.last_frame.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl EventSource for HeadlessSink {
    fn drain_events(&mut self) -> Vec<HostEvent> {
        Vec::new()
    }
}

impl PresentationSink for HeadlessSink {
    fn present(&mut self, frame: &MappedFramebuffer) -> Result<(), PresentError> {
        if self.released {
            return Err(PresentError::Released);
        }
        match self.last_frame.as_mut() {
            Some(last) => last.clone_from(frame),
            None => self.last_frame = Some(frame.clone()),
        }
        self.presented += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
        debug!(frames = self.presented, "headless sink released");
    }
}

/// Encode a frame as binary PPM (P6), dropping the alpha byte
pub fn encode_ppm(frame: &MappedFramebuffer) -> Vec<u8> {
    let (width, height) = (frame.width(), frame.height());
    let mut ppm = Vec::with_capacity(width * height * 3 + 32);
    ppm.extend_from_slice(format!("P6\n{} {}\n255\n", width, height).as_bytes());
    for &px in frame.as_slice() {
        let r = ((px >> 16) & 0xFF) as u8;
        let g = ((px >> 8) & 0xFF) as u8;
        let b = (px & 0xFF) as u8;
        ppm.extend_from_slice(&[r, g, b]);
    }
    ppm
}

/// Write a frame to disk as PPM
pub fn write_ppm(path: &Path, frame: &MappedFramebuffer) -> io::Result<()> {
    fs::write(path, encode_ppm(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu_core::{blank_framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::palette::{map, Palette};

    #[test]
    fn test_headless_keeps_last_frame() {
        let mut sink = HeadlessSink::new();
        assert!(sink.last_frame().is_none());

        let mut raw = blank_framebuffer();
        sink.present(&map(&raw, &Palette::default())).unwrap();
        raw[0][0] = 3;
        sink.present(&map(&raw, &Palette::default())).unwrap();

        assert_eq!(sink.frames_presented(), 2);
        assert_eq!(sink.last_frame().unwrap().pixel(0, 0), 0);
        assert!(sink.drain_events().is_empty());
    }

    #[test]
    fn test_present_after_release_fails() {
        let mut sink = HeadlessSink::new();
        sink.release();
        let err = sink.present(&MappedFramebuffer::new()).unwrap_err();
        assert!(matches!(err, PresentError::Released));
    }

    #[test]
    fn test_ppm_encoding() {
        let frame = map(&blank_framebuffer(), &Palette::new([0x00AB_CDEF, 0, 0, 0]));
        let ppm = encode_ppm(&frame);
        let header = format!("P6\n{} {}\n255\n", SCREEN_WIDTH, SCREEN_HEIGHT);
        assert!(ppm.starts_with(header.as_bytes()));
        assert_eq!(ppm.len(), header.len() + SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        assert_eq!(&ppm[header.len()..header.len() + 3], &[0xAB, 0xCD, 0xEF]);
    }
}
