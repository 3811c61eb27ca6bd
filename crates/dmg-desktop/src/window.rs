//! minifb window as event source and presentation sink

use dmg_harness::sink::{EventSource, HostEvent, PresentError, PresentationSink};
use dmg_harness::{MappedFramebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use minifb::{Key, Scale, Window, WindowOptions};
use tracing::debug;

const TITLE: &str = "DMG Emulator";

pub struct WindowFrontend {
    window: Option<Window>,
}

impl WindowFrontend {
    /// Open a fixed-size 160x144 window at the given integer scale
    pub fn open(scale: u8) -> Result<Self, PresentError> {
        let window = Window::new(
            TITLE,
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            WindowOptions {
                resize: false,
                scale: window_scale(scale),
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PresentError::Backend(e.to_string()))?;

        debug!(scale, "window opened");
        Ok(Self {
            window: Some(window),
        })
    }
}

fn window_scale(scale: u8) -> Scale {
    match scale {
        1 => Scale::X1,
        4 => Scale::X4,
        8 => Scale::X8,
        _ => Scale::X2,
    }
}

impl EventSource for WindowFrontend {
    // minifb pumps the platform queue inside update_with_buffer, so this
    // only inspects the state it left behind.
    fn drain_events(&mut self) -> Vec<HostEvent> {
        match &self.window {
            Some(window) if window.is_open() && !window.is_key_down(Key::Escape) => Vec::new(),
            _ => vec![HostEvent::Quit],
        }
    }
}

impl PresentationSink for WindowFrontend {
    fn present(&mut self, frame: &MappedFramebuffer) -> Result<(), PresentError> {
        let window = self.window.as_mut().ok_or(PresentError::Released)?;
        window
            .update_with_buffer(frame.as_slice(), frame.width(), frame.height())
            .map_err(|e| PresentError::Backend(e.to_string()))
    }

    fn release(&mut self) {
        if self.window.take().is_some() {
            debug!("window closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_scale() {
        assert!(matches!(window_scale(1), Scale::X1));
        assert!(matches!(window_scale(2), Scale::X2));
        assert!(matches!(window_scale(8), Scale::X8));
    }
}
