//! Frame pacing against a monotonic deadline
//!
//! Each frame gets a deadline one period after the previous one, so time
//! spent emulating and presenting comes out of the sleep instead of adding
//! to it. When the loop falls more than a period behind the deadline is
//! pulled up to `now + period` rather than bursting frames to catch up.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

/// DMG refresh rate: 4194304 Hz clock / 70224 clocks per frame
pub const DMG_REFRESH_HZ: f64 = 4_194_304.0 / 70_224.0;

/// Frame period at [`DMG_REFRESH_HZ`]
pub fn dmg_frame_period() -> Duration {
    Duration::from_secs_f64(1.0 / DMG_REFRESH_HZ)
}

/// Sleeps the frame loop to a fixed cadence
#[derive(Debug)]
pub struct FramePacer {
    period: Option<Duration>,
    deadline: Instant,
    late_frames: u64,
}

impl FramePacer {
    /// `None` disables pacing entirely
    pub fn new(period: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            period,
            deadline: now + period.unwrap_or_default(),
            late_frames: 0,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Frames that missed their deadline
    pub fn late_frames(&self) -> u64 {
        self.late_frames
    }

    /// Block until the current frame's deadline, then schedule the next one
    pub fn wait(&mut self) {
        let Some(period) = self.period else {
            return;
        };

        let now = Instant::now();
        if now < self.deadline {
            thread::sleep(self.deadline - now);
        } else {
            self.late_frames += 1;
            trace!(behind = ?(now - self.deadline), "frame missed its deadline");
        }

        self.deadline = next_deadline(self.deadline, Instant::now(), period);
    }
}

/// Deadline after `deadline`, resynchronised if `now` is already past it
pub fn next_deadline(deadline: Instant, now: Instant, period: Duration) -> Instant {
    let next = deadline + period;
    if now > next {
        now + period
    } else {
        next
    }
}
