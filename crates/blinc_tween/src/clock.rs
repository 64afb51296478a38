//! Frame clock
//!
//! Turns wall-clock frames into tick deltas for hosts that don't already
//! have a per-frame delta time.

use crate::scheduler::TweenScheduler;
use std::time::Instant;

/// Measures time between frames
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    last_frame: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last_frame: None }
    }

    /// Seconds since the previous frame (0.0 on the first frame)
    pub fn delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    /// Like [`FrameClock::delta`], with an explicit timestamp
    ///
    /// A timestamp earlier than the previous one yields 0.0.
    pub fn delta_at(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);
        dt
    }

    /// Measure the frame and tick `scheduler` with it. Returns the delta used.
    pub fn tick(&mut self, scheduler: &TweenScheduler) -> f32 {
        let dt = self.delta();
        scheduler.tick(dt);
        dt
    }

    /// Forget the previous frame, e.g. after the host was suspended
    ///
    /// Prevents one huge delta on the first frame after resuming.
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}
