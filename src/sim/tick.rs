//! Fixed timestep frame clock
//!
//! The host calls [`FrameClock::advance`] with a millisecond timestamp on
//! every animation frame. At most one step is taken per call; elapsed time
//! beyond one frame interval is dropped rather than caught up.

use crate::consts::DEFAULT_FPS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: u32,
    last_step_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            last_step_ms: f64::NEG_INFINITY,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.max(1);
    }

    #[inline]
    pub fn ms_per_frame(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// Timestamp the clock considers the last step to have happened at
    pub fn last_step_ms(&self) -> f64 {
        self.last_step_ms
    }

    /// Forget the last step so the next `advance` steps immediately
    pub fn reset(&mut self) {
        self.last_step_ms = f64::NEG_INFINITY;
    }

    /// Returns true when a step is due at `timestamp_ms`
    pub fn advance(&mut self, timestamp_ms: f64) -> bool {
        let ms_per_frame = self.ms_per_frame();
        let remainder = timestamp_ms - self.last_step_ms - ms_per_frame;
        if remainder > 0.0 {
            self.last_step_ms = timestamp_ms - remainder.min(ms_per_frame);
            true
        } else {
            false
        }
    }
}
