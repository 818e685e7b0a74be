//! Time management utilities

use std::time::Instant;

/// Timing information for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Monotonic timestamp supplied by the scheduler, in milliseconds
    pub now_ms: f64,

    /// Seconds elapsed since the previous tick
    pub delta_time: f32,
}

impl FrameTiming {
    /// Build timing for a frame directly (handy for fixed-step callers)
    pub fn new(now_ms: f64, delta_time: f32) -> Self {
        Self { now_ms, delta_time }
    }
}

/// Converts scheduler timestamps into per-frame delta times
///
/// The previous timestamp starts at zero, so the very first tick reports the
/// full time since the scheduler's epoch.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    prev_ms: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock to `now_ms` and return the frame timing
    pub fn tick(&mut self, now_ms: f64) -> FrameTiming {
        // Non-monotonic input collapses to a zero-length frame
        let delta_ms = (now_ms - self.prev_ms).max(0.0);
        self.prev_ms = now_ms;
        self.frame_count += 1;

        FrameTiming {
            now_ms,
            delta_time: (delta_ms / 1000.0) as f32,
        }
    }

    /// Number of ticks processed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// High-precision wall-clock timer for frame statistics
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_tick_measures_from_zero() {
        let mut clock = FrameClock::new();
        let timing = clock.tick(500.0);
        assert_relative_eq!(timing.delta_time, 0.5);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_consecutive_ticks() {
        let mut clock = FrameClock::new();
        clock.tick(1000.0);
        let timing = clock.tick(1000.0 + 1000.0 / 60.0);
        assert_relative_eq!(timing.delta_time, 1.0 / 60.0, epsilon = 1e-6);
        assert_relative_eq!(timing.now_ms, 1000.0 + 1000.0 / 60.0);
    }

    #[test]
    fn test_backwards_timestamp_yields_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick(2000.0);
        let timing = clock.tick(1500.0);
        assert_eq!(timing.delta_time, 0.0);

        // The clock re-anchors on the late timestamp
        let timing = clock.tick(1600.0);
        assert_relative_eq!(timing.delta_time, 0.1, epsilon = 1e-6);
    }
}
