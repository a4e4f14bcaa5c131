//! Time management utilities

use std::time::{Duration, Instant};

/// Timing information for a single frame
///
/// Passed to every update and draw call. `elapsed` is already scaled by the
/// time scale that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    elapsed: Duration,
    total: Duration,
    time_scale: f32,
    frame_index: u64,
}

impl Default for FrameTime {
    fn default() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 1.0, 0)
    }
}

impl FrameTime {
    /// Create frame timing from raw values
    pub fn new(elapsed: Duration, total: Duration, time_scale: f32, frame_index: u64) -> Self {
        Self {
            elapsed,
            total,
            time_scale,
            frame_index,
        }
    }

    /// Deterministic timing for fixed-step hosts and tests
    pub fn fixed(step_seconds: f32, frame_index: u64) -> Self {
        let step = Duration::from_secs_f32(step_seconds.max(0.0));
        let frames = u32::try_from(frame_index).unwrap_or(u32::MAX);
        Self::new(step, step * frames, 1.0, frame_index)
    }

    /// Time since the previous frame
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time since the previous frame in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Accumulated time since the first frame
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Scale applied to wall-clock time
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Index of this frame, starting at zero
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// Frame timer producing one [`FrameTime`] per tick
pub struct Timer {
    last_frame: Instant,
    total: Duration,
    time_scale: f32,
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
            total: Duration::ZERO,
            time_scale: 1.0,
            frame_count: 0,
        }
    }

    /// Set the factor applied to wall-clock time (negative values clamp to 0)
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    /// Advance the timer (should be called once per frame)
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).mul_f32(self.time_scale);
        self.last_frame = now;
        self.total += elapsed;

        let frame = FrameTime::new(elapsed, self.total, self.time_scale, self.frame_count);
        self.frame_count += 1;
        frame
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
