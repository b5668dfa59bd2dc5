use std::time::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
}

impl FrameTime {
    /// A synthetic frame with a fixed step, for simulations without a clock.
    pub fn fixed(dt: f32, frame_index: u64) -> Self {
        Self {
            dt,
            now: Instant::now(),
            frame_index,
        }
    }
}

/// Produces one [`FrameTime`] per tick.
///
/// Delta time is clamped to `[dt_min, dt_max]` so a debugger pause or a
/// minimized window does not hand a huge step to the simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the delta measurement from now.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean frame time over consecutive windows of `window` seconds.
#[derive(Debug, Clone)]
pub struct FrameAverage {
    window: f32,
    elapsed: f32,
    dt_sum: f32,
    frames: u32,
    average: f32,
}

impl FrameAverage {
    pub fn new(window: f32) -> Self {
        Self {
            window,
            elapsed: 0.0,
            dt_sum: 0.0,
            frames: 0,
            average: 0.0,
        }
    }

    /// Adds one frame. Returns the new average when a window completes.
    pub fn push(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.dt_sum += dt;
        self.frames += 1;

        if self.elapsed < self.window {
            return None;
        }

        self.average = self.dt_sum / self.frames as f32;
        self.elapsed -= self.window;
        self.dt_sum = 0.0;
        self.frames = 0;
        Some(self.average)
    }

    /// Average of the last completed window; 0 before the first one.
    pub fn average(&self) -> f32 {
        self.average
    }
}

impl Default for FrameAverage {
    fn default() -> Self {
        Self::new(1.0)
    }
}
