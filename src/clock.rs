//! Frame timing.
//!
//! [`FrameClock`] is the single source of elapsed time for the viewer. The
//! scene animates from [`FrameClock::elapsed`]; the window title shows
//! [`FrameClock::fps`], which is recomputed twice a second.

use std::time::{Duration, Instant};

/// Frames counted over a fixed window of wall time.
#[derive(Debug, Clone, Copy)]
struct FpsWindow {
    opened_at: Instant,
    frames: u64,
    length: Duration,
}

impl FpsWindow {
    fn new(now: Instant, length: Duration) -> Self {
        Self {
            opened_at: now,
            frames: 0,
            length,
        }
    }

    /// Count one frame. Returns the rate once the window has run its length,
    /// then starts a new window at `now`.
    fn count(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let span = now.duration_since(self.opened_at);
        if span < self.length {
            return None;
        }
        let rate = self.frames as f32 / span.as_secs_f32();
        *self = Self::new(now, self.length);
        Some(rate)
    }
}

/// Elapsed time, frame delta, frame count and a periodically refreshed FPS.
#[derive(Debug)]
pub struct FrameClock {
    origin: Instant,
    previous: Instant,
    elapsed: Duration,
    delta: Duration,
    ticks: u64,
    window: FpsWindow,
    fps: f32,
    fps_refreshed: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_fps_interval(Duration::from_millis(500))
    }

    pub fn with_fps_interval(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    fn starting_at(origin: Instant, interval: Duration) -> Self {
        Self {
            origin,
            previous: origin,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            ticks: 0,
            window: FpsWindow::new(origin, interval),
            fps: 0.0,
            fps_refreshed: false,
        }
    }

    /// Advance to the current instant. Call once per frame.
    ///
    /// Returns `(elapsed, delta)` in seconds. Elapsed time is `f64` so it
    /// stays exact over long sessions.
    pub fn update(&mut self) -> (f64, f32) {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> (f64, f32) {
        self.delta = now.saturating_duration_since(self.previous);
        self.elapsed = now.saturating_duration_since(self.origin);
        self.previous = now;
        self.ticks += 1;

        let rate = self.window.count(now);
        self.fps_refreshed = rate.is_some();
        if let Some(rate) = rate {
            self.fps = rate;
        }

        (self.elapsed(), self.delta())
    }

    /// Seconds since the clock started or was last reset.
    pub fn elapsed(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn delta(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn frame(&self) -> u64 {
        self.ticks
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the last [`update`](Self::update) recomputed the FPS.
    pub fn fps_refreshed(&self) -> bool {
        self.fps_refreshed
    }

    pub fn reset(&mut self) {
        *self = Self::with_fps_interval(self.window.length);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
