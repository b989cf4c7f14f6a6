use std::collections::VecDeque;
use std::time::Duration;

/// Sliding window over the most recent frame durations, read by the overlay.
///
/// Durations are recorded as measured, before the game loop caps its
/// movement delta, so stalls stay visible in `max` and `fps`.
#[derive(Debug)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    limit: usize,
    total: Duration,
}

impl FrameTimer {
    /// Keep the last `limit` frames (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            window: VecDeque::with_capacity(limit),
            limit,
            total: Duration::ZERO,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.limit {
            if let Some(oldest) = self.window.pop_front() {
                self.total -= oldest;
            }
        }
        self.window.push_back(dt);
        self.total += dt;
    }

    /// Mean frame time over the window; zero before the first frame.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.window.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total / n,
        }
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or_default()
    }

    /// Frames currently in the window.
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Frames per second over the window; zero before any frame.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(120)
    }
}
