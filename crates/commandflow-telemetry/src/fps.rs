use std::time::{Duration, Instant};

/// Counts events and reports a rate once per reporting window.
///
/// `tick()` returns `Some(rate)` when a full window has elapsed, else `None`.
pub struct FpsTracker {
    window: Duration,
    window_start: Instant,
    count: u64,
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsTracker {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            count: 0,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.count += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            let fps = self.count as f64 / elapsed.as_secs_f64();
            self.count = 0;
            self.window_start = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rate_before_window_elapses() {
        let mut tracker = FpsTracker::with_window(Duration::from_secs(3600));
        for _ in 0..100 {
            assert!(tracker.tick().is_none());
        }
    }

    #[test]
    fn rate_reported_after_window() {
        let mut tracker = FpsTracker::with_window(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        let fps = tracker.tick().expect("window elapsed, rate expected");
        assert!(fps > 0.0);
    }
}
