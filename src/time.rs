//! Frame clock.
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // In the frame loop:
//! let (elapsed, delta) = time.update();
//! ```

use std::time::{Duration, Instant};

/// Elapsed and delta time for the frame loop.
///
/// Elapsed time is non-decreasing. While paused, `delta()` is 0 and
/// `elapsed()` holds still; resuming does not jump forward.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    /// Total time spent paused.
    pause_elapsed: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A clock whose zero is `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last_frame: start,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn update(&mut self) -> (f32, f32) {
        self.update_at(Instant::now())
    }

    /// Update as if the frame happened at `now`.
    pub fn update_at(&mut self, now: Instant) -> (f32, f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        self.delta_secs = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = self.last_frame.max(now);

        let running = now.saturating_duration_since(self.start).saturating_sub(self.pause_elapsed);
        self.elapsed_secs = running.as_secs_f32().max(self.elapsed_secs);

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn resume_at(&mut self, now: Instant) {
        if self.paused {
            self.pause_elapsed += now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_time_update() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        let (elapsed, delta) = time.update_at(start + Duration::from_millis(250));
        assert!((elapsed - 0.25).abs() < 1e-6);
        assert!((delta - 0.25).abs() < 1e-6);

        let (elapsed, delta) = time.update_at(start + Duration::from_millis(300));
        assert!((elapsed - 0.3).abs() < 1e-6);
        assert!((delta - 0.05).abs() < 1e-6);
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn test_time_pause() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.update_at(start + Duration::from_secs(1));

        time.pause();
        let (elapsed, delta) = time.update_at(start + Duration::from_secs(5));
        assert_eq!(elapsed, 1.0);
        assert_eq!(delta, 0.0);

        // Resuming skips the paused span
        time.resume_at(start + Duration::from_secs(5));
        let (elapsed, _) = time.update_at(start + Duration::from_secs(6));
        assert!((elapsed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.update_at(start + Duration::from_secs(2));
        let (elapsed, delta) = time.update_at(start + Duration::from_secs(1));
        assert_eq!(elapsed, 2.0);
        assert_eq!(delta, 0.0);
    }
}
