use std::time::Instant;

/// Monotonic frame timer: delta since the previous call and elapsed time
/// since reset, both in seconds.
pub struct Timer {
    start: Instant,
    last: Instant,
}

impl Timer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }

    pub fn running_time(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_non_negative_and_resets_baseline() {
        let mut timer = Timer::new();
        let first = timer.delta_time();
        let second = timer.delta_time();
        assert!(first >= 0.0);
        // The second delta measures from the first call, not from creation.
        assert!(second <= timer.running_time());
    }

    #[test]
    fn running_time_is_monotonic() {
        let timer = Timer::new();
        let a = timer.running_time();
        let b = timer.running_time();
        assert!(b >= a);
    }

    #[test]
    fn reset_rewinds_running_time() {
        let mut timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let before = timer.running_time();
        timer.reset();
        assert!(timer.running_time() < before);
    }
}
