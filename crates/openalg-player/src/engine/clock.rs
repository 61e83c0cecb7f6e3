//! Millisecond clocks for frame pacing

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Wall-clock source the scheduler paces against
pub trait Clock {
    /// Milliseconds since an arbitrary start; wraps after ~49 days
    fn now_ms(&self) -> u32;

    fn sleep_ms(&mut self, ms: u32);
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn sleep_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Simulated time; sleeping advances it instantly.
///
/// Clones share one timeline so a test can keep a handle while the
/// scheduler owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_time() {
        let handle = ManualClock::new();
        let mut owned: Box<dyn Clock> = Box::new(handle.clone());
        owned.sleep_ms(15);
        handle.advance(5);
        assert_eq!(owned.now_ms(), 20);
        assert_eq!(handle.now_ms(), 20);
    }
}
