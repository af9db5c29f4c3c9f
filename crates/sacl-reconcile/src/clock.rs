use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Time source for retry loops.
///
/// `now` is a monotonic offset from an arbitrary origin. Implementations
/// used in tests advance `now` on `sleep` instead of blocking.
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&self, d: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d)
    }
}

/// Wall clock backed by [`Instant`] and a blocking thread sleep.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Deterministic clock. `sleep` advances time instantly and is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a sleep (e.g. a slow remote call).
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.sleeps.borrow_mut().push(d);
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let c = ManualClock::new();
        c.sleep(Duration::from_secs(2));
        c.advance(Duration::from_millis(500));
        assert_eq!(c.now(), Duration::from_millis(2500));
        assert_eq!(c.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn borrowed_clock_is_a_clock() {
        fn elapsed_after_sleep<K: Clock>(k: K) -> Duration {
            k.sleep(Duration::from_secs(1));
            k.now()
        }
        let c = ManualClock::new();
        assert_eq!(elapsed_after_sleep(&c), Duration::from_secs(1));
        assert_eq!(c.total_slept(), Duration::from_secs(1));
    }
}
