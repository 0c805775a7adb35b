// src/core/clock.rs

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Source of elapsed-time measurements for one code interval.
pub trait Clock {
    type Instant: Copy;

    fn now(&self) -> Self::Instant;

    fn elapsed(&self, start: Self::Instant, end: Self::Instant) -> Duration;
}

/// Host monotonic clock. `std::time::Instant` picks the best monotonic source the
/// platform offers; on targets without a high-resolution one the precision is simply
/// coarser.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, start: Instant, end: Instant) -> Duration {
        end.saturating_duration_since(start)
    }
}

/// Clock that replays a pre-scripted timing series instead of measuring hardware.
///
/// Calls to `now()` come in pairs: the first opens an interval, the second closes it
/// and advances virtual time by the next scripted sample. Once the script runs out,
/// intervals have zero length.
#[derive(Debug, Default)]
pub struct ScriptedClock {
    samples: RefCell<VecDeque<Duration>>,
    current: Cell<Duration>,
    open: Cell<bool>,
    intervals: Cell<usize>,
}

impl ScriptedClock {
    pub fn new(samples: Vec<Duration>) -> Self {
        ScriptedClock {
            samples: RefCell::new(samples.into()),
            ..Default::default()
        }
    }

    /// Script expressed in nanoseconds.
    pub fn from_nanos(samples: &[u64]) -> Self {
        Self::new(samples.iter().map(|&ns| Duration::from_nanos(ns)).collect())
    }

    /// Number of closed (measured) intervals so far.
    pub fn intervals_measured(&self) -> usize {
        self.intervals.get()
    }

    pub fn remaining(&self) -> usize {
        self.samples.borrow().len()
    }
}

impl Clock for ScriptedClock {
    type Instant = Duration;

    fn now(&self) -> Duration {
        if self.open.get() {
            let step = self.samples.borrow_mut().pop_front().unwrap_or_default();
            self.current.set(self.current.get() + step);
            self.open.set(false);
            self.intervals.set(self.intervals.get() + 1);
        } else {
            self.open.set(true);
        }
        self.current.get()
    }

    fn elapsed(&self, start: Duration, end: Duration) -> Duration {
        end.saturating_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    type Instant = C::Instant;

    fn now(&self) -> Self::Instant {
        (**self).now()
    }

    fn elapsed(&self, start: Self::Instant, end: Self::Instant) -> Duration {
        (**self).elapsed(start, end)
    }
}

/// Every timing sample in the crate is a nanosecond count.
pub fn duration_to_nanos(duration: Duration) -> f64 {
    duration.as_nanos() as f64
}
