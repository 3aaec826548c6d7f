//! The two chip timers and the clocks driving them.
use std::{
    thread,
    time::{Duration, Instant},
};

/// Represents a timer inside of the chip
/// infrastruture, it will count down to
/// zero from what ever number given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Will set the value from which the timer shall count down from.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    /// Will get the value that the counter is currently at.
    pub fn get_value(&self) -> u8 {
        self.value
    }

    /// Counts down by one and reports if this tick made the timer run out.
    ///
    /// # Example
    /// ```rust
    /// # use chip::timer::Timer;
    /// let mut timer = Timer::new(1);
    /// assert!(timer.tick());
    /// assert!(!timer.tick());
    /// assert_eq!(timer.get_value(), 0);
    /// ```
    pub fn tick(&mut self) -> bool {
        match self.value {
            0 => false,
            value => {
                self.value = value - 1;
                self.value == 0
            }
        }
    }
}

/// Divides the instruction clock down to the timer clock in logical time.
///
/// Every instruction tick earns `timer_hertz` credits, every
/// `cpu_hertz` credits are worth one timer tick. The remainder is
/// carried over, so no ticks get lost for uneven ratios.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    cpu_hertz: u64,
    timer_hertz: u64,
    credit: u64,
}

impl Cadence {
    pub fn new(cpu_hertz: u64, timer_hertz: u64) -> Self {
        Self {
            cpu_hertz: cpu_hertz.max(1),
            timer_hertz,
            credit: 0,
        }
    }

    /// Advances by one instruction tick and returns the number of
    /// timer ticks that are due now.
    pub fn tick(&mut self) -> u64 {
        self.credit += self.timer_hertz;
        let due = self.credit / self.cpu_hertz;
        self.credit %= self.cpu_hertz;
        due
    }
}

/// Keeps a loop at a fixed wall clock rate.
///
/// The interval is measured from one deadline to the next, so the time
/// spent working inside the loop is subtracted from the sleep.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    deadline: Instant,
}

impl Pacer {
    /// If the loop falls behind by more than this, the schedule is reset
    /// instead of trying to catch up.
    const MAX_LAG: Duration = Duration::from_millis(100);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now() + interval,
        }
    }

    /// Blocks until the next deadline.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if let Some(remaining) = self.deadline.checked_duration_since(now) {
            thread::sleep(remaining);
        } else if now - self.deadline > Self::MAX_LAG {
            log::trace!("Running {:?} behind, resetting the schedule", now - self.deadline);
            self.deadline = now;
        }
        self.deadline += self.interval;
    }
}
