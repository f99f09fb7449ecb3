//! Module: clock
//!
//! Purpose: Monotonic millisecond clock injected into the bridge.
//!
//! Architecture:
//! - [`Clock`] is the only time source the engine and relay look at
//! - [`Deadline`] turns "wait N ms" into an explicit check against the clock
//! - [`StepClock`] advances by a fixed step on every read (deterministic tests)
//! - `EspClock` reads `esp_timer_get_time()` on the firmware target
//!
//! Safety: Safe. `EspClock` wraps one FFI call that has no preconditions.

use core::cell::Cell;

/// Monotonic clock in milliseconds.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. Never goes backwards.
    fn now_ms(&self) -> u64;
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// A point in time a busy-wait runs up to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    start_ms: u64,
    budget_ms: u64,
}

impl Deadline {
    /// Start a window of `budget_ms` from the clock's current time.
    pub fn after<K: Clock + ?Sized>(clock: &K, budget_ms: u64) -> Self {
        Self {
            start_ms: clock.now_ms(),
            budget_ms,
        }
    }

    /// Time elapsed since the window opened.
    pub fn elapsed<K: Clock + ?Sized>(&self, clock: &K) -> u64 {
        clock.now_ms().saturating_sub(self.start_ms)
    }

    /// True once the budget is used up.
    pub fn expired<K: Clock + ?Sized>(&self, clock: &K) -> bool {
        self.elapsed(clock) >= self.budget_ms
    }

    /// Spin until the window closes.
    pub fn wait<K: Clock + ?Sized>(&self, clock: &K) {
        while !self.expired(clock) {
            core::hint::spin_loop();
        }
    }
}

/// Fake clock: every `now_ms()` returns the current time, then moves it
/// forward by `step_ms`.
///
/// A step of zero freezes time; only use that with code that does not
/// wait on a deadline.
#[derive(Debug, Default)]
pub struct StepClock {
    now: Cell<u64>,
    step_ms: u64,
}

impl StepClock {
    /// Start at `start_ms`, advancing `step_ms` per read.
    pub const fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step_ms,
        }
    }

    /// Current time, without advancing.
    pub fn current(&self) -> u64 {
        self.now.get()
    }

    /// Jump forward.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }
}

/// `esp_timer` backed clock (microsecond timer since boot).
#[cfg(target_os = "espidf")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

#[cfg(target_os = "espidf")]
impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions once IDF is up
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        (us.max(0) as u64) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_clock_advances_per_read() {
        let clock = StepClock::new(10, 5);
        assert_eq!(clock.now_ms(), 10);
        assert_eq!(clock.now_ms(), 15);
        assert_eq!(clock.current(), 20);
    }

    #[test]
    fn test_deadline_expires_after_budget() {
        let clock = StepClock::new(0, 0);
        let deadline = Deadline::after(&clock, 100);

        assert!(!deadline.expired(&clock));
        clock.advance(99);
        assert!(!deadline.expired(&clock));
        clock.advance(1);
        assert!(deadline.expired(&clock));
    }

    #[test]
    fn test_deadline_wait_returns() {
        let clock = StepClock::new(0, 1);
        let deadline = Deadline::after(&clock, 100);
        deadline.wait(&clock);
        assert!(clock.current() >= 100);
    }
}
