//! Trailing-edge debounce as an explicit state machine.
//!
//! The debouncer never sleeps on its own. The caller asks for the [`Debouncer::deadline`]
//! and calls [`Debouncer::flush`] once it has passed, which keeps the timing logic
//! testable against a [`ManualClock`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Tokio's clock; honours a paused test runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// No flush was pending; the window starts now.
    Armed,
    /// A flush was already pending; its window restarts.
    Rearmed,
}

pub struct Debouncer<C> {
    window: Duration,
    clock: C,
    deadline: Option<Instant>,
}

impl<C: Clock> Debouncer<C> {
    pub fn new(window: Duration, clock: C) -> Self {
        Self {
            window,
            clock,
            deadline: None,
        }
    }

    pub fn trigger(&mut self) -> Trigger {
        let was_pending = self.deadline.is_some();
        self.deadline = Some(self.clock.now() + self.window);
        if was_pending {
            Trigger::Rearmed
        } else {
            Trigger::Armed
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|d| self.clock.now() >= d)
    }

    /// Consumes the pending flush if its quiet window has fully elapsed.
    pub fn flush(&mut self) -> bool {
        if self.is_due() {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_millis(5_000);

    #[test]
    fn burst_of_triggers_flushes_once_after_last() {
        let clock = Arc::new(ManualClock::new());
        let mut d = Debouncer::new(WINDOW, clock.clone());

        assert_eq!(d.trigger(), Trigger::Armed);
        for _ in 0..9 {
            clock.advance(Duration::from_millis(400));
            assert_eq!(d.trigger(), Trigger::Rearmed);
            assert!(!d.flush());
        }

        clock.advance(WINDOW - Duration::from_millis(1));
        assert!(!d.flush());

        clock.advance(Duration::from_millis(1));
        assert!(d.flush());
        assert!(!d.flush(), "flush is consumed");
        assert!(!d.is_pending());
    }

    #[test]
    fn idle_debouncer_never_flushes() {
        let clock = Arc::new(ManualClock::new());
        let mut d = Debouncer::new(WINDOW, clock.clone());
        clock.advance(WINDOW * 3);
        assert!(!d.flush());
    }

    #[test]
    fn cancel_drops_pending_flush() {
        let clock = Arc::new(ManualClock::new());
        let mut d = Debouncer::new(WINDOW, clock.clone());
        d.trigger();
        d.cancel();
        clock.advance(WINDOW);
        assert!(!d.flush());
        assert_eq!(d.trigger(), Trigger::Armed);
    }
}
