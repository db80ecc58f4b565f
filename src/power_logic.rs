//! Idle and sleep-gesture policy.
//!
//! Either trigger commits the ring to deep sleep; nothing cancels it once
//! it fires.

use core::time::Duration;

use crate::config::PinId;
use crate::timer::Instant;

/// Why the ring is going to sleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepReason {
    IdleTimeout,
    LongPress,
}

/// Timestamp of the last user interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityClock {
    last: Instant,
}

impl ActivityClock {
    pub const fn new(now: Instant) -> Self {
        Self { last: now }
    }

    /// Record activity (button press, scroll tick).
    pub fn touch(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn last(&self) -> Instant {
        self.last
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last)
    }
}

/// True once inactivity strictly exceeds `timeout`.
pub fn idle_expired(idle: Duration, timeout: Duration) -> bool {
    idle > timeout
}

/// Long-press detector. The hold timer starts the first poll the
/// qualifying condition is true and resets whenever it is false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LongPress {
    since: Option<Instant>,
}

impl LongPress {
    pub const fn new() -> Self {
        Self { since: None }
    }

    /// Feed the current condition. Returns `true` once it has held for at
    /// least `hold`.
    pub fn update(&mut self, now: Instant, qualifying: bool, hold: Duration) -> bool {
        if !qualifying {
            self.since = None;
            return false;
        }
        let since = *self.since.get_or_insert(now);
        now.saturating_duration_since(since) >= hold
    }

    pub fn reset(&mut self) {
        self.since = None;
    }

    pub fn is_timing(&self) -> bool {
        self.since.is_some()
    }
}

/// Platform deep-sleep primitive: arm a level-low wake on `wake_pin` and
/// power down. Execution resumes from reset, never from here.
pub trait DeepSleep {
    fn sleep_until_pin_low(&mut self, wake_pin: PinId) -> !;
}
