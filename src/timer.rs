//! Monotonic time and non-blocking deadlines.
//!
//! Instead of sleeping, the runtime asks for an instant some time in the
//! future and checks on later iterations whether it has passed - turning
//! LEDs off after a flash, debouncing switches, pacing scroll ticks.

use core::ops::Add;
use core::time::Duration;

/// A monotonic instant in nanoseconds since an arbitrary epoch (boot).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u64);

impl Instant {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros.saturating_mul(1_000))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let nanos = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Instant(self.0.saturating_add(nanos))
    }
}

/// Source of monotonic time. Reads never fail; a platform whose clock can
/// fail must treat that as fatal before it gets here.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Deadline `duration` from now.
    fn deadline_after(&self, duration: Duration) -> Deadline {
        Deadline::after(self.now(), duration)
    }

    fn is_elapsed(&self, deadline: &Deadline) -> bool {
        deadline.is_elapsed(self.now())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// "No action before this instant", or unset.
///
/// Each timer slot holds at most one deadline; arming again overwrites it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub const UNSET: Deadline = Deadline(None);

    /// Deadline `duration` after `now`.
    pub fn after(now: Instant, duration: Duration) -> Self {
        Deadline(Some(now + duration))
    }

    /// Overwrite this slot with a deadline `duration` after `now`.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        *self = Deadline::after(now, duration);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Set and strictly in the future.
    pub fn is_pending(&self, now: Instant) -> bool {
        matches!(self.0, Some(at) if at > now)
    }

    /// Set and reached. An unset deadline never elapses.
    pub fn is_elapsed(&self, now: Instant) -> bool {
        matches!(self.0, Some(at) if at <= now)
    }

    /// Clear the slot if it has elapsed, reporting whether it did.
    pub fn take_elapsed(&mut self, now: Instant) -> bool {
        if self.is_elapsed(now) {
            self.0 = None;
            true
        } else {
            false
        }
    }
}
