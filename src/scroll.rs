//! Scroll wheel acceleration.
//!
//! Holding a scroll button repeats wheel ticks. Each tick shortens the
//! delay to the next one by a fixed step down to a floor; letting go for a
//! single loop iteration starts over slow.

use core::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrollAccelerator {
    initial: f32,
    accel: f32,
    floor: f32,
    current: f32,
}

impl ScrollAccelerator {
    /// Delays are in seconds. `floor` must not exceed `initial`.
    pub fn new(initial: f32, accel: f32, floor: f32) -> Self {
        Self {
            initial,
            accel,
            floor,
            current: initial,
        }
    }

    /// Register a wheel tick and return the delay before the next one.
    pub fn on_scroll_event(&mut self) -> Duration {
        self.current -= self.accel;
        if self.current < self.floor {
            self.current = self.floor;
        }
        Duration::from_secs_f32(self.current)
    }

    /// No scroll input this iteration. Returns `true` if the speed was reset.
    pub fn on_idle_tick(&mut self) -> bool {
        if self.current != self.initial {
            self.current = self.initial;
            true
        } else {
            false
        }
    }

    /// Current inter-tick delay in seconds.
    pub fn speed(&self) -> f32 {
        self.current
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }
}
