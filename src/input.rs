//! Debounced button input.
//!
//! Buttons are active-low with internal pull-up. Each [`DebouncedInput`]
//! owns one pin and one debounce deadline, so one button's bounce never
//! holds up another.
//!
//! The first raw level that differs from the stable one is accepted at
//! once and arms the deadline. Raw transitions are ignored until it
//! elapses, so contact bounce after an edge never becomes a second edge.
//! A level that changed back during the lockout is picked up on the first
//! poll after it.

use core::time::Duration;

use embedded_hal::digital::InputPin;

use crate::error::Error;
use crate::timer::{Deadline, Instant};

/// Logical state of one button after debouncing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Released.
    #[default]
    Idle,
    /// Debounced press seen on this poll.
    Pressed,
    /// Still pressed on a later poll.
    Held,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        !matches!(self, ButtonState::Idle)
    }
}

pub struct DebouncedInput<P> {
    pin: P,
    debounce: Duration,
    deadline: Deadline,
    stable_low: bool,
    raw_low: bool,
    state: ButtonState,
}

impl<P: InputPin> DebouncedInput<P> {
    /// Wrap `pin`, assuming it starts released.
    pub fn new(pin: P, debounce: Duration) -> Self {
        Self {
            pin,
            debounce,
            deadline: Deadline::UNSET,
            stable_low: false,
            raw_low: false,
            state: ButtonState::Idle,
        }
    }

    /// Sample the pin and advance the debounce state machine.
    pub fn poll(&mut self, now: Instant) -> Result<ButtonState, Error> {
        let raw_low = self.pin.is_low().map_err(|_| Error::Input)?;
        self.raw_low = raw_low;

        let mut edge = false;
        if raw_low != self.stable_low && !self.deadline.is_pending(now) {
            self.stable_low = raw_low;
            self.deadline.arm(now, self.debounce);
            edge = true;
        }

        self.state = match (self.stable_low, edge) {
            (false, _) => ButtonState::Idle,
            (true, true) => ButtonState::Pressed,
            (true, false) => ButtonState::Held,
        };
        Ok(self.state)
    }

    /// State computed by the last [`poll`](Self::poll).
    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        self.state.is_down()
    }

    /// Level read by the last poll, before debouncing.
    pub fn is_low_raw(&self) -> bool {
        self.raw_low
    }

    /// True while edges are locked out after the last accepted one.
    pub fn debounce_pending(&self, now: Instant) -> bool {
        self.deadline.is_pending(now)
    }
}

/// Which physical button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    Left,
    Right,
    ScrollUp,
    ScrollDown,
}

/// The four ring buttons.
pub struct Buttons<P> {
    pub left: DebouncedInput<P>,
    pub right: DebouncedInput<P>,
    pub scroll_up: DebouncedInput<P>,
    pub scroll_down: DebouncedInput<P>,
}

impl<P: InputPin> Buttons<P> {
    pub fn new(left: P, right: P, scroll_up: P, scroll_down: P, debounce: Duration) -> Self {
        Self {
            left: DebouncedInput::new(left, debounce),
            right: DebouncedInput::new(right, debounce),
            scroll_up: DebouncedInput::new(scroll_up, debounce),
            scroll_down: DebouncedInput::new(scroll_down, debounce),
        }
    }

    /// Poll every button once.
    pub fn poll(&mut self, now: Instant) -> Result<(), Error> {
        self.left.poll(now)?;
        self.right.poll(now)?;
        self.scroll_up.poll(now)?;
        self.scroll_down.poll(now)?;
        Ok(())
    }

    pub fn state(&self, id: ButtonId) -> ButtonState {
        match id {
            ButtonId::Left => self.left.state(),
            ButtonId::Right => self.right.state(),
            ButtonId::ScrollUp => self.scroll_up.state(),
            ButtonId::ScrollDown => self.scroll_down.state(),
        }
    }
}
