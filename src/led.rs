//! Tri-colour status LED.
//!
//! Three discrete active-low outputs. Colours are fixed combinations of
//! them; amber is red and green together.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedColor {
    #[default]
    Off,
    Green,
    Amber,
    Red,
    Blue,
}

impl LedColor {
    /// Lit channels as (red, green, blue).
    pub const fn channels(self) -> (bool, bool, bool) {
        match self {
            LedColor::Off => (false, false, false),
            LedColor::Green => (false, true, false),
            LedColor::Amber => (true, true, false),
            LedColor::Red => (true, false, false),
            LedColor::Blue => (false, false, true),
        }
    }
}

pub struct StatusLed<P> {
    red: P,
    green: P,
    blue: P,
    current: LedColor,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take the three outputs and switch them all off.
    pub fn new(red: P, green: P, blue: P) -> Result<Self, Error> {
        let mut led = Self {
            red,
            green,
            blue,
            current: LedColor::Off,
        };
        led.all_off()?;
        Ok(led)
    }

    /// Show exactly `color`. Channels that must go dark are cleared before
    /// any new channel is lit, so no extra colour is ever visible.
    pub fn set(&mut self, color: LedColor) -> Result<(), Error> {
        let (r, g, b) = color.channels();
        if !r {
            drive(&mut self.red, false)?;
        }
        if !g {
            drive(&mut self.green, false)?;
        }
        if !b {
            drive(&mut self.blue, false)?;
        }
        if r {
            drive(&mut self.red, true)?;
        }
        if g {
            drive(&mut self.green, true)?;
        }
        if b {
            drive(&mut self.blue, true)?;
        }
        self.current = color;
        Ok(())
    }

    pub fn all_off(&mut self) -> Result<(), Error> {
        self.set(LedColor::Off)
    }

    pub fn current(&self) -> LedColor {
        self.current
    }

    /// Red, green, then blue pulse, `pulse_ms` each with a dark gap before
    /// every pulse. Blocks until done; only used once sleep is committed.
    pub fn farewell_blink<D: DelayNs>(&mut self, delay: &mut D, pulse_ms: u32) -> Result<(), Error> {
        self.all_off()?;
        for color in [LedColor::Red, LedColor::Green, LedColor::Blue] {
            delay.delay_ms(pulse_ms);
            self.set(color)?;
            delay.delay_ms(pulse_ms);
            self.all_off()?;
        }
        Ok(())
    }
}

/// Active-low: lit means driven low.
fn drive<P: OutputPin>(pin: &mut P, lit: bool) -> Result<(), Error> {
    if lit {
        pin.set_low()
    } else {
        pin.set_high()
    }
    .map_err(|_| Error::Output)
}
