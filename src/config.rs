//! Application-wide constants and startup configuration.
//!
//! All hardware pin assignments, timing parameters, and thresholds live
//! here so they can be tuned in one place. The [`Config`] value is built
//! once at startup from these defaults and the selected [`Hand`] profile;
//! nothing reconfigures it afterwards.

use core::time::Duration;

use heapless::String;

use crate::battery::ChargeCurrent;
use crate::error::Error;
use crate::logging::LogLevel;

// Timing

/// Button debounce time (ms).
pub const DEBOUNCE_MS: u64 = 150;

/// Period of the firmware's poll loop (ms). One loop iteration is one
/// LED cadence tick.
pub const POLL_PERIOD_MS: u64 = 1;

/// Main-loop ticks between battery colour refreshes (5 s at the poll
/// period above). The radio heartbeat (blue flash) fires at twice this
/// count.
pub const BLINK_INTERVAL_TICKS: u32 = 5_000;

/// How long a status flash stays lit (ms).
pub const LED_FLASH_MS: u64 = 100;

/// Blue LED toggle period while advertising (ms). One full on/off cycle
/// takes two periods, so the indicator runs at ~0.5 Hz.
pub const ADVERTISING_BLINK_MS: u64 = 1000;

/// Length of each pulse of the pre-sleep farewell sequence (ms).
pub const FAREWELL_PULSE_MS: u32 = 200;

// Power

/// Inactivity before deep sleep (seconds).
pub const IDLE_TIMEOUT_SECS: u64 = 600;

/// Hold time of the sleep gesture (seconds).
pub const LONG_PRESS_SECS: u64 = 5;

// Scroll acceleration (seconds between wheel ticks)

pub const SCROLL_INITIAL: f32 = 0.2;
pub const SCROLL_ACCEL: f32 = 0.015;
pub const SCROLL_FLOOR: f32 = 0.01;

// BLE

/// GAP appearance: generic HID mouse.
pub const APPEARANCE_MOUSE: u16 = 961;

/// Device Information service strings.
pub const MANUFACTURER: &str = "mouse-ring";
pub const SOFTWARE_REVISION: &str = env!("CARGO_PKG_VERSION");

// GPIO pin assignments (Seeed XIAO nRF52840)
//
//   Red LED    → P0.26    Green LED → P0.30    Blue LED → P0.06
//   D1 → P0.03   D2 → P0.28   D3 → P0.29   D5 → P0.05
//   D6 → P1.11   D7 → P1.12   D8 → P1.13   D9 → P1.14   D10 → P1.15

/// A GPIO identified by `port * 32 + pin`, the numbering
/// `embassy_nrf::gpio::AnyPin::steal` expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub u8);

impl PinId {
    pub const fn p0(pin: u8) -> Self {
        Self(pin)
    }

    pub const fn p1(pin: u8) -> Self {
        Self(32 + pin)
    }

    pub const fn port(self) -> u8 {
        self.0 / 32
    }

    pub const fn pin(self) -> u8 {
        self.0 % 32
    }
}

/// Button wiring of one ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    pub left: PinId,
    pub right: PinId,
    pub scroll_up: PinId,
    pub scroll_down: PinId,
    /// Wake source for deep sleep (active-low).
    pub power: PinId,
}

impl PinMap {
    fn buttons(&self) -> [PinId; 4] {
        [self.left, self.right, self.scroll_up, self.scroll_down]
    }
}

/// On-board tri-colour LED (active-low).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPins {
    pub red: PinId,
    pub green: PinId,
    pub blue: PinId,
}

pub const LED_PINS: LedPins = LedPins {
    red: PinId::p0(26),
    green: PinId::p0(30),
    blue: PinId::p0(6),
};

/// Which hand the ring is built for. The two rings differ only in wiring
/// and advertised name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const fn name(self) -> &'static str {
        match self {
            Hand::Left => "Left Mouse Ring",
            Hand::Right => "Right Mouse Ring",
        }
    }

    pub const fn pins(self) -> PinMap {
        match self {
            // D10 / D8 / D7 / D9, wake on D6
            Hand::Left => PinMap {
                left: PinId::p1(15),
                right: PinId::p1(13),
                scroll_up: PinId::p1(12),
                scroll_down: PinId::p1(14),
                power: PinId::p1(11),
            },
            // D3 / D5 / D2 / D1, wake on D6
            Hand::Right => PinMap {
                left: PinId::p0(29),
                right: PinId::p0(5),
                scroll_up: PinId::p0(28),
                scroll_down: PinId::p0(3),
                power: PinId::p1(11),
            },
        }
    }
}

/// Hand selected at build time.
#[cfg(feature = "right-hand")]
pub const HAND: Hand = Hand::Right;
#[cfg(not(feature = "right-hand"))]
pub const HAND: Hand = Hand::Left;

/// Resolved per-device configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub name: String<32>,
    pub pins: PinMap,
    pub leds: LedPins,
    pub charge_current: ChargeCurrent,
    pub log_level: LogLevel,
    pub blink_interval: u32,
    pub led_flash: Duration,
    pub advertising_blink: Duration,
    pub farewell_pulse_ms: u32,
    pub debounce: Duration,
    pub idle_timeout: Duration,
    pub push_time: Duration,
    /// Allow the long-press gesture to put the ring to sleep.
    pub deep_sleep_by_click: bool,
    pub sp_initial: f32,
    pub sp_accel: f32,
    pub sp_max: f32,
}

impl Config {
    pub fn for_hand(hand: Hand) -> Self {
        let mut name = String::new();
        // Both profile names fit in 32 bytes.
        let _ = name.push_str(hand.name());
        Self {
            name,
            pins: hand.pins(),
            leds: LED_PINS,
            charge_current: ChargeCurrent::Ma50,
            log_level: LogLevel::Info,
            blink_interval: BLINK_INTERVAL_TICKS,
            led_flash: Duration::from_millis(LED_FLASH_MS),
            advertising_blink: Duration::from_millis(ADVERTISING_BLINK_MS),
            farewell_pulse_ms: FAREWELL_PULSE_MS,
            debounce: Duration::from_millis(DEBOUNCE_MS),
            idle_timeout: Duration::from_secs(IDLE_TIMEOUT_SECS),
            push_time: Duration::from_secs(LONG_PRESS_SECS),
            deep_sleep_by_click: true,
            sp_initial: SCROLL_INITIAL,
            sp_accel: SCROLL_ACCEL,
            sp_max: SCROLL_FLOOR,
        }
    }

    /// Reject values the runtime cannot honour.
    pub fn validate(&self) -> Result<(), Error> {
        if self.debounce.is_zero() {
            return Err(Error::Config("debounce must be non-zero"));
        }
        if self.blink_interval == 0 {
            return Err(Error::Config("blink interval must be non-zero"));
        }
        if !(self.sp_accel > 0.0) {
            return Err(Error::Config("scroll acceleration must be positive"));
        }
        if !(self.sp_max > 0.0 && self.sp_max <= self.sp_initial) {
            return Err(Error::Config("scroll floor must be in (0, initial]"));
        }
        let buttons = self.pins.buttons();
        for (i, a) in buttons.iter().enumerate() {
            if buttons[i + 1..].contains(a) {
                return Err(Error::Config("duplicate button pin"));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_hand(HAND)
    }
}
