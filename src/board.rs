//! XIAO nRF52840 bindings for the runtime's collaborator traits.

use core::fmt;

use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull};
use embassy_time::Delay;

use mouse_ring::config::PinId;
use mouse_ring::logging::{LogLevel, LogSink};
use mouse_ring::timer::{Clock, Instant};
use mouse_ring::Board;

use crate::battery_monitor::XiaoBattery;
use crate::ble::{BatteryLevel, HidMouse, SoftdeviceSession};
use crate::power::SystemOff;

pub struct Xiao;

impl Board for Xiao {
    type Input = Input<'static>;
    type Output = Output<'static>;
    type Clock = EmbassyClock;
    type Delay = Delay;
    type Battery = XiaoBattery;
    type Ble = SoftdeviceSession;
    type Mouse = HidMouse;
    type Level = BatteryLevel;
    type Sleep = SystemOff;
    type Log = DefmtSink;
}

/// RTC1-backed uptime from the Embassy time driver.
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::from_micros(embassy_time::Instant::now().as_micros())
    }
}

/// Forwards runtime log records to defmt (RTT).
pub struct DefmtSink;

impl LogSink for DefmtSink {
    fn write(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        let msg = defmt::Display2Format(&args);
        match level {
            LogLevel::Debug => defmt::debug!("{}", msg),
            LogLevel::Info => defmt::info!("{}", msg),
            LogLevel::Warn => defmt::warn!("{}", msg),
            LogLevel::Error => defmt::error!("{}", msg),
        }
    }
}

/// Button input with internal pull-up (buttons short to ground).
pub fn button(id: PinId) -> Input<'static> {
    // SAFETY: each configured pin is claimed exactly once at startup and
    // never taken from `Peripherals` elsewhere.
    let pin = unsafe { AnyPin::steal(id.0) };
    Input::new(pin, Pull::Up)
}

/// LED channel, starting dark (active-low).
pub fn led(id: PinId) -> Output<'static> {
    // SAFETY: see `button`.
    let pin = unsafe { AnyPin::steal(id.0) };
    Output::new(pin, Level::High, OutputDrive::Standard)
}
