//! HID output side: what the runtime asks the BLE HID and Battery services
//! to send.

pub mod mouse;

pub use mouse::{MouseButton, MouseReport, MouseState};

/// Mouse HID proxy. Implementations turn each call into one input report.
pub trait MouseSink {
    fn press(&mut self, button: MouseButton);
    fn release(&mut self, button: MouseButton);
    /// Wheel delta, positive scrolls up.
    fn scroll(&mut self, wheel: i8);
}

/// Battery Service level characteristic.
pub trait BatteryLevelSink {
    /// `percent` is 0..=100.
    fn set_level(&mut self, percent: u8);
}
