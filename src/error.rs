//! Unified error type for the mouse ring firmware.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! Only faults that make the firmware untrustworthy end up here. Log
//! persistence problems are absorbed by the sink and dropped HID reports
//! are logged, so neither is represented.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // GPIO
    /// A button pin could not be read.
    Input,

    /// An LED or charger control pin could not be driven.
    Output,

    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // Battery
    /// The battery voltage could not be sampled.
    Battery,

    // Configuration
    /// Static configuration failed validation (reason tag).
    Config(&'static str),
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Advertising could not be started.
    AdvertiseFailed,
    /// GATT service registration failed.
    ServiceFailed,
    /// Characteristic value update or notification failed.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
