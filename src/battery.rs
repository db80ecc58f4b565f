//! Battery level estimation and status colour.
//!
//! A 3.7 V LiPo is considered empty at 3.5 V under load. Capacity is read
//! off a fixed discharge table rather than computed, which is close enough
//! for a three-colour indicator and the BLE battery-level icon.

use crate::error::Error;
use crate::led::LedColor;

/// Discharge table as (threshold volts, percent), highest first.
///
/// Ordered once here; lookups walk it top-down and take the first row the
/// voltage reaches.
pub const BATTERY_TABLE: [(f32, u8); 21] = [
    (4.26, 100),
    (4.22, 95),
    (4.19, 90),
    (4.15, 85),
    (4.11, 80),
    (4.07, 75),
    (4.03, 70),
    (4.00, 65),
    (3.96, 60),
    (3.92, 55),
    (3.88, 50),
    (3.84, 45),
    (3.80, 40),
    (3.77, 35),
    (3.73, 30),
    (3.69, 25),
    (3.65, 20),
    (3.61, 15),
    (3.58, 10),
    (3.54, 5),
    (3.50, 0),
];

/// Capacity percent (0..=100) for a battery voltage. Anything under the
/// lowest threshold, including NaN, reads as empty.
pub fn percent_for(volts: f32) -> u8 {
    BATTERY_TABLE
        .iter()
        .find(|(threshold, _)| volts >= *threshold)
        .map_or(0, |(_, percent)| *percent)
}

/// Status colour for a capacity. Charging always shows green.
pub fn color_for(percent: u8, charging: bool) -> LedColor {
    if charging || percent > 79 {
        LedColor::Green
    } else if percent > 19 {
        LedColor::Amber
    } else {
        LedColor::Red
    }
}

/// One sample from the fuel gauge. Used within a single loop iteration,
/// never kept.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    pub voltage: f32,
    pub charging: bool,
}

impl BatteryReading {
    pub fn percent(&self) -> u8 {
        percent_for(self.voltage)
    }

    pub fn color(&self) -> LedColor {
        color_for(self.percent(), self.charging)
    }
}

/// Charger current limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeCurrent {
    #[default]
    Ma50,
    Ma100,
}

impl ChargeCurrent {
    pub const fn milliamps(self) -> u16 {
        match self {
            ChargeCurrent::Ma50 => 50,
            ChargeCurrent::Ma100 => 100,
        }
    }
}

/// Fuel gauge and charge controller.
pub trait BatterySource {
    fn voltage(&mut self) -> Result<f32, Error>;
    fn charging(&mut self) -> Result<bool, Error>;
    fn set_charge_current(&mut self, level: ChargeCurrent) -> Result<(), Error>;

    fn read(&mut self) -> Result<BatteryReading, Error> {
        Ok(BatteryReading {
            voltage: self.voltage()?,
            charging: self.charging()?,
        })
    }
}
