//! Battery voltage and charger control on the XIAO nRF52840.
//!
//! VBAT reaches AIN7 (P0.31) through a 1 MΩ / 510 kΩ divider that only
//! conducts while P0.14 is driven low. The BQ25101 charger pulls P0.17 low
//! while charging; P0.13 low selects 100 mA instead of 50 mA.
//!
//! The SAADC is async, the runtime is not, so a task samples periodically
//! and publishes millivolts through an atomic.

use core::sync::atomic::{AtomicU32, Ordering};

use defmt::debug;
use embassy_nrf::gpio::{Input, Output};
use embassy_nrf::peripherals::{P0_31, SAADC};
use embassy_nrf::saadc::{self, ChannelConfig, Saadc};
use embassy_nrf::{bind_interrupts, Peripheral};
use embassy_time::{Duration, Timer};

use mouse_ring::battery::{BatterySource, ChargeCurrent};
use mouse_ring::Error;

bind_interrupts!(pub struct Irqs {
    SAADC => saadc::InterruptHandler;
});

const SAMPLE_PERIOD: Duration = Duration::from_secs(10);

/// 0.6 V reference with 1/6 gain: 3.6 V full scale at 12 bits.
const FULL_SCALE_MV: u32 = 3600;
const RESOLUTION: u32 = 4096;

const DIVIDER_TOP_KOHM: u32 = 1000;
const DIVIDER_BOTTOM_KOHM: u32 = 510;

/// Latest VBAT in millivolts, 0 until the first sample.
static VBAT_MV: AtomicU32 = AtomicU32::new(0);

pub fn saadc(
    saadc: impl Peripheral<P = SAADC> + 'static,
    vbat: impl Peripheral<P = P0_31> + 'static,
) -> Saadc<'static, 1> {
    // Defaults: internal 0.6 V reference, gain 1/6, 12-bit.
    Saadc::new(
        saadc,
        Irqs,
        saadc::Config::default(),
        [ChannelConfig::single_ended(vbat)],
    )
}

/// Battery voltage for a raw 12-bit sample taken behind the divider.
fn vbat_millivolts(raw: i16) -> u32 {
    let raw = u32::try_from(raw.max(0)).unwrap_or(0);
    let pin_mv = raw * FULL_SCALE_MV / RESOLUTION;
    pin_mv * (DIVIDER_TOP_KOHM + DIVIDER_BOTTOM_KOHM) / DIVIDER_BOTTOM_KOHM
}

/// Take one sample and publish it.
pub async fn sample(adc: &mut Saadc<'static, 1>) {
    let mut buf = [0i16; 1];
    adc.sample(&mut buf).await;
    let mv = vbat_millivolts(buf[0]);
    VBAT_MV.store(mv, Ordering::Relaxed);
    debug!("VBAT raw={} {}mV", buf[0], mv);
}

#[embassy_executor::task]
pub async fn battery_task(mut adc: Saadc<'static, 1>, _divider: Output<'static>) -> ! {
    loop {
        Timer::after(SAMPLE_PERIOD).await;
        sample(&mut adc).await;
    }
}

/// Synchronous view of the charger for the runtime.
pub struct XiaoBattery {
    charging: Input<'static>,
    current: Output<'static>,
}

impl XiaoBattery {
    pub fn new(charging: Input<'static>, current: Output<'static>) -> Self {
        Self { charging, current }
    }
}

impl BatterySource for XiaoBattery {
    fn voltage(&mut self) -> Result<f32, Error> {
        match VBAT_MV.load(Ordering::Relaxed) {
            0 => Err(Error::Battery),
            mv => Ok(mv as f32 / 1000.0),
        }
    }

    fn charging(&mut self) -> Result<bool, Error> {
        Ok(self.charging.is_low())
    }

    fn set_charge_current(&mut self, level: ChargeCurrent) -> Result<(), Error> {
        match level {
            ChargeCurrent::Ma50 => self.current.set_high(),
            ChargeCurrent::Ma100 => self.current.set_low(),
        }
        Ok(())
    }
}
