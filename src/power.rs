//! Power management - reset diagnostics and System OFF.
//!
//! nRF52840 power modes:
//! - System ON: Normal operation (~3.5 mA with BLE active)
//! - System OFF: Deep sleep, wake on GPIO sense (~0.4 µA)
//!
//! Waking from System OFF is a reset; `RESETREAS.OFF` tells the next boot.

use embassy_nrf::pac;
use embassy_nrf::pac::gpio::vals;
use nrf_softdevice::raw;

use mouse_ring::config::PinId;
use mouse_ring::power_logic::DeepSleep;

/// Read and clear `RESETREAS`. Must run before the SoftDevice is enabled;
/// afterwards POWER belongs to it.
pub fn take_reset_reason() -> u32 {
    let reg = pac::POWER.resetreas();
    let bits = reg.read();
    // Write-one-to-clear, otherwise reasons accumulate across resets.
    reg.write_value(bits);
    bits.0
}

/// System OFF through the SoftDevice.
pub struct SystemOff;

impl DeepSleep for SystemOff {
    fn sleep_until_pin_low(&mut self, wake_pin: PinId) -> ! {
        let port = if wake_pin.port() == 0 { pac::P0 } else { pac::P1 };
        port.pin_cnf(usize::from(wake_pin.pin())).write(|w| {
            w.set_dir(vals::Dir::INPUT);
            w.set_input(vals::Input::CONNECT);
            w.set_pull(vals::Pull::PULLUP);
            w.set_sense(vals::Sense::LOW);
        });

        defmt::info!("System OFF, wake on P{}.{:02}", wake_pin.port(), wake_pin.pin());
        unsafe {
            raw::sd_power_system_off();
        }

        // Only reached under a debugger (emulated System OFF).
        loop {
            cortex_m::asm::wfe();
        }
    }
}
