//! Mouse ring firmware for the Seeed XIAO nRF52840.
//!
//! Four buttons become BLE HID left/right clicks and wheel ticks. A
//! tri-colour LED shows battery state and link status, and the ring powers
//! itself off after ten idle minutes or a five-second long press.
//!
//! Tasks:
//! - `softdevice_task` - SoftDevice event pump
//! - `ble_task` - advertising and the GATT server
//! - `battery_task` - periodic VBAT sampling
//! - `runtime_task` - the 1 ms poll loop (buttons, LED, sleep policy)
//!
//! Build: `cargo build --release --features embedded`
//! (add `right-hand` for the right-hand ring).

#![no_std]
#![no_main]

mod battery_monitor;
mod ble;
mod board;
mod power;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_time::{Delay, Duration, Ticker};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mouse_ring::config::{Config, POLL_PERIOD_MS, SOFTWARE_REVISION};
use mouse_ring::diagnostics::ResetCause;
use mouse_ring::{BoardParts, Runtime, Step};

use crate::battery_monitor::XiaoBattery;
use crate::ble::{BatteryLevel, HidMouse, Server, SoftdeviceSession};
use crate::board::{DefmtSink, EmbassyClock, Xiao};
use crate::power::SystemOff;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(embassy_config());
    let reset = ResetCause::from_resetreas(power::take_reset_reason());

    let config = Config::default();
    info!("{} v{} ({})", config.name.as_str(), SOFTWARE_REVISION, reset);

    let sd = Softdevice::enable(&ble::softdevice_config());
    static SERVER: StaticCell<Server> = StaticCell::new();
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(ble::softdevice_task(sd)));

    interrupt::SAADC.set_priority(Priority::P3);
    let mut adc = battery_monitor::saadc(p.SAADC, p.P0_31);
    let divider = Output::new(p.P0_14, Level::Low, OutputDrive::Standard);
    adc.calibrate().await;
    // The runtime reports the battery on its first iteration.
    battery_monitor::sample(&mut adc).await;
    unwrap!(spawner.spawn(battery_monitor::battery_task(adc, divider)));

    let battery = XiaoBattery::new(
        Input::new(p.P0_17, Pull::Up),
        Output::new(p.P0_13, Level::High, OutputDrive::Standard),
    );

    let parts = BoardParts::<Xiao> {
        left: board::button(config.pins.left),
        right: board::button(config.pins.right),
        scroll_up: board::button(config.pins.scroll_up),
        scroll_down: board::button(config.pins.scroll_down),
        red: board::led(config.leds.red),
        green: board::led(config.leds.green),
        blue: board::led(config.leds.blue),
        clock: EmbassyClock,
        delay: Delay,
        battery,
        ble: SoftdeviceSession,
        mouse: HidMouse::new(server),
        level: BatteryLevel::new(sd, server),
        sleep: SystemOff,
        log: DefmtSink,
    };

    let mut runtime = unwrap!(Runtime::new(config, parts));
    unwrap!(runtime.start(reset));

    unwrap!(spawner.spawn(ble::ble_task(sd, server)));
    unwrap!(spawner.spawn(runtime_task(runtime)));
}

#[embassy_executor::task]
async fn runtime_task(mut runtime: Runtime<Xiao>) -> ! {
    // The CPU idles between iterations; LED cadence ticks run at this rate.
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    loop {
        match runtime.poll() {
            Ok(Step::Continue) => ticker.next().await,
            Ok(Step::Sleep(reason)) => runtime.enter_sleep(reason),
            Err(e) => defmt::panic!("runtime fault: {}", e),
        }
    }
}

// 0 is Highest. Lower prio number can preempt higher prio number
// Softdevice has reserved priorities 0, 1 and 4
fn embassy_config() -> embassy_nrf::config::Config {
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    config
}
