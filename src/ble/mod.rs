//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Services** - HID over GATT (mouse), Battery and Device Information.
//! 2. **Advertising** - connectable, "Just Works" bondable, started when
//!    the runtime asks for it and stopped by the SoftDevice on connect.
//! 3. **Adapters** - the synchronous session, mouse and battery-level
//!    collaborators the runtime polls, backed by shared statics.
//!
//! The BLE task owns the async side; the runtime task only ever reads the
//! current connection and signals for advertising.

pub mod security;
pub mod services;

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
    ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use mouse_ring::config::{APPEARANCE_MOUSE, HAND};
use mouse_ring::connection::BleSession;
use mouse_ring::hid::mouse::MOUSE_REPORT_SIZE;
use mouse_ring::hid::{BatteryLevelSink, MouseButton, MouseSink, MouseState};
use mouse_ring::Error;

pub use services::Server;

/// The link to the host, if any.
static CONNECTION: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

/// Raised by the runtime to (re)start advertising.
static ADVERTISE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

const APPEARANCE: [u8; 2] = APPEARANCE_MOUSE.to_le_bytes();

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Incomplete,
        &[ServiceUuid16::HUMAN_INTERFACE_DEVICE, ServiceUuid16::BATTERY],
    )
    .raw(AdvertisementDataType::APPEARANCE, &APPEARANCE)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(HAND.name())
    .build();

fn current_connection() -> Option<Connection> {
    CONNECTION.lock(|c| c.borrow().clone())
}

pub fn softdevice_config() -> nrf_softdevice::Config {
    let name = HAND.name();
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: name.as_ptr() as _,
            current_len: name.len() as u16,
            max_len: name.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise on request, then serve GATT until the host goes away.
#[embassy_executor::task]
pub async fn ble_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    let bonder = security::bonder();
    loop {
        ADVERTISE.wait().await;

        let config = peripheral::Config::default();
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_pairable(sd, adv, &config, bonder).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertising failed: {:?}", e);
                Timer::after_millis(250).await;
                ADVERTISE.signal(());
                continue;
            }
        };

        info!("host connected: {}", conn.peer_address());
        CONNECTION.lock(|c| *c.borrow_mut() = Some(conn.clone()));
        let e = gatt_server::run(&conn, server, |_| {}).await;
        CONNECTION.lock(|c| *c.borrow_mut() = None);
        info!("gatt_server run exited: {:?}", e);
    }
}

/// Connection state as the runtime sees it.
pub struct SoftdeviceSession;

impl BleSession for SoftdeviceSession {
    fn start_advertising(&mut self) -> Result<(), Error> {
        ADVERTISE.signal(());
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), Error> {
        // The SoftDevice stops advertising itself once a central connects.
        ADVERTISE.reset();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        CONNECTION.lock(|c| c.borrow().is_some())
    }

    fn connection_count(&self) -> usize {
        usize::from(self.is_connected())
    }
}

/// Mouse input reports over the HID service.
pub struct HidMouse {
    server: &'static Server,
    state: MouseState,
}

impl HidMouse {
    pub fn new(server: &'static Server) -> Self {
        Self {
            server,
            state: MouseState::new(),
        }
    }

    fn send(&mut self, report: [u8; MOUSE_REPORT_SIZE]) {
        let Some(conn) = current_connection() else {
            // Link gone; the host forgets held buttons with it.
            self.state.clear();
            return;
        };
        if let Err(e) = self.server.hid.send_report(&conn, &report) {
            warn!("HID report dropped: {:?}", e);
        }
    }
}

impl MouseSink for HidMouse {
    fn press(&mut self, button: MouseButton) {
        let report = self.state.press(button);
        self.send(report.to_bytes());
    }

    fn release(&mut self, button: MouseButton) {
        let report = self.state.release(button);
        self.send(report.to_bytes());
    }

    fn scroll(&mut self, wheel: i8) {
        let report = self.state.scroll(wheel);
        self.send(report.to_bytes());
    }
}

/// Battery Service level: stored for reads, notified when connected.
pub struct BatteryLevel {
    sd: &'static Softdevice,
    server: &'static Server,
}

impl BatteryLevel {
    pub fn new(sd: &'static Softdevice, server: &'static Server) -> Self {
        Self { sd, server }
    }
}

impl BatteryLevelSink for BatteryLevel {
    fn set_level(&mut self, percent: u8) {
        if let Err(e) = self.server.battery.level_set(self.sd, percent) {
            warn!("battery level not stored: {:?}", e);
        }
        if let Some(conn) = current_connection() {
            // Fails harmlessly when the host has not subscribed.
            let _ = self.server.battery.level_notify(&conn, percent);
        }
    }
}
