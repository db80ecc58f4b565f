//! GATT services: HID over GATT (mouse), Battery, Device Information.

use defmt::{debug, info};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

use mouse_ring::config::{MANUFACTURER, SOFTWARE_REVISION};
use mouse_ring::hid::mouse::{MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_SIZE};

const HID_SERVICE: Uuid = Uuid::new_16(0x1812);
const HID_INFO: Uuid = Uuid::new_16(0x2a4a);
const REPORT_MAP: Uuid = Uuid::new_16(0x2a4b);
const HID_CONTROL_POINT: Uuid = Uuid::new_16(0x2a4c);
const HID_REPORT: Uuid = Uuid::new_16(0x2a4d);
const PROTOCOL_MODE: Uuid = Uuid::new_16(0x2a4e);
const HID_REPORT_REF: Uuid = Uuid::new_16(0x2908);

const BATTERY_SERVICE: Uuid = Uuid::new_16(0x180f);
const BATTERY_LEVEL: Uuid = Uuid::new_16(0x2a19);

const DEVICE_INFO_SERVICE: Uuid = Uuid::new_16(0x180a);
const MANUFACTURER_NAME: Uuid = Uuid::new_16(0x2a29);
const SOFTWARE_REVISION_STRING: Uuid = Uuid::new_16(0x2a28);

/// bcdHID 1.11, no country code, normally connectable.
const HID_INFO_VALUE: [u8; 4] = [0x11, 0x01, 0x00, 0x02];
/// Report ID 0 (descriptor has none), input report.
const MOUSE_REPORT_REF: [u8; 2] = [0x00, 0x01];

pub struct HidService {
    input_report: u16,
    input_report_cccd: u16,
    protocol_mode: u16,
    control_point: u16,
}

impl HidService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, HID_SERVICE)?;

        service
            .add_characteristic(
                HID_INFO,
                Attribute::new(HID_INFO_VALUE).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        service
            .add_characteristic(
                REPORT_MAP,
                Attribute::new(MOUSE_REPORT_DESCRIPTOR).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        let control_point = service
            .add_characteristic(
                HID_CONTROL_POINT,
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = service
            .add_characteristic(
                PROTOCOL_MODE,
                Attribute::new([1u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let mut report = service.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8; MOUSE_REPORT_SIZE]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        report.add_descriptor(
            HID_REPORT_REF,
            Attribute::new(MOUSE_REPORT_REF).security(SecurityMode::JustWorks),
        )?;
        let report = report.build();

        let _service = service.build();

        Ok(Self {
            input_report: report.value_handle,
            input_report_cccd: report.cccd_handle,
            protocol_mode: protocol_mode.value_handle,
            control_point: control_point.value_handle,
        })
    }

    pub fn send_report(
        &self,
        conn: &Connection,
        report: &[u8; MOUSE_REPORT_SIZE],
    ) -> Result<(), gatt_server::NotifyValueError> {
        gatt_server::notify_value(conn, self.input_report, report)
    }

    fn on_write(&self, handle: u16, data: &[u8]) {
        let Some(&value) = data.first() else {
            return;
        };
        if handle == self.input_report_cccd {
            info!("HID input notifications: {}", value & 0x01 != 0);
        } else if handle == self.protocol_mode {
            debug!("HID protocol mode: {}", value);
        } else if handle == self.control_point {
            debug!("HID control point: {}", value);
        }
    }
}

pub struct BatteryService {
    level: u16,
    level_cccd: u16,
}

impl BatteryService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, BATTERY_SERVICE)?;
        let level = service
            .add_characteristic(
                BATTERY_LEVEL,
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().notify()),
            )?
            .build();
        let _service = service.build();

        Ok(Self {
            level: level.value_handle,
            level_cccd: level.cccd_handle,
        })
    }

    pub fn level_set(&self, sd: &Softdevice, percent: u8) -> Result<(), gatt_server::SetValueError> {
        gatt_server::set_value(sd, self.level, &[percent])
    }

    pub fn level_notify(&self, conn: &Connection, percent: u8) -> Result<(), gatt_server::NotifyValueError> {
        gatt_server::notify_value(conn, self.level, &[percent])
    }

    fn on_write(&self, handle: u16, data: &[u8]) {
        if handle == self.level_cccd {
            if let Some(&value) = data.first() {
                info!("battery notifications: {}", value & 0x01 != 0);
            }
        }
    }
}

/// Read-only identification strings.
pub struct DeviceInfoService;

impl DeviceInfoService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, DEVICE_INFO_SERVICE)?;
        for (uuid, value) in [
            (MANUFACTURER_NAME, MANUFACTURER),
            (SOFTWARE_REVISION_STRING, SOFTWARE_REVISION),
        ] {
            service
                .add_characteristic(
                    uuid,
                    Attribute::new(value.as_bytes()).security(SecurityMode::JustWorks),
                    Metadata::new(Properties::new().read()),
                )?
                .build();
        }
        let _service = service.build();
        Ok(Self)
    }
}

pub struct Server {
    pub hid: HidService,
    pub battery: BatteryService,
    _device_info: DeviceInfoService,
}

impl Server {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        Ok(Self {
            _device_info: DeviceInfoService::new(sd)?,
            battery: BatteryService::new(sd)?,
            hid: HidService::new(sd)?,
        })
    }
}

impl gatt_server::Server for Server {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        self.hid.on_write(handle, data);
        self.battery.on_write(handle, data);
        None
    }
}
