//! Probe Catalogues
//!
//! Static candidate data for a probe sweep: the device objects to try and
//! the property groups to request from each. The sweep iterates these
//! slices in order, so adding a candidate is a data change only.

use crate::{
    object::ObjectIdentity,
    property::{
        EPC_CHARGE_DISCHARGE_POWER, EPC_CUMULATIVE_POWER, EPC_INSTALLATION_LOCATION,
        EPC_INSTANTANEOUS_POWER, EPC_MANUFACTURER_CODE, EPC_OPERATION_STATUS,
        EPC_POWER_CONSUMPTION,
    },
};

/// A device object worth asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCandidate {
    pub label: &'static str,
    pub identity: ObjectIdentity,
}

/// A set of property codes requested together in one Get
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyGroup {
    pub name: &'static str,
    pub codes: &'static [u8],
}

/// Storage battery class
pub const STORAGE_BATTERY: ObjectIdentity = ObjectIdentity::new(0x02, 0x7D, 0x01);
/// Home solar power generation class
pub const HOME_SOLAR_POWER: ObjectIdentity = ObjectIdentity::new(0x02, 0x79, 0x01);
/// Low-voltage smart electric energy meter class
pub const SMART_ENERGY_METER: ObjectIdentity = ObjectIdentity::new(0x02, 0x88, 0x01);
/// Controller class
pub const CONTROLLER: ObjectIdentity = ObjectIdentity::controller();
/// Temperature sensor class
pub const TEMPERATURE_SENSOR: ObjectIdentity = ObjectIdentity::new(0x00, 0x11, 0x01);

/// Devices tried by the default sweep, in order
pub static DEVICE_CANDIDATES: &[DeviceCandidate] = &[
    DeviceCandidate {
        label: "Storage Battery",
        identity: STORAGE_BATTERY,
    },
    DeviceCandidate {
        label: "Home Solar Power",
        identity: HOME_SOLAR_POWER,
    },
    DeviceCandidate {
        label: "Smart Electric Energy Meter",
        identity: SMART_ENERGY_METER,
    },
    DeviceCandidate {
        label: "Controller",
        identity: CONTROLLER,
    },
    DeviceCandidate {
        label: "Temperature Sensor",
        identity: TEMPERATURE_SENSOR,
    },
];

/// Identity properties every device class implements
pub const BASIC_PROPERTIES: PropertyGroup = PropertyGroup {
    name: "basic",
    codes: &[
        EPC_OPERATION_STATUS,
        EPC_INSTALLATION_LOCATION,
        EPC_MANUFACTURER_CODE,
    ],
};

/// Power consumption properties
pub const POWER_PROPERTIES: PropertyGroup = PropertyGroup {
    name: "power",
    codes: &[EPC_POWER_CONSUMPTION, EPC_CUMULATIVE_POWER],
};

/// Solar generation and battery properties
pub const SOLAR_BATTERY_PROPERTIES: PropertyGroup = PropertyGroup {
    name: "solar/battery",
    codes: &[EPC_INSTANTANEOUS_POWER, EPC_CHARGE_DISCHARGE_POWER],
};

/// Property groups requested from each device, in order
pub static PROPERTY_GROUPS: &[PropertyGroup] = &[
    BASIC_PROPERTIES,
    POWER_PROPERTIES,
    SOLAR_BATTERY_PROPERTIES,
];
