//! ECHONET Lite Property Value Decoders
//!
//! This module turns raw property data (EDT) into readable values based on
//! the property code (EPC). Only the handful of codes the prober asks for
//! are interpreted; anything else is shown as a raw hex dump.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

use crate::util::{be_signed_decimal, be_unsigned_decimal, to_hex};

/// Operation status
pub const EPC_OPERATION_STATUS: u8 = 0x80;
/// Installation location
pub const EPC_INSTALLATION_LOCATION: u8 = 0x81;
/// Instantaneous power consumption
pub const EPC_POWER_CONSUMPTION: u8 = 0x84;
/// Cumulative power consumption
pub const EPC_CUMULATIVE_POWER: u8 = 0x85;
/// Manufacturer code
pub const EPC_MANUFACTURER_CODE: u8 = 0x8A;
/// Instantaneous charging/discharging power (storage battery)
pub const EPC_CHARGE_DISCHARGE_POWER: u8 = 0xD3;
/// Instantaneous charging/discharging current (storage battery)
pub const EPC_CHARGE_DISCHARGE_CURRENT: u8 = 0xD4;
/// Instantaneous power generation (solar)
pub const EPC_INSTANTANEOUS_POWER: u8 = 0xE0;
/// Cumulative power generation (solar)
pub const EPC_CUMULATIVE_GENERATION: u8 = 0xE1;
/// Instantaneous electric energy (smart meter)
pub const EPC_INSTANTANEOUS_ENERGY: u8 = 0xE7;
/// Cumulative electric energy (smart meter)
pub const EPC_CUMULATIVE_ENERGY: u8 = 0xE8;
/// Measured electric power
pub const EPC_MEASURED_POWER: u8 = 0xEA;
/// Cumulative electric energy measurement value
pub const EPC_CUMULATIVE_MEASUREMENT: u8 = 0xEB;

/// Operation status EDT meaning "ON"
pub const OPERATION_STATUS_ON: u8 = 0x30;

/// Errors raised while interpreting a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The property needs at least one byte but none were supplied
    EmptyPayload(u8),
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::EmptyPayload(code) => {
                write!(f, "empty payload for EPC 0x{:02X}", code)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PropertyError {}

/// Decoded property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Operation status, `true` when ON
    Status(bool),
    /// Manufacturer code bytes
    Manufacturer(String),
    /// Unsigned measurement in decimal, with unit suffix.
    ///
    /// Kept as digits since the payload may be wider than any native integer.
    Unsigned { value: String, unit: &'static str },
    /// Battery power in decimal watts
    ChargeDischarge { discharging: bool, watts: String },
    /// Unknown code or payload too short for the expected width
    Raw(String),
}

impl PropertyValue {
    /// Get the value as a display string
    pub fn as_display_string(&self) -> String {
        match self {
            PropertyValue::Status(true) => "ON".into(),
            PropertyValue::Status(false) => "OFF".into(),
            PropertyValue::Manufacturer(code) => format!("Manufacturer: {}", code),
            PropertyValue::Unsigned { value, unit } => format!("{} {}", value, unit),
            PropertyValue::ChargeDischarge {
                discharging: false,
                watts,
            } => format!("Charging: {} W", watts),
            PropertyValue::ChargeDischarge {
                discharging: true,
                watts,
            } => format!("Discharging: {} W", watts),
            PropertyValue::Raw(hex) => format!("Raw: {}", hex),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display_string())
    }
}

/// Decode a payload according to its property code
pub fn decode_property(code: u8, payload: &[u8]) -> Result<PropertyValue, PropertyError> {
    let value = match code {
        EPC_OPERATION_STATUS => {
            let first = payload
                .first()
                .ok_or(PropertyError::EmptyPayload(code))?;
            PropertyValue::Status(*first == OPERATION_STATUS_ON)
        }
        EPC_MANUFACTURER_CODE => PropertyValue::Manufacturer(to_hex(payload)),
        EPC_POWER_CONSUMPTION | EPC_INSTANTANEOUS_POWER if payload.len() >= 2 => {
            PropertyValue::Unsigned {
                value: be_unsigned_decimal(payload),
                unit: "W",
            }
        }
        EPC_CUMULATIVE_POWER if payload.len() >= 4 => PropertyValue::Unsigned {
            value: be_unsigned_decimal(payload),
            unit: "kWh",
        },
        EPC_CHARGE_DISCHARGE_POWER if payload.len() >= 2 => match be_signed_decimal(payload) {
            Some((discharging, watts)) => PropertyValue::ChargeDischarge { discharging, watts },
            None => PropertyValue::Raw(to_hex(payload)),
        },
        _ => PropertyValue::Raw(to_hex(payload)),
    };
    Ok(value)
}

/// Format a property value for display.
///
/// Never fails: interpretation errors are rendered as `Error formatting: ...`.
pub fn format_property_value(code: u8, payload: &[u8]) -> String {
    match decode_property(code, payload) {
        Ok(value) => value.as_display_string(),
        Err(e) => format!("Error formatting: {}", e),
    }
}

/// Human-readable name of a property code, if known
pub fn describe(code: u8) -> Option<&'static str> {
    let name = match code {
        EPC_OPERATION_STATUS => "Operation status",
        EPC_INSTALLATION_LOCATION => "Installation location",
        EPC_POWER_CONSUMPTION => "Instantaneous power consumption",
        EPC_CUMULATIVE_POWER => "Cumulative power consumption",
        EPC_MANUFACTURER_CODE => "Manufacturer code",
        EPC_CHARGE_DISCHARGE_POWER => "Instantaneous charging/discharging power",
        EPC_CHARGE_DISCHARGE_CURRENT => "Instantaneous charging/discharging current",
        EPC_INSTANTANEOUS_POWER => "Instantaneous power generation",
        EPC_CUMULATIVE_GENERATION => "Cumulative power generation",
        EPC_INSTANTANEOUS_ENERGY => "Instantaneous electric energy",
        EPC_CUMULATIVE_ENERGY => "Cumulative electric energy",
        EPC_MEASURED_POWER => "Measured electric power",
        EPC_CUMULATIVE_MEASUREMENT => "Cumulative electric energy measurement value",
        _ => return None,
    };
    Some(name)
}

/// Label used for a property in reports, e.g. `EPC 0x80 (Operation status)`
pub fn property_label(code: u8) -> String {
    match describe(code) {
        Some(name) => format!("EPC 0x{:02X} ({})", code, name),
        None => format!("EPC 0x{:02X}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status() {
        assert_eq!(format_property_value(0x80, &[0x30]), "ON");
        assert_eq!(format_property_value(0x80, &[0x31]), "OFF");
        assert_eq!(format_property_value(0x80, &[0x30, 0x00]), "ON");
    }

    #[test]
    fn test_operation_status_empty_payload() {
        assert_eq!(
            format_property_value(0x80, &[]),
            "Error formatting: empty payload for EPC 0x80"
        );
    }

    #[test]
    fn test_charge_discharge() {
        assert_eq!(format_property_value(0xD3, &[0x00, 0x0A]), "Charging: 10 W");
        assert_eq!(format_property_value(0xD3, &[0xFF, 0xF6]), "Discharging: 10 W");
        assert_eq!(format_property_value(0xD3, &[0x00, 0x00]), "Charging: 0 W");
        assert_eq!(
            format_property_value(0xD3, &[0xFF, 0xFF, 0xFC, 0x18]),
            "Discharging: 1000 W"
        );
        assert_eq!(
            format_property_value(0xD3, &[0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
            "Discharging: 9223372036854775808 W"
        );
    }

    #[test]
    fn test_power_values() {
        assert_eq!(format_property_value(0x84, &[0x00, 0x96]), "150 W");
        assert_eq!(format_property_value(0xE0, &[0x01, 0x00]), "256 W");
        assert_eq!(
            format_property_value(0x85, &[0x00, 0x00, 0x30, 0x39]),
            "12345 kWh"
        );
    }

    #[test]
    fn test_short_payload_falls_back_to_raw() {
        assert_eq!(format_property_value(0x84, &[0x7F]), "Raw: 7f");
        assert_eq!(format_property_value(0x85, &[0x00, 0x01]), "Raw: 0001");
        assert_eq!(format_property_value(0xD3, &[0xFF]), "Raw: ff");
    }

    #[test]
    fn test_payloads_wider_than_eight_bytes() {
        let mut power = vec![0x00; 8];
        power.push(0x96);
        assert_eq!(format_property_value(0x84, &power), "150 W");
        assert_eq!(format_property_value(0xE0, &power), "150 W");
        assert_eq!(format_property_value(0x85, &power), "150 kWh");

        let mut discharge = vec![0xFF; 8];
        discharge.push(0xF6);
        assert_eq!(format_property_value(0xD3, &discharge), "Discharging: 10 W");

        // 2^72, too wide for u64
        let mut huge = vec![0x01];
        huge.extend_from_slice(&[0x00; 9]);
        assert_eq!(
            format_property_value(0x84, &huge),
            "4722366482869645213696 W"
        );
        assert!(!format_property_value(0x85, &[0xAB; 32]).starts_with("Error"));
    }

    #[test]
    fn test_manufacturer_and_unknown() {
        assert_eq!(
            format_property_value(0x8A, &[0x00, 0x00, 0x69]),
            "Manufacturer: 000069"
        );
        let raw = format_property_value(0xFF, &[0xAB, 0xCD]);
        assert!(raw.contains("abcd"));
        assert_eq!(raw, "Raw: abcd");
        assert_eq!(format_property_value(0x81, &[]), "Raw: ");
    }

    #[test]
    fn test_decode_typed() {
        assert_eq!(
            decode_property(0xE0, &[0x00, 0x96]),
            Ok(PropertyValue::Unsigned {
                value: "150".into(),
                unit: "W"
            })
        );
        assert_eq!(
            decode_property(0xD3, &[0xFF, 0xF6]),
            Ok(PropertyValue::ChargeDischarge {
                discharging: true,
                watts: "10".into()
            })
        );
        assert_eq!(
            decode_property(0x80, &[]),
            Err(PropertyError::EmptyPayload(0x80))
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(property_label(0x80), "EPC 0x80 (Operation status)");
        assert_eq!(property_label(0xF0), "EPC 0xF0");
        assert_eq!(describe(0xEB), Some("Cumulative electric energy measurement value"));
    }
}
