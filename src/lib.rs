#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod catalog;
#[cfg(feature = "std")]
pub mod client;
pub mod encoding;
pub mod object;
pub mod property;
#[cfg(feature = "std")]
pub mod transport;
pub mod util;

// Re-export main types without glob imports to avoid conflicts
pub use encoding::{EncodingError, Frame, Property, ServiceCode};
pub use object::ObjectIdentity;
pub use property::{format_property_value, PropertyValue};

#[cfg(feature = "std")]
pub use client::{probe_host, ProbeConfig, ProbeReport, Prober, Reading};

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// ECHONET Lite UDP port
pub const ECHONET_LITE_PORT: u16 = 3610;
