//! ECHONET Lite Object Identities
//!
//! Every logical endpoint on an ECHONET Lite node is addressed by a 3-byte
//! object identity (EOJ): class group code, class code and instance number.
//! A storage battery is `02 7D 01`, a smart electric energy meter `02 88 01`,
//! a controller `05 FF 01`, and so on.
//!
//! # Example
//!
//! ```
//! use echonet_probe::object::ObjectIdentity;
//!
//! let meter = ObjectIdentity::new(0x02, 0x88, 0x01);
//! assert_eq!(meter.to_bytes(), [0x02, 0x88, 0x01]);
//! assert_eq!(meter.to_string(), "02:88:01");
//! ```

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

/// Class group code of the management/control equipment group
pub const CLASS_GROUP_MANAGEMENT: u8 = 0x05;

/// Class code of a controller within the management group
pub const CLASS_CONTROLLER: u8 = 0xFF;

/// ECHONET Lite object identity (EOJ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity {
    /// Class group code
    pub group: u8,
    /// Class code
    pub class: u8,
    /// Instance number
    pub instance: u8,
}

impl ObjectIdentity {
    /// Create a new object identity
    pub const fn new(group: u8, class: u8, instance: u8) -> Self {
        Self {
            group,
            class,
            instance,
        }
    }

    /// The identity this crate uses as the source of every request
    pub const fn controller() -> Self {
        Self::new(CLASS_GROUP_MANAGEMENT, CLASS_CONTROLLER, 0x01)
    }

    /// Wire representation
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.group, self.class, self.instance]
    }

    /// Build from wire representation
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

impl From<[u8; 3]> for ObjectIdentity {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}",
            self.group, self.class, self.instance
        )
    }
}
