//! ECHONET Lite Frame Encoding/Decoding Module
//!
//! This module builds and parses ECHONET Lite frames (format 1, the fixed
//! "specified message" layout).
//!
//! # Wire Layout
//!
//! All multi-byte fields are big-endian.
//!
//! ```text
//! 0      2      4       7       10    11    12
//! +------+------+-------+-------+-----+-----+------------------------+
//! | EHD  | TID  | SEOJ  | DEOJ  | ESV | OPC | OPC x (EPC, PDC, EDT)  |
//! +------+------+-------+-------+-----+-----+------------------------+
//! ```
//!
//! A frame is at least [`HEADER_SIZE`] bytes. Decoding tolerates truncated
//! property lists: parsing stops at the first property that is not fully
//! present and the properties read so far are returned.
//!
//! # Example
//!
//! ```
//! use echonet_probe::encoding::{Frame, ServiceCode};
//! use echonet_probe::object::ObjectIdentity;
//!
//! let meter = ObjectIdentity::new(0x02, 0x88, 0x01);
//! let request = Frame::get_request(0x0001, meter, &[0x80, 0xE0]).unwrap();
//! let bytes = request.encode();
//! assert_eq!(&bytes[..4], &[0x10, 0x81, 0x00, 0x01]);
//!
//! let decoded = Frame::decode(&bytes).unwrap();
//! assert_eq!(decoded.service, ServiceCode::Get);
//! assert_eq!(decoded, request);
//! ```

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{object::ObjectIdentity, util::Buffer};

/// First header byte: ECHONET Lite
pub const EHD1_ECHONET_LITE: u8 = 0x10;

/// Second header byte: format 1 (specified message format)
pub const EHD2_FORMAT_1: u8 = 0x81;

/// Fixed header size: EHD(2) + TID(2) + SEOJ(3) + DEOJ(3) + ESV(1) + OPC(1)
pub const HEADER_SIZE: usize = 12;

/// Maximum number of properties in one frame (OPC is a single byte)
pub const MAX_PROPERTIES: usize = u8::MAX as usize;

/// Maximum payload length of one property (PDC is a single byte)
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Result type for encoding operations
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, EncodingError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, EncodingError>;

/// Errors that can occur while building or decoding frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Input is shorter than the fixed frame header
    InsufficientData { needed: usize, available: usize },
    /// Property payload does not fit the one-byte PDC field
    PayloadTooLong(usize),
    /// Frame already holds the maximum number of properties
    TooManyProperties,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::InsufficientData { needed, available } => write!(
                f,
                "Insufficient data: need {} bytes, got {}",
                needed, available
            ),
            EncodingError::PayloadTooLong(len) => write!(
                f,
                "Property payload of {} bytes exceeds {} bytes",
                len, MAX_PAYLOAD_LEN
            ),
            EncodingError::TooManyProperties => {
                write!(f, "Frame cannot hold more than {} properties", MAX_PROPERTIES)
            }
        }
    }
}

#[cfg(feature = "std")]
impl Error for EncodingError {}

/// ECHONET Lite service codes (ESV)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCode {
    /// Property value write request (no response required)
    SetI,
    /// Property value write request (response required)
    SetC,
    /// Property value read request
    Get,
    /// Property value notification request
    InfReq,
    /// Property value write & read request
    SetGet,
    /// Property value write response
    SetRes,
    /// Property value read response
    GetRes,
    /// Property value notification
    Inf,
    /// Property value notification (response required)
    InfC,
    /// Property value notification response
    InfCRes,
    /// Property value write & read response
    SetGetRes,
    /// SetI not possible
    SetISna,
    /// SetC not possible
    SetCSna,
    /// Get not possible
    GetSna,
    /// Inf not possible
    InfSna,
    /// SetGet not possible
    SetGetSna,
    /// Any code not listed above.
    ///
    /// `Other` carrying a listed code is folded into its named variant by
    /// [`Frame::new`] and by decoding.
    Other(u8),
}

impl ServiceCode {
    /// Whether this is one of the "not possible" error responses
    pub fn is_error_response(self) -> bool {
        matches!(
            self,
            ServiceCode::SetISna
                | ServiceCode::SetCSna
                | ServiceCode::GetSna
                | ServiceCode::InfSna
                | ServiceCode::SetGetSna
        )
    }

    /// Short protocol name, e.g. `Get_Res`
    pub fn name(self) -> &'static str {
        SERVICE_CODES
            .iter()
            .find(|(_, service, _)| *service == self)
            .map_or("Unknown", |&(_, _, name)| name)
    }
}

/// Every named service code with its ESV byte and protocol name
const SERVICE_CODES: &[(u8, ServiceCode, &str)] = &[
    (0x60, ServiceCode::SetI, "SetI"),
    (0x61, ServiceCode::SetC, "SetC"),
    (0x62, ServiceCode::Get, "Get"),
    (0x63, ServiceCode::InfReq, "INF_REQ"),
    (0x6E, ServiceCode::SetGet, "SetGet"),
    (0x71, ServiceCode::SetRes, "Set_Res"),
    (0x72, ServiceCode::GetRes, "Get_Res"),
    (0x73, ServiceCode::Inf, "INF"),
    (0x74, ServiceCode::InfC, "INFC"),
    (0x7A, ServiceCode::InfCRes, "INFC_Res"),
    (0x7E, ServiceCode::SetGetRes, "SetGet_Res"),
    (0x50, ServiceCode::SetISna, "SetI_SNA"),
    (0x51, ServiceCode::SetCSna, "SetC_SNA"),
    (0x52, ServiceCode::GetSna, "Get_SNA"),
    (0x53, ServiceCode::InfSna, "INF_SNA"),
    (0x5E, ServiceCode::SetGetSna, "SetGet_SNA"),
];

impl From<u8> for ServiceCode {
    fn from(value: u8) -> Self {
        SERVICE_CODES
            .iter()
            .find(|(code, _, _)| *code == value)
            .map_or(ServiceCode::Other(value), |(_, service, _)| *service)
    }
}

impl From<ServiceCode> for u8 {
    fn from(value: ServiceCode) -> Self {
        match value {
            ServiceCode::Other(code) => code,
            named => SERVICE_CODES
                .iter()
                .find(|(_, service, _)| *service == named)
                .map_or(0, |(code, _, _)| *code),
        }
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), u8::from(*self))
    }
}

/// One property entry: EPC, PDC and EDT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property code (EPC)
    pub code: u8,
    payload: Bytes,
}

impl Property {
    /// Create a property carrying a value
    pub fn new(code: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(EncodingError::PayloadTooLong(payload.len()));
        }
        Ok(Self { code, payload })
    }

    /// Create a read request entry (PDC = 0)
    pub fn request(code: u8) -> Self {
        Self {
            code,
            payload: Bytes::new(),
        }
    }

    /// Property value data (EDT)
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared payload length (PDC)
    pub fn pdc(&self) -> u8 {
        // Bounded by the constructor
        self.payload.len() as u8
    }

    fn encoded_len(&self) -> usize {
        2 + self.payload.len()
    }
}

/// An ECHONET Lite frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Transaction ID (TID)
    pub transaction_id: u16,
    /// Source object (SEOJ)
    pub source: ObjectIdentity,
    /// Destination object (DEOJ)
    pub destination: ObjectIdentity,
    /// Service code (ESV)
    pub service: ServiceCode,
    properties: Vec<Property>,
}

impl Frame {
    /// Create an empty frame
    pub fn new(
        transaction_id: u16,
        source: ObjectIdentity,
        destination: ObjectIdentity,
        service: ServiceCode,
    ) -> Self {
        Self {
            transaction_id,
            source,
            destination,
            service: ServiceCode::from(u8::from(service)),
            properties: Vec::new(),
        }
    }

    /// Build a Get request from the controller object with one empty
    /// property per requested code
    pub fn get_request(
        transaction_id: u16,
        destination: ObjectIdentity,
        codes: &[u8],
    ) -> Result<Self> {
        let mut frame = Self::new(
            transaction_id,
            ObjectIdentity::controller(),
            destination,
            ServiceCode::Get,
        );
        for &code in codes {
            frame.push_property(Property::request(code))?;
        }
        Ok(frame)
    }

    /// Append a property, keeping OPC within one byte
    pub fn push_property(&mut self, property: Property) -> Result<()> {
        if self.properties.len() >= MAX_PROPERTIES {
            return Err(EncodingError::TooManyProperties);
        }
        self.properties.push(property);
        Ok(())
    }

    /// Builder form of [`Frame::push_property`]
    pub fn with_property(mut self, property: Property) -> Result<Self> {
        self.push_property(property)?;
        Ok(self)
    }

    /// Properties in frame order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Property count (OPC)
    pub fn opc(&self) -> u8 {
        self.properties.len() as u8
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.properties.iter().map(Property::encoded_len).sum::<usize>()
    }

    /// Encode the frame to wire format
    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.encoded_len());

        buffer.put_u8(EHD1_ECHONET_LITE);
        buffer.put_u8(EHD2_FORMAT_1);
        buffer.put_u16(self.transaction_id);
        buffer.put_slice(&self.source.to_bytes());
        buffer.put_slice(&self.destination.to_bytes());
        buffer.put_u8(self.service.into());
        buffer.put_u8(self.opc());

        for property in &self.properties {
            buffer.put_u8(property.code);
            buffer.put_u8(property.pdc());
            if !property.payload.is_empty() {
                buffer.put_slice(&property.payload);
            }
        }

        buffer.freeze()
    }

    /// Decode a frame, tolerating a truncated property list
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_partial(data).map(|(frame, _)| frame)
    }

    /// Decode a frame and also return the declared property count (OPC).
    ///
    /// When the returned frame holds fewer properties than declared, the
    /// input was truncated.
    pub fn decode_partial(data: &[u8]) -> Result<(Self, u8)> {
        if data.len() < HEADER_SIZE {
            return Err(EncodingError::InsufficientData {
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }

        let transaction_id = u16::from_be_bytes([data[2], data[3]]);
        let source = ObjectIdentity::new(data[4], data[5], data[6]);
        let destination = ObjectIdentity::new(data[7], data[8], data[9]);
        let service = ServiceCode::from(data[10]);
        let declared = data[11];

        let mut frame = Self::new(transaction_id, source, destination, service);
        let mut buffer = Buffer::new(&data[HEADER_SIZE..]);

        for _ in 0..declared {
            let (code, pdc) = match (buffer.read_u8(), buffer.read_u8()) {
                (Some(code), Some(pdc)) => (code, pdc),
                _ => break,
            };
            let payload = match buffer.read_bytes(pdc as usize) {
                Some(payload) => payload,
                None => break,
            };
            frame.properties.push(Property {
                code,
                payload: Bytes::copy_from_slice(payload),
            });
        }

        Ok((frame, declared))
    }
}

/// Check the two ECHONET Lite header bytes (EHD1/EHD2)
pub fn is_echonet_lite(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == EHD1_ECHONET_LITE && data[1] == EHD2_FORMAT_1
}
