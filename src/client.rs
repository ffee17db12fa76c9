//! ECHONET Lite Probe Client
//!
//! This module drives a discovery sweep against one ECHONET Lite node: for
//! every candidate device object and every property group it sends a Get
//! request, waits for a single reply, and turns the returned properties into
//! [`Reading`]s.
//!
//! The sweep is strictly sequential with one request outstanding at a time.
//! Timeouts and malformed replies are expected; they are logged, recorded as
//! the [`PairOutcome`] of that pair, and the sweep moves on. Nothing is
//! retried.
//!
//! # Example
//!
//! ```no_run
//! use echonet_probe::client::{probe_host, ProbeConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let report = probe_host("192.168.1.50", &ProbeConfig::default())?;
//! for reading in &report.readings {
//!     println!("{}", reading);
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    net::{SocketAddr, ToSocketAddrs},
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    catalog::{DeviceCandidate, PropertyGroup, DEVICE_CANDIDATES, PROPERTY_GROUPS},
    encoding::{is_echonet_lite, EncodingError, Frame, ServiceCode},
    object::ObjectIdentity,
    property::{format_property_value, property_label},
    transport::{Transport, TransportError, UdpTransport},
    util::{hex_dump, CommunicationStats},
};

/// Prober defaults
pub mod constants {
    use std::time::Duration;

    /// ECHONET Lite UDP port
    pub const ECHONET_LITE_PORT: u16 = 3610;

    /// Default wait for a reply to one request
    pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Default pause between two requests
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

    /// Default receive buffer size
    pub const DEFAULT_BUFFER_SIZE: usize = 1024;
}

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can stop a probe before the sweep starts, or fail one pair
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// Frame could not be built or decoded
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
    /// Host name did not resolve to an address
    #[error("Cannot resolve target {0}")]
    UnresolvedTarget(String),
    /// I/O error outside the transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Local bind address
    pub bind_address: SocketAddr,
    /// Destination UDP port
    pub port: u16,
    /// Wait for a reply to one request
    pub response_timeout: Duration,
    /// Pause between two requests
    pub request_delay: Duration,
    /// Receive buffer size
    pub buffer_size: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 0)),
            port: constants::ECHONET_LITE_PORT,
            response_timeout: constants::DEFAULT_RESPONSE_TIMEOUT,
            request_delay: constants::DEFAULT_REQUEST_DELAY,
            buffer_size: constants::DEFAULT_BUFFER_SIZE,
        }
    }
}

/// One property value read from a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// Catalogue label of the device object
    pub device: &'static str,
    /// Object the request was addressed to
    pub identity: ObjectIdentity,
    /// Property code (EPC)
    pub code: u8,
    /// Property label, e.g. `EPC 0x80 (Operation status)`
    pub description: String,
    /// Formatted value
    pub value: String,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {}", self.device, self.description, self.value)
    }
}

/// How one (device, property group) exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// A reply was decoded
    Received {
        /// Service code of the reply
        esv: ServiceCode,
        /// Property count declared by the reply
        declared: u8,
        /// Properties actually present
        parsed: usize,
        /// Readings produced from this reply
        readings: usize,
    },
    /// No reply before the deadline
    TimedOut,
    /// Send, receive or decode failed
    Failed(String),
}

/// Record of one attempted pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairAttempt {
    pub device: &'static str,
    pub identity: ObjectIdentity,
    pub group: &'static str,
    pub transaction_id: u16,
    pub outcome: PairOutcome,
}

/// Result of a complete sweep
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Readings in the order their pairs were attempted
    pub readings: Vec<Reading>,
    /// One entry per attempted pair
    pub attempts: Vec<PairAttempt>,
    /// Message counters
    pub stats: CommunicationStats,
}

impl ProbeReport {
    /// At least one reading was collected
    pub fn is_success(&self) -> bool {
        !self.readings.is_empty()
    }

    /// Number of pairs that timed out
    pub fn timeouts(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == PairOutcome::TimedOut)
            .count()
    }
}

/// Transaction ID from the current time in milliseconds, truncated to 16 bits.
///
/// IDs can repeat within a run, so a late reply to an earlier request that
/// happens to share the ID is indistinguishable from a fresh one.
pub fn next_transaction_id() -> u16 {
    (Utc::now().timestamp_millis() & 0xFFFF) as u16
}

/// Sequential ECHONET Lite prober
pub struct Prober<T: Transport> {
    transport: T,
    config: ProbeConfig,
    devices: &'static [DeviceCandidate],
    groups: &'static [PropertyGroup],
}

impl<T: Transport> Prober<T> {
    /// Create a prober over the default catalogues
    pub fn new(transport: T, config: ProbeConfig) -> Self {
        Self {
            transport,
            config,
            devices: DEVICE_CANDIDATES,
            groups: PROPERTY_GROUPS,
        }
    }

    /// Replace the candidate catalogues
    pub fn with_catalogue(
        mut self,
        devices: &'static [DeviceCandidate],
        groups: &'static [PropertyGroup],
    ) -> Self {
        self.devices = devices;
        self.groups = groups;
        self
    }

    /// Number of exchanges a sweep will attempt
    pub fn pair_count(&self) -> usize {
        self.devices.len() * self.groups.len()
    }

    /// Sweep every (device, property group) pair against `target`.
    ///
    /// Consumes the prober so the transport is released when the sweep ends.
    pub fn run(mut self, target: SocketAddr) -> ProbeReport {
        info!(
            "Probing ECHONET Lite node at {} ({} requests)",
            target,
            self.pair_count()
        );

        let mut report = ProbeReport::default();
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut first = true;

        for device in self.devices {
            info!(
                "Testing {} (group 0x{:02X}, class 0x{:02X}, instance 0x{:02X})",
                device.label, device.identity.group, device.identity.class, device.identity.instance
            );

            for group in self.groups {
                if !first && !self.config.request_delay.is_zero() {
                    thread::sleep(self.config.request_delay);
                }
                first = false;

                let transaction_id = next_transaction_id();
                let outcome = match self.exchange(
                    target,
                    device,
                    group,
                    transaction_id,
                    &mut buffer,
                    &mut report,
                ) {
                    Ok(outcome) => outcome,
                    Err(ProbeError::Transport(e)) if e.is_timeout() => {
                        info!("No response for {} {} properties (timeout)", device.label, group.name);
                        report.stats.record_timeout();
                        PairOutcome::TimedOut
                    }
                    Err(e) => {
                        warn!("{} {} properties: {}", device.label, group.name, e);
                        report.stats.record_error();
                        PairOutcome::Failed(e.to_string())
                    }
                };

                report.attempts.push(PairAttempt {
                    device: device.label,
                    identity: device.identity,
                    group: group.name,
                    transaction_id,
                    outcome,
                });
            }
        }

        info!(
            "Probe complete: {} readings, {} of {} requests timed out",
            report.readings.len(),
            report.timeouts(),
            report.attempts.len()
        );
        report
    }

    /// One request/response exchange: `Idle -> Sent -> Received | TimedOut`
    fn exchange(
        &mut self,
        target: SocketAddr,
        device: &DeviceCandidate,
        group: &PropertyGroup,
        transaction_id: u16,
        buffer: &mut [u8],
        report: &mut ProbeReport,
    ) -> Result<PairOutcome> {
        let request = Frame::get_request(transaction_id, device.identity, group.codes)?;
        let bytes = request.encode();

        debug!(
            "Sending Get TID 0x{:04X} to {}:\n{}",
            transaction_id,
            target,
            hex_dump(&bytes, "  ")
        );
        self.transport.send_to(&bytes, target)?;
        report.stats.record_sent(bytes.len());

        // Replies to earlier requests are dropped until ours arrives or the
        // deadline passes
        let deadline = Instant::now() + self.config.response_timeout;
        let mut remaining = self.config.response_timeout;
        let (response, declared) = loop {
            let (len, source) = self.transport.recv_timeout(buffer, remaining)?;
            report.stats.record_received(len);
            let data = &buffer[..len];

            debug!("Received {} bytes from {}:\n{}", len, source, hex_dump(data, "  "));
            if !is_echonet_lite(data) {
                debug!("Reply from {} does not carry the ECHONET Lite header", source);
            }

            let (response, declared) = Frame::decode_partial(data)?;
            if response.transaction_id == transaction_id {
                info!(
                    "Received response from {}: TID 0x{:04X}, ESV {}, {} properties",
                    source, response.transaction_id, response.service, declared
                );
                break (response, declared);
            }

            warn!(
                "Discarding stale reply from {}: TID 0x{:04X}, expected 0x{:04X}",
                source, response.transaction_id, transaction_id
            );
            remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout(self.config.response_timeout).into());
            }
        };
        if response.service.is_error_response() {
            info!("{} rejected part of the request ({})", device.label, response.service);
        }
        if response.properties().len() < declared as usize {
            warn!(
                "Reply truncated: {} of {} properties present",
                response.properties().len(),
                declared
            );
        }

        let mut readings = 0;
        for property in response.properties() {
            let value = format_property_value(property.code, property.payload());
            info!(
                "  EPC 0x{:02X}, PDC {}, Value: {}",
                property.code,
                property.pdc(),
                value
            );

            if property.pdc() > 0 {
                report.readings.push(Reading {
                    device: device.label,
                    identity: device.identity,
                    code: property.code,
                    description: property_label(property.code),
                    value,
                });
                readings += 1;
            }
        }

        Ok(PairOutcome::Received {
            esv: response.service,
            declared,
            parsed: response.properties().len(),
            readings,
        })
    }
}

/// Resolve `host` on the configured port
pub fn resolve_target(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| ProbeError::UnresolvedTarget(format!("{}:{}", host, port)))
}

/// Open a UDP socket, sweep `host` and close the socket.
pub fn probe_host(host: &str, config: &ProbeConfig) -> Result<ProbeReport> {
    let target = resolve_target(host, config.port)?;
    let transport = UdpTransport::bind(config.bind_address)?;
    debug!("Local socket {}", transport.local_address()?);
    Ok(Prober::new(transport, config.clone()).run(target))
}
