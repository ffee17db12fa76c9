//! ECHONET Lite Transport Module
//!
//! ECHONET Lite runs over UDP port 3610. This module provides the datagram
//! seam the prober talks to: a [`Transport`] trait with one send and one
//! bounded receive, and [`UdpTransport`], its implementation over a blocking
//! UDP socket.
//!
//! The socket is opened by [`UdpTransport::bind`] and closed when the
//! transport is dropped.
//!
//! # Example
//!
//! ```no_run
//! use echonet_probe::transport::{Transport, UdpTransport};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = UdpTransport::bind("0.0.0.0:0".parse()?)?;
//! transport.send_to(&[0x10, 0x81], "192.168.1.50:3610".parse()?)?;
//!
//! let mut buffer = [0u8; 1024];
//! let (len, source) = transport.recv_timeout(&mut buffer, Duration::from_secs(2))?;
//! println!("{} bytes from {}", len, source);
//! # Ok(())
//! # }
//! ```

use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// No datagram arrived before the deadline
    #[error("Timeout: no response within {0:?}")]
    Timeout(Duration),
    /// Datagram was only partially sent
    #[error("Short send: {sent} of {expected} bytes")]
    ShortSend { sent: usize, expected: usize },
}

impl TransportError {
    /// Whether this error is an expired receive deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Connectionless datagram transport
pub trait Transport {
    /// Send one datagram
    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<()>;

    /// Wait for one datagram, at most `timeout`
    fn recv_timeout(&mut self, buffer: &mut [u8], timeout: Duration)
        -> Result<(usize, SocketAddr)>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<()> {
        (**self).send_to(data, dest)
    }

    fn recv_timeout(
        &mut self,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<(usize, SocketAddr)> {
        (**self).recv_timeout(buffer, timeout)
    }
}

/// UDP transport over a blocking socket
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Open a UDP socket bound to `bind_addr`
    pub fn bind(bind_addr: SocketAddr) -> Result<Self> {
        let socket = Socket::new(
            Domain::for_address(bind_addr),
            Type::DGRAM,
            Some(Protocol::UDP),
        )?;
        socket.bind(&bind_addr.into())?;

        log::debug!("Bound UDP socket to {}", bind_addr);
        Ok(Self {
            socket: socket.into(),
        })
    }

    /// Address the socket is bound to, with the ephemeral port filled in
    pub fn local_address(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<()> {
        let sent = self.socket.send_to(data, dest)?;
        if sent != data.len() {
            return Err(TransportError::ShortSend {
                sent,
                expected: data.len(),
            });
        }
        Ok(())
    }

    fn recv_timeout(
        &mut self,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<(usize, SocketAddr)> {
        // A zero read timeout is rejected by the OS
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(timeout))?;

        match self.socket.recv_from(buffer) {
            Ok(received) => Ok(received),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Err(TransportError::Timeout(timeout))
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
