//! The protocol layers on top of the wire codecs.
//!
//! Everything here operates on a single raw frame buffer owned by the caller:
//!
//! * [`classify`] holds pure predicates over a received frame. They never mutate anything and
//!   return the same answer for the same bytes.
//! * [`arp`], [`icmp`] and [`udp`] answer a received frame in place, turning the request buffer
//!   into the reply and returning the length to transmit.
//! * [`tcp`] builds the outbound segments of the MQTT session from scratch.
//! * [`session`] is the state machine selecting which of those to build next.
//!
//! Each builder fills every header from Ethernet upwards and computes all lengths and checksums
//! before the buffer is handed to a transport.
//!
//! [`classify`]: classify/index.html
//! [`arp`]: arp/index.html
//! [`icmp`]: icmp/index.html
//! [`udp`]: udp/index.html
//! [`tcp`]: tcp/index.html
//! [`session`]: session/index.html
use core::fmt;

use crate::wire::{self, EthernetAddress, Ipv4Address};

pub mod arp;
pub mod classify;
pub mod icmp;
pub mod session;
pub mod tcp;
pub mod udp;


/// The result type of builders and transports.
pub type Result<T> = core::result::Result<T, Error>;

/// The error type of builders and transports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The operation was not permitted.
    ///
    /// Returned when a frame handed to a builder is not the kind of frame it answers, or when the
    /// session is in no state to send the requested segment.
    Illegal,

    /// Not enough space for the requested frame.
    ///
    /// The buffer handed to a builder is shorter than the frame it would produce, or a received
    /// frame is shorter than its headers claim.
    BadSize,

    /// The transport aborted the transmission.
    ///
    /// Never retried; the caller may report it.
    Aborted,

    /// The hardware address of the destination is not known yet.
    Unreachable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Illegal     => write!(f, "operation not permitted"),
            Error::BadSize     => write!(f, "buffer too small"),
            Error::Aborted     => write!(f, "transmission aborted"),
            Error::Unreachable => write!(f, "destination unreachable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Can convert from a wire error.
///
/// This indicates some layer tried to operate on a frame but failed.
impl From<wire::Error> for Error {
    fn from(err: wire::Error) -> Self {
        match err {
            wire::Error::Truncated => Error::BadSize,
            _ => Error::Illegal,
        }
    }
}

/// Our own addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Local {
    /// The hardware address of the interface.
    pub hardware_addr: EthernetAddress,
    /// The IPv4 address of the interface.
    pub ip_addr: Ipv4Address,
}

/// The addressing of the single peer we hold a connection with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peer {
    /// The hardware address, all zero while unresolved.
    pub hardware_addr: EthernetAddress,
    /// The IPv4 address of the broker.
    pub ip_addr: Ipv4Address,
    /// The TCP port of the broker.
    pub port: u16,
}

/// Check that a buffer can hold a frame of `len` octets.
fn ensure_len(buffer: &[u8], len: usize) -> Result<()> {
    if buffer.len() < len {
        net_debug!("buffer of {} bytes too small for frame of {}", buffer.len(), len);
        Err(Error::BadSize)
    } else {
        Ok(())
    }
}

/// Drop the options of a received IPv4 datagram in place.
///
/// Replies are always sent with a plain 20 byte header, so the payload is moved directly behind
/// it. The header checksum is left stale, every reply recomputes it.
fn strip_ipv4_options(packet: &mut [u8]) -> Result<()> {
    let ip = wire::ipv4_packet::new_checked_mut(packet)?;
    let header_len = usize::from(ip.header_len());
    let total_len = usize::from(ip.total_len());
    if header_len == wire::ipv4::HEADER_LEN {
        return Ok(());
    }

    let options = header_len - wire::ipv4::HEADER_LEN;
    ip.set_version_and_header_len(4, wire::ipv4::HEADER_LEN as u8);
    ip.set_total_len((total_len - options) as u16);
    let bytes = ip.as_bytes_mut();
    bytes.copy_within(header_len..total_len, wire::ipv4::HEADER_LEN);
    Ok(())
}
