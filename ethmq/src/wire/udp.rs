use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Checksum, Error, Result};
use super::checksum::Accumulator;
use super::ipv4::{Address, Protocol};

byte_wrapper! {
    /// A byte sequence representing a UDP datagram.
    #[derive(Debug, PartialEq, Eq)]
    pub struct udp([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const LENGTH:   Field = 4..6;
    pub(crate) const CHECKSUM: Field = 6..8;

    pub(crate) const PAYLOAD: usize = 8;
}

/// The length of a UDP header.
pub const HEADER_LEN: usize = field::PAYLOAD;

impl udp {
    /// View octets as UDP packet, unchecked.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// View mutable octets as UDP packet, unchecked.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// All octets of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check that every accessor stays in bounds.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is too short for the header or the length
    /// field, and `Err(Error::Malformed)` if the length field is smaller than the header.
    ///
    /// The result of this check is invalidated by calling [set_len].
    ///
    /// [set_len]: #method.set_len
    pub fn check_len(&self) -> Result<()> {
        let buffer_len = self.0.len();
        if buffer_len < field::PAYLOAD {
            return Err(Error::Truncated);
        }

        let field_len = usize::from(self.len());
        if field_len < field::PAYLOAD {
            Err(Error::Malformed)
        } else if field_len > buffer_len {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The source port.
    #[inline]
    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SRC_PORT])
    }

    /// The destination port.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::DST_PORT])
    }

    /// Return the length field, header included.
    #[inline]
    pub fn len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// The checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Write the source port.
    #[inline]
    pub fn set_src_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::SRC_PORT], value)
    }

    /// Write the destination port.
    #[inline]
    pub fn set_dst_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::DST_PORT], value)
    }

    /// Write the length.
    #[inline]
    pub fn set_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Write the checksum.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    fn datagram(&self) -> &[u8] {
        &self.0[..usize::from(self.len())]
    }

    /// Compute and fill in the checksum over pseudo-header, header and payload.
    pub fn fill_checksum(&mut self, src_addr: Address, dst_addr: Address) {
        self.set_checksum(0);
        let checksum = Accumulator::new()
            .pseudo_header(src_addr, dst_addr, Protocol::Udp, self.len())
            .accumulate(self.datagram())
            .finalize();
        // A computed zero is transmitted as all ones.
        self.set_checksum(if checksum == 0 { 0xffff } else { checksum })
    }

    /// Validate the pseudo-header checksum.
    pub fn verify_checksum(&self, src_addr: Address, dst_addr: Address) -> bool {
        Accumulator::new()
            .pseudo_header(src_addr, dst_addr, Protocol::Udp, self.len())
            .accumulate(self.datagram())
            .finalize() == 0
    }

    /// The payload octets.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::PAYLOAD..usize::from(self.len())]
    }

    /// The payload octets, mutably.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let end = usize::from(self.len());
        &mut self.0[field::PAYLOAD..end]
    }
}

impl AsRef<[u8]> for udp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The ports and payload length of a UDP datagram.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_port: u16,
    pub dst_port: u16,
    pub payload_len: usize,
}

impl Repr {
    /// Read a UDP header into its representation.
    pub fn parse(
        packet: &udp,
        src_addr: Address,
        dst_addr: Address,
        checksum: Checksum,
    ) -> Result<Repr> {
        packet.check_len()?;
        if checksum.manual() && !packet.verify_checksum(src_addr, dst_addr) {
            return Err(Error::WrongChecksum)
        }

        Ok(Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            payload_len: packet.payload_slice().len(),
        })
    }

    /// The header of a reply: ports swapped, new payload length.
    pub fn reply(&self, payload_len: usize) -> Repr {
        Repr {
            src_port: self.dst_port,
            dst_port: self.src_port,
            payload_len,
        }
    }

    /// Return the length of the datagram, header and payload.
    pub fn buffer_len(&self) -> usize {
        field::PAYLOAD + self.payload_len
    }

    /// Emit the header into a User Datagram Protocol packet.
    ///
    /// The payload must already be in place when the checksum is requested.
    pub fn emit(
        &self,
        packet: &mut udp,
        src_addr: Address,
        dst_addr: Address,
        checksum: Checksum,
    ) {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_len(self.buffer_len() as u16);

        if checksum.manual() {
            packet.fill_checksum(src_addr, dst_addr)
        } else {
            // make sure we get a consistently zeroed checksum, since implementations might rely
            // on it
            packet.set_checksum(0);
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UDP src={} dst={} len={}",
               self.src_port, self.dst_port, self.payload_len)
    }
}
