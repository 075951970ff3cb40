//! The RFC 1071 internet checksum.
//!
//! A sum is accumulated over any number of regions and finalized once. The byte phase is carried
//! between regions, so the pseudo-header, the transport header and the payload can live in
//! different buffers. An odd trailing byte is the high byte of a zero-padded word.
//!
//! A region that already contains its stored checksum verifies when [`Accumulator::finalize`]
//! returns zero.
//!
//! [`Accumulator::finalize`]: struct.Accumulator.html#method.finalize
use byteorder::{ByteOrder, NetworkEndian};

use super::ipv4::{Address, Protocol};

/// A running one's-complement sum.
///
/// This is a local value of a single checksum computation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    sum: u32,
    /// The high byte of a word whose low byte is still missing.
    pending: Option<u8>,
}

impl Accumulator {
    /// An empty sum.
    pub const fn new() -> Self {
        Accumulator { sum: 0, pending: None }
    }

    /// Add all big-endian 16-bit words of `data`.
    pub fn accumulate(&mut self, data: &[u8]) -> &mut Self {
        let mut data = data;

        if let Some(high) = self.pending.take() {
            match data.split_first() {
                Some((&low, rest)) => {
                    self.add_word(u16::from_be_bytes([high, low]));
                    data = rest;
                },
                None => {
                    self.pending = Some(high);
                    return self;
                },
            }
        }

        let mut words = data.chunks_exact(2);
        for word in &mut words {
            self.add_word(NetworkEndian::read_u16(word));
        }

        if let [last] = words.remainder() {
            self.pending = Some(*last);
        }

        self
    }

    /// Add a single word.
    ///
    /// Must not be called while the byte phase is odd.
    pub fn add_word(&mut self, word: u16) -> &mut Self {
        debug_assert!(self.pending.is_none(), "word added at odd byte phase");
        self.sum += u32::from(word);
        // Keep room for the next additions.
        if self.sum & 0x8000_0000 != 0 {
            self.sum = (self.sum & 0xffff) + (self.sum >> 16);
        }
        self
    }

    /// Add the IPv4 pseudo-header of a TCP or UDP segment.
    ///
    /// Consists of source and destination address, a zero octet, the protocol number and the
    /// length of the transport header plus payload.
    pub fn pseudo_header(
        &mut self,
        src_addr: Address,
        dst_addr: Address,
        protocol: Protocol,
        length: u16,
    ) -> &mut Self {
        let protocol: u8 = protocol.into();
        self.accumulate(src_addr.as_bytes())
            .accumulate(dst_addr.as_bytes())
            .accumulate(&[0, protocol]);
        let mut len = [0; 2];
        NetworkEndian::write_u16(&mut len, length);
        self.accumulate(&len)
    }

    /// Fold all carries into the low 16 bits and return the one's complement.
    pub fn finalize(&self) -> u16 {
        let mut sum = self.sum;
        if let Some(high) = self.pending {
            sum += u32::from(high) << 8;
        }
        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

/// The checksum over a single contiguous region.
pub fn compute(data: &[u8]) -> u16 {
    Accumulator::new().accumulate(data).finalize()
}
