use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Checksum, Error, Result};
use super::checksum::Accumulator;
use super::ipv4::{Address, Protocol};

/// The window we advertise in every segment.
pub const DEFAULT_WINDOW: u16 = 1280;

/// The maximum segment size we announce in our SYN.
pub const DEFAULT_MSS: u16 = 1280;

/// The flag bits of a TCP header.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Flags(pub u16);

byte_wrapper! {
    /// A byte sequence representing a TCP segment.
    #[derive(Debug, PartialEq, Eq)]
    pub struct tcp([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const SEQ_NUM:  Field = 4..8;
    pub(crate) const ACK_NUM:  Field = 8..12;
    pub(crate) const FLAGS:    Field = 12..14;
    pub(crate) const FLAG_BYTE: usize = 13;
    pub(crate) const WIN_SIZE: Field = 14..16;
    pub(crate) const CHECKSUM: Field = 16..18;
    pub(crate) const URGENT:   Field = 18..20;

    pub(crate) const FLG_FIN: u16 = 0x001;
    pub(crate) const FLG_SYN: u16 = 0x002;
    pub(crate) const FLG_RST: u16 = 0x004;
    pub(crate) const FLG_PSH: u16 = 0x008;
    pub(crate) const FLG_ACK: u16 = 0x010;

    pub(crate) const OPT_END: u8 = 0x00;
    pub(crate) const OPT_NOP: u8 = 0x01;
    pub(crate) const OPT_MSS: u8 = 0x02;
}

/// The length of a header without options.
pub const HEADER_LEN: usize = field::URGENT.end;

impl Flags {
    /// Only FIN.
    pub const FIN: Flags = Flags(field::FLG_FIN);
    /// Only SYN.
    pub const SYN: Flags = Flags(field::FLG_SYN);
    /// Only RST.
    pub const RST: Flags = Flags(field::FLG_RST);
    /// Only PSH.
    pub const PSH: Flags = Flags(field::FLG_PSH);
    /// Only ACK.
    pub const ACK: Flags = Flags(field::FLG_ACK);

    /// Return the FIN flag.
    #[inline]
    pub fn fin(&self) -> bool {
        self.0 & field::FLG_FIN != 0
    }

    /// Return the SYN flag.
    #[inline]
    pub fn syn(&self) -> bool {
        self.0 & field::FLG_SYN != 0
    }

    /// Return the RST flag.
    #[inline]
    pub fn rst(&self) -> bool {
        self.0 & field::FLG_RST != 0
    }

    /// Return the PSH flag.
    #[inline]
    pub fn psh(&self) -> bool {
        self.0 & field::FLG_PSH != 0
    }

    /// Return the ACK flag.
    #[inline]
    pub fn ack(&self) -> bool {
        self.0 & field::FLG_ACK != 0
    }

    /// The low octet of the flags, as it appears in the header.
    #[inline]
    pub fn byte(&self) -> u8 {
        self.0 as u8
    }

    /// The number of sequence numbers that SYN and FIN occupy.
    pub fn sequence_len(&self) -> u32 {
        u32::from(self.syn()) + u32::from(self.fin())
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (self.syn(), "SYN"),
            (self.fin(), "FIN"),
            (self.rst(), "RST"),
            (self.psh(), "PSH"),
            (self.ack(), "ACK"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

impl tcp {
    /// View octets as TCP segment, unchecked.
    pub fn new_unchecked(data: &[u8]) -> &tcp {
        Self::__from_macro_new_unchecked(data)
    }

    /// View mutable octets as TCP segment, unchecked.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut tcp {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&tcp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// All octets of the segment.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check that every accessor stays in bounds.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is too short for the header length, and
    /// `Err(Error::Malformed)` if the header length is below the fixed header.
    ///
    /// The result of this check is invalidated by calling [set_header_len].
    ///
    /// [set_header_len]: #method.set_header_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            return Err(Error::Truncated);
        }

        let header_len = usize::from(self.header_len());
        if header_len < HEADER_LEN {
            Err(Error::Malformed)
        } else if len < header_len {
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

    /// The sequence number.
    #[inline]
    pub fn seq_number(&self) -> u32 {
        NetworkEndian::read_u32(&self.0[field::SEQ_NUM])
    }

    /// The acknowledgement number.
    #[inline]
    pub fn ack_number(&self) -> u32 {
        NetworkEndian::read_u32(&self.0[field::ACK_NUM])
    }

    /// The header length in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        ((raw >> 12) * 4) as u8
    }

    /// Return all flag bits.
    #[inline]
    pub fn flags(&self) -> Flags {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        Flags(raw & 0x1ff)
    }

    /// Return the octet holding FIN through CWR, compared as a whole by the classifiers.
    #[inline]
    pub fn flag_byte(&self) -> u8 {
        self.0[field::FLAG_BYTE]
    }

    /// The window size.
    #[inline]
    pub fn window_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::WIN_SIZE])
    }

    /// The checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// The urgent pointer.
    #[inline]
    pub fn urgent_at(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::URGENT])
    }

    /// Return the options region of the header.
    pub fn options(&self) -> &[u8] {
        &self.0[HEADER_LEN..usize::from(self.header_len())]
    }

    /// Find the maximum segment size option.
    ///
    /// Returns `Err(Error::Malformed)` if an option length runs past the options region.
    pub fn max_seg_size(&self) -> Result<Option<u16>> {
        let mut options = self.options();
        loop {
            match options {
                [] | [field::OPT_END, ..] => return Ok(None),
                [field::OPT_NOP, rest @ ..] => options = rest,
                [kind, len, rest @ ..] => {
                    let len = usize::from(*len);
                    if len < 2 || len - 2 > rest.len() {
                        return Err(Error::Malformed);
                    }
                    let (data, rest) = rest.split_at(len - 2);
                    if *kind == field::OPT_MSS {
                        if data.len() != 2 {
                            return Err(Error::Malformed);
                        }
                        return Ok(Some(NetworkEndian::read_u16(data)));
                    }
                    options = rest;
                },
                [_] => return Err(Error::Malformed),
            }
        }
    }

    /// Return the number of sequence numbers this segment occupies.
    ///
    /// That is the payload length plus one for each of SYN and FIN.
    pub fn sequence_len(&self) -> u32 {
        self.payload_slice().len() as u32 + self.flags().sequence_len()
    }

    /// Validate the pseudo-header checksum over the whole segment.
    pub fn verify_checksum(&self, src_addr: Address, dst_addr: Address) -> bool {
        Accumulator::new()
            .pseudo_header(src_addr, dst_addr, Protocol::Tcp, self.0.len() as u16)
            .accumulate(&self.0)
            .finalize() == 0
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

    /// Write the sequence number.
    #[inline]
    pub fn set_seq_number(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.0[field::SEQ_NUM], value)
    }

    /// Write the acknowledgement number.
    #[inline]
    pub fn set_ack_number(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.0[field::ACK_NUM], value)
    }

    /// Write the header length and the flags, which share a.
    ///
    /// The header length is given in octets and must be a multiple of four.
    #[inline]
    pub fn set_header_len_and_flags(&mut self, header_len: u8, flags: Flags) {
        let raw = (u16::from(header_len) / 4) << 12 | (flags.0 & 0x1ff);
        NetworkEndian::write_u16(&mut self.0[field::FLAGS], raw)
    }

    /// Write the window size.
    #[inline]
    pub fn set_window_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::WIN_SIZE], value)
    }

    /// Write the checksum.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Write the urgent pointer.
    #[inline]
    pub fn set_urgent_at(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::URGENT], value)
    }

    /// Return the options region of the header as a mutable slice.
    pub fn options_mut(&mut self) -> &mut [u8] {
        let end = usize::from(self.header_len());
        &mut self.0[HEADER_LEN..end]
    }

    /// Compute and fill in the checksum over the pseudo-header and the whole segment.
    pub fn fill_checksum(&mut self, src_addr: Address, dst_addr: Address) {
        self.set_checksum(0);
        let checksum = Accumulator::new()
            .pseudo_header(src_addr, dst_addr, Protocol::Tcp, self.0.len() as u16)
            .accumulate(&self.0)
            .finalize();
        self.set_checksum(checksum)
    }

    /// The payload octets.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[usize::from(self.header_len())..]
    }

    /// The payload octets, mutably.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let start = usize::from(self.header_len());
        &mut self.0[start..]
    }
}

impl AsRef<[u8]> for tcp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The fields of a TCP header that the builders set.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_port:     u16,
    pub dst_port:     u16,
    pub flags:        Flags,
    pub seq_number:   u32,
    pub ack_number:   u32,
    pub window_len:   u16,
    pub max_seg_size: Option<u16>,
    pub payload_len:  usize,
}

impl Repr {
    /// Read a TCP header into its representation.
    ///
    /// The segment is the whole IP payload, the payload extends to its end.
    pub fn parse(
        packet: &tcp,
        src_addr: Address,
        dst_addr: Address,
        checksum: Checksum,
    ) -> Result<Repr> {
        packet.check_len()?;

        // Source and destination ports must be present.
        if packet.src_port() == 0 { return Err(Error::Malformed) }
        if packet.dst_port() == 0 { return Err(Error::Malformed) }
        // Valid checksum is expected.
        if checksum.manual() && !packet.verify_checksum(src_addr, dst_addr) {
            return Err(Error::WrongChecksum)
        }

        Ok(Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            flags: packet.flags(),
            seq_number: packet.seq_number(),
            ack_number: packet.ack_number(),
            window_len: packet.window_len(),
            max_seg_size: packet.max_seg_size()?,
            payload_len: packet.payload_slice().len(),
        })
    }

    /// Return the length of the header that will be emitted, options included.
    pub fn header_len(&self) -> usize {
        let mut length = HEADER_LEN;
        if self.max_seg_size.is_some() {
            length += 4;
        }
        length
    }

    /// Return the length of the segment, header and payload.
    pub fn buffer_len(&self) -> usize {
        self.header_len() + self.payload_len
    }

    /// Emit the header into a segment of exactly [`buffer_len`] octets.
    ///
    /// The payload must already be in place when the checksum is requested.
    ///
    /// [`buffer_len`]: #method.buffer_len
    pub fn emit(
        &self,
        packet: &mut tcp,
        src_addr: Address,
        dst_addr: Address,
        checksum: Checksum,
    ) {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_seq_number(self.seq_number);
        packet.set_ack_number(self.ack_number);
        packet.set_header_len_and_flags(self.header_len() as u8, self.flags);
        packet.set_window_len(self.window_len);
        packet.set_urgent_at(0);

        if let Some(mss) = self.max_seg_size {
            let options = packet.options_mut();
            options[0] = field::OPT_MSS;
            options[1] = 4;
            NetworkEndian::write_u16(&mut options[2..4], mss);
        }

        if checksum.manual() {
            packet.fill_checksum(src_addr, dst_addr)
        } else {
            packet.set_checksum(0);
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TCP src={} dst={} {} seq={} ack={} win={} len={}",
               self.src_port, self.dst_port, self.flags,
               self.seq_number, self.ack_number, self.window_len, self.payload_len)?;
        if let Some(mss) = self.max_seg_size {
            write!(f, " mss={}", mss)?;
        }
        Ok(())
    }
}
