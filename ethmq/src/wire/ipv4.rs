use core::{fmt, str::FromStr};
use byteorder::{ByteOrder, NetworkEndian};

use super::{checksum, Checksum, Error, Result};

/// The time to live of every datagram we emit.
pub const DEFAULT_HOP_LIMIT: u8 = 128;

enum_with_unknown! {
    /// IP datagram encapsulated protocol.
    pub enum Protocol(u8) {
        Icmp = 0x01,
        Tcp  = 0x06,
        Udp  = 0x11,
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::Icmp => write!(f, "ICMP"),
            Protocol::Tcp  => write!(f, "TCP"),
            Protocol::Udp  => write!(f, "UDP"),
            Protocol::Unknown(id) => write!(f, "0x{:02x}", id),
        }
    }
}

/// A four-octet IPv4 address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// An unspecified address.
    pub const UNSPECIFIED: Address = Address([0x00; 4]);

    /// The broadcast address.
    pub const BROADCAST:   Address = Address([0xff; 4]);

    /// Construct an IPv4 address from parts.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Construct an IPv4 address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not four octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an IPv4 address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Query whether the address is the unspecified address.
    pub fn is_unspecified(&self) -> bool {
        self.0 == [0x00; 4]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// Error from parsing a dotted-quad address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAddressError;

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("expected four dot separated decimal octets")
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let mut parsed = [0; 4];
        let mut components = src.split('.');
        for c in parsed.iter_mut() {
            let part = components.next().ok_or(ParseAddressError)?;
            // `u8::from_str` would also accept a leading `+`.
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseAddressError);
            }
            *c = part.parse().map_err(|_| ParseAddressError)?;
        }

        match components.next() {
            Some(_) => Err(ParseAddressError),
            None => Ok(Address(parsed)),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an IPv4 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv4([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const VER_IHL:  usize = 0;
    pub(crate) const DSCP_ECN: usize = 1;
    pub(crate) const LENGTH:   Field = 2..4;
    pub(crate) const IDENT:    Field = 4..6;
    pub(crate) const FLG_OFF:  Field = 6..8;
    pub(crate) const TTL:      usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const CHECKSUM: Field = 10..12;
    pub(crate) const SRC_ADDR: Field = 12..16;
    pub(crate) const DST_ADDR: Field = 16..20;

    pub(crate) const FLG_DF:   u16 = 0x4000;
    pub(crate) const FLG_MF:   u16 = 0x2000;
    pub(crate) const OFF_MASK: u16 = 0x1fff;
}

/// The length of a header without options.
pub const HEADER_LEN: usize = field::DST_ADDR.end;

impl ipv4 {
    /// View octets as IPv4 packet, unchecked.
    pub fn new_unchecked(data: &[u8]) -> &ipv4 {
        Self::__from_macro_new_unchecked(data)
    }

    /// View mutable octets as IPv4 packet, unchecked.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut ipv4 {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&ipv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Mutable version of [new_checked](#method.new_checked).
    pub fn new_checked_mut(data: &mut [u8]) -> Result<&mut ipv4> {
        Self::new_checked(&data[..])?;
        Ok(Self::new_unchecked_mut(data))
    }

    /// All octets of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// All octets of the packet, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Check that every accessor stays in bounds.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is shorter than the header length or the
    /// total length field, and `Err(Error::Malformed)` if the header length is smaller than the
    /// fixed header or the total length smaller than the header length.
    ///
    /// The result of this check is invalidated by calling [set_header_len]
    /// and [set_total_len].
    ///
    /// [set_header_len]: #method.set_header_len
    /// [set_total_len]: #method.set_total_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            return Err(Error::Truncated);
        }

        let header_len = self.header_len() as usize;
        let total_len = self.total_len() as usize;
        if header_len < HEADER_LEN || total_len < header_len {
            Err(Error::Malformed)
        } else if len < header_len || len < total_len {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The version.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_IHL] >> 4
    }

    /// The header length in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        (self.0[field::VER_IHL] & 0x0f) * 4
    }

    /// The type of service.
    #[inline]
    pub fn dscp_ecn(&self) -> u8 {
        self.0[field::DSCP_ECN]
    }

    /// The total length.
    #[inline]
    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// The fragment identification.
    #[inline]
    pub fn ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::IDENT])
    }

    /// Return the "don't fragment" flag.
    #[inline]
    pub fn dont_frag(&self) -> bool {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) & field::FLG_DF != 0
    }

    /// Return the "more fragments" flag.
    #[inline]
    pub fn more_frags(&self) -> bool {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) & field::FLG_MF != 0
    }

    /// Return the fragment offset, in octets.
    #[inline]
    pub fn frag_offset(&self) -> u16 {
        (NetworkEndian::read_u16(&self.0[field::FLG_OFF]) & field::OFF_MASK) << 3
    }

    /// The time to live.
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::TTL]
    }

    /// The protocol.
    #[inline]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.0[field::PROTOCOL])
    }

    /// The header checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// The source address.
    #[inline]
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SRC_ADDR])
    }

    /// The destination address.
    #[inline]
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DST_ADDR])
    }

    /// Validate the header checksum.
    pub fn verify_checksum(&self) -> bool {
        let header = &self.0[..usize::from(self.header_len())];
        checksum::compute(header) == 0
    }

    /// Set the version field and header length in one go.
    ///
    /// The header length is given in octets and must be a multiple of four.
    #[inline]
    pub fn set_version_and_header_len(&mut self, version: u8, header_len: u8) {
        self.0[field::VER_IHL] = (version << 4) | (header_len / 4);
    }

    /// Write the type of service.
    #[inline]
    pub fn set_dscp_ecn(&mut self, value: u8) {
        self.0[field::DSCP_ECN] = value;
    }

    /// Write the total length.
    #[inline]
    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Write the fragment identification.
    #[inline]
    pub fn set_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::IDENT], value)
    }

    /// Set the flags and fragment offset to "don't fragment" and zero offset, or clear them.
    #[inline]
    pub fn set_dont_frag(&mut self, value: bool) {
        let raw = if value { field::FLG_DF } else { 0 };
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw)
    }

    /// Write the time to live.
    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        self.0[field::TTL] = value
    }

    /// Write the protocol.
    #[inline]
    pub fn set_protocol(&mut self, value: Protocol) {
        self.0[field::PROTOCOL] = value.into()
    }

    /// Write the header checksum.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Write the source address.
    #[inline]
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SRC_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Write the destination address.
    #[inline]
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DST_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Compute and fill in the header checksum.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = {
            let header = &self.0[..usize::from(self.header_len())];
            checksum::compute(header)
        };
        self.set_checksum(checksum)
    }

    /// The payload octets.
    ///
    /// Bytes beyond the total length, such as Ethernet padding, are not part of the payload.
    pub fn payload_slice(&self) -> &[u8] {
        let range = self.payload_range();
        &self.0[range]
    }

    /// The payload octets, mutably.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let range = self.payload_range();
        &mut self.0[range]
    }

    fn payload_range(&self) -> core::ops::Range<usize> {
        usize::from(self.header_len())..usize::from(self.total_len())
    }
}

impl AsRef<[u8]> for ipv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The parts of an IPv4 header that vary between our packets.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_addr:    Address,
    pub dst_addr:    Address,
    pub protocol:    Protocol,
    pub payload_len: usize,
    pub hop_limit:   u8,
}

impl Repr {
    /// Read an IPv4 header into its representation.
    pub fn parse(packet: &ipv4, checksum: Checksum) -> Result<Repr> {
        packet.check_len()?;
        // Version 4 is expected.
        if packet.version() != 4 { return Err(Error::Malformed) }
        // Valid checksum is expected.
        if checksum.manual() && !packet.verify_checksum() { return Err(Error::WrongChecksum) }
        // We do not reassemble.
        if packet.more_frags() || packet.frag_offset() != 0 { return Err(Error::Unsupported) }

        Ok(Repr {
            src_addr:    packet.src_addr(),
            dst_addr:    packet.dst_addr(),
            protocol:    packet.protocol(),
            payload_len: packet.payload_slice().len(),
            hop_limit:   packet.hop_limit(),
        })
    }

    /// The header of a reply: addresses swapped, our own hop limit.
    pub fn reply(&self, payload_len: usize) -> Repr {
        Repr {
            src_addr: self.dst_addr,
            dst_addr: self.src_addr,
            protocol: self.protocol,
            payload_len,
            hop_limit: DEFAULT_HOP_LIMIT,
        }
    }

    /// Length of the header `emit` writes.
    pub fn buffer_len(&self) -> usize {
        // We never emit any options.
        HEADER_LEN
    }

    /// Write the representation into an IPv4 header.
    ///
    /// Every datagram is sent with identification zero and "don't fragment".
    pub fn emit(&self, packet: &mut ipv4, checksum: Checksum) {
        packet.set_version_and_header_len(4, HEADER_LEN as u8);
        packet.set_dscp_ecn(0);
        let total_len = packet.as_bytes().len().min(self.buffer_len() + self.payload_len);
        packet.set_total_len(total_len as u16);
        packet.set_ident(0);
        packet.set_dont_frag(true);
        packet.set_hop_limit(self.hop_limit);
        packet.set_protocol(self.protocol);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);

        if checksum.manual() {
            packet.fill_checksum();
        } else {
            // make sure we get a consistently zeroed checksum,
            // since implementations might rely on it
            packet.set_checksum(0);
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IPv4 src={} dst={} proto={} len={} ttl={}",
               self.src_addr, self.dst_addr, self.protocol, self.payload_len, self.hop_limit)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static PACKET_BYTES: [u8; 24] =
        [0x45, 0x00, 0x00, 0x18,
         0x00, 0x00, 0x40, 0x00,
         0x80, 0x01, 0x65, 0x08,
         0xc0, 0xa8, 0x0a, 0x02,
         0xc0, 0xa8, 0x0a, 0x8a,
         0xaa, 0x00, 0x00, 0xff];

    static PAYLOAD_BYTES: [u8; 4] =
        [0xaa, 0x00, 0x00, 0xff];

    fn packet_repr() -> Repr {
        Repr {
            src_addr:    Address::new(192, 168, 10, 2),
            dst_addr:    Address::new(192, 168, 10, 138),
            protocol:    Protocol::Icmp,
            payload_len: 4,
            hop_limit:   128,
        }
    }

    #[test]
    fn test_deconstruct() {
        let packet = ipv4::new_checked(&PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.header_len(), 20);
        assert_eq!(packet.total_len(), 24);
        assert_eq!(packet.ident(), 0);
        assert!(packet.dont_frag());
        assert!(!packet.more_frags());
        assert_eq!(packet.frag_offset(), 0);
        assert_eq!(packet.hop_limit(), 128);
        assert_eq!(packet.protocol(), Protocol::Icmp);
        assert_eq!(packet.checksum(), 0x6508);
        assert_eq!(packet.src_addr(), Address::new(192, 168, 10, 2));
        assert_eq!(packet.dst_addr(), Address::new(192, 168, 10, 138));
        assert!(packet.verify_checksum());
        assert_eq!(packet.payload_slice(), &PAYLOAD_BYTES[..]);
    }

    #[test]
    fn test_parse() {
        let packet = ipv4::new_unchecked(&PACKET_BYTES[..]);
        let repr = Repr::parse(packet, Checksum::Manual).unwrap();
        assert_eq!(repr, packet_repr());
    }

    #[test]
    fn test_emit() {
        let repr = packet_repr();
        let mut bytes = vec![0xa5; repr.buffer_len() + PAYLOAD_BYTES.len()];
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        repr.emit(packet, Checksum::Manual);
        packet.payload_mut_slice().copy_from_slice(&PAYLOAD_BYTES[..]);
        assert_eq!(packet.as_bytes(), &PACKET_BYTES[..]);
    }

    #[test]
    fn test_wrong_checksum() {
        let mut bytes = PACKET_BYTES;
        bytes[11] ^= 0x01;
        let packet = ipv4::new_unchecked(&bytes[..]);
        assert!(!packet.verify_checksum());
        assert_eq!(Repr::parse(packet, Checksum::Manual), Err(Error::WrongChecksum));
        assert!(Repr::parse(packet, Checksum::Ignored).is_ok());
    }

    #[test]
    fn test_padding_excluded() {
        // Ethernet pads short frames, the total length field wins.
        let mut bytes = PACKET_BYTES.to_vec();
        bytes.extend_from_slice(&[0; 22]);
        let packet = ipv4::new_checked(&bytes).unwrap();
        assert_eq!(packet.payload_slice(), &PAYLOAD_BYTES[..]);
    }

    #[test]
    fn test_total_len_overflow() {
        let mut bytes = PACKET_BYTES;
        ipv4::new_unchecked_mut(&mut bytes).set_total_len(128);
        assert_eq!(ipv4::new_checked(&bytes[..]), Err(Error::Truncated));
        ipv4::new_unchecked_mut(&mut bytes).set_total_len(12);
        assert_eq!(ipv4::new_checked(&bytes[..]), Err(Error::Malformed));
    }

    #[test]
    fn address_parse() {
        assert_eq!("192.168.10.138".parse::<Address>(), Ok(Address::new(192, 168, 10, 138)));
        assert_eq!("192.168.10".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("192.168.10.1.1".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("192.168.10.256".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("192.168.+1.1".parse::<Address>(), Err(ParseAddressError));
        assert_eq!(format!("{}", Address::new(255, 255, 255, 0)), "255.255.255.0");
    }
}
