use core::{fmt, str::FromStr};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

enum_with_unknown! {
    /// Ethernet protocol type.
    pub enum EtherType(u16) {
        Ipv4 = 0x0800,
        Arp  = 0x0806,
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Arp  => write!(f, "ARP"),
            EtherType::Unknown(id) => write!(f, "0x{:04x}", id)
        }
    }
}

/// A six-octet Ethernet II address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 6]);

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address([0xff; 6]);

    /// Construct an Ethernet address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an Ethernet address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the address is all zeroes, which we use for "not yet known".
    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; 6]
    }
}

/// Error from parsing a colon separated Ethernet address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAddressError {
    kind: ParseAddressErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParseAddressErrorKind {
    ComponentError,
    SeparatorError,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
               bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
    }
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self.kind {
            ParseAddressErrorKind::ComponentError => "invalid ethernet component",
            ParseAddressErrorKind::SeparatorError => "expected six colon separated components",
        })
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let separator = ParseAddressError { kind: ParseAddressErrorKind::SeparatorError };
        let component = ParseAddressError { kind: ParseAddressErrorKind::ComponentError };

        let mut parsed = [0; 6];
        let mut components = src.split(':');
        for c in parsed.iter_mut() {
            let part = components.next().ok_or_else(|| separator.clone())?;
            *c = u8::from_str_radix(part, 16).map_err(|_| component.clone())?;
        }

        match components.next() {
            Some(_) => Err(separator),
            None => Ok(Address(parsed)),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an Ethernet II frame.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ethernet([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const DESTINATION: Field =  0..6;
    pub(crate) const SOURCE:      Field =  6..12;
    pub(crate) const ETHERTYPE:   Field = 12..14;
    pub(crate) const PAYLOAD:     Rest  = 14..;
}

/// The length of an Ethernet II header.
pub const HEADER_LEN: usize = field::PAYLOAD.start;

impl ethernet {
    /// View octets as Ethernet frame, unchecked.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// View mutable octets as Ethernet frame, unchecked.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        Self::new_unchecked(data).check_len()?;
        Ok(Self::new_unchecked(data))
    }

    /// Mutable version of [new_checked](#method.new_checked).
    pub fn new_checked_mut(data: &mut [u8]) -> Result<&mut Self> {
        Self::new_checked(&data[..])?;
        Ok(Self::new_unchecked_mut(data))
    }

    /// All octets of the frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// All octets of the frame, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Check that every accessor stays in bounds, `Error::Truncated` otherwise.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < field::PAYLOAD.start {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The destination address.
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DESTINATION])
    }

    /// The source address.
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SOURCE])
    }

    /// The EtherType.
    pub fn ethertype(&self) -> EtherType {
        let raw = NetworkEndian::read_u16(&self.0[field::ETHERTYPE]);
        EtherType::from(raw)
    }

    /// Write the destination address.
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DESTINATION].copy_from_slice(value.as_bytes())
    }

    /// Write the source address.
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SOURCE].copy_from_slice(value.as_bytes())
    }

    /// Write the EtherType.
    pub fn set_ethertype(&mut self, value: EtherType) {
        NetworkEndian::write_u16(&mut self.0[field::ETHERTYPE], value.into())
    }

    /// The payload octets.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::PAYLOAD]
    }

    /// The payload octets, mutably.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::PAYLOAD]
    }
}

impl AsRef<[u8]> for ethernet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The addressing of an Ethernet II frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_addr:    Address,
    pub dst_addr:    Address,
    pub ethertype:   EtherType,
}

impl Repr {
    /// Read an Ethernet II frame into its representation.
    pub fn parse(frame: &ethernet) -> Result<Repr> {
        frame.check_len()?;
        Ok(Repr {
            src_addr: frame.src_addr(),
            dst_addr: frame.dst_addr(),
            ethertype: frame.ethertype(),
        })
    }

    /// The reply header: addresses swapped, same EtherType.
    pub fn reply(&self) -> Repr {
        Repr {
            src_addr: self.dst_addr,
            dst_addr: self.src_addr,
            ethertype: self.ethertype,
        }
    }

    /// Length of the header `emit` writes.
    pub fn header_len(&self) -> usize {
        field::PAYLOAD.start
    }

    /// Write the representation into an Ethernet II frame.
    pub fn emit(&self, frame: &mut ethernet) {
        frame.set_src_addr(self.src_addr);
        frame.set_dst_addr(self.dst_addr);
        frame.set_ethertype(self.ethertype);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EthernetII src={} dst={} type={}",
               self.src_addr, self.dst_addr, self.ethertype)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static FRAME_BYTES: [u8; 18] =
        [0x02, 0x03, 0x04, 0x05, 0x06, 0x8a,
         0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
         0x08, 0x06,
         0x00, 0x01, 0x08, 0x00];

    #[test]
    fn test_deconstruct() {
        let frame = ethernet::new_checked(&FRAME_BYTES[..]).unwrap();
        assert_eq!(frame.dst_addr(), Address([0x02, 0x03, 0x04, 0x05, 0x06, 0x8a]));
        assert_eq!(frame.src_addr(), Address([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert_eq!(frame.ethertype(), EtherType::Arp);
        assert_eq!(frame.payload_slice(), &FRAME_BYTES[14..]);
    }

    #[test]
    fn test_construct() {
        let mut bytes = vec![0xa5; 18];
        let frame = ethernet::new_unchecked_mut(&mut bytes);
        Repr {
            dst_addr: Address([0x02, 0x03, 0x04, 0x05, 0x06, 0x8a]),
            src_addr: Address([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            ethertype: EtherType::Arp,
        }.emit(frame);
        frame.payload_mut_slice().copy_from_slice(&FRAME_BYTES[14..]);
        assert_eq!(frame.as_bytes(), &FRAME_BYTES[..]);
    }

    #[test]
    fn test_truncated() {
        assert_eq!(ethernet::new_checked(&FRAME_BYTES[..13]), Err(Error::Truncated));
    }

    #[test]
    fn address_format() {
        let addr = Address([0x1c, 0x69, 0x7a, 0x07, 0x94, 0xe3]);
        assert_eq!(format!("{}", addr), "1c:69:7a:07:94:e3");
        assert_eq!("1c:69:7a:07:94:e3".parse::<Address>(), Ok(addr));
        assert!("1c:69:7a:07:94".parse::<Address>().is_err());
        assert!("1c:69:7a:07:94:e3:00".parse::<Address>().is_err());
        assert!("1c:69:7a:07:94:zz".parse::<Address>().is_err());
    }
}
