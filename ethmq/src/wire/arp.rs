use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::ethernet::{Address as EthernetAddress, EtherType};
use super::ipv4::Address as Ipv4Address;

enum_with_unknown! {
    /// ARP hardware type.
    pub enum Hardware(u16) {
        Ethernet = 1
    }
}

enum_with_unknown! {
    /// ARP operation type.
    pub enum Operation(u16) {
        Request = 1,
        Reply = 2
    }
}

byte_wrapper! {
    /// A byte sequence representing an ARP packet for Ethernet and IPv4.
    #[derive(Debug, PartialEq, Eq)]
    pub struct arp([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const HTYPE: Field = 0..2;
    pub(crate) const PTYPE: Field = 2..4;
    pub(crate) const HLEN: usize = 4;
    pub(crate) const PLEN: usize = 5;
    pub(crate) const OPER: Field = 6..8;
    pub(crate) const SHA:  Field = 8..14;
    pub(crate) const SPA:  Field = 14..18;
    pub(crate) const THA:  Field = 18..24;
    pub(crate) const TPA:  Field = 24..28;
}

/// The length of an Ethernet/IPv4 ARP packet.
pub const PACKET_LEN: usize = field::TPA.end;

impl arp {
    /// View octets as ARP packet, unchecked.
    pub fn new_unchecked(buffer: &[u8]) -> &arp {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// View mutable octets as ARP packet, unchecked.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut arp {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&arp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// All octets of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check that every accessor stays in bounds, `Error::Truncated` otherwise.
    ///
    /// Only the Ethernet/IPv4 flavour with its fixed 28 byte layout is handled, other hardware or
    /// protocol lengths are rejected in [`Repr::parse`].
    ///
    /// [`Repr::parse`]: enum.Repr.html#method.parse
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < PACKET_LEN {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The hardware type.
    #[inline]
    pub fn hardware_type(&self) -> Hardware {
        Hardware::from(NetworkEndian::read_u16(&self.0[field::HTYPE]))
    }

    /// The protocol type.
    #[inline]
    pub fn protocol_type(&self) -> EtherType {
        EtherType::from(NetworkEndian::read_u16(&self.0[field::PTYPE]))
    }

    /// The hardware length.
    #[inline]
    pub fn hardware_len(&self) -> u8 {
        self.0[field::HLEN]
    }

    /// The protocol length.
    #[inline]
    pub fn protocol_len(&self) -> u8 {
        self.0[field::PLEN]
    }

    /// The operation.
    #[inline]
    pub fn operation(&self) -> Operation {
        Operation::from(NetworkEndian::read_u16(&self.0[field::OPER]))
    }

    /// The source hardware address.
    pub fn source_hardware_addr(&self) -> EthernetAddress {
        EthernetAddress::from_bytes(&self.0[field::SHA])
    }

    /// The source protocol address.
    pub fn source_protocol_addr(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.0[field::SPA])
    }

    /// The target hardware address.
    pub fn target_hardware_addr(&self) -> EthernetAddress {
        EthernetAddress::from_bytes(&self.0[field::THA])
    }

    /// The target protocol address.
    pub fn target_protocol_addr(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.0[field::TPA])
    }

    /// Write the hardware type.
    #[inline]
    pub fn set_hardware_type(&mut self, value: Hardware) {
        NetworkEndian::write_u16(&mut self.0[field::HTYPE], value.into())
    }

    /// Write the protocol type.
    #[inline]
    pub fn set_protocol_type(&mut self, value: EtherType) {
        NetworkEndian::write_u16(&mut self.0[field::PTYPE], value.into())
    }

    /// Write the hardware length.
    #[inline]
    pub fn set_hardware_len(&mut self, value: u8) {
        self.0[field::HLEN] = value
    }

    /// Write the protocol length.
    #[inline]
    pub fn set_protocol_len(&mut self, value: u8) {
        self.0[field::PLEN] = value
    }

    /// Write the operation.
    #[inline]
    pub fn set_operation(&mut self, value: Operation) {
        NetworkEndian::write_u16(&mut self.0[field::OPER], value.into())
    }

    /// Write the source hardware address.
    pub fn set_source_hardware_addr(&mut self, value: EthernetAddress) {
        self.0[field::SHA].copy_from_slice(value.as_bytes())
    }

    /// Write the source protocol address.
    pub fn set_source_protocol_addr(&mut self, value: Ipv4Address) {
        self.0[field::SPA].copy_from_slice(value.as_bytes())
    }

    /// Write the target hardware address.
    pub fn set_target_hardware_addr(&mut self, value: EthernetAddress) {
        self.0[field::THA].copy_from_slice(value.as_bytes())
    }

    /// Write the target protocol address.
    pub fn set_target_protocol_addr(&mut self, value: Ipv4Address) {
        self.0[field::TPA].copy_from_slice(value.as_bytes())
    }
}

impl AsRef<[u8]> for arp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The fields of an Ethernet/IPv4 ARP packet that carry meaning.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub operation: Operation,
    pub source_hardware_addr: EthernetAddress,
    pub source_protocol_addr: Ipv4Address,
    pub target_hardware_addr: EthernetAddress,
    pub target_protocol_addr: Ipv4Address,
}

impl Repr {
    /// Read an ARP packet into its representation.
    ///
    /// Only Ethernet/IPv4 requests and replies are understood, anything else is
    /// `Error::Unrecognized`.
    pub fn parse(packet: &arp) -> Result<Repr> {
        packet.check_len()?;

        match (packet.hardware_type(), packet.protocol_type(),
               packet.hardware_len(), packet.protocol_len()) {
            (Hardware::Ethernet, EtherType::Ipv4, 6, 4) => {
                Ok(Repr {
                    operation: packet.operation(),
                    source_hardware_addr: packet.source_hardware_addr(),
                    source_protocol_addr: packet.source_protocol_addr(),
                    target_hardware_addr: packet.target_hardware_addr(),
                    target_protocol_addr: packet.target_protocol_addr(),
                })
            },
            _ => Err(Error::Unrecognized)
        }
    }

    /// The answer to a request: we become the source, the requester becomes the target.
    pub fn reply(&self, hardware_addr: EthernetAddress, protocol_addr: Ipv4Address) -> Repr {
        Repr {
            operation: Operation::Reply,
            source_hardware_addr: hardware_addr,
            source_protocol_addr: protocol_addr,
            target_hardware_addr: self.source_hardware_addr,
            target_protocol_addr: self.source_protocol_addr,
        }
    }

    /// Length of header and payload together.
    pub fn buffer_len(&self) -> usize {
        PACKET_LEN
    }

    /// Write the representation into an ARP packet.
    pub fn emit(&self, packet: &mut arp) {
        packet.set_hardware_type(Hardware::Ethernet);
        packet.set_protocol_type(EtherType::Ipv4);
        packet.set_hardware_len(6);
        packet.set_protocol_len(4);
        packet.set_operation(self.operation);
        packet.set_source_hardware_addr(self.source_hardware_addr);
        packet.set_source_protocol_addr(self.source_protocol_addr);
        packet.set_target_hardware_addr(self.target_hardware_addr);
        packet.set_target_protocol_addr(self.target_protocol_addr);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ARP type=Ethernet+IPv4 src={}/{} tgt={}/{} op={:?}",
               self.source_hardware_addr, self.source_protocol_addr,
               self.target_hardware_addr, self.target_protocol_addr,
               self.operation)
    }
}
