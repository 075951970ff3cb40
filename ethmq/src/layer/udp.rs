//! Answering UDP datagrams.
//!
//! There are no sockets: whatever arrives is offered to the application, which may write a reply
//! payload. The reply travels back to where the request came from.
use crate::wire::{
    ethernet_frame, ipv4_packet, udp_packet, Checksum, EthernetRepr, IpProtocol, Ipv4Repr,
    UdpRepr,
};
use crate::wire::{ethernet, ipv4, udp as udp_wire};

use super::{ensure_len, strip_ipv4_options, Error, Result};

/// The offset of the UDP payload in a frame with a plain IPv4 header.
pub const PAYLOAD_OFFSET: usize = ethernet::HEADER_LEN + ipv4::HEADER_LEN + udp_wire::HEADER_LEN;

/// A received datagram, located in the frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Datagram {
    /// The port the datagram was sent to.
    pub dst_port: u16,
    /// The port it came from.
    pub src_port: u16,
    /// The payload length.
    pub payload_len: usize,
}

/// Prepare a received datagram for an in-place reply.
///
/// Any IPv4 options are dropped so that the payload starts at [`PAYLOAD_OFFSET`], where the
/// application may overwrite it with the reply.
///
/// [`PAYLOAD_OFFSET`]: constant.PAYLOAD_OFFSET.html
pub fn accept(buffer: &mut [u8]) -> Result<Datagram> {
    ethernet_frame::new_checked(buffer)?;
    strip_ipv4_options(&mut buffer[ethernet::HEADER_LEN..])?;

    let ip = ipv4_packet::new_checked(&buffer[ethernet::HEADER_LEN..])?;
    let ip_repr = Ipv4Repr::parse(ip, Checksum::Ignored)?;
    if ip_repr.protocol != IpProtocol::Udp {
        return Err(Error::Illegal);
    }
    let udp = udp_packet::new_checked(ip.payload_slice())?;
    let repr = UdpRepr::parse(udp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Ignored)?;

    Ok(Datagram {
        dst_port: repr.dst_port,
        src_port: repr.src_port,
        payload_len: repr.payload_len,
    })
}

/// Turn a received datagram into a reply whose payload is already in place.
///
/// Ethernet and IP addressing are swapped, the reply source port is the request destination
/// port and vice versa. IP total length and both checksums are recomputed. Returns the length of
/// the frame to transmit.
pub fn reply_in_place(buffer: &mut [u8], payload_len: usize) -> Result<usize> {
    let len = PAYLOAD_OFFSET + payload_len;
    ensure_len(buffer, len)?;

    let (eth_repr, ip_repr, udp_repr) = {
        let eth = ethernet_frame::new_checked(buffer)?;
        let ip = ipv4_packet::new_checked(eth.payload_slice())?;
        let ip_repr = Ipv4Repr::parse(ip, Checksum::Ignored)?;
        if ip.header_len() as usize != ipv4::HEADER_LEN || ip_repr.protocol != IpProtocol::Udp {
            return Err(Error::Illegal);
        }
        let udp = udp_packet::new_checked(ip.payload_slice())?;
        let udp_repr = UdpRepr::parse(udp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Ignored)?;
        (EthernetRepr::parse(eth)?, ip_repr, udp_repr)
    };

    let udp_repr = udp_repr.reply(payload_len);
    let ip_repr = ip_repr.reply(udp_repr.buffer_len());

    let eth = ethernet_frame::new_unchecked_mut(&mut buffer[..len]);
    eth_repr.reply().emit(eth);
    let ip = ipv4_packet::new_unchecked_mut(eth.payload_mut_slice());
    ip_repr.emit(ip, Checksum::Manual);
    let udp = udp_packet::new_unchecked_mut(ip.payload_mut_slice());
    udp_repr.emit(udp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Manual);

    net_trace!("udp: {} to {}", udp_repr, ip_repr.dst_addr);
    Ok(len)
}

/// Turn a received datagram into a reply carrying `payload`.
pub fn reply(buffer: &mut [u8], payload: &[u8]) -> Result<usize> {
    accept(buffer)?;
    ensure_len(buffer, PAYLOAD_OFFSET + payload.len())?;
    buffer[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
    reply_in_place(buffer, payload.len())
}
