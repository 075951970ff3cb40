//! Answering ICMP echo requests.
use crate::wire::{
    ethernet_frame, icmpv4_packet, ipv4_packet, Checksum, EthernetRepr, Icmpv4Repr, IpProtocol,
    Ipv4Repr,
};
use crate::wire::{ethernet, ipv4};

use super::{strip_ipv4_options, Error, Result};

/// Turn a received echo request into the echo reply, in place.
///
/// Ethernet and IP addresses are swapped, the type becomes echo reply and identifier, sequence
/// number and payload are echoed unchanged. The echoed payload is the IP payload minus the eight
/// octet echo header. Returns the length of the frame to transmit.
pub fn echo_reply(buffer: &mut [u8]) -> Result<usize> {
    let eth_repr = {
        let eth = ethernet_frame::new_checked(buffer)?;
        EthernetRepr::parse(eth)?
    };

    let ip_bytes = &mut buffer[ethernet::HEADER_LEN..];
    strip_ipv4_options(ip_bytes)?;

    let (ip_repr, echo) = {
        let ip = ipv4_packet::new_checked(ip_bytes)?;
        let ip_repr = Ipv4Repr::parse(ip, Checksum::Ignored)?;
        if ip_repr.protocol != IpProtocol::Icmp {
            return Err(Error::Illegal);
        }
        let icmp = icmpv4_packet::new_checked(ip.payload_slice())?;
        let echo = Icmpv4Repr::parse(icmp, Checksum::Ignored)?
            .echo_reply()
            .ok_or(Error::Illegal)?;
        (ip_repr, echo)
    };

    let reply_ip = ip_repr.reply(echo.buffer_len());
    let len = ethernet::HEADER_LEN + ipv4::HEADER_LEN + reply_ip.payload_len;

    let eth = ethernet_frame::new_unchecked_mut(&mut buffer[..len]);
    eth_repr.reply().emit(eth);
    let ip = ipv4_packet::new_unchecked_mut(eth.payload_mut_slice());
    reply_ip.emit(ip, Checksum::Manual);
    echo.emit(icmpv4_packet::new_unchecked_mut(ip.payload_mut_slice()), Checksum::Manual);

    net_trace!("icmp: {} to {}", echo, reply_ip.dst_addr);
    Ok(len)
}
