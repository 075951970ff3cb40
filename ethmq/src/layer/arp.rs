//! Answering and sending ARP.
use crate::wire::{
    arp_packet, ethernet_frame, ArpOperation, ArpRepr, EthernetAddress, EthernetProtocol,
    EthernetRepr, Ipv4Address,
};
use crate::wire::{arp::PACKET_LEN, ethernet::HEADER_LEN};

use super::{ensure_len, Error, Local, Result};

/// The length of every ARP frame we send.
pub const FRAME_LEN: usize = HEADER_LEN + PACKET_LEN;

/// Parse the ARP packet of a received frame.
pub fn parse(frame: &[u8]) -> Result<ArpRepr> {
    let eth = ethernet_frame::new_checked(frame)?;
    if eth.ethertype() != EthernetProtocol::Arp {
        return Err(Error::Illegal);
    }
    let repr = ArpRepr::parse(arp_packet::new_checked(eth.payload_slice())?)?;
    Ok(repr)
}

/// Turn a received ARP request for our address into the reply, in place.
///
/// The reply goes back to the requester: we become the sender with our own hardware and protocol
/// address, the requester becomes the target. Returns the length of the frame to transmit.
pub fn reply(buffer: &mut [u8], local: &Local) -> Result<usize> {
    let request = parse(buffer)?;
    if request.operation != ArpOperation::Request || request.target_protocol_addr != local.ip_addr {
        return Err(Error::Illegal);
    }
    ensure_len(buffer, FRAME_LEN)?;

    let reply = request.reply(local.hardware_addr, local.ip_addr);
    emit(buffer, local.hardware_addr, request.source_hardware_addr, &reply);

    net_trace!("arp: reply to {} at {}", request.source_protocol_addr, request.source_hardware_addr);
    Ok(FRAME_LEN)
}

/// Build a broadcast request for the hardware address of `target`.
///
/// The target hardware address is sent as all ones.
pub fn request(buffer: &mut [u8], local: &Local, target: Ipv4Address) -> Result<usize> {
    ensure_len(buffer, FRAME_LEN)?;

    let request = ArpRepr {
        operation: ArpOperation::Request,
        source_hardware_addr: local.hardware_addr,
        source_protocol_addr: local.ip_addr,
        target_hardware_addr: EthernetAddress::BROADCAST,
        target_protocol_addr: target,
    };
    emit(buffer, local.hardware_addr, EthernetAddress::BROADCAST, &request);

    net_trace!("arp: who has {}", target);
    Ok(FRAME_LEN)
}

fn emit(buffer: &mut [u8], src_addr: EthernetAddress, dst_addr: EthernetAddress, repr: &ArpRepr) {
    let eth = ethernet_frame::new_unchecked_mut(&mut buffer[..FRAME_LEN]);
    EthernetRepr {
        src_addr,
        dst_addr,
        ethertype: EthernetProtocol::Arp,
    }.emit(eth);
    repr.emit(arp_packet::new_unchecked_mut(eth.payload_mut_slice()));
}
