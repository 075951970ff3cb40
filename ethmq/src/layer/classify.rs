//! Pure predicates over a received frame.
//!
//! Every predicate takes the valid bytes of one received Ethernet frame and parses only as deep
//! as it needs to. A frame that is too short for any header on the way answers `false`, so the
//! predicates can be asked in any order. None of them keeps state: asking twice gives the same
//! answer.
//!
//! The TCP predicates compare the whole flag octet, `is_ack` is true for a bare ACK only. The
//! MQTT predicates look at the first octet of the TCP payload.
use crate::wire::{
    arp_packet, ethernet_frame, icmpv4_packet, ipv4_packet, mqtt_packet, tcp_packet, udp_packet,
    ArpOperation, EthernetProtocol, Icmpv4Message, IpProtocol, Ipv4Address, MqttCode,
};

const FLAGS_SYN_ACK: u8 = 0x12;
const FLAGS_ACK: u8 = 0x10;
const FLAGS_PSH_ACK: u8 = 0x18;
const FLAGS_FIN_ACK: u8 = 0x11;

/// The kind of a TCP segment, as far as the session cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// SYN and ACK, answering our SYN.
    SynAck,
    /// FIN and ACK, the broker closing its side.
    FinAck,
    /// An MQTT CONNACK.
    ConnAck,
    /// An MQTT SUBACK.
    SubAck,
    /// An MQTT UNSUBACK.
    UnsubAck,
    /// An MQTT PINGRESP.
    PingResp,
    /// An MQTT PUBLISH from the broker.
    Publish,
    /// A bare ACK.
    Ack,
    /// PSH and ACK with a payload we do not recognize.
    PushAck,
    /// Anything else.
    Other,
}

/// The classification of a TCP segment together with its sequence bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    /// What the segment means to the session.
    pub kind: Kind,
    /// The source port, the broker's.
    pub src_port: u16,
    /// The destination port, ours.
    pub dst_port: u16,
    /// The sequence number of the segment.
    pub seq: u32,
    /// The acknowledgement number of the segment.
    pub ack: u32,
    /// The payload length plus one each for SYN and FIN.
    pub consumed: u32,
}

fn ipv4(frame: &[u8]) -> Option<&ipv4_packet> {
    let eth = ethernet_frame::new_checked(frame).ok()?;
    if eth.ethertype() != EthernetProtocol::Ipv4 {
        return None;
    }
    ipv4_packet::new_checked(eth.payload_slice()).ok()
}

fn ipv4_carrying(frame: &[u8], protocol: IpProtocol) -> Option<&ipv4_packet> {
    ipv4(frame).filter(|ip| ip.protocol() == protocol)
}

fn arp(frame: &[u8]) -> Option<&arp_packet> {
    let eth = ethernet_frame::new_checked(frame).ok()?;
    if eth.ethertype() != EthernetProtocol::Arp {
        return None;
    }
    arp_packet::new_checked(eth.payload_slice()).ok()
}

/// The TCP segment of a frame, if it carries one.
pub fn tcp(frame: &[u8]) -> Option<(&ipv4_packet, &tcp_packet)> {
    let ip = ipv4_carrying(frame, IpProtocol::Tcp)?;
    let tcp = tcp_packet::new_checked(ip.payload_slice()).ok()?;
    Some((ip, tcp))
}

/// The MQTT packet at the start of the TCP payload, if there is a payload.
pub fn mqtt(frame: &[u8]) -> Option<&mqtt_packet> {
    let (_, tcp) = tcp(frame)?;
    let payload = tcp.payload_slice();
    if payload.is_empty() {
        None
    } else {
        Some(mqtt_packet::new_unchecked(payload))
    }
}

fn first_payload_byte(frame: &[u8]) -> Option<u8> {
    mqtt(frame).map(|packet| packet.control())
}

fn flag_byte(frame: &[u8]) -> Option<u8> {
    tcp(frame).map(|(_, tcp)| tcp.flag_byte())
}

/// The frame is IPv4 and its header checksum verifies.
pub fn is_ip(frame: &[u8]) -> bool {
    ipv4(frame).map_or(false, |ip| ip.verify_checksum())
}

/// The frame is IPv4 and addressed to `local` exactly.
pub fn is_ip_unicast(frame: &[u8], local: Ipv4Address) -> bool {
    ipv4(frame).map_or(false, |ip| ip.dst_addr() == local)
}

/// The frame is an ARP request for `local`.
pub fn is_arp_request(frame: &[u8], local: Ipv4Address) -> bool {
    arp(frame).map_or(false, |arp| {
        arp.operation() == ArpOperation::Request && arp.target_protocol_addr() == local
    })
}

/// The frame is an ARP reply sent to `local`.
pub fn is_arp_reply(frame: &[u8], local: Ipv4Address) -> bool {
    arp(frame).map_or(false, |arp| {
        arp.operation() == ArpOperation::Reply && arp.target_protocol_addr() == local
    })
}

/// The frame is an ICMP echo request.
pub fn is_ping_request(frame: &[u8]) -> bool {
    ipv4_carrying(frame, IpProtocol::Icmp)
        .and_then(|ip| icmpv4_packet::new_checked(ip.payload_slice()).ok())
        .map_or(false, |icmp| icmp.msg_type() == Icmpv4Message::EchoRequest)
}

/// The frame is UDP and its pseudo-header checksum verifies.
pub fn is_udp_valid(frame: &[u8]) -> bool {
    ipv4_carrying(frame, IpProtocol::Udp).map_or(false, |ip| {
        udp_packet::new_checked(ip.payload_slice())
            .map_or(false, |udp| udp.verify_checksum(ip.src_addr(), ip.dst_addr()))
    })
}

/// The frame is TCP.
///
/// The checksum is not looked at, see [`is_tcp_checksum_valid`].
///
/// [`is_tcp_checksum_valid`]: fn.is_tcp_checksum_valid.html
pub fn is_tcp(frame: &[u8]) -> bool {
    tcp(frame).is_some()
}

/// The frame is TCP and its pseudo-header checksum verifies.
pub fn is_tcp_checksum_valid(frame: &[u8]) -> bool {
    tcp(frame).map_or(false, |(ip, tcp)| tcp.verify_checksum(ip.src_addr(), ip.dst_addr()))
}

/// The flag octet is exactly SYN+ACK.
pub fn is_syn_ack(frame: &[u8]) -> bool {
    flag_byte(frame) == Some(FLAGS_SYN_ACK)
}

/// The flag octet is exactly ACK.
pub fn is_ack(frame: &[u8]) -> bool {
    flag_byte(frame) == Some(FLAGS_ACK)
}

/// The flag octet is exactly PSH+ACK.
pub fn is_push_ack(frame: &[u8]) -> bool {
    flag_byte(frame) == Some(FLAGS_PSH_ACK)
}

/// The flag octet is exactly FIN+ACK.
pub fn is_fin_ack(frame: &[u8]) -> bool {
    flag_byte(frame) == Some(FLAGS_FIN_ACK)
}

/// The TCP payload starts with a CONNACK.
pub fn is_connect_ack(frame: &[u8]) -> bool {
    first_payload_byte(frame) == Some(MqttCode::ConnAck.into())
}

/// The TCP payload starts with a SUBACK.
pub fn is_sub_ack(frame: &[u8]) -> bool {
    first_payload_byte(frame) == Some(MqttCode::SubAck.into())
}

/// The TCP payload starts with an UNSUBACK.
pub fn is_unsub_ack(frame: &[u8]) -> bool {
    first_payload_byte(frame) == Some(MqttCode::UnsubAck.into())
}

/// The TCP payload starts with a PINGRESP.
pub fn is_ping_response(frame: &[u8]) -> bool {
    first_payload_byte(frame) == Some(MqttCode::PingResp.into())
}

/// The TCP payload starts with a PUBLISH of any QoS.
pub fn is_mqtt_publish(frame: &[u8]) -> bool {
    mqtt(frame).map_or(false, |packet| packet.packet_type() == 0x3)
}

/// Classify a TCP segment and compute the sequence space it consumed.
///
/// The first matching kind wins, in the order SYN+ACK, FIN+ACK, the MQTT packet types, bare ACK
/// and PSH+ACK.
pub fn segment(frame: &[u8]) -> Option<Segment> {
    let (_, tcp) = tcp(frame)?;

    let kind = if is_syn_ack(frame) {
        Kind::SynAck
    } else if is_fin_ack(frame) {
        Kind::FinAck
    } else if is_connect_ack(frame) {
        Kind::ConnAck
    } else if is_sub_ack(frame) {
        Kind::SubAck
    } else if is_unsub_ack(frame) {
        Kind::UnsubAck
    } else if is_ping_response(frame) {
        Kind::PingResp
    } else if is_mqtt_publish(frame) {
        Kind::Publish
    } else if is_ack(frame) {
        Kind::Ack
    } else if is_push_ack(frame) {
        Kind::PushAck
    } else {
        Kind::Other
    };

    Some(Segment {
        kind,
        src_port: tcp.src_port(),
        dst_port: tcp.dst_port(),
        seq: tcp.seq_number(),
        ack: tcp.ack_number(),
        consumed: tcp.sequence_len(),
    })
}
