//! Building the outbound segments of the MQTT session.
//!
//! Unlike the other builders these do not answer a received frame. Each one starts from an empty
//! buffer and fills Ethernet, IPv4 and TCP headers for the configured peer. Sequence numbers are
//! passed in, see [`session::Session::numbers`].
//!
//! [`session::Session::numbers`]: ../session/struct.Session.html#method.numbers
use rand::Rng;

use crate::wire::{
    ethernet_frame, ipv4_packet, mqtt_packet, tcp_packet, Checksum, EthernetProtocol,
    EthernetRepr, IpProtocol, Ipv4Repr, MqttRepr, TcpFlags, TcpRepr,
};
use crate::wire::{ethernet, ipv4, mqtt, tcp as tcp_wire};

use super::{ensure_len, Error, Local, Peer, Result};

/// The lowest ephemeral port we pick.
pub const EPHEMERAL_MIN: u16 = 1024;

/// The highest ephemeral port we pick.
pub const EPHEMERAL_MAX: u16 = 49151;

/// The addressing of our one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    /// Our addresses.
    pub local: Local,
    /// The broker.
    pub peer: Peer,
    /// Our ephemeral port.
    pub local_port: u16,
}

/// Sequence and acknowledgement number of an outbound segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Numbers {
    /// Our sequence number.
    pub seq: u32,
    /// The next sequence number we expect from the broker.
    pub ack: u32,
}

/// Choose a random ephemeral port in `EPHEMERAL_MIN..=EPHEMERAL_MAX`.
pub fn ephemeral_port<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.gen_range(EPHEMERAL_MIN..=EPHEMERAL_MAX)
}

/// Build the SYN opening the connection.
///
/// Sequence and acknowledgement number are zero, the only option is our maximum segment size.
pub fn syn(buffer: &mut [u8], conn: &Connection) -> Result<usize> {
    let repr = header(conn, TcpFlags::SYN, Numbers::default(), Some(tcp_wire::DEFAULT_MSS), 0);
    segment(buffer, conn, repr, |_| ())
}

/// Build a bare ACK.
pub fn ack(buffer: &mut [u8], conn: &Connection, numbers: Numbers) -> Result<usize> {
    let repr = header(conn, TcpFlags::ACK, numbers, None, 0);
    segment(buffer, conn, repr, |_| ())
}

/// Build a segment carrying one MQTT packet.
pub fn mqtt(
    buffer: &mut [u8],
    conn: &Connection,
    numbers: Numbers,
    flags: TcpFlags,
    packet: &MqttRepr,
) -> Result<usize> {
    let repr = header(conn, flags, numbers, None, packet.buffer_len());
    let len = segment(buffer, conn, repr, |payload| {
        packet.emit(mqtt_packet::new_unchecked_mut(payload))
    })?;
    net_debug!("tcp: {}", packet);
    Ok(len)
}

/// Build the MQTT CONNECT.
pub fn connect(
    buffer: &mut [u8],
    conn: &Connection,
    numbers: Numbers,
    client_id: &str,
    flags: u8,
    keep_alive: u16,
) -> Result<usize> {
    let packet = MqttRepr::Connect { client_id, flags, keep_alive };
    mqtt(buffer, conn, numbers, TcpFlags::PSH | TcpFlags::ACK, &packet)
}

/// Build an MQTT PUBLISH with QoS 0.
pub fn publish(
    buffer: &mut [u8],
    conn: &Connection,
    numbers: Numbers,
    topic: &str,
    message: &[u8],
) -> Result<usize> {
    let packet = MqttRepr::Publish { topic, message };
    mqtt(buffer, conn, numbers, TcpFlags::PSH | TcpFlags::ACK, &packet)
}

/// Build an MQTT SUBSCRIBE for one topic with QoS 0.
pub fn subscribe(buffer: &mut [u8], conn: &Connection, numbers: Numbers, topic: &str)
    -> Result<usize>
{
    let packet = MqttRepr::Subscribe { packet_id: mqtt::DEFAULT_PACKET_ID, topic, qos: 0 };
    mqtt(buffer, conn, numbers, TcpFlags::PSH | TcpFlags::ACK, &packet)
}

/// Build an MQTT UNSUBSCRIBE for one topic.
pub fn unsubscribe(buffer: &mut [u8], conn: &Connection, numbers: Numbers, topic: &str)
    -> Result<usize>
{
    let packet = MqttRepr::Unsubscribe { packet_id: mqtt::DEFAULT_PACKET_ID, topic };
    mqtt(buffer, conn, numbers, TcpFlags::PSH | TcpFlags::ACK, &packet)
}

/// Build the MQTT DISCONNECT, which also closes our side with FIN.
pub fn disconnect(buffer: &mut [u8], conn: &Connection, numbers: Numbers) -> Result<usize> {
    let flags = TcpFlags::FIN | TcpFlags::PSH | TcpFlags::ACK;
    mqtt(buffer, conn, numbers, flags, &MqttRepr::Disconnect)
}

/// Build an MQTT PINGREQ.
pub fn ping_request(buffer: &mut [u8], conn: &Connection, numbers: Numbers) -> Result<usize> {
    mqtt(buffer, conn, numbers, TcpFlags::PSH | TcpFlags::ACK, &MqttRepr::PingReq)
}

fn header(
    conn: &Connection,
    flags: TcpFlags,
    numbers: Numbers,
    max_seg_size: Option<u16>,
    payload_len: usize,
) -> TcpRepr {
    TcpRepr {
        src_port: conn.local_port,
        dst_port: conn.peer.port,
        flags,
        seq_number: numbers.seq,
        ack_number: numbers.ack,
        window_len: tcp_wire::DEFAULT_WINDOW,
        max_seg_size,
        payload_len,
    }
}

/// Emit all headers of a segment, with `fill` writing the payload before the checksum.
fn segment<F>(buffer: &mut [u8], conn: &Connection, repr: TcpRepr, fill: F) -> Result<usize>
    where F: FnOnce(&mut [u8])
{
    if conn.peer.hardware_addr.is_unspecified() {
        return Err(Error::Unreachable);
    }

    let ip_repr = Ipv4Repr {
        src_addr: conn.local.ip_addr,
        dst_addr: conn.peer.ip_addr,
        protocol: IpProtocol::Tcp,
        payload_len: repr.buffer_len(),
        hop_limit: ipv4::DEFAULT_HOP_LIMIT,
    };
    let len = ethernet::HEADER_LEN + ip_repr.buffer_len() + ip_repr.payload_len;
    ensure_len(buffer, len)?;

    let eth = ethernet_frame::new_unchecked_mut(&mut buffer[..len]);
    EthernetRepr {
        src_addr: conn.local.hardware_addr,
        dst_addr: conn.peer.hardware_addr,
        ethertype: EthernetProtocol::Ipv4,
    }.emit(eth);

    let ip = ipv4_packet::new_unchecked_mut(eth.payload_mut_slice());
    ip_repr.emit(ip, Checksum::Manual);

    let tcp = tcp_packet::new_unchecked_mut(ip.payload_mut_slice());
    // The header length must be in place before the payload can be located.
    tcp.set_header_len_and_flags(repr.header_len() as u8, repr.flags);
    fill(tcp.payload_mut_slice());
    repr.emit(tcp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Manual);

    net_trace!("tcp: {}", repr);
    Ok(len)
}
