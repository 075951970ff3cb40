use super::*;
use crate::layer::classify;
use crate::nic::loopback::Loopback;
use crate::nic::MAX_FRAME_LEN;
use crate::storage::MemoryStore;
use crate::wire::{
    ethernet_frame, ipv4_packet, tcp_packet, udp_packet, ArpOperation, ArpRepr, EthernetProtocol,
    EthernetRepr, IpProtocol, Ipv4Repr, TcpFlags, TcpRepr, UdpRepr,
};

const HOST_MAC: EthernetAddress = EthernetAddress([2, 3, 4, 5, 6, 138]);
const HOST_IP: Ipv4Address = Ipv4Address::new(192, 168, 10, 138);
const BROKER_MAC: EthernetAddress = EthernetAddress([0x1c, 0x69, 0x7a, 0x07, 0x94, 0xe3]);
const BROKER_IP: Ipv4Address = Ipv4Address::new(192, 168, 10, 2);

/// The broker's initial sequence number.
const ISN: u32 = 0x1000;

fn ip_frame(protocol: IpProtocol, src_addr: Ipv4Address, l4_len: usize) -> (Vec<u8>, Ipv4Repr) {
    let ip_repr = Ipv4Repr {
        src_addr,
        dst_addr: HOST_IP,
        protocol,
        payload_len: l4_len,
        hop_limit: 64,
    };
    let mut frame = vec![0; 14 + 20 + l4_len];
    let eth = ethernet_frame::new_unchecked_mut(&mut frame);
    EthernetRepr {
        src_addr: BROKER_MAC,
        dst_addr: HOST_MAC,
        ethertype: EthernetProtocol::Ipv4,
    }.emit(eth);
    ip_repr.emit(ipv4_packet::new_unchecked_mut(eth.payload_mut_slice()), Checksum::Manual);
    (frame, ip_repr)
}

/// A segment of the broker to our `port`.
fn broker(port: u16, flags: TcpFlags, seq: u32, ack: u32, payload: &[u8]) -> Vec<u8> {
    let repr = TcpRepr {
        src_port: 1883,
        dst_port: port,
        flags,
        seq_number: seq,
        ack_number: ack,
        window_len: 0xfaf0,
        max_seg_size: if flags.syn() { Some(1460) } else { None },
        payload_len: payload.len(),
    };
    let (mut frame, ip_repr) = ip_frame(IpProtocol::Tcp, BROKER_IP, repr.buffer_len());
    let offset = 14 + 20 + repr.header_len();
    frame[offset..].copy_from_slice(payload);

    let tcp = tcp_packet::new_unchecked_mut(&mut frame[34..]);
    repr.emit(tcp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Manual);
    frame
}

fn datagram(dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let repr = UdpRepr { src_port: 40000, dst_port, payload_len: payload.len() };
    let (mut frame, ip_repr) = ip_frame(IpProtocol::Udp, BROKER_IP, repr.buffer_len());
    frame[42..].copy_from_slice(payload);

    let udp = udp_packet::new_unchecked_mut(&mut frame[34..]);
    repr.emit(udp, ip_repr.src_addr, ip_repr.dst_addr, Checksum::Manual);
    frame
}

fn arp_frame(operation: ArpOperation, src: (EthernetAddress, Ipv4Address), target: Ipv4Address)
    -> Vec<u8>
{
    let mut frame = vec![0; 42];
    let eth = ethernet_frame::new_unchecked_mut(&mut frame);
    EthernetRepr {
        src_addr: src.0,
        dst_addr: EthernetAddress::BROADCAST,
        ethertype: EthernetProtocol::Arp,
    }.emit(eth);
    ArpRepr {
        operation,
        source_hardware_addr: src.0,
        source_protocol_addr: src.1,
        target_hardware_addr: HOST_MAC,
        target_protocol_addr: target,
    }.emit(crate::wire::arp_packet::new_unchecked_mut(eth.payload_mut_slice()));
    frame
}

fn tcp_of(frame: &[u8]) -> &tcp_packet {
    classify::tcp(frame).map(|(_, tcp)| tcp).unwrap()
}

struct Bench {
    engine: Engine,
    nic: Loopback,
    buffer: Vec<u8>,
    now: Instant,
    messages: Vec<(std::string::String, Vec<u8>)>,
}

impl Handler for Vec<(std::string::String, Vec<u8>)> {
    fn message(&mut self, topic: &str, message: &[u8]) {
        self.push((topic.into(), message.to_vec()));
    }

    fn datagram(&mut self, datagram: &udp::Datagram, payload: &mut [u8]) -> Option<usize> {
        if datagram.dst_port != 7 {
            return None;
        }
        payload[..8].copy_from_slice(b"Received");
        Some(8)
    }
}

impl Bench {
    fn new(config: Config) -> Self {
        Bench {
            engine: Engine::new(config),
            nic: Loopback::new(),
            buffer: vec![0; MAX_FRAME_LEN],
            now: Instant::from_millis(0),
            messages: Vec::new(),
        }
    }

    fn poll(&mut self) -> Poll {
        self.engine.poll(&mut self.nic, &mut self.buffer, self.now, &mut self.messages)
    }

    /// Deliver a frame and poll once, returning what was sent.
    fn receive(&mut self, frame: &[u8]) -> (Poll, Vec<Vec<u8>>) {
        self.nic.inject(frame);
        let poll = self.poll();
        (poll, self.nic.take_sent())
    }

    fn idle(&mut self) -> (Poll, Vec<Vec<u8>>) {
        let poll = self.poll();
        (poll, self.nic.take_sent())
    }

    fn port(&self) -> u16 {
        self.engine.session().local_port()
    }

    /// Run the exchange up to the request going out, returning its frame.
    fn connect(&mut self, request: Request) -> Vec<u8> {
        self.engine.request(request).unwrap();
        let (poll, sent) = self.idle();
        assert_eq!(poll.outbound, Some(Frame::Syn));
        assert_eq!(self.engine.state(), State::SynSent);
        assert_eq!(sent.len(), 1);
        let syn = tcp_of(&sent[0]);
        assert_eq!(syn.dst_port(), 1883);
        assert_eq!(syn.flags(), TcpFlags::SYN);
        assert_eq!(syn.max_seg_size(), Ok(Some(1280)));

        let port = self.port();
        assert!(port >= 1024 && port <= 49151);
        let (poll, sent) = self.receive(&broker(port, TcpFlags::SYN | TcpFlags::ACK, ISN, 1, &[]));
        assert_eq!(poll.inbound, Some(Frame::Ack));
        assert_eq!(poll.outbound, None);
        assert_eq!(self.engine.state(), State::Established);
        assert_eq!(tcp_of(&sent[0]).ack_number(), ISN + 1);
        assert_eq!(tcp_of(&sent[0]).seq_number(), 1);

        let (poll, sent) = self.idle();
        assert_eq!(poll.outbound, Some(Frame::Connect));
        assert_eq!(self.engine.state(), State::PublishingMqtt);
        let connect = tcp_of(&sent[0]);
        assert_eq!(connect.payload_slice()[0], 0x10);
        let acked = 1 + connect.payload_slice().len() as u32;

        let connack = broker(port, TcpFlags::PSH | TcpFlags::ACK, ISN + 1, acked, &[0x20, 0x02, 0x00, 0x00]);
        let (poll, mut sent) = self.receive(&connack);
        assert_eq!(self.engine.state(), State::DisconnectRequested);
        assert_eq!(sent.len(), 1);
        assert!(poll.inbound.is_some());
        let frame = sent.remove(0);
        assert_eq!(tcp_of(&frame).seq_number(), acked);
        assert_eq!(tcp_of(&frame).ack_number(), ISN + 5);
        frame
    }

    /// Close the connection after the broker acknowledged the request with `ack`.
    fn close(&mut self, ack: &[u8]) {
        let port = self.port();
        let (poll, sent) = self.receive(ack);
        assert_eq!(poll.inbound, Some(Frame::Disconnect));
        assert_eq!(self.engine.state(), State::FinWait1);
        let disconnect = tcp_of(&sent[0]);
        assert_eq!(disconnect.flag_byte(), 0x19);
        assert_eq!(disconnect.payload_slice(), &[0xe0, 0x00][..]);
        let seq = disconnect.seq_number() + 3;
        let peer_seq = disconnect.ack_number();

        let (poll, sent) = self.receive(&broker(port, TcpFlags::FIN | TcpFlags::ACK, peer_seq, seq, &[]));
        assert_eq!(poll.inbound, None);
        assert!(sent.is_empty());
        assert_eq!(self.engine.state(), State::FinWait2);

        let (poll, sent) = self.idle();
        assert_eq!(poll.outbound, Some(Frame::Ack));
        assert_eq!(self.engine.state(), State::TimeWait);
        assert_eq!(tcp_of(&sent[0]).ack_number(), peer_seq + 1);
        assert_eq!(tcp_of(&sent[0]).seq_number(), seq);

        self.now = self.now + Duration::from_millis(999);
        let (_, sent) = self.idle();
        assert!(sent.is_empty());
        assert_eq!(self.engine.state(), State::TimeWait);

        self.now = self.now + Duration::from_millis(1);
        let (poll, sent) = self.idle();
        assert!(sent.is_empty());
        assert_eq!(poll.outbound, None);
        assert_eq!(self.engine.state(), State::Closed);
        assert_eq!(self.engine.pending(), None);
    }
}

#[test]
fn publish_exchange() {
    let mut bench = Bench::new(Config::default());
    let publish = bench.connect(Request::publish("lights/kitchen", "on").unwrap());
    assert_eq!(tcp_of(&publish).payload_slice(), &b"\x30\x12\x00\x0elights/kitchenon"[..]);
    assert!(classify::is_tcp_checksum_valid(&publish));

    let port = bench.port();
    let seq = tcp_of(&publish).seq_number() + 20;
    bench.close(&broker(port, TcpFlags::ACK, ISN + 5, seq, &[]));

    // Nothing more to do.
    let (poll, sent) = bench.idle();
    assert_eq!(poll, Poll::default());
    assert!(sent.is_empty());
}

#[test]
fn subscribe_exchange() {
    let mut bench = Bench::new(Config::default());
    let subscribe = bench.connect(Request::subscribe("lights/#").unwrap());
    assert_eq!(tcp_of(&subscribe).payload_slice()[0], 0x82);

    let port = bench.port();
    let seq = tcp_of(&subscribe).seq_number() + tcp_of(&subscribe).payload_slice().len() as u32;
    // SUBACK followed by a retained message in the same segment.
    let mut payload = vec![0x90, 0x03, 0x00, 0x01, 0x00];
    payload.extend_from_slice(b"\x30\x0b\x00\x07lights/on");
    bench.close(&broker(port, TcpFlags::PSH | TcpFlags::ACK, ISN + 5, seq, &payload));

    assert_eq!(bench.messages, vec![(std::string::String::from("lights/"), b"on".to_vec())]);
}

#[test]
fn unsubscribe_exchange() {
    let mut bench = Bench::new(Config::default());
    let unsubscribe = bench.connect(Request::unsubscribe("lights/#").unwrap());
    assert_eq!(tcp_of(&unsubscribe).payload_slice()[0], 0xa2);

    let port = bench.port();
    let seq = tcp_of(&unsubscribe).seq_number() + tcp_of(&unsubscribe).payload_slice().len() as u32;
    bench.close(&broker(port, TcpFlags::PSH | TcpFlags::ACK, ISN + 5, seq, &[0xb0, 0x02, 0x00, 0x01]));
}

#[test]
fn second_connection_uses_fresh_port() {
    let mut bench = Bench::new(Config::default());
    let publish = bench.connect(Request::publish("a", "1").unwrap());
    let first = bench.port();
    let seq = tcp_of(&publish).seq_number() + tcp_of(&publish).payload_slice().len() as u32;
    bench.close(&broker(first, TcpFlags::ACK, ISN + 5, seq, &[]));

    bench.engine.request(Request::publish("a", "2").unwrap()).unwrap();
    let (poll, sent) = bench.idle();
    assert_eq!(poll.outbound, Some(Frame::Syn));
    assert_eq!(tcp_of(&sent[0]).seq_number(), 0);
    assert_eq!(tcp_of(&sent[0]).src_port(), bench.port());
}

#[test]
fn request_while_busy() {
    let mut bench = Bench::new(Config::default());
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();
    assert_eq!(bench.engine.request(Request::subscribe("b").unwrap()), Err(Error::Busy));
    assert_eq!(bench.engine.pending(), Some(&Request::publish("a", "1").unwrap()));
}

#[test]
fn request_too_long() {
    let topic = [b'a'; TOPIC_LEN + 1];
    let topic = core::str::from_utf8(&topic).unwrap();
    assert_eq!(Request::subscribe(topic), Err(Error::TooLong));
    assert!(Request::subscribe(&topic[..TOPIC_LEN]).is_ok());
}

#[test]
fn answers_arp_and_ping() {
    let mut bench = Bench::new(Config::default());
    let peer = (EthernetAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]), BROKER_IP);

    let (poll, sent) = bench.receive(&arp_frame(ArpOperation::Request, peer, HOST_IP));
    assert_eq!(poll.inbound, Some(Frame::ArpReply));
    let reply = crate::layer::arp::parse(&sent[0]).unwrap();
    assert_eq!(reply.operation, ArpOperation::Reply);
    assert_eq!(reply.source_hardware_addr, HOST_MAC);
    assert_eq!(reply.target_hardware_addr, peer.0);

    // Not for us.
    let other = Ipv4Address::new(192, 168, 10, 139);
    let (poll, sent) = bench.receive(&arp_frame(ArpOperation::Request, peer, other));
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());

    // Echo request, identifier 0x1234 and sequence 1.
    let echo = [0x08, 0x00, 0x54, 0x35, 0x12, 0x34, 0x00, 0x01, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h'];
    let (mut frame, _) = ip_frame(IpProtocol::Icmp, BROKER_IP, echo.len());
    frame[34..].copy_from_slice(&echo);
    let (poll, sent) = bench.receive(&frame);
    assert_eq!(poll.inbound, Some(Frame::EchoReply));
    assert_eq!(sent[0].len(), frame.len());
    assert_eq!(&sent[0][34..36], &[0x00, 0x00]);
    assert_eq!(&sent[0][38..], &echo[4..]);
    assert!(classify::is_ip(&sent[0]));
}

#[test]
fn drops_foreign_and_broken_frames() {
    let mut bench = Bench::new(Config::default());

    // IP header checksum broken.
    let (mut frame, _) = ip_frame(IpProtocol::Icmp, BROKER_IP, 8);
    frame[24] ^= 0x01;
    let (poll, sent) = bench.receive(&frame);
    assert_eq!(poll.received, frame.len());
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());

    // Addressed to someone else.
    let mut frame = datagram(7, b"ping");
    frame[33] = 139;
    let (poll, _) = bench.receive(&frame);
    assert_eq!(poll.inbound, None);

    // Runt frame.
    let (poll, _) = bench.receive(&[0xff; 10]);
    assert_eq!(poll, Poll { received: 10, ..Poll::default() });
}

#[test]
fn udp_through_handler() {
    let mut bench = Bench::new(Config::default());
    let (poll, sent) = bench.receive(&datagram(7, b"on"));
    assert_eq!(poll.inbound, Some(Frame::UdpReply));
    assert_eq!(&sent[0][42..], b"Received");
    assert!(classify::is_udp_valid(&sent[0]));

    let (poll, sent) = bench.receive(&datagram(9, b"on"));
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());

    // Zero checksum is not accepted.
    let mut frame = datagram(7, b"on");
    frame[40] = 0;
    frame[41] = 0;
    let (poll, _) = bench.receive(&frame);
    assert_eq!(poll.inbound, None);
}

#[test]
fn resolves_broker_address() {
    let config = Config { peer_hardware_addr: EthernetAddress([0; 6]), ..Config::default() };
    let mut bench = Bench::new(config);
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();

    let (poll, sent) = bench.idle();
    assert_eq!(poll.outbound, Some(Frame::ArpRequest));
    assert_eq!(bench.engine.state(), State::Closed);
    assert!(classify::is_arp_request(&sent[0], BROKER_IP));

    // Not again before the retry delay.
    bench.now = bench.now + Duration::from_millis(500);
    let (_, sent) = bench.idle();
    assert!(sent.is_empty());
    bench.now = bench.now + Duration::from_millis(500);
    let (poll, _) = bench.idle();
    assert_eq!(poll.outbound, Some(Frame::ArpRequest));

    let (poll, sent) = bench.receive(&arp_frame(ArpOperation::Reply, (BROKER_MAC, BROKER_IP), HOST_IP));
    assert_eq!(poll.inbound, None);
    assert_eq!(poll.outbound, Some(Frame::Syn));
    assert_eq!(bench.engine.peer_hardware_addr(), Some(BROKER_MAC));
    let eth = ethernet_frame::new_checked(&sent[0][..]).unwrap();
    assert_eq!(eth.dst_addr(), BROKER_MAC);
}

#[test]
fn broker_behind_gateway() {
    let config = Config {
        peer_hardware_addr: EthernetAddress([0; 6]),
        peer_ip_addr: Ipv4Address::new(10, 0, 0, 2),
        gateway: Ipv4Address::new(192, 168, 10, 1),
        ..Config::default()
    };
    assert_eq!(config.next_hop(), Ipv4Address::new(192, 168, 10, 1));
    let mut bench = Bench::new(config);
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();
    let (_, sent) = bench.idle();
    assert!(classify::is_arp_request(&sent[0], Ipv4Address::new(192, 168, 10, 1)));
}

#[test]
fn ignores_foreign_segments() {
    let mut bench = Bench::new(Config::default());
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();
    bench.idle();
    let port = bench.port();

    // Wrong port.
    let (poll, sent) = bench.receive(&broker(port + 1, TcpFlags::SYN | TcpFlags::ACK, ISN, 1, &[]));
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());
    assert_eq!(bench.engine.state(), State::SynSent);

    // Broken checksum.
    let mut frame = broker(port, TcpFlags::SYN | TcpFlags::ACK, ISN, 1, &[]);
    frame[50] ^= 0xff;
    let (poll, _) = bench.receive(&frame);
    assert_eq!(poll.inbound, None);
    assert_eq!(bench.engine.state(), State::SynSent);
}

#[test]
fn unverified_checksum() {
    let config = Config { tcp_checksum: Checksum::Ignored, ..Config::default() };
    let mut bench = Bench::new(config);
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();
    bench.idle();
    let port = bench.port();

    let mut frame = broker(port, TcpFlags::SYN | TcpFlags::ACK, ISN, 1, &[]);
    frame[50] ^= 0xff;
    let (poll, _) = bench.receive(&frame);
    assert_eq!(poll.inbound, Some(Frame::Ack));
    assert_eq!(bench.engine.state(), State::Established);
}

#[test]
fn segments_without_session() {
    let mut bench = Bench::new(Config::default());
    let (poll, sent) = bench.receive(&broker(50000, TcpFlags::SYN | TcpFlags::ACK, ISN, 1, &[]));
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());
    assert_eq!(bench.engine.state(), State::Closed);
}

#[test]
fn overflow_and_truncation() {
    let mut bench = Bench::new(Config::default());
    bench.nic.set_overflow();
    bench.nic.inject(&[0; 2000]);
    let poll = bench.poll();
    assert!(poll.overflow);
    assert_eq!(poll.received, MAX_FRAME_LEN);

    bench.nic.inject(&[0; 60]);
    let poll = bench.poll();
    assert!(!poll.overflow);
}

#[test]
fn transmit_failure_advances() {
    let mut bench = Bench::new(Config::default());
    bench.engine.request(Request::publish("a", "1").unwrap()).unwrap();
    bench.nic.set_abort(true);
    let poll = bench.poll();
    assert_eq!(poll.outbound, Some(Frame::Syn));
    assert!(poll.transmit_failed);
    assert_eq!(bench.engine.state(), State::SynSent);
}

#[test]
fn ping_broker() {
    let mut bench = Bench::new(Config::default());
    assert_eq!(bench.engine.ping_broker(&mut bench.nic, &mut bench.buffer), Err(Error::NotConnected));

    let publish = bench.connect(Request::publish("a", "1").unwrap());
    let after_publish = tcp_of(&publish).seq_number() + tcp_of(&publish).payload_slice().len() as u32;
    bench.engine.ping_broker(&mut bench.nic, &mut bench.buffer).unwrap();
    let sent = bench.nic.take_sent();
    let ping = tcp_of(&sent[0]);
    assert_eq!(ping.payload_slice(), &[0xc0, 0x00][..]);
    assert_eq!(ping.seq_number(), after_publish);
    assert_eq!(ping.ack_number(), ISN + 5);
    let after_ping = after_publish + 2;

    // The answer changes nothing.
    let port = bench.port();
    let pingresp = broker(port, TcpFlags::PSH | TcpFlags::ACK, ISN + 5, after_ping, &[0xd0, 0x00]);
    let (poll, sent) = bench.receive(&pingresp);
    assert_eq!(poll.inbound, None);
    assert!(sent.is_empty());
    assert_eq!(bench.engine.state(), State::DisconnectRequested);

    // An acknowledgement of the PUBLISH alone arriving late still closes after the PINGREQ.
    let (poll, sent) = bench.receive(&broker(port, TcpFlags::ACK, ISN + 7, after_publish, &[]));
    assert_eq!(poll.inbound, Some(Frame::Disconnect));
    assert_eq!(tcp_of(&sent[0]).seq_number(), after_ping);
    assert_eq!(tcp_of(&sent[0]).ack_number(), ISN + 7);
}

#[test]
fn console_commands() {
    let mut engine = Engine::new(Config::default());
    let mut store = MemoryStore::<64>::new();
    let mut nic = Loopback::new();
    let mut out = std::string::String::new();

    let command = Command::parse("pub lights/kitchen on").unwrap();
    assert_eq!(engine.execute(&command, &mut store, &mut nic, &mut out), Ok(Outcome::Done));
    assert_eq!(engine.pending(), Some(&Request::publish("lights/kitchen", "on").unwrap()));
    let command = Command::parse("sub lights").unwrap();
    assert_eq!(engine.execute(&command, &mut store, &mut nic, &mut out), Err(Error::Busy));

    let command = Command::parse("setip 192.168.10.140").unwrap();
    assert_eq!(engine.execute(&command, &mut store, &mut nic, &mut out), Ok(Outcome::Done));
    assert_eq!(engine.ip_addr(), Ipv4Address::new(192, 168, 10, 140));
    let restored = Config::default().with_stored_ip(&store);
    assert_eq!(restored.ip_addr, Ipv4Address::new(192, 168, 10, 140));

    nic.set_link_up(false);
    let command = Command::parse("ifconfig").unwrap();
    assert_eq!(engine.execute(&command, &mut store, &mut nic, &mut out), Ok(Outcome::Done));
    assert!(out.starts_with("HW: 02:03:04:05:06:8a\r\nIP: 192.168.10.140 (static)\r\n"));
    assert!(out.ends_with("Link is down\r\n"));

    let command = Command::parse("reboot").unwrap();
    assert_eq!(engine.execute(&command, &mut store, &mut nic, &mut out), Ok(Outcome::Reboot));
    engine.reset();
    assert_eq!(engine.pending(), None);
}

#[test]
fn configuration() {
    let mut engine = Engine::new(Config::default());
    assert!(engine.is_ip_valid());
    assert!(!engine.is_dhcp_enabled());
    engine.set_dhcp(true);
    engine.set_subnet_mask(Ipv4Address::new(255, 255, 0, 0));
    engine.set_gateway(Ipv4Address::new(192, 168, 0, 1));
    engine.set_hardware_addr(EthernetAddress([2, 0, 0, 0, 0, 1]));
    engine.set_ip_addr(Ipv4Address::UNSPECIFIED);
    assert!(engine.is_dhcp_enabled());
    assert!(!engine.is_ip_valid());
    assert_eq!(engine.subnet_mask(), Ipv4Address::new(255, 255, 0, 0));
    assert_eq!(engine.gateway(), Ipv4Address::new(192, 168, 0, 1));
    assert_eq!(engine.hardware_addr(), EthernetAddress([2, 0, 0, 0, 0, 1]));
    assert!(Config::default().is_local(BROKER_IP));
}
