//! One iteration of the main loop at a time.
//!
//! The [`Engine`] owns everything the stack remembers between frames: the [`Config`], the
//! [`Session`], the pending [`Request`] and the random source for ports. The caller owns the
//! transport and the single frame buffer and lends both to [`poll`] once per loop iteration:
//!
//! ```
//! use ethmq::engine::{Config, Engine, Request};
//! use ethmq::nic::{loopback::Loopback, MAX_FRAME_LEN};
//! use ethmq::time::Instant;
//!
//! let mut engine = Engine::new(Config::default());
//! let mut nic = Loopback::new();
//! let mut buffer = [0; MAX_FRAME_LEN];
//!
//! engine.request(Request::publish("lights/kitchen", "on").unwrap()).unwrap();
//! let poll = engine.poll(&mut nic, &mut buffer, Instant::from_millis(0), &mut ());
//! // The connection opens with a SYN to the broker.
//! assert_eq!(nic.sent().len(), 1);
//! assert!(poll.outbound.is_some());
//! ```
//!
//! [`Engine`]: struct.Engine.html
//! [`Config`]: struct.Config.html
//! [`Session`]: ../layer/session/struct.Session.html
//! [`Request`]: enum.Request.html
//! [`poll`]: struct.Engine.html#method.poll
use core::fmt;

use heapless::String;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::console::{self, Command};
use crate::layer::{self, arp, classify, icmp, tcp, udp};
use crate::layer::classify::Kind;
use crate::layer::session::{Action, Event, Session, State};
use crate::layer::tcp::Connection;
use crate::layer::{Local, Peer};
use crate::nic::Transport;
use crate::storage::{self, KeyStore};
use crate::time::{Duration, Instant};
use crate::wire::{mqtt, mqtt_packet, Checksum, EthernetAddress, Ipv4Address, MqttRepr};

/// The longest client identifier, as MQTT 3.1.1 guarantees brokers accept.
pub const CLIENT_ID_LEN: usize = 23;

/// The longest topic of a request.
pub const TOPIC_LEN: usize = console::MAX_CHARS;

/// The longest message of a request.
pub const MESSAGE_LEN: usize = console::MAX_CHARS;

/// Errors of the engine operations that are not frame processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// A request is already under way.
    Busy,

    /// A topic or message does not fit.
    TooLong,

    /// The session is not in a state to carry the packet.
    NotConnected,

    /// Building or transmitting a frame failed.
    Layer(layer::Error),

    /// The key store failed.
    Storage(storage::Error),

    /// Writing console output failed.
    Format,
}

/// Result type of engine operations.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Busy => write!(f, "a request is already pending"),
            Error::TooLong => write!(f, "topic or message too long"),
            Error::NotConnected => write!(f, "no connection to the broker"),
            Error::Layer(err) => write!(f, "{}", err),
            Error::Storage(err) => write!(f, "key store: {}", err),
            Error::Format => write!(f, "console output failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<layer::Error> for Error {
    fn from(err: layer::Error) -> Self {
        Error::Layer(err)
    }
}

impl From<storage::Error> for Error {
    fn from(err: storage::Error) -> Self {
        Error::Storage(err)
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Format
    }
}

/// The configuration of the interface and of the broker session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Our hardware address.
    pub hardware_addr: EthernetAddress,
    /// Our IPv4 address.
    pub ip_addr: Ipv4Address,
    /// The subnet mask.
    pub subnet_mask: Ipv4Address,
    /// The default gateway.
    pub gateway: Ipv4Address,
    /// Whether the address was assigned by DHCP, shown by `ifconfig` only.
    pub dhcp: bool,
    /// The hardware address of the next hop to the broker, all zero to resolve it with ARP.
    pub peer_hardware_addr: EthernetAddress,
    /// The address of the broker.
    pub peer_ip_addr: Ipv4Address,
    /// The port of the broker.
    pub peer_port: u16,
    /// The MQTT client identifier.
    pub client_id: String<CLIENT_ID_LEN>,
    /// The MQTT connect flags.
    pub connect_flags: u8,
    /// The MQTT keep alive, in seconds.
    pub keep_alive: u16,
    /// How long to linger in `TimeWait`.
    pub time_wait: Duration,
    /// How long to wait for an ARP reply before asking again.
    pub arp_retry: Duration,
    /// Whether inbound TCP checksums are verified.
    pub tcp_checksum: Checksum,
    /// The seed of the ephemeral port generator.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        let mut client_id = String::new();
        // Fits, five of twenty-three.
        let _ = client_id.push_str("hello");

        Config {
            hardware_addr: EthernetAddress([2, 3, 4, 5, 6, 138]),
            ip_addr: Ipv4Address::new(192, 168, 10, 138),
            subnet_mask: Ipv4Address::new(255, 255, 255, 0),
            gateway: Ipv4Address::new(192, 168, 1, 1),
            dhcp: false,
            peer_hardware_addr: EthernetAddress([0x1c, 0x69, 0x7a, 0x07, 0x94, 0xe3]),
            peer_ip_addr: Ipv4Address::new(192, 168, 10, 2),
            peer_port: mqtt::DEFAULT_PORT,
            client_id,
            connect_flags: mqtt::CLEAN_SESSION,
            keep_alive: 60,
            time_wait: Duration::from_secs(1),
            arp_retry: Duration::from_secs(1),
            tcp_checksum: Checksum::Manual,
            seed: 0x0203_0405_068a,
        }
    }
}

impl Config {
    /// Replace the IP address with the one persisted in `store`, if any.
    pub fn with_stored_ip<S: KeyStore + ?Sized>(mut self, store: &S) -> Self {
        if let Some(addr) = storage::load_ip(store, storage::IP_ADDRESS) {
            self.ip_addr = addr;
        }
        self
    }

    /// Whether `addr` is in our subnet.
    pub fn is_local(&self, addr: Ipv4Address) -> bool {
        let mask = self.subnet_mask.as_bytes();
        let ours = self.ip_addr.as_bytes();
        let theirs = addr.as_bytes();
        (0..4).all(|idx| ours[idx] & mask[idx] == theirs[idx] & mask[idx])
    }

    /// The address whose hardware address frames to the broker go to.
    pub fn next_hop(&self) -> Ipv4Address {
        if self.is_local(self.peer_ip_addr) {
            self.peer_ip_addr
        } else {
            self.gateway
        }
    }
}

/// What the session should do once connected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Publish a message with QoS 0.
    Publish {
        /// The topic.
        topic: String<TOPIC_LEN>,
        /// The message.
        message: String<MESSAGE_LEN>,
    },
    /// Subscribe to a topic with QoS 0.
    Subscribe {
        /// The topic filter.
        topic: String<TOPIC_LEN>,
    },
    /// Unsubscribe from a topic.
    Unsubscribe {
        /// The topic filter.
        topic: String<TOPIC_LEN>,
    },
}

fn copy<const N: usize>(text: &str) -> Result<String<N>> {
    let mut out = String::new();
    out.push_str(text).map_err(|_| Error::TooLong)?;
    Ok(out)
}

impl Request {
    /// A publish request.
    pub fn publish(topic: &str, message: &str) -> Result<Self> {
        Ok(Request::Publish { topic: copy(topic)?, message: copy(message)? })
    }

    /// A subscribe request.
    pub fn subscribe(topic: &str) -> Result<Self> {
        Ok(Request::Subscribe { topic: copy(topic)? })
    }

    /// An unsubscribe request.
    pub fn unsubscribe(topic: &str) -> Result<Self> {
        Ok(Request::Unsubscribe { topic: copy(topic)? })
    }
}

/// The frames the engine builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// ARP reply to a request for our address.
    ArpReply,
    /// ARP request for the next hop to the broker.
    ArpRequest,
    /// ICMP echo reply.
    EchoReply,
    /// UDP reply written by the handler.
    UdpReply,
    /// TCP SYN opening the connection.
    Syn,
    /// Bare TCP ACK.
    Ack,
    /// MQTT CONNECT.
    Connect,
    /// MQTT PUBLISH.
    Publish,
    /// MQTT SUBSCRIBE.
    Subscribe,
    /// MQTT UNSUBSCRIBE.
    Unsubscribe,
    /// MQTT DISCONNECT with FIN.
    Disconnect,
    /// MQTT PINGREQ.
    PingRequest,
}

/// A report of one loop iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Poll {
    /// Length of the received frame, zero if there was none.
    pub received: usize,
    /// The transport had lost frames.
    pub overflow: bool,
    /// The frame sent in response to the received one.
    pub inbound: Option<Frame>,
    /// The frame sent by the idle step of the session.
    pub outbound: Option<Frame>,
    /// A transmission was aborted. The session advanced regardless.
    pub transmit_failed: bool,
}

/// The result of dispatching one received frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// The frame built in the buffer in response, with its length.
    pub reply: Option<(Frame, usize)>,
    /// The frame was a segment of the session.
    pub session: bool,
}

/// The outcome of a console command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The command was carried out.
    Done,
    /// The caller should restart the board.
    Reboot,
}

/// The application side of the engine.
///
/// Both methods have defaults that ignore the traffic, `()` is the handler that does nothing.
pub trait Handler {
    /// A PUBLISH from the broker arrived.
    fn message(&mut self, topic: &str, message: &[u8]) {
        let _ = (topic, message);
    }

    /// A UDP datagram arrived.
    ///
    /// `payload` holds the received payload in its first `datagram.payload_len` octets and extends
    /// to the end of the frame buffer. Write a reply into it and return its length to answer.
    fn datagram(&mut self, datagram: &udp::Datagram, payload: &mut [u8]) -> Option<usize> {
        let _ = (datagram, payload);
        None
    }
}

impl Handler for () {}

impl<H: Handler + ?Sized> Handler for &'_ mut H {
    fn message(&mut self, topic: &str, message: &[u8]) {
        (**self).message(topic, message)
    }

    fn datagram(&mut self, datagram: &udp::Datagram, payload: &mut [u8]) -> Option<usize> {
        (**self).datagram(datagram, payload)
    }
}

/// A handler of received messages from a closure.
pub struct FnHandler<F>(pub F);

impl<F> Handler for FnHandler<F>
    where F: FnMut(&str, &[u8])
{
    fn message(&mut self, topic: &str, message: &[u8]) {
        (self.0)(topic, message)
    }
}

/// The kind of a received frame, decided before it is answered.
enum Inbound {
    ArpRequest,
    ArpReply,
    Echo,
    Datagram,
    Segment,
    Ignored,
}

/// The network stack of the board.
pub struct Engine {
    config: Config,
    session: Session,
    request: Option<Request>,
    rng: SmallRng,
    arp_sent: Option<Instant>,
}

impl Engine {
    /// Start with a closed session and no request.
    pub fn new(config: Config) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Engine {
            config,
            session: Session::new(),
            request: None,
            rng,
            arp_sent: None,
        }
    }

    /// Start over as after a reset, keeping the configuration.
    pub fn reset(&mut self) {
        self.session.reset();
        self.request = None;
        self.arp_sent = None;
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Our hardware address.
    pub fn hardware_addr(&self) -> EthernetAddress {
        self.config.hardware_addr
    }

    /// Change our hardware address.
    pub fn set_hardware_addr(&mut self, addr: EthernetAddress) {
        self.config.hardware_addr = addr;
    }

    /// Our IP address.
    pub fn ip_addr(&self) -> Ipv4Address {
        self.config.ip_addr
    }

    /// Change our IP address.
    pub fn set_ip_addr(&mut self, addr: Ipv4Address) {
        self.config.ip_addr = addr;
    }

    /// The subnet mask.
    pub fn subnet_mask(&self) -> Ipv4Address {
        self.config.subnet_mask
    }

    /// Change the subnet mask.
    pub fn set_subnet_mask(&mut self, mask: Ipv4Address) {
        self.config.subnet_mask = mask;
    }

    /// The default gateway.
    pub fn gateway(&self) -> Ipv4Address {
        self.config.gateway
    }

    /// Change the default gateway.
    pub fn set_gateway(&mut self, addr: Ipv4Address) {
        self.config.gateway = addr;
    }

    /// Whether the address is marked as assigned by DHCP.
    pub fn is_dhcp_enabled(&self) -> bool {
        self.config.dhcp
    }

    /// Mark the address as assigned by DHCP or static.
    pub fn set_dhcp(&mut self, enabled: bool) {
        self.config.dhcp = enabled;
    }

    /// Whether we have an address at all.
    pub fn is_ip_valid(&self) -> bool {
        !self.config.ip_addr.is_unspecified()
    }

    /// The hardware address of the next hop to the broker, if known.
    pub fn peer_hardware_addr(&self) -> Option<EthernetAddress> {
        Some(self.config.peer_hardware_addr).filter(|addr| !addr.is_unspecified())
    }

    /// The session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The state of the session.
    pub fn state(&self) -> State {
        self.session.state()
    }

    /// The request the session is carrying out or about to.
    pub fn pending(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Ask the session to carry out a request.
    ///
    /// The connection opens on the next poll. Fails while another request is pending.
    pub fn request(&mut self, request: Request) -> Result<()> {
        if self.request.is_some() {
            return Err(Error::Busy);
        }
        net_debug!("engine: new request {:?}", request);
        self.request = Some(request);
        Ok(())
    }

    /// Run one loop iteration.
    ///
    /// Receives at most one frame and answers it, then gives the session its idle step unless the
    /// frame was one of its segments.
    pub fn poll<T, H>(&mut self, nic: &mut T, buffer: &mut [u8], now: Instant, handler: &mut H)
        -> Poll
    where
        T: Transport + ?Sized,
        H: Handler + ?Sized,
    {
        let mut poll = Poll::default();
        let mut session = false;

        if nic.is_data_available() {
            poll.overflow = nic.take_overflow();
            if poll.overflow {
                net_warn!("engine: receive overflow");
            }

            poll.received = nic.receive_into(buffer);
            if poll.received > 0 {
                let dispatch = self.dispatch(buffer, poll.received, now, handler);
                session = dispatch.session;
                if let Some((frame, len)) = dispatch.reply {
                    poll.inbound = Some(frame);
                    poll.transmit_failed |= !Self::transmit(nic, &buffer[..len], frame);
                }
            }
        }

        if !session {
            if let Some((frame, len)) = self.idle(buffer, now) {
                poll.outbound = Some(frame);
                poll.transmit_failed |= !Self::transmit(nic, &buffer[..len], frame);
            }
        }

        poll
    }

    /// Answer a received frame of `len` octets at the start of `buffer`.
    ///
    /// The reply is built in the same buffer, which may be longer than the frame.
    pub fn dispatch<H>(&mut self, buffer: &mut [u8], len: usize, now: Instant, handler: &mut H)
        -> Dispatch
        where H: Handler + ?Sized
    {
        let len = len.min(buffer.len());
        let local = self.local();

        match self.inbound(&buffer[..len]) {
            Inbound::ArpRequest => Dispatch {
                reply: Self::built(Frame::ArpReply, arp::reply(&mut buffer[..len], &local)),
                session: false,
            },
            Inbound::ArpReply => {
                self.learn_peer(&buffer[..len]);
                Dispatch::default()
            },
            Inbound::Echo => Dispatch {
                reply: Self::built(Frame::EchoReply, icmp::echo_reply(&mut buffer[..len])),
                session: false,
            },
            Inbound::Datagram => Dispatch {
                reply: Self::datagram(buffer, len, handler),
                session: false,
            },
            Inbound::Segment => self.segment(buffer, len, now, handler),
            Inbound::Ignored => Dispatch::default(),
        }
    }

    /// Send a PINGREQ to the broker on the open session.
    pub fn ping_broker<T>(&mut self, nic: &mut T, buffer: &mut [u8]) -> Result<()>
        where T: Transport + ?Sized
    {
        match self.session.state() {
            State::PublishingMqtt | State::DisconnectRequested => (),
            _ => return Err(Error::NotConnected),
        }

        let len = tcp::ping_request(buffer, &self.connection(), self.session.numbers())?;
        nic.transmit(&buffer[..len])?;
        self.record_sent(&buffer[..len]);
        Ok(())
    }

    /// Carry out a console command, printing to `out`.
    ///
    /// `setip` changes the address and persists it in `store`. `reboot` is left to the caller.
    pub fn execute<S, T, W>(&mut self, command: &Command, store: &mut S, nic: &mut T, out: &mut W)
        -> Result<Outcome>
    where
        S: KeyStore + ?Sized,
        T: Transport + ?Sized,
        W: fmt::Write + ?Sized,
    {
        match *command {
            Command::Publish { topic, message } => self.request(Request::publish(topic, message)?)?,
            Command::Subscribe { topic } => self.request(Request::subscribe(topic)?)?,
            Command::Unsubscribe { topic } => self.request(Request::unsubscribe(topic)?)?,
            Command::SetIp(addr) => {
                storage::save_ip(store, storage::IP_ADDRESS, addr)?;
                self.set_ip_addr(addr);
                net_debug!("engine: address changed to {}", addr);
            },
            Command::Ifconfig => console::ifconfig(out, &self.config, nic.is_link_up())?,
            Command::Reboot => return Ok(Outcome::Reboot),
        }
        Ok(Outcome::Done)
    }

    fn local(&self) -> Local {
        Local {
            hardware_addr: self.config.hardware_addr,
            ip_addr: self.config.ip_addr,
        }
    }

    fn connection(&self) -> Connection {
        Connection {
            local: self.local(),
            peer: Peer {
                hardware_addr: self.config.peer_hardware_addr,
                ip_addr: self.config.peer_ip_addr,
                port: self.config.peer_port,
            },
            local_port: self.session.local_port(),
        }
    }

    fn inbound(&self, frame: &[u8]) -> Inbound {
        let ip_addr = self.config.ip_addr;
        if classify::is_arp_request(frame, ip_addr) {
            Inbound::ArpRequest
        } else if classify::is_arp_reply(frame, ip_addr) {
            Inbound::ArpReply
        } else if !classify::is_ip(frame) || !classify::is_ip_unicast(frame, ip_addr) {
            Inbound::Ignored
        } else if classify::is_ping_request(frame) {
            Inbound::Echo
        } else if classify::is_udp_valid(frame) {
            Inbound::Datagram
        } else if classify::is_tcp(frame) {
            Inbound::Segment
        } else {
            Inbound::Ignored
        }
    }

    fn learn_peer(&mut self, frame: &[u8]) {
        let repr = match arp::parse(frame) {
            Ok(repr) => repr,
            Err(_) => return,
        };
        if repr.source_protocol_addr == self.config.next_hop() {
            net_debug!("engine: {} is at {}", repr.source_protocol_addr, repr.source_hardware_addr);
            self.config.peer_hardware_addr = repr.source_hardware_addr;
            self.arp_sent = None;
        }
    }

    fn datagram<H>(buffer: &mut [u8], len: usize, handler: &mut H) -> Option<(Frame, usize)>
        where H: Handler + ?Sized
    {
        let datagram = match udp::accept(&mut buffer[..len]) {
            Ok(datagram) => datagram,
            Err(err) => {
                net_debug!("engine: dropped datagram: {}", err);
                return None;
            },
        };

        let payload = buffer.get_mut(udp::PAYLOAD_OFFSET..)?;
        let reply_len = handler.datagram(&datagram, payload)?;
        Self::built(Frame::UdpReply, udp::reply_in_place(buffer, reply_len))
    }

    fn segment<H>(&mut self, buffer: &mut [u8], len: usize, now: Instant, handler: &mut H)
        -> Dispatch
        where H: Handler + ?Sized
    {
        let frame = &buffer[..len];
        let segment = match classify::segment(frame) {
            Some(segment) => segment,
            None => return Dispatch::default(),
        };

        let from_peer = classify::tcp(frame)
            .map_or(false, |(ip, _)| ip.src_addr() == self.config.peer_ip_addr);
        if !from_peer || !self.session.accepts(&segment, self.config.peer_port) {
            net_trace!("engine: segment not for the session");
            return Dispatch::default();
        }
        if self.config.tcp_checksum.manual() && !classify::is_tcp_checksum_valid(frame) {
            net_debug!("engine: segment with bad checksum");
            return Dispatch::default();
        }

        self.session.learn(&segment);
        Self::deliver(frame, handler);
        if segment.kind == Kind::PingResp {
            net_debug!("engine: broker answered ping");
        }

        let step = self.session.step(Event::Segment(segment.kind), now);
        let reply = step.action.and_then(|action| self.perform(action, buffer));
        self.session.settle(now);

        Dispatch { reply, session: true }
    }

    /// Hand every PUBLISH in the payload of a segment to the handler.
    fn deliver<H: Handler + ?Sized>(frame: &[u8], handler: &mut H) {
        let mut payload = match classify::tcp(frame) {
            Some((_, tcp)) => tcp.payload_slice(),
            None => return,
        };

        while !payload.is_empty() {
            let packet = match mqtt_packet::new_checked(payload) {
                Ok(packet) => packet,
                Err(_) => return,
            };
            if let Ok(MqttRepr::Publish { topic, message }) = MqttRepr::parse(packet) {
                net_debug!("engine: message on {}", topic);
                handler.message(topic, message);
            }
            payload = &payload[packet.packet_len()..];
        }
    }

    /// The step of the session when nothing arrived for it.
    fn idle(&mut self, buffer: &mut [u8], now: Instant) -> Option<(Frame, usize)> {
        let event = match self.session.state() {
            State::Closed => {
                self.request.as_ref()?;
                if self.peer_hardware_addr().is_none() {
                    return self.resolve_peer(buffer, now);
                }
                self.session.open(tcp::ephemeral_port(&mut self.rng));
                Event::Request
            },
            State::TimeWait => match self.session.time_wait_since() {
                Some(since) if now.has_elapsed(since, self.config.time_wait) => Event::Elapsed,
                _ => return None,
            },
            _ => Event::Idle,
        };

        let step = self.session.step(event, now);
        let sent = step.action.and_then(|action| self.perform(action, buffer));
        self.session.settle(now);
        sent
    }

    fn resolve_peer(&mut self, buffer: &mut [u8], now: Instant) -> Option<(Frame, usize)> {
        if let Some(sent) = self.arp_sent {
            if !now.has_elapsed(sent, self.config.arp_retry) {
                return None;
            }
        }
        self.arp_sent = Some(now);
        Self::built(Frame::ArpRequest, arp::request(buffer, &self.local(), self.config.next_hop()))
    }

    /// Build the frame an action asks for.
    fn perform(&mut self, action: Action, buffer: &mut [u8]) -> Option<(Frame, usize)> {
        let conn = self.connection();
        let numbers = self.session.numbers();

        let built = match action {
            Action::SendSyn => (Frame::Syn, tcp::syn(buffer, &conn)),
            Action::SendAck => (Frame::Ack, tcp::ack(buffer, &conn, numbers)),
            Action::SendConnect => {
                let config = &self.config;
                let len = tcp::connect(
                    buffer, &conn, numbers,
                    &config.client_id, config.connect_flags, config.keep_alive);
                (Frame::Connect, len)
            },
            Action::SendRequest => match self.request.as_ref()? {
                Request::Publish { topic, message } =>
                    (Frame::Publish, tcp::publish(buffer, &conn, numbers, topic, message.as_bytes())),
                Request::Subscribe { topic } =>
                    (Frame::Subscribe, tcp::subscribe(buffer, &conn, numbers, topic)),
                Request::Unsubscribe { topic } =>
                    (Frame::Unsubscribe, tcp::unsubscribe(buffer, &conn, numbers, topic)),
            },
            Action::SendDisconnect => (Frame::Disconnect, tcp::disconnect(buffer, &conn, numbers)),
            Action::ClearRequest => {
                net_debug!("engine: request done");
                self.request = None;
                return None;
            },
        };

        let (frame, len) = Self::built(built.0, built.1)?;
        self.record_sent(&buffer[..len]);
        Some((frame, len))
    }

    fn record_sent(&mut self, frame: &[u8]) {
        if let Some(segment) = classify::segment(frame) {
            self.session.sent(&segment);
        }
    }

    fn built(frame: Frame, result: layer::Result<usize>) -> Option<(Frame, usize)> {
        match result {
            Ok(len) => Some((frame, len)),
            Err(err) => {
                net_debug!("engine: could not build {:?}: {}", frame, err);
                None
            },
        }
    }

    fn transmit<T: Transport + ?Sized>(nic: &mut T, frame: &[u8], kind: Frame) -> bool {
        match nic.transmit(frame) {
            Ok(()) => {
                net_trace!("engine: sent {:?}, {} octets", kind, frame.len());
                true
            },
            Err(err) => {
                net_warn!("engine: transmit of {:?} failed: {}", kind, err);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests;
