//! MQTT 3.1.1 control packets, as far as a single QoS 0 client needs them.
//!
//! Every packet starts with a fixed header: the control byte, whose upper nibble is the packet
//! type, followed by the remaining length as a variable byte integer. Strings carry a big-endian
//! 16-bit length prefix.
use core::{fmt, str};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

/// The well-known broker port.
pub const DEFAULT_PORT: u16 = 1883;

/// The protocol level of MQTT 3.1.1.
pub const PROTOCOL_LEVEL: u8 = 4;

/// The "clean session" connect flag.
pub const CLEAN_SESSION: u8 = 0x02;

/// The packet identifier of our SUBSCRIBE and UNSUBSCRIBE.
pub const DEFAULT_PACKET_ID: u16 = 1;

const PROTOCOL_NAME: &[u8] = b"MQTT";

/// Remaining length values need at most four bytes.
const MAX_REMAINING_BYTES: usize = 4;

enum_with_unknown! {
    /// The full control byte of the packets we send or recognize.
    pub doc enum Code(u8) {
        /// Client request to connect.
        Connect     = 0x10,
        /// Connect acknowledgement.
        ConnAck     = 0x20,
        /// Publish message, QoS 0 and no flags.
        Publish     = 0x30,
        /// Subscribe request, with the mandatory reserved flags.
        Subscribe   = 0x82,
        /// Subscribe acknowledgement.
        SubAck      = 0x90,
        /// Unsubscribe request, with the mandatory reserved flags.
        Unsubscribe = 0xA2,
        /// Unsubscribe acknowledgement.
        UnsubAck    = 0xB0,
        /// Ping request.
        PingReq     = 0xC0,
        /// Ping response.
        PingResp    = 0xD0,
        /// Client is disconnecting.
        Disconnect  = 0xE0,
    }
}

byte_wrapper! {
    /// A byte sequence representing an MQTT control packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct mqtt([u8]);
}

mod field {
    pub(crate) const CONTROL: usize = 0;
    pub(crate) const REMAINING: usize = 1;
}

impl mqtt {
    /// View octets as MQTT packet, unchecked.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// View mutable octets as MQTT packet, unchecked.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// All octets of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that the fixed header decodes and the packet fits the buffer.
    pub fn check_len(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::Truncated);
        }
        let (remaining, used) = decode_remaining_len(&self.0[field::REMAINING..])?;
        if self.0.len() < 1 + used + remaining {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the control byte.
    #[inline]
    pub fn control(&self) -> u8 {
        self.0[field::CONTROL]
    }

    /// Return the control byte as a known code.
    #[inline]
    pub fn code(&self) -> Code {
        Code::from(self.control())
    }

    /// Return the packet type, the upper nibble of the control byte.
    #[inline]
    pub fn packet_type(&self) -> u8 {
        self.control() >> 4
    }

    /// Return the decoded remaining length.
    ///
    /// # Panics
    /// This function may panic unless [check_len] succeeded.
    ///
    /// [check_len]: #method.check_len
    pub fn remaining_len(&self) -> usize {
        self.remaining_range().len()
    }

    /// The bytes following the fixed header, up to the remaining length.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.0[self.remaining_range()]
    }

    /// The length of the whole packet, fixed header included.
    ///
    /// Further packets may follow in the same buffer.
    pub fn packet_len(&self) -> usize {
        self.remaining_range().end
    }

    fn remaining_range(&self) -> core::ops::Range<usize> {
        match decode_remaining_len(&self.0[field::REMAINING..]) {
            Ok((remaining, used)) => {
                let start = field::REMAINING + used;
                start..start + remaining
            },
            Err(_) => self.0.len()..self.0.len(),
        }
    }
}

impl AsRef<[u8]> for mqtt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Decode a variable byte integer, returning the value and the number of bytes it occupied.
pub fn decode_remaining_len(bytes: &[u8]) -> Result<(usize, usize)> {
    let mut value = 0usize;
    for (idx, &byte) in bytes.iter().enumerate().take(MAX_REMAINING_BYTES) {
        value |= usize::from(byte & 0x7f) << (7 * idx);
        if byte & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }

    if bytes.len() >= MAX_REMAINING_BYTES {
        Err(Error::Malformed)
    } else {
        Err(Error::Truncated)
    }
}

/// Number of bytes needed to encode `len` as a variable byte integer.
pub fn remaining_len_size(len: usize) -> usize {
    match len {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    }
}

/// Encode `len` as a variable byte integer, returning the number of bytes written.
///
/// # Panics
/// This function panics if `out` is shorter than [`remaining_len_size`].
///
/// [`remaining_len_size`]: fn.remaining_len_size.html
pub fn encode_remaining_len(len: usize, out: &mut [u8]) -> usize {
    let mut len = len;
    let mut idx = 0;
    loop {
        let mut byte = (len & 0x7f) as u8;
        len >>= 7;
        if len > 0 {
            byte |= 0x80;
        }
        out[idx] = byte;
        idx += 1;
        if len == 0 {
            return idx;
        }
    }
}

/// An MQTT control packet, borrowing strings from the buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Repr<'a> {
    Connect {
        client_id: &'a str,
        flags: u8,
        keep_alive: u16,
    },
    ConnAck {
        session_present: bool,
        return_code: u8,
    },
    Publish {
        topic: &'a str,
        message: &'a [u8],
    },
    Subscribe {
        packet_id: u16,
        topic: &'a str,
        qos: u8,
    },
    SubAck {
        packet_id: u16,
        return_code: u8,
    },
    Unsubscribe {
        packet_id: u16,
        topic: &'a str,
    },
    UnsubAck {
        packet_id: u16,
    },
    PingReq,
    PingResp,
    Disconnect,
}

/// Sequential writer over an exactly sized packet buffer.
struct Writer<'a> {
    buffer: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn u8(&mut self, value: u8) {
        self.buffer[self.pos] = value;
        self.pos += 1;
    }

    fn u16(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer[self.pos..self.pos + 2], value);
        self.pos += 2;
    }

    fn bytes(&mut self, value: &[u8]) {
        self.buffer[self.pos..self.pos + value.len()].copy_from_slice(value);
        self.pos += value.len();
    }

    fn string(&mut self, value: &[u8]) {
        self.u16(value.len() as u16);
        self.bytes(value);
    }

    fn remaining_len(&mut self, len: usize) {
        self.pos += encode_remaining_len(len, &mut self.buffer[self.pos..]);
    }
}

/// Sequential reader over the remaining bytes of a packet.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn u8(&mut self) -> Result<u8> {
        let (&first, rest) = self.data.split_first().ok_or(Error::Truncated)?;
        self.data = rest;
        Ok(first)
    }

    fn u16(&mut self) -> Result<u16> {
        if self.data.len() < 2 {
            return Err(Error::Truncated);
        }
        let (head, rest) = self.data.split_at(2);
        self.data = rest;
        Ok(NetworkEndian::read_u16(head))
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.data.len() < len {
            return Err(Error::Truncated);
        }
        let (head, rest) = self.data.split_at(len);
        self.data = rest;
        Ok(head)
    }

    fn string(&mut self) -> Result<&'a str> {
        let len = self.u16()?;
        let raw = self.bytes(usize::from(len))?;
        str::from_utf8(raw).map_err(|_| Error::Malformed)
    }

    fn rest(&mut self) -> &'a [u8] {
        core::mem::take(&mut self.data)
    }
}

impl<'a> Repr<'a> {
    /// Parse an inbound control packet.
    ///
    /// Only the packets a broker sends to a client are recognized: CONNACK, PUBLISH, SUBACK,
    /// UNSUBACK and PINGRESP.
    pub fn parse(packet: &'a mqtt) -> Result<Repr<'a>> {
        packet.check_len()?;
        let mut reader = Reader { data: packet.remaining_slice() };

        match packet.packet_type() {
            0x2 => {
                let flags = reader.u8()?;
                let return_code = reader.u8()?;
                Ok(Repr::ConnAck { session_present: flags & 0x01 != 0, return_code })
            },
            0x3 => {
                let qos = (packet.control() >> 1) & 0x3;
                let topic = reader.string()?;
                if qos > 0 {
                    // Packet identifier, we never acknowledge.
                    reader.u16()?;
                }
                Ok(Repr::Publish { topic, message: reader.rest() })
            },
            0x9 => {
                let packet_id = reader.u16()?;
                let return_code = reader.u8()?;
                Ok(Repr::SubAck { packet_id, return_code })
            },
            0xB => Ok(Repr::UnsubAck { packet_id: reader.u16()? }),
            0xD => Ok(Repr::PingResp),
            _ => Err(Error::Unrecognized),
        }
    }

    /// The control byte of this packet.
    pub fn code(&self) -> Code {
        match self {
            Repr::Connect { .. } => Code::Connect,
            Repr::ConnAck { .. } => Code::ConnAck,
            Repr::Publish { .. } => Code::Publish,
            Repr::Subscribe { .. } => Code::Subscribe,
            Repr::SubAck { .. } => Code::SubAck,
            Repr::Unsubscribe { .. } => Code::Unsubscribe,
            Repr::UnsubAck { .. } => Code::UnsubAck,
            Repr::PingReq => Code::PingReq,
            Repr::PingResp => Code::PingResp,
            Repr::Disconnect => Code::Disconnect,
        }
    }

    /// The length of everything after the fixed header.
    pub fn remaining_len(&self) -> usize {
        match *self {
            // Name, level, flags, keep alive and the client id string.
            Repr::Connect { client_id, .. } =>
                2 + PROTOCOL_NAME.len() + 1 + 1 + 2 + 2 + client_id.len(),
            Repr::ConnAck { .. } => 2,
            Repr::Publish { topic, message } => 2 + topic.len() + message.len(),
            Repr::Subscribe { topic, .. } => 2 + 2 + topic.len() + 1,
            Repr::SubAck { .. } => 3,
            Repr::Unsubscribe { topic, .. } => 2 + 2 + topic.len(),
            Repr::UnsubAck { .. } => 2,
            Repr::PingReq | Repr::PingResp | Repr::Disconnect => 0,
        }
    }

    /// Return the length of the packet that will be emitted, fixed header included.
    pub fn buffer_len(&self) -> usize {
        let remaining = self.remaining_len();
        1 + remaining_len_size(remaining) + remaining
    }

    /// Emit the packet into a buffer of exactly [`buffer_len`] octets.
    ///
    /// [`buffer_len`]: #method.buffer_len
    pub fn emit(&self, packet: &mut mqtt) {
        let mut writer = Writer { buffer: &mut packet.0, pos: 0 };
        writer.u8(self.code().into());
        writer.remaining_len(self.remaining_len());

        match *self {
            Repr::Connect { client_id, flags, keep_alive } => {
                writer.string(PROTOCOL_NAME);
                writer.u8(PROTOCOL_LEVEL);
                writer.u8(flags);
                writer.u16(keep_alive);
                writer.string(client_id.as_bytes());
            },
            Repr::ConnAck { session_present, return_code } => {
                writer.u8(u8::from(session_present));
                writer.u8(return_code);
            },
            Repr::Publish { topic, message } => {
                writer.string(topic.as_bytes());
                writer.bytes(message);
            },
            Repr::Subscribe { packet_id, topic, qos } => {
                writer.u16(packet_id);
                writer.string(topic.as_bytes());
                writer.u8(qos);
            },
            Repr::SubAck { packet_id, return_code } => {
                writer.u16(packet_id);
                writer.u8(return_code);
            },
            Repr::Unsubscribe { packet_id, topic } => {
                writer.u16(packet_id);
                writer.string(topic.as_bytes());
            },
            Repr::UnsubAck { packet_id } => writer.u16(packet_id),
            Repr::PingReq | Repr::PingResp | Repr::Disconnect => (),
        }
    }
}

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Repr::Connect { client_id, keep_alive, .. } =>
                write!(f, "MQTT CONNECT id={} keepalive={}", client_id, keep_alive),
            Repr::ConnAck { return_code, .. } =>
                write!(f, "MQTT CONNACK rc={}", return_code),
            Repr::Publish { topic, message } =>
                write!(f, "MQTT PUBLISH topic={} len={}", topic, message.len()),
            Repr::Subscribe { topic, .. } =>
                write!(f, "MQTT SUBSCRIBE topic={}", topic),
            Repr::SubAck { packet_id, return_code } =>
                write!(f, "MQTT SUBACK id={} rc={}", packet_id, return_code),
            Repr::Unsubscribe { topic, .. } =>
                write!(f, "MQTT UNSUBSCRIBE topic={}", topic),
            Repr::UnsubAck { packet_id } =>
                write!(f, "MQTT UNSUBACK id={}", packet_id),
            Repr::PingReq => write!(f, "MQTT PINGREQ"),
            Repr::PingResp => write!(f, "MQTT PINGRESP"),
            Repr::Disconnect => write!(f, "MQTT DISCONNECT"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static CONNECT_BYTES: [u8; 19] =
        [0x10, 0x11,
         0x00, 0x04, b'M', b'Q', b'T', b'T',
         0x04, 0x02, 0x00, 0x3c,
         0x00, 0x05, b'h', b'e', b'l', b'l', b'o'];

    static PUBLISH_BYTES: [u8; 9] =
        [0x30, 0x07, 0x00, 0x03, b'a', b'/', b'b', b'h', b'i'];

    static SUBSCRIBE_BYTES: [u8; 10] =
        [0x82, 0x08, 0x00, 0x01, 0x00, 0x03, b'a', b'/', b'b', 0x00];

    static UNSUBSCRIBE_BYTES: [u8; 9] =
        [0xa2, 0x07, 0x00, 0x01, 0x00, 0x03, b'a', b'/', b'b'];

    fn emitted(repr: Repr) -> Vec<u8> {
        let mut bytes = vec![0xa5; repr.buffer_len()];
        repr.emit(mqtt::new_unchecked_mut(&mut bytes));
        bytes
    }

    #[test]
    fn emit_connect() {
        let repr = Repr::Connect { client_id: "hello", flags: CLEAN_SESSION, keep_alive: 60 };
        assert_eq!(repr.remaining_len(), 12 + 5);
        assert_eq!(emitted(repr), &CONNECT_BYTES[..]);
    }

    #[test]
    fn emit_requests() {
        assert_eq!(emitted(Repr::Publish { topic: "a/b", message: b"hi" }), &PUBLISH_BYTES[..]);
        assert_eq!(emitted(Repr::Subscribe { packet_id: 1, topic: "a/b", qos: 0 }),
                   &SUBSCRIBE_BYTES[..]);
        assert_eq!(emitted(Repr::Unsubscribe { packet_id: 1, topic: "a/b" }),
                   &UNSUBSCRIBE_BYTES[..]);
        assert_eq!(emitted(Repr::Disconnect), &[0xe0, 0x00][..]);
        assert_eq!(emitted(Repr::PingReq), &[0xc0, 0x00][..]);
    }

    #[test]
    fn parse_replies() {
        fn parse(bytes: &[u8]) -> Result<Repr<'_>> {
            Repr::parse(mqtt::new_unchecked(bytes))
        }

        assert_eq!(parse(&[0x20, 0x02, 0x00, 0x00]),
                   Ok(Repr::ConnAck { session_present: false, return_code: 0 }));
        assert_eq!(parse(&[0x90, 0x03, 0x00, 0x01, 0x00]),
                   Ok(Repr::SubAck { packet_id: 1, return_code: 0 }));
        assert_eq!(parse(&[0xb0, 0x02, 0x00, 0x01]), Ok(Repr::UnsubAck { packet_id: 1 }));
        assert_eq!(parse(&[0xd0, 0x00]), Ok(Repr::PingResp));
        assert_eq!(parse(&PUBLISH_BYTES), Ok(Repr::Publish { topic: "a/b", message: b"hi" }));
        assert_eq!(parse(&[0xe0, 0x00]), Err(Error::Unrecognized));
    }

    #[test]
    fn parse_publish_qos1() {
        let bytes = [0x32, 0x09, 0x00, 0x03, b'a', b'/', b'b', 0x00, 0x07, b'h', b'i'];
        let packet = mqtt::new_checked(&bytes[..]).unwrap();
        assert_eq!(packet.packet_type(), 0x3);
        assert_eq!(Repr::parse(packet), Ok(Repr::Publish { topic: "a/b", message: b"hi" }));
    }

    #[test]
    fn long_remaining_length() {
        let message = [b'x'; 200];
        let repr = Repr::Publish { topic: "a/b", message: &message };
        let bytes = emitted(repr);
        assert_eq!(&bytes[..3], &[0x30, 0xcd, 0x01]);
        assert_eq!(bytes.len(), 3 + 205);
        assert_eq!(Repr::parse(mqtt::new_unchecked(&bytes)), Ok(repr));
    }

    #[test]
    fn remaining_length_limits() {
        assert_eq!(decode_remaining_len(&[0x00]), Ok((0, 1)));
        assert_eq!(decode_remaining_len(&[0xff, 0x7f]), Ok((16_383, 2)));
        assert_eq!(decode_remaining_len(&[0xff, 0xff, 0xff, 0x7f]), Ok((268_435_455, 4)));
        assert_eq!(decode_remaining_len(&[0xff, 0xff]), Err(Error::Truncated));
        assert_eq!(decode_remaining_len(&[0xff, 0xff, 0xff, 0xff, 0x01]), Err(Error::Malformed));

        let mut out = [0; 4];
        assert_eq!(encode_remaining_len(16_384, &mut out), 3);
        assert_eq!(&out[..3], &[0x80u8, 0x80, 0x01][..]);
        assert_eq!(remaining_len_size(16_384), 3);
    }

    #[test]
    fn truncated_packet() {
        assert_eq!(mqtt::new_checked(&PUBLISH_BYTES[..8]), Err(Error::Truncated));
        assert_eq!(mqtt::new_checked(&[]), Err(Error::Truncated));
    }

    #[test]
    fn packets_back_to_back() {
        let mut bytes = vec![0x90, 0x03, 0x00, 0x01, 0x00];
        bytes.extend_from_slice(&PUBLISH_BYTES);
        let first = mqtt::new_checked(&bytes[..]).unwrap();
        assert_eq!(first.packet_len(), 5);
        let second = mqtt::new_checked(&bytes[first.packet_len()..]).unwrap();
        assert_eq!(second.packet_len(), PUBLISH_BYTES.len());
        assert_eq!(Repr::parse(second), Ok(Repr::Publish { topic: "a/b", message: b"hi" }));
    }
}
