use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{checksum, Checksum, Error, Result};

enum_with_unknown! {
    /// ICMPv4 message types, the echo pair is all we answer.
    pub doc enum Message(u8) {
        /// Echo reply
        EchoReply      =  0,
        /// Echo request
        EchoRequest    =  8,
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::EchoReply      => write!(f, "echo reply"),
            Message::EchoRequest    => write!(f, "echo request"),
            Message::Unknown(id)    => write!(f, "{}", id),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an ICMPv4 message.
    #[derive(Debug, PartialEq, Eq)]
    pub struct icmpv4([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const TYPE:       usize = 0;
    pub(crate) const CODE:       usize = 1;
    pub(crate) const CHECKSUM:   Field = 2..4;

    pub(crate) const ECHO_IDENT: Field = 4..6;
    pub(crate) const ECHO_SEQNO: Field = 6..8;

    pub(crate) const HEADER_END: usize = 8;
}

/// The length of an echo header, up to and including the sequence number.
pub const HEADER_LEN: usize = field::HEADER_END;

impl icmpv4 {
    /// View octets as ICMPv4 packet, unchecked.
    pub fn new_unchecked(buffer: &[u8]) -> &icmpv4 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// View mutable octets as ICMPv4 packet, unchecked.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut icmpv4 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Wrap a buffer that passed [`check_len`].
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&icmpv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// All octets of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check that every accessor stays in bounds, `Error::Truncated` otherwise.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < field::HEADER_END {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The message type.
    #[inline]
    pub fn msg_type(&self) -> Message {
        Message::from(self.0[field::TYPE])
    }

    /// The message code.
    #[inline]
    pub fn msg_code(&self) -> u8 {
        self.0[field::CODE]
    }

    /// The checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// The echo identifier.
    #[inline]
    pub fn echo_ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_IDENT])
    }

    /// The echo sequence number.
    #[inline]
    pub fn echo_seq_no(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_SEQNO])
    }

    /// Validate the checksum over header and payload.
    pub fn verify_checksum(&self) -> bool {
        checksum::compute(self.as_bytes()) == 0
    }

    /// Write the message type.
    #[inline]
    pub fn set_msg_type(&mut self, value: Message) {
        self.0[field::TYPE] = value.into();
    }

    /// Write the message code.
    #[inline]
    pub fn set_msg_code(&mut self, value: u8) {
        self.0[field::CODE] = value;
    }

    /// Write the checksum.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value);
    }

    /// Write the echo identifier.
    #[inline]
    pub fn set_echo_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_IDENT], value);
    }

    /// Write the echo sequence number.
    #[inline]
    pub fn set_echo_seq_no(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_SEQNO], value);
    }

    /// Compute and fill in the checksum over header and payload.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = checksum::compute(&self.0);
        self.set_checksum(checksum);
    }

    /// The payload octets.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::HEADER_END..]
    }

    /// The payload octets, mutably.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::HEADER_END..]
    }
}

impl AsRef<[u8]> for icmpv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An echo request or reply, the only messages we handle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Repr {
    EchoRequest {
        ident:  u16,
        seq_no: u16,
        payload: usize,
    },
    EchoReply {
        ident:  u16,
        seq_no: u16,
        payload: usize,
    },
}

impl Repr {
    /// Get the echo reply if this is an echo request.
    pub fn echo_reply(self) -> Option<Repr> {
        match self {
            Repr::EchoRequest { ident, seq_no, payload, } =>
                Some(Repr::EchoReply { ident, seq_no, payload, }),
            _ => None,
        }
    }

    /// Read an ICMPv4 message into its representation.
    pub fn parse(packet: &icmpv4, checksum: Checksum) -> Result<Repr> {
        packet.check_len()?;
        if checksum.manual() && !packet.verify_checksum() { return Err(Error::WrongChecksum) }

        match (packet.msg_type(), packet.msg_code()) {
            (Message::EchoRequest, 0) => {
                Ok(Repr::EchoRequest {
                    ident:  packet.echo_ident(),
                    seq_no: packet.echo_seq_no(),
                    payload: packet.payload_slice().len(),
                })
            },

            (Message::EchoReply, 0) => {
                Ok(Repr::EchoReply {
                    ident:  packet.echo_ident(),
                    seq_no: packet.echo_seq_no(),
                    payload: packet.payload_slice().len(),
                })
            },

            (Message::Unknown(_), _) => Err(Error::Unrecognized),
            _ => Err(Error::Unsupported),
        }
    }

    /// Length of header and payload together.
    pub fn buffer_len(&self) -> usize {
        match self {
            Repr::EchoRequest { payload, .. } |
            Repr::EchoReply { payload, .. } => field::HEADER_END + payload,
        }
    }

    /// Emit the header into an ICMPv4 message.
    ///
    /// The payload must already be in place when the checksum is requested, since it covers the
    /// whole message.
    pub fn emit(&self, packet: &mut icmpv4, checksum: Checksum) {
        let (message, ident, seq_no) = match *self {
            Repr::EchoRequest { ident, seq_no, .. } => (Message::EchoRequest, ident, seq_no),
            Repr::EchoReply { ident, seq_no, .. } => (Message::EchoReply, ident, seq_no),
        };

        packet.set_msg_type(message);
        packet.set_msg_code(0);
        packet.set_echo_ident(ident);
        packet.set_echo_seq_no(seq_no);

        if checksum.manual() {
            packet.fill_checksum()
        } else {
            packet.set_checksum(0);
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Repr::EchoRequest { ident, seq_no, payload } =>
                write!(f, "ICMPv4 echo request id={} seq={} len={}",
                       ident, seq_no, payload),
            Repr::EchoReply { ident, seq_no, payload } =>
                write!(f, "ICMPv4 echo reply id={} seq={} len={}",
                       ident, seq_no, payload),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static ECHO_PACKET_BYTES: [u8; 16] =
        [0x08, 0x00, 0x54, 0x35,
         0x12, 0x34, 0x00, 0x01,
         0x61, 0x62, 0x63, 0x64,
         0x65, 0x66, 0x67, 0x68];

    static REPLY_PACKET_BYTES: [u8; 16] =
        [0x00, 0x00, 0x5c, 0x35,
         0x12, 0x34, 0x00, 0x01,
         0x61, 0x62, 0x63, 0x64,
         0x65, 0x66, 0x67, 0x68];

    static ECHO_DATA_BYTES: [u8; 8] = *b"abcdefgh";

    #[test]
    fn test_echo_deconstruct() {
        let packet = icmpv4::new_checked(&ECHO_PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.msg_type(), Message::EchoRequest);
        assert_eq!(packet.msg_code(), 0);
        assert_eq!(packet.checksum(), 0x5435);
        assert_eq!(packet.echo_ident(), 0x1234);
        assert_eq!(packet.echo_seq_no(), 1);
        assert_eq!(packet.payload_slice(), &ECHO_DATA_BYTES[..]);
        assert!(packet.verify_checksum());
    }

    #[test]
    fn test_echo_reply_emit() {
        let request = Repr::parse(icmpv4::new_unchecked(&ECHO_PACKET_BYTES[..]), Checksum::Manual)
            .unwrap();
        let reply = request.echo_reply().unwrap();
        assert_eq!(reply.buffer_len(), 16);

        let mut bytes = vec![0xa5; reply.buffer_len()];
        let packet = icmpv4::new_unchecked_mut(&mut bytes);
        packet.payload_mut_slice().copy_from_slice(&ECHO_DATA_BYTES[..]);
        reply.emit(packet, Checksum::Manual);
        assert_eq!(packet.as_bytes(), &REPLY_PACKET_BYTES[..]);
    }

    #[test]
    fn test_no_reply_to_reply() {
        let reply = Repr::parse(icmpv4::new_unchecked(&REPLY_PACKET_BYTES[..]), Checksum::Manual)
            .unwrap();
        assert_eq!(reply.echo_reply(), None);
    }

    #[test]
    fn test_check_len() {
        assert_eq!(icmpv4::new_checked(&ECHO_PACKET_BYTES[..0]), Err(Error::Truncated));
        assert_eq!(icmpv4::new_checked(&ECHO_PACKET_BYTES[..4]), Err(Error::Truncated));
        assert!(icmpv4::new_checked(&ECHO_PACKET_BYTES[..8]).is_ok());
    }
}
