use core::fmt;

/// The error type for parsing and emitting frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A frame was shorter than its headers or its own length fields claim.
    ///
    /// For variable length headers this may also be a header length field pointing past the end
    /// of the received data.
    Truncated,

    /// A frame had an incorrect checksum and was dropped.
    WrongChecksum,

    /// A frame could not be recognized, such as an unknown EtherType or MQTT packet type.
    Unrecognized,

    /// A frame was recognized but self-contradictory.
    ///
    /// Examples: an IPv4 header length below 20 bytes, a UDP length below 8 bytes or an MQTT
    /// remaining length spilling over four bytes.
    Malformed,

    /// Parsing would require a feature that is not implemented, such as IP fragments.
    Unsupported,
}

/// The result type for the wire codecs.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated     => write!(f, "truncated packet"),
            Error::WrongChecksum => write!(f, "checksum error"),
            Error::Unrecognized  => write!(f, "unrecognized packet"),
            Error::Malformed     => write!(f, "malformed packet"),
            Error::Unsupported   => write!(f, "unsupported option"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
