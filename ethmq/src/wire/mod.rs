/*! Low-level frame access and construction.

# Frame representations

The `wire` module deals with the frame *representation* on two levels.

 * Lowercase byte wrappers such as [`ethernet_frame`] or [`tcp_packet`] extract fields from
   sequences of octets and insert fields into them. They are the only place where conversion to
   and from network byte order happens.
 * The `Repr` family of structs and enums, e.g. [`ArpRepr`] or [`Ipv4Repr`], is a compact,
   high-level representation of header data that can be parsed from and emitted into a wrapper.

Every layer is embedded in the payload of the previous one. The IPv4 header length is read from
the packet itself, so the transport layer starts at a variable offset.

[`ethernet_frame`]: struct.ethernet_frame.html
[`tcp_packet`]: struct.tcp_packet.html
[`ArpRepr`]: struct.ArpRepr.html
[`Ipv4Repr`]: struct.Ipv4Repr.html

If the `check_len()` method of a byte wrapper returned `Ok(())`, then no field accessor or setter
will panic; the guarantee only holds as long as the length fields named in its documentation are
not mutated. The `new_checked` constructor is a shorthand for `new_unchecked` and `check_len`.
When parsing untrusted input it is *necessary* to use a checked constructor. When emitting output
it is *incorrect* to use one: the check would read stale length fields of whatever frame occupied
the buffer before.

`Repr::parse()` never panics. `Repr::emit()` never panics as long as the buffer is at least
`Repr::buffer_len()` octets long; for TCP and MQTT it must be exactly that long.

# Checksums

The [`checksum`] module holds the RFC 1071 accumulator shared by IPv4, ICMP, UDP and TCP. Whether
a checksum is computed and verified or left alone is decided per call with [`Checksum`].

[`checksum`]: checksum/index.html
[`Checksum`]: enum.Checksum.html

# Examples

To emit an IP packet header into an octet buffer, and then parse it back:

```rust
use ethmq::wire::*;
let repr = Ipv4Repr {
    src_addr:    Ipv4Address::new(192, 168, 10, 138),
    dst_addr:    Ipv4Address::new(192, 168, 10, 2),
    protocol:    IpProtocol::Tcp,
    payload_len: 10,
    hop_limit:   128,
};
let mut buffer = vec![0; repr.buffer_len() + repr.payload_len];
{ // emission
    let packet = ipv4_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet, Checksum::Manual);
}
{ // parsing
    let packet = ipv4_packet::new_checked(&buffer)
        .expect("truncated packet");
    let parsed = Ipv4Repr::parse(packet, Checksum::Manual)
        .expect("malformed packet");
    assert_eq!(repr, parsed);
}
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// The byte wrapper structure of this folder follows `smoltcp`, originally distributed under
// 0-clause BSD. Applies to `arp.rs`, `error.rs`, `ethernet.rs`, `icmpv4.rs`, `ipv4.rs`, `tcp.rs`,
// `udp.rs` and `mod.rs` (this file).

// Most fields of the `Repr` types are self-explanatory.
#![allow(missing_docs)]

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

pub mod arp;
pub mod checksum;
mod error;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod mqtt;
pub mod tcp;
pub mod udp;

/// Whether checksums are computed on emit and verified on parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// Compute on emit, verify on parse.
    Manual,

    /// The checksum is not computed and never checked.
    Ignored,
}

impl Checksum {
    /// Whether checksums are computed and verified.
    pub fn manual(self) -> bool {
        match self {
            Checksum::Manual => true,
            Checksum::Ignored => false,
        }
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::Manual
    }
}

pub use self::error::{
    Error,
    Result};

pub use self::ethernet::{
    ethernet as ethernet_frame,
    EtherType as EthernetProtocol,
    Address as EthernetAddress,
    Repr as EthernetRepr};

pub use self::arp::{
    arp as arp_packet,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    Repr as Ipv4Repr};

pub use self::icmpv4::{
    icmpv4 as icmpv4_packet,
    Message as Icmpv4Message,
    Repr as Icmpv4Repr};

pub use self::udp::{
    udp as udp_packet,
    Repr as UdpRepr};

pub use self::tcp::{
    tcp as tcp_packet,
    Flags as TcpFlags,
    Repr as TcpRepr};

pub use self::mqtt::{
    mqtt as mqtt_packet,
    Code as MqttCode,
    Repr as MqttRepr};
