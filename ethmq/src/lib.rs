//! A minimal network stack carrying exactly one MQTT client session.
//!
//! ## Table of contents
//!
//! 1. [Design](#design)
//! 2. [The wire module](wire/index.html): codecs for Ethernet, ARP, IPv4, ICMP, UDP, TCP and MQTT
//! 3. [The layers](layer/index.html): classifiers, frame builders and the session state machine
//! 4. [The engine](engine/index.html): one poll-loop iteration over a transport
//! 5. [Network interfaces](nic/index.html)
//! 6. [The console](console/index.html) and [key storage](storage/index.html)
//!
//! ## Design
//!
//! The stack is written for a board with a discrete Ethernet controller and no operating system.
//! There is a single peer, a single connection and a single raw frame buffer that the caller owns
//! and lends to the engine for one receive or transmit cycle. Nothing dynamically allocates
//! memory. Anything that is not addressed to us, or that does not belong to the session, is
//! dropped without a reply.
//!
//! All frame access goes through the typed accessors of the [`wire`] module, which also perform
//! every conversion to and from network byte order. Classification of an inbound frame is a set of
//! pure predicates in [`layer::classify`]. The only mutable protocol state is the
//! [`layer::session::Session`], advanced by an explicit transition function.
//!
//! [`wire`]: wire/index.html
//! [`layer::classify`]: layer/classify/index.html
//! [`layer::session::Session`]: layer/session/struct.Session.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

#[macro_use] mod macros;

pub mod console;
pub mod engine;
pub mod layer;
pub mod nic;
pub mod storage;
pub mod time;
pub mod wire;
