//! Encapsulates the network interface card.
//!
//! The engine only ever needs one frame at a time: ask whether one arrived, copy it into the
//! caller's buffer, and send a finished frame. [`Transport`] is that narrow interface. A software
//! [`Loopback`] stands in for hardware in tests, a Linux tap interface is available with the `sys`
//! feature.
//!
//! [`Transport`]: trait.Transport.html
//! [`Loopback`]: loopback/struct.Loopback.html
#[cfg(feature = "std")]
pub mod loopback;

#[cfg(feature = "sys")]
#[path="sys/mod.rs"]
mod sys_internal;

use crate::layer::Result;

#[cfg(feature = "sys")]
pub use self::sys_internal::exports as sys;

/// The maximum frame: Ethernet header with VLAN tag (18), MTU (1500) and CRC (4).
pub const MAX_FRAME_LEN: usize = 1522;

/// A layer 2 device delivering and sending one frame at a time.
pub trait Transport {
    /// Whether a received frame is waiting.
    fn is_data_available(&mut self) -> bool;

    /// Whether frames were lost since the last call.
    ///
    /// Reading the flag clears it.
    fn take_overflow(&mut self) -> bool;

    /// Copy the next received frame into `buffer`.
    ///
    /// A frame longer than the buffer is truncated to its capacity. Returns the number of octets
    /// written, zero when no frame was waiting.
    fn receive_into(&mut self, buffer: &mut [u8]) -> usize;

    /// Send a complete frame.
    ///
    /// Blocks until the device reports success, or fails with `Error::Aborted`.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Whether the physical link is established.
    fn is_link_up(&mut self) -> bool;
}

impl<T: Transport + ?Sized> Transport for &'_ mut T {
    fn is_data_available(&mut self) -> bool {
        (**self).is_data_available()
    }

    fn take_overflow(&mut self) -> bool {
        (**self).take_overflow()
    }

    fn receive_into(&mut self, buffer: &mut [u8]) -> usize {
        (**self).receive_into(buffer)
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn is_link_up(&mut self) -> bool {
        (**self).is_link_up()
    }
}
