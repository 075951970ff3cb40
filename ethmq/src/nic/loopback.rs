//! Implementation of a software loop-back device.
use std::collections::VecDeque;

use super::Transport;
use crate::layer::{Error, Result};

/// A software device for driving the engine without hardware.
///
/// Frames put in with [`inject`] are received in order. Transmitted frames are not delivered back
/// but kept for inspection, so a test plays the far side of the link.
///
/// [`inject`]: #method.inject
#[derive(Clone, Debug, Default)]
pub struct Loopback {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    overflow: bool,
    link_down: bool,
    abort: bool,
}

impl Loopback {
    /// A device with the link up and nothing queued.
    pub fn new() -> Self {
        Loopback::default()
    }

    /// Queue a frame for reception.
    pub fn inject(&mut self, frame: &[u8]) {
        self.inbound.push_back(frame.to_vec());
    }

    /// Number of frames waiting for reception.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Flag a receive overflow, as if the device had dropped frames.
    pub fn set_overflow(&mut self) {
        self.overflow = true;
    }

    /// Bring the link up or down.
    pub fn set_link_up(&mut self, up: bool) {
        self.link_down = !up;
    }

    /// Make all following transmissions abort.
    pub fn set_abort(&mut self, abort: bool) {
        self.abort = abort;
    }

    /// The frames transmitted so far.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Take the frames transmitted so far.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        core::mem::replace(&mut self.sent, Vec::new())
    }
}

impl Transport for Loopback {
    fn is_data_available(&mut self) -> bool {
        !self.inbound.is_empty()
    }

    fn take_overflow(&mut self) -> bool {
        core::mem::replace(&mut self.overflow, false)
    }

    fn receive_into(&mut self, buffer: &mut [u8]) -> usize {
        let frame = match self.inbound.pop_front() {
            Some(frame) => frame,
            None => return 0,
        };
        let len = frame.len().min(buffer.len());
        buffer[..len].copy_from_slice(&frame[..len]);
        len
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        if self.abort {
            return Err(Error::Aborted);
        }
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn is_link_up(&mut self) -> bool {
        !self.link_down
    }
}
