#![allow(unsafe_code)]
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//
// Applies to files in this folder unless otherwise noted. These are:
// * `linux.rs`
// * `mod.rs`
// * `tap_interface.rs`
use core::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
mod tap_interface;

/// Everything the `sys` feature exports, with the `cfg` bits kept in here.
pub mod exports {
    #[cfg(target_os = "linux")]
    pub use super::tap_interface::{TapInterface, TapInterfaceDesc};
    pub use super::wait as sys_wait;
    pub use super::Errno;
}

/// Block until `fd` is readable or the timeout passed, forever without a timeout.
///
/// Returns whether the descriptor is readable.
pub fn wait(fd: RawFd, timeout: Option<Duration>) -> Result<bool, Errno> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout = match timeout {
        Some(timeout) => timeout.as_millis().min(libc::c_int::max_value() as u128) as libc::c_int,
        None => -1,
    };

    check(unsafe { libc::poll(&mut pollfd, 1, timeout) })?;
    Ok(pollfd.revents & libc::POLLIN != 0)
}

/// The errno of a failed libc call.
///
/// Converts into a `std::io::Error` for a readable description.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Errno(pub libc::c_int);

impl Errno {
    /// The errno of the last failed call on this thread.
    pub fn last() -> Errno {
        Errno(io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }

    /// Whether the call would have blocked.
    pub fn is_would_block(&self) -> bool {
        self.0 == libc::EWOULDBLOCK || self.0 == libc::EAGAIN
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", io::Error::from_raw_os_error(self.0))
    }
}

impl std::error::Error for Errno {}

impl From<Errno> for io::Error {
    fn from(err: Errno) -> io::Error {
        io::Error::from_raw_os_error(err.0)
    }
}

/// Return values of libc calls that signal failure with `-1`.
trait MinusOne: Copy + PartialEq {
    const MINUS_ONE: Self;
}

impl MinusOne for i32 {
    const MINUS_ONE: Self = -1;
}

impl MinusOne for isize {
    const MINUS_ONE: Self = -1;
}

/// Turn a failing return value into the errno it left behind.
fn check<T: MinusOne>(value: T) -> Result<T, Errno> {
    if value == T::MINUS_ONE {
        Err(Errno::last())
    } else {
        Ok(value)
    }
}

/// The name part of a `struct ifreq`, nul terminated.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
struct InterfaceName {
    ifr_name: [libc::c_char; libc::IF_NAMESIZE],
}

impl InterfaceName {
    /// Truncates names longer than the kernel accepts.
    fn new(name: &str) -> Self {
        let mut ifr_name = [0; libc::IF_NAMESIZE];
        for (slot, byte) in ifr_name[..libc::IF_NAMESIZE - 1].iter_mut().zip(name.as_bytes()) {
            *slot = *byte as libc::c_char
        }
        InterfaceName { ifr_name }
    }
}
