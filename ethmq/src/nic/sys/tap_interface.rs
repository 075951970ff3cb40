// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
use std::os::unix::io::{RawFd, AsRawFd};

use super::{check, Errno, InterfaceName};

use crate::layer::{Error, Result};
use crate::nic::Transport;

/// Large enough for any frame the kernel hands to a tap.
const STAGING_LEN: usize = 1 << 16;

/// The open descriptor of a tap, with its name for interface queries.
///
/// Reads and writes single frames but is not a [`Transport`] by itself, see [`TapInterface`].
///
/// [`Transport`]: ../../trait.Transport.html
/// [`TapInterface`]: struct.TapInterface.html
#[derive(Debug)]
pub struct TapInterfaceDesc {
    lower: libc::c_int,
    name: InterfaceName,
}

/// A tap interface usable as the transport of the engine.
///
/// Reading is non-blocking. Asking whether data is available reads one frame into a staging
/// buffer, where it waits for `receive_into`.
#[derive(Debug)]
pub struct TapInterface {
    inner: TapInterfaceDesc,
    staged: Vec<u8>,
    staged_len: Option<usize>,
    overflow: bool,
    last_err: Option<Errno>,
}

impl AsRawFd for TapInterfaceDesc {
    fn as_raw_fd(&self) -> RawFd {
        self.lower
    }
}

impl AsRawFd for TapInterface {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

static TAP_PATH: &'static [u8] = b"/dev/net/tun\0";

impl TapInterfaceDesc {
    /// Open the tun device for the named tap, non-blocking.
    ///
    /// The descriptor is not bound to the tap until [`attach_interface`].
    ///
    /// [`attach_interface`]: #method.attach_interface
    pub fn new(name: &str) -> core::result::Result<TapInterfaceDesc, Errno> {
        let lower = unsafe {
            libc::open(
                TAP_PATH.as_ptr() as *const libc::c_char,
                libc::O_RDWR | libc::O_NONBLOCK)
        };

        let lower = check(lower)?;

        Ok(TapInterfaceDesc {
            lower,
            name: InterfaceName::new(name),
        })
    }

    /// Bind the descriptor to the tap, creating the tap if it does not exist.
    pub fn attach_interface(&mut self) -> core::result::Result<(), Errno> {
        self.name.attach_tap(self.lower)
    }

    /// The mtu of the tap.
    pub fn interface_mtu(&mut self) -> core::result::Result<usize, Errno> {
        let name = &self.name;
        with_inet_socket(|socket| name.mtu(socket))
            .map(|mtu| mtu as usize)
    }

    /// Whether the interface is up and running.
    pub fn is_running(&mut self) -> core::result::Result<bool, Errno> {
        let name = &self.name;
        let flags = with_inet_socket(|socket| name.flags(socket))?;
        let wanted = libc::IFF_UP | libc::IFF_RUNNING;
        Ok(flags & wanted == wanted)
    }

    /// Read one frame, truncated to the buffer.
    pub fn recv(&mut self, buffer: &mut [u8]) -> core::result::Result<usize, Errno> {
        let len = unsafe {
            libc::read(
                self.lower,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len())
        };
        Ok(check(len)? as usize)
    }

    /// Write one frame.
    pub fn send(&mut self, buffer: &[u8]) -> core::result::Result<usize, Errno> {
        let len = unsafe {
            libc::write(
                self.lower,
                buffer.as_ptr() as *const libc::c_void,
                buffer.len())
        };
        Ok(check(len)? as usize)
    }
}

/// Interface ioctls need a socket of the address family, not the tap descriptor.
fn with_inet_socket<T>(
    query: impl FnOnce(libc::c_int) -> core::result::Result<T, Errno>,
) -> core::result::Result<T, Errno> {
    let socket = unsafe {
        libc::socket(libc::AF_INET, libc::SOCK_DGRAM, libc::IPPROTO_IP)
    };

    let socket = check(socket)?;
    let result = query(socket);
    unsafe { libc::close(socket); }
    result
}

impl TapInterface {
    /// Open a tap interface by name.
    pub fn new(name: &str) -> core::result::Result<Self, Errno> {
        let inner = TapInterfaceDesc::new(name)?;
        Self::with_descriptor(inner)
    }

    /// Wrap an existing descriptor into a transport.
    pub fn with_descriptor(mut inner: TapInterfaceDesc) -> core::result::Result<Self, Errno> {
        inner.attach_interface()?;
        Ok(TapInterface {
            inner,
            staged: vec![0; STAGING_LEN],
            staged_len: None,
            overflow: false,
            last_err: None,
        })
    }

    /// The descriptor, for queries such as the mtu.
    pub fn descriptor(&mut self) -> &mut TapInterfaceDesc {
        &mut self.inner
    }

    /// Take the last io error returned by the OS.
    pub fn last_err(&mut self) -> Option<Errno> {
        self.last_err.take()
    }

    fn stage(&mut self) {
        if self.staged_len.is_some() {
            return;
        }

        match self.inner.recv(&mut self.staged) {
            Ok(len) => self.staged_len = Some(len),
            Err(ref err) if err.is_would_block() => (),
            Err(err) => {
                net_warn!("tap: receive failed: {}", err);
                // The frame, if there was one, is gone.
                self.overflow = true;
                self.last_err = Some(err);
            },
        }
    }
}

impl Drop for TapInterfaceDesc {
    fn drop(&mut self) {
        unsafe { libc::close(self.lower); }
    }
}

impl Transport for TapInterface {
    fn is_data_available(&mut self) -> bool {
        self.stage();
        self.staged_len.is_some()
    }

    fn take_overflow(&mut self) -> bool {
        core::mem::replace(&mut self.overflow, false)
    }

    fn receive_into(&mut self, buffer: &mut [u8]) -> usize {
        self.stage();
        let staged = match self.staged_len.take() {
            Some(len) => len,
            None => return 0,
        };
        let len = staged.min(buffer.len());
        buffer[..len].copy_from_slice(&self.staged[..len]);
        len
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        match self.inner.send(frame) {
            Ok(_) => Ok(()),
            Err(err) => {
                net_warn!("tap: transmit failed: {}", err);
                self.last_err = Some(err);
                Err(Error::Aborted)
            },
        }
    }

    fn is_link_up(&mut self) -> bool {
        match self.inner.is_running() {
            Ok(running) => running,
            Err(err) => {
                self.last_err = Some(err);
                false
            },
        }
    }
}
