// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
use super::{check, Errno, InterfaceName};

const SIOCGIFFLAGS: libc::Ioctl = 0x8913;
const SIOCGIFMTU: libc::Ioctl = 0x8921;
const TUNSETIFF: libc::Ioctl = 0x400454CA;

const IFF_TAP: libc::c_short = 0x0002;
const IFF_NO_PI: libc::c_short = 0x1000;

/// Size of the union following the name in `struct ifreq`.
const IFRU_LEN: usize = 24;

/// A whole `struct ifreq`, which the kernel copies in and out.
#[repr(C)]
struct Request {
    name: InterfaceName,
    ifru: [u8; IFRU_LEN],
}

impl InterfaceName {
    fn ioctl(&self, fd: libc::c_int, code: libc::Ioctl, ifru: [u8; IFRU_LEN])
        -> Result<[u8; IFRU_LEN], Errno>
    {
        let mut request = Request { name: *self, ifru };
        check(unsafe { libc::ioctl(fd, code, &mut request as *mut Request) })?;
        Ok(request.ifru)
    }

    /// Attach a tun descriptor to the tap of this name, creating it if necessary.
    pub(crate) fn attach_tap(&self, fd: libc::c_int) -> Result<(), Errno> {
        let mut ifru = [0; IFRU_LEN];
        ifru[..2].copy_from_slice(&(IFF_TAP | IFF_NO_PI).to_ne_bytes());
        self.ioctl(fd, TUNSETIFF, ifru)?;
        Ok(())
    }

    /// The mtu, queried through any socket.
    pub(crate) fn mtu(&self, socket: libc::c_int) -> Result<libc::c_int, Errno> {
        let ifru = self.ioctl(socket, SIOCGIFMTU, [0; IFRU_LEN])?;
        let mut mtu = [0; 4];
        mtu.copy_from_slice(&ifru[..4]);
        Ok(libc::c_int::from_ne_bytes(mtu))
    }

    /// The interface flags, queried through any socket.
    pub(crate) fn flags(&self, socket: libc::c_int) -> Result<libc::c_int, Errno> {
        let ifru = self.ioctl(socket, SIOCGIFFLAGS, [0; IFRU_LEN])?;
        let flags = libc::c_short::from_ne_bytes([ifru[0], ifru[1]]);
        // The flags are unsigned to the kernel.
        Ok(libc::c_int::from(flags as u16))
    }
}
