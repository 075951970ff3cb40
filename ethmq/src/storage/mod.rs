//! Persistent configuration words.
//!
//! The board keeps its settings in a small word addressed memory organized in blocks of sixteen
//! words. The [`KeyStore`] trait is the narrow interface to it, [`MemoryStore`] keeps the words in
//! RAM for tests and the host shell.
//!
//! [`KeyStore`]: trait.KeyStore.html
//! [`MemoryStore`]: struct.MemoryStore.html
use core::fmt;

use crate::wire::Ipv4Address;

/// Number of words in one block.
pub const BLOCK_LEN: u16 = 16;

/// The first of the four slots holding the configured IP address.
pub const IP_ADDRESS: u16 = 0;

/// The address of a word, from its block and its offset in the block.
pub fn address(block: u16, offset: u16) -> Result<u16> {
    block.checked_mul(BLOCK_LEN)
        .and_then(|start| start.checked_add(offset))
        .ok_or(Error::OutOfRange)
}

/// The four slots of an IP address starting at `base`.
fn ip_slots(base: u16) -> Result<core::ops::RangeInclusive<u16>> {
    let last = base.checked_add(3).ok_or(Error::OutOfRange)?;
    Ok(base..=last)
}

/// Errors of a key store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The address lies beyond the end of the store.
    OutOfRange,

    /// The underlying memory reported a failed write.
    Write,
}

/// Result type of key store operations.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OutOfRange => write!(f, "address out of range"),
            Error::Write => write!(f, "write failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// A word addressed persistent store.
///
/// Reading an address that was never written returns whatever the memory holds, typically zero.
pub trait KeyStore {
    /// Read the word at an address.
    fn read(&self, address: u16) -> u32;

    /// Write the word at an address, returning once it is stored.
    fn write(&mut self, address: u16, value: u32) -> Result<()>;
}

impl<S: KeyStore + ?Sized> KeyStore for &'_ mut S {
    fn read(&self, address: u16) -> u32 {
        (**self).read(address)
    }

    fn write(&mut self, address: u16, value: u32) -> Result<()> {
        (**self).write(address, value)
    }
}

/// A key store in memory, with `N` words all initially zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryStore<const N: usize = 64> {
    words: [u32; N],
}

impl<const N: usize> MemoryStore<N> {
    /// An empty store.
    pub const fn new() -> Self {
        MemoryStore { words: [0; N] }
    }

    /// All words of the store.
    pub fn words(&self) -> &[u32] {
        &self.words[..]
    }
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl<const N: usize> KeyStore for MemoryStore<N> {
    fn read(&self, address: u16) -> u32 {
        self.words.get(usize::from(address)).copied().unwrap_or(0)
    }

    fn write(&mut self, address: u16, value: u32) -> Result<()> {
        let word = self.words.get_mut(usize::from(address)).ok_or(Error::OutOfRange)?;
        *word = value;
        Ok(())
    }
}

/// Persist an IP address as four words, one octet each, starting at `base`.
pub fn save_ip<S: KeyStore + ?Sized>(store: &mut S, base: u16, addr: Ipv4Address) -> Result<()> {
    for (slot, &octet) in ip_slots(base)?.zip(addr.as_bytes()) {
        store.write(slot, u32::from(octet))?;
    }
    Ok(())
}

/// Load an IP address saved with [`save_ip`].
///
/// Returns `None` when all four slots are zero, that is nothing was saved, or when they do not fit
/// below the highest address. Only the low octet of each word is used.
///
/// [`save_ip`]: fn.save_ip.html
pub fn load_ip<S: KeyStore + ?Sized>(store: &S, base: u16) -> Option<Ipv4Address> {
    let mut octets = [0u8; 4];
    for (slot, octet) in ip_slots(base).ok()?.zip(octets.iter_mut()) {
        *octet = store.read(slot) as u8;
    }

    let addr = Ipv4Address(octets);
    if addr.is_unspecified() {
        None
    } else {
        Some(addr)
    }
}
