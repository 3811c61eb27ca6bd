//! Memory bridge
//!
//! Straight-line access to the two host-owned buffers:
//! - ROM image: immutable, loaded once before the core exists
//! - Cartridge RAM: sized once from the core's save size, filled with
//!   [`CART_RAM_FILL`]
//!
//! Offsets come from the core's own address decoding and are not checked
//! again here. Slice indexing means a bad offset panics instead of wrapping.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::HarnessError;

/// Erased-state value for fresh cartridge RAM
pub const CART_RAM_FILL: u8 = 0xFF;

/// Immutable ROM image owned by the host
#[derive(Debug, Clone)]
pub struct RomImage {
    bytes: Vec<u8>,
}

impl RomImage {
    /// Read a ROM file fully into memory
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let read_err = |source| HarnessError::RomRead {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(read_err)?;
        let len = file.metadata().map_err(read_err)?.len() as usize;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|source| HarnessError::Allocation {
                buffer: "ROM image",
                bytes: len,
                source,
            })?;
        file.read_to_end(&mut bytes).map_err(read_err)?;

        debug!(path = %path.display(), bytes = bytes.len(), "ROM image loaded");
        Ok(Self { bytes })
    }

    /// Wrap bytes already in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sizes of the buffers handed back when a bridge is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasedBuffers {
    pub rom_bytes: usize,
    pub cart_ram_bytes: usize,
}

/// Host side of the core's memory callbacks
#[derive(Debug)]
pub struct MemoryBridge {
    rom: RomImage,
    cart_ram: Vec<u8>,
    cart_ram_sized: bool,
}

impl MemoryBridge {
    /// Create a bridge over a ROM image. Cartridge RAM is empty until
    /// [`install_cart_ram`](Self::install_cart_ram) is called.
    pub fn new(rom: RomImage) -> Self {
        Self {
            rom,
            cart_ram: Vec::new(),
            cart_ram_sized: false,
        }
    }

    /// Allocate cartridge RAM once, filled with [`CART_RAM_FILL`]
    pub fn install_cart_ram(&mut self, size: usize) -> Result<(), HarnessError> {
        if self.cart_ram_sized {
            return Err(HarnessError::CartRamAlreadySized(self.cart_ram.len()));
        }

        let mut cart_ram = Vec::new();
        cart_ram
            .try_reserve_exact(size)
            .map_err(|source| HarnessError::Allocation {
                buffer: "cartridge RAM",
                bytes: size,
                source,
            })?;
        cart_ram.resize(size, CART_RAM_FILL);

        self.cart_ram = cart_ram;
        self.cart_ram_sized = true;
        debug!(bytes = size, "cartridge RAM installed");
        Ok(())
    }

    #[inline]
    pub fn read_rom(&self, addr: u32) -> u8 {
        self.rom.bytes[addr as usize]
    }

    #[inline]
    pub fn read_cart_ram(&self, addr: u32) -> u8 {
        self.cart_ram[addr as usize]
    }

    /// In-memory only; nothing is persisted.
    #[inline]
    pub fn write_cart_ram(&mut self, addr: u32, value: u8) {
        self.cart_ram[addr as usize] = value;
    }

    pub fn rom(&self) -> &RomImage {
        &self.rom
    }

    pub fn cart_ram(&self) -> &[u8] {
        &self.cart_ram
    }

    /// Free both buffers. Consuming `self` makes a second release impossible.
    pub fn release(self) -> ReleasedBuffers {
        let released = ReleasedBuffers {
            rom_bytes: self.rom.len(),
            cart_ram_bytes: self.cart_ram.len(),
        };
        debug!(
            rom_bytes = released.rom_bytes,
            cart_ram_bytes = released.cart_ram_bytes,
            "host buffers released"
        );
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_cart_ram_fills_erased_state() {
        let mut bridge = MemoryBridge::new(RomImage::from_bytes(vec![0; 16]));
        bridge.install_cart_ram(0x2000).unwrap();
        assert_eq!(bridge.cart_ram().len(), 0x2000);
        assert!(bridge.cart_ram().iter().all(|&b| b == CART_RAM_FILL));
    }

    #[test]
    fn test_cart_ram_is_sized_once() {
        let mut bridge = MemoryBridge::new(RomImage::from_bytes(vec![0; 16]));
        bridge.install_cart_ram(0x800).unwrap();
        let err = bridge.install_cart_ram(0x2000).unwrap_err();
        assert!(matches!(err, HarnessError::CartRamAlreadySized(0x800)));
        assert_eq!(bridge.cart_ram().len(), 0x800);
    }

    #[test]
    fn test_zero_sized_cart_ram() {
        let mut bridge = MemoryBridge::new(RomImage::from_bytes(vec![0; 16]));
        bridge.install_cart_ram(0).unwrap();
        assert!(bridge.cart_ram().is_empty());
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_rom_read_does_not_wrap() {
        let bridge = MemoryBridge::new(RomImage::from_bytes(vec![0xAB; 4]));
        bridge.read_rom(4);
    }
}
