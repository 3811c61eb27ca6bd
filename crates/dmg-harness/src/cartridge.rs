//! Cartridge header inspection
//!
//! The DMG cartridge header lives at $0100-$014F:
//! $0134-$0143 - Title (upper-case ASCII, NUL padded)
//! $0147       - Cartridge type (MBC and extras)
//! $0148       - ROM size code (32KB << n)
//! $0149       - External RAM size code
//! $014D       - Header checksum over $0134-$014C

use crate::error::HarnessError;

/// First byte past the header; any real ROM is at least this long
pub const HEADER_END: usize = 0x150;

const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x143;
const CARTRIDGE_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const RAM_SIZE: usize = 0x149;
const CHECKSUM_END: usize = 0x14C;
const HEADER_CHECKSUM: usize = 0x14D;

/// External RAM bytes indexed by the $0149 size code
const RAM_SIZES: [usize; 6] = [0, 0x800, 0x2000, 0x8000, 0x20000, 0x10000];

/// MBC2 carries 512 half-byte cells on-chip regardless of $0149
const MBC2_RAM: usize = 0x200;

/// Parsed DMG cartridge header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub title: String,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub header_checksum: u8,
    computed_checksum: u8,
}

impl CartridgeHeader {
    /// Parse the header from the start of a ROM image
    pub fn parse(rom: &[u8]) -> Result<Self, HarnessError> {
        if rom.len() < HEADER_END {
            return Err(HarnessError::RomTooSmall {
                len: rom.len(),
                required: HEADER_END,
            });
        }

        let title: String = rom[TITLE_START..TITLE_END]
            .iter()
            .take_while(|&&b| b != 0)
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| b as char)
            .collect();

        Ok(Self {
            title: title.trim_end().to_string(),
            cartridge_type: rom[CARTRIDGE_TYPE],
            rom_size_code: rom[ROM_SIZE],
            ram_size_code: rom[RAM_SIZE],
            header_checksum: rom[HEADER_CHECKSUM],
            computed_checksum: header_checksum(rom),
        })
    }

    /// Whether the stored header checksum matches the header bytes
    pub fn checksum_ok(&self) -> bool {
        self.header_checksum == self.computed_checksum
    }

    pub fn computed_checksum(&self) -> u8 {
        self.computed_checksum
    }

    /// Bytes of cartridge RAM the cartridge expects
    pub fn save_size(&self) -> usize {
        if self.is_mbc2() {
            return MBC2_RAM;
        }
        RAM_SIZES
            .get(self.ram_size_code as usize)
            .copied()
            .unwrap_or(0)
    }

    /// ROM size declared by the header, if the code is known
    pub fn declared_rom_size(&self) -> Option<usize> {
        (self.rom_size_code <= 8).then(|| 0x8000usize << self.rom_size_code)
    }

    pub fn is_mbc2(&self) -> bool {
        matches!(self.cartridge_type, 0x05 | 0x06)
    }
}

/// Header checksum: x = x - byte - 1 over $0134..=$014C
pub fn header_checksum(rom: &[u8]) -> u8 {
    rom[TITLE_START..=CHECKSUM_END]
        .iter()
        .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
}

#[cfg(test)]
pub(crate) fn test_rom(title: &str, cartridge_type: u8, ram_size_code: u8, len: usize) -> Vec<u8> {
    let mut rom = vec![0u8; len.max(HEADER_END)];
    for (i, b) in title.bytes().take(TITLE_END - TITLE_START).enumerate() {
        rom[TITLE_START + i] = b;
    }
    rom[CARTRIDGE_TYPE] = cartridge_type;
    rom[ROM_SIZE] = 0;
    rom[RAM_SIZE] = ram_size_code;
    rom[HEADER_CHECKSUM] = header_checksum(&rom);
    rom
}
