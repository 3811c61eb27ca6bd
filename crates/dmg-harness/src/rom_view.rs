//! Stand-in core
//!
//! `RomViewCore` satisfies the core contract without executing any
//! instructions. Each frame it reads a 160x144 window of the ROM through the
//! host callbacks, four 2-bit colour classes per byte, and scrolls the window
//! down one row. It also bumps a frame counter in cartridge RAM so the RAM
//! callbacks see traffic. Useful for exercising a frontend before a real core
//! is plugged in.

use tracing::{debug, warn};

use crate::cartridge::{CartridgeHeader, HEADER_END};
use crate::emu_core::{
    blank_framebuffer, CoreHost, CpuSnapshot, EmulationCore, RawFramebuffer, SCREEN_WIDTH,
};
use crate::error::HarnessError;

/// Bytes per framebuffer row at four pixels per byte
const ROW_BYTES: usize = SCREEN_WIDTH / 4;

/// Stack pointer value after the boot ROM hands over
const BOOT_SP: u16 = 0xFFFE;

pub struct RomViewCore {
    header: CartridgeHeader,
    rom_len: usize,
    offset: usize,
    framebuffer: Box<RawFramebuffer>,
    frames: u64,
}

impl RomViewCore {
    /// Read the cartridge header through the host
    ///
    /// `rom_len` bounds every ROM read this core issues.
    pub fn init(host: &mut dyn CoreHost, rom_len: usize) -> Result<Self, HarnessError> {
        if rom_len < HEADER_END {
            return Err(HarnessError::RomTooSmall {
                len: rom_len,
                required: HEADER_END,
            });
        }

        let header_bytes: Vec<u8> = (0..HEADER_END as u32).map(|a| host.read_rom(a)).collect();
        let header = CartridgeHeader::parse(&header_bytes)?;
        if !header.checksum_ok() {
            warn!(
                stored = header.header_checksum,
                computed = header.computed_checksum(),
                "cartridge header checksum mismatch"
            );
        }
        if let Some(declared) = header.declared_rom_size() {
            if declared != rom_len {
                warn!(declared, actual = rom_len, "ROM size differs from header");
            }
        }
        debug!(title = %header.title, cartridge_type = header.cartridge_type, "cartridge header read");

        Ok(Self {
            header,
            rom_len,
            offset: 0,
            framebuffer: blank_framebuffer(),
            frames: 0,
        })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl EmulationCore for RomViewCore {
    fn required_save_size(&self) -> usize {
        self.header.save_size()
    }

    fn run_frame(&mut self, host: &mut dyn CoreHost) {
        for (y, row) in self.framebuffer.iter_mut().enumerate() {
            for (x, cells) in row.chunks_exact_mut(4).enumerate() {
                let addr = (self.offset + y * ROW_BYTES + x) % self.rom_len;
                let byte = host.read_rom(addr as u32);
                for (i, cell) in cells.iter_mut().enumerate() {
                    *cell = (byte >> (6 - 2 * i)) & 0b11;
                }
            }
        }

        let save_size = self.header.save_size();
        if save_size > 0 {
            let addr = (self.frames as usize % save_size) as u32;
            let value = host.read_cart_ram(addr);
            host.write_cart_ram(addr, value.wrapping_add(1));
        }

        self.offset = (self.offset + ROW_BYTES) % self.rom_len;
        self.frames += 1;
    }

    fn framebuffer(&self) -> &RawFramebuffer {
        &self.framebuffer
    }

    fn cpu(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: (self.offset & 0xFFFF) as u16,
            sp: BOOT_SP,
        }
    }
}

impl std::fmt::Debug for RomViewCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomViewCore")
            .field("title", &self.header.title)
            .field("rom_len", &self.rom_len)
            .field("offset", &self.offset)
            .field("frames", &self.frames)
            .finish()
    }
}
