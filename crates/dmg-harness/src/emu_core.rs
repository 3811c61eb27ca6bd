//! Core/host callback contract
//!
//! The emulation core is an external collaborator. It never owns memory the
//! host is responsible for: every ROM read, cartridge RAM access and fault
//! report goes through a [`CoreHost`] handed to it for the duration of a
//! single call. The core never stores the host.

use std::fmt;

/// DMG LCD width in pixels
pub const SCREEN_WIDTH: usize = 160;
/// DMG LCD height in pixels
pub const SCREEN_HEIGHT: usize = 144;

/// Per-pixel colour classes (0-3) produced by the core, row-major.
pub type RawFramebuffer = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// Fault kinds a core may report while running a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The byte at PC does not decode to an instruction.
    InvalidOpcode(u8),
    /// A read hit an unmapped address.
    InvalidRead,
    /// A write hit an unmapped address.
    InvalidWrite,
    /// Anything the core could not classify.
    Unclassified,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::InvalidOpcode(op) => write!(f, "Invalid opcode {:#04x}", op),
            Fault::InvalidRead => write!(f, "Invalid read"),
            Fault::InvalidWrite => write!(f, "Invalid write"),
            Fault::Unclassified => write!(f, "Unknown error"),
        }
    }
}

/// The two core registers the host may inspect for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub sp: u16,
}

/// Host verdict on a reported fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Treat the fault as transient and resume at the current PC.
    Continue,
    /// Abandon the frame. The host will not call the core again.
    Terminate,
}

/// Callbacks the core uses to reach host-owned state
///
/// Addresses are offsets already decoded by the core. The host does not
/// re-validate them; an out-of-range offset is a core contract violation.
pub trait CoreHost {
    /// Read a byte from the ROM image
    fn read_rom(&mut self, addr: u32) -> u8;
    /// Read a byte from cartridge RAM
    fn read_cart_ram(&mut self, addr: u32) -> u8;
    /// Write a byte to cartridge RAM
    fn write_cart_ram(&mut self, addr: u32, value: u8);
    /// Report a fault. On [`Resolution::Terminate`] the core must return
    /// from [`EmulationCore::run_frame`] without finishing the frame.
    fn on_fault(&mut self, fault: Fault, cpu: CpuSnapshot) -> Resolution;
}

/// A cycle-stepped core the host drives one frame at a time
pub trait EmulationCore {
    /// Cartridge RAM the core expects, queried once right after construction.
    fn required_save_size(&self) -> usize;

    /// Run until the next frame boundary.
    fn run_frame(&mut self, host: &mut dyn CoreHost);

    /// The most recent complete frame.
    fn framebuffer(&self) -> &RawFramebuffer;

    /// Program counter and stack pointer.
    fn cpu(&self) -> CpuSnapshot;
}

/// A blank (colour class 0) framebuffer on the heap
pub fn blank_framebuffer() -> Box<RawFramebuffer> {
    Box::new([[0; SCREEN_WIDTH]; SCREEN_HEIGHT])
}
