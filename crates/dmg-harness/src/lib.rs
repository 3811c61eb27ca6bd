//! DMG Harness - host side of a pluggable Game Boy (DMG) emulation core
//!
//! The harness owns everything the core must not: the ROM image, the
//! cartridge RAM, the frame loop and the display. The core is reached only
//! through the traits in [`emu_core`]:
//! - the core calls back into the host through [`emu_core::CoreHost`] for every
//!   ROM/RAM access and to report faults,
//! - the host drives the core one frame at a time through
//!   [`emu_core::EmulationCore`].
//!
//! A [`session::Session`] wires a core to a [`bridge::MemoryBridge`] and a
//! [`fault::FaultHandler`], then runs the frame loop against any frontend
//! implementing [`sink::EventSource`] and [`sink::PresentationSink`].

#![forbid(unsafe_code)]

/// Cartridge header inspection
pub mod cartridge;
/// Memory bridge over the host-owned ROM image and cartridge RAM
pub mod bridge;
/// Core/host callback contract
pub mod emu_core;
/// Error types
pub mod error;
/// Fault classification and diagnostics
pub mod fault;
/// Monotonic frame pacing
pub mod pacer;
/// Colour-class to pixel mapping
pub mod palette;
/// Operator recovery policies
pub mod recovery;
/// Stand-in core that renders the ROM image
pub mod rom_view;
/// Frame loop
pub mod session;
/// Presentation sink and event source contracts
pub mod sink;

pub use crate::bridge::{MemoryBridge, ReleasedBuffers, RomImage, CART_RAM_FILL};
pub use crate::emu_core::{
    CoreHost, CpuSnapshot, EmulationCore, Fault, RawFramebuffer, Resolution, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
pub use crate::error::HarnessError;
pub use crate::fault::{FaultHandler, FaultReport};
pub use crate::palette::{MappedFramebuffer, Palette};
pub use crate::recovery::{RecoveryMode, RecoveryPolicy};
pub use crate::session::{HostConfig, RunReport, RunStatus, Session};
