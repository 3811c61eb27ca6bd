//! Frame loop
//!
//! One iteration, always in this order:
//! 1. drain and classify frontend events (quit ends the loop here)
//! 2. run the core to its next frame boundary
//! 3. map the raw frame through the palette and present it
//! 4. sleep until the next frame deadline
//!
//! Clean quit releases the presentation sink first, then the ROM image and
//! cartridge RAM. A fault the operator chooses to terminate on skips the
//! sink and releases only the host buffers.

use std::io::{Stdout, Write};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::bridge::{MemoryBridge, ReleasedBuffers, RomImage};
use crate::emu_core::{CoreHost, CpuSnapshot, EmulationCore, Fault, Resolution};
use crate::error::HarnessError;
use crate::fault::FaultHandler;
use crate::pacer::{dmg_frame_period, FramePacer};
use crate::palette::{map_into, MappedFramebuffer, Palette};
use crate::recovery::RecoveryPolicy;
use crate::sink::{EventSource, HostEvent, PresentationSink};

/// Host-level knobs
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub palette: Palette,
    /// `None` runs unthrottled
    pub frame_period: Option<Duration>,
    /// Stop cleanly after this many frames
    pub frame_limit: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            frame_period: Some(dmg_frame_period()),
            frame_limit: None,
        }
    }
}

impl HostConfig {
    /// Unthrottled, frame-limited configuration for headless runs
    pub fn headless(frames: u64) -> Self {
        Self {
            frame_period: None,
            frame_limit: Some(frames),
            ..Self::default()
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Quit event or frame limit
    Quit,
    /// The operator terminated on a core fault
    FaultTerminated,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Quit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Completed calls to [`EmulationCore::run_frame`]
    pub frames: u64,
    /// Registers when the loop stopped
    pub cpu: CpuSnapshot,
    pub released: ReleasedBuffers,
}

/// Result of advancing the core by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A complete frame is ready in [`Session::mapped_frame`]
    Completed,
    /// A fault resolution ended the session mid-frame
    Terminated,
}

/// The [`CoreHost`] handed to the core: memory bridge plus fault handler
pub struct Host<P, W = Stdout> {
    bridge: MemoryBridge,
    faults: FaultHandler<P, W>,
}

impl<P, W> Host<P, W> {
    pub fn bridge(&self) -> &MemoryBridge {
        &self.bridge
    }

    pub fn faults(&self) -> &FaultHandler<P, W> {
        &self.faults
    }
}

impl<P: RecoveryPolicy, W: Write> CoreHost for Host<P, W> {
    fn read_rom(&mut self, addr: u32) -> u8 {
        self.bridge.read_rom(addr)
    }

    fn read_cart_ram(&mut self, addr: u32) -> u8 {
        self.bridge.read_cart_ram(addr)
    }

    fn write_cart_ram(&mut self, addr: u32, value: u8) {
        self.bridge.write_cart_ram(addr, value)
    }

    fn on_fault(&mut self, fault: Fault, cpu: CpuSnapshot) -> Resolution {
        self.faults.handle(fault, cpu)
    }
}

/// A core bound to its host buffers, fault handler and palette
pub struct Session<C, P, W = Stdout> {
    core: C,
    host: Host<P, W>,
    config: HostConfig,
    mapped: MappedFramebuffer,
    frames: u64,
}

impl<C, P, W> Session<C, P, W>
where
    C: EmulationCore,
    P: RecoveryPolicy,
    W: Write,
{
    /// Construct the core against a ROM image and size its cartridge RAM
    ///
    /// `init` builds the core; it may read the ROM through the host but
    /// cartridge RAM does not exist until it returns.
    pub fn boot<F>(
        rom: RomImage,
        faults: FaultHandler<P, W>,
        config: HostConfig,
        init: F,
    ) -> Result<Self, HarnessError>
    where
        F: FnOnce(&mut dyn CoreHost) -> Result<C, HarnessError>,
    {
        let mut host = Host {
            bridge: MemoryBridge::new(rom),
            faults,
        };

        let core = init(&mut host)?;
        if host.faults.terminate_requested() {
            return Err(HarnessError::TerminatedDuringInit);
        }

        let save_size = core.required_save_size();
        host.bridge.install_cart_ram(save_size)?;
        debug!(
            rom_bytes = host.bridge.rom().len(),
            save_size, "core initialised"
        );

        Ok(Self {
            core,
            host,
            config,
            mapped: MappedFramebuffer::new(),
            frames: 0,
        })
    }

    /// Run the core to its next frame boundary and map the result
    ///
    /// After a fault resolved to terminate the core is never run again.
    pub fn advance(&mut self) -> FrameOutcome {
        if self.host.faults.terminate_requested() {
            return FrameOutcome::Terminated;
        }

        self.core.run_frame(&mut self.host);
        if self.host.faults.terminate_requested() {
            return FrameOutcome::Terminated;
        }

        self.frames += 1;
        map_into(self.core.framebuffer(), &self.config.palette, &mut self.mapped);
        trace!(frame = self.frames, "frame complete");
        FrameOutcome::Completed
    }

    /// Drive the loop until a quit event, the frame limit or a fault
    /// termination
    pub fn run<S>(mut self, frontend: &mut S) -> Result<RunReport, HarnessError>
    where
        S: EventSource + PresentationSink,
    {
        let mut pacer = FramePacer::new(self.config.frame_period);
        info!(period = ?pacer.period(), limit = ?self.config.frame_limit, "frame loop started");

        loop {
            let events = frontend.drain_events();
            if events.contains(&HostEvent::Quit) {
                debug!(frame = self.frames, "quit requested");
                break;
            }
            if self.config.frame_limit.is_some_and(|limit| self.frames >= limit) {
                debug!(frame = self.frames, "frame limit reached");
                break;
            }

            if self.advance() == FrameOutcome::Terminated {
                info!(frame = self.frames, "session terminated by fault resolution");
                return Ok(self.finish(RunStatus::FaultTerminated));
            }

            frontend.present(&self.mapped)?;
            pacer.wait();
        }

        frontend.release();
        if pacer.late_frames() > 0 {
            debug!(late = pacer.late_frames(), "frames missed their deadline");
        }
        Ok(self.finish(RunStatus::Quit))
    }

    fn finish(self, status: RunStatus) -> RunReport {
        let cpu = self.core.cpu();
        let frames = self.frames;
        let released = self.host.bridge.release();
        RunReport {
            status,
            frames,
            cpu,
            released,
        }
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn host(&self) -> &Host<P, W> {
        &self.host
    }

    pub fn mapped_frame(&self) -> &MappedFramebuffer {
        &self.mapped
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}
