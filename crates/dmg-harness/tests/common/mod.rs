//! Shared fixtures: a scripted core, a recording frontend and a shared
//! diagnostic buffer.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use dmg_harness::emu_core::blank_framebuffer;
use dmg_harness::sink::{EventSource, HostEvent, PresentError, PresentationSink};
use dmg_harness::{
    CoreHost, CpuSnapshot, EmulationCore, Fault, MappedFramebuffer, RawFramebuffer, Resolution,
};

/// Everything observable across the host/core boundary, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Drain,
    RunFrame(u64),
    FrameAborted(u64),
    Present,
    SinkReleased,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// One callback the scripted core issues during a frame
#[derive(Debug, Clone, Copy)]
pub enum Step {
    ReadRom(u32),
    ReadRam(u32),
    WriteRam(u32, u8),
    Raise(Fault),
}

/// Core that replays a per-frame script of callbacks
pub struct ScriptedCore {
    save_size: usize,
    script: Vec<Vec<Step>>,
    frame: u64,
    framebuffer: Box<RawFramebuffer>,
    cpu: CpuSnapshot,
    log: Log,
    /// Values returned by every read callback, in order
    pub reads: Vec<u8>,
    /// Resolutions returned by every fault callback, in order
    pub resolutions: Vec<Resolution>,
}

impl ScriptedCore {
    pub fn new(save_size: usize, script: Vec<Vec<Step>>, log: Log) -> Self {
        Self {
            save_size,
            script,
            frame: 0,
            framebuffer: blank_framebuffer(),
            cpu: CpuSnapshot { pc: 0x0100, sp: 0xFFFE },
            log,
            reads: Vec::new(),
            resolutions: Vec::new(),
        }
    }

    pub fn with_cpu(mut self, cpu: CpuSnapshot) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn frames_started(&self) -> u64 {
        self.frame
    }
}

impl EmulationCore for ScriptedCore {
    fn required_save_size(&self) -> usize {
        self.save_size
    }

    fn run_frame(&mut self, host: &mut dyn CoreHost) {
        let frame = self.frame;
        self.frame += 1;
        self.log.borrow_mut().push(Event::RunFrame(frame));

        let steps = self.script.get(frame as usize).cloned().unwrap_or_default();
        for step in steps {
            match step {
                Step::ReadRom(addr) => self.reads.push(host.read_rom(addr)),
                Step::ReadRam(addr) => self.reads.push(host.read_cart_ram(addr)),
                Step::WriteRam(addr, value) => host.write_cart_ram(addr, value),
                Step::Raise(fault) => {
                    let resolution = host.on_fault(fault, self.cpu);
                    self.resolutions.push(resolution);
                    if resolution == Resolution::Terminate {
                        self.log.borrow_mut().push(Event::FrameAborted(frame));
                        return;
                    }
                }
            }
        }

        // Diagonal stripes that shift each frame
        for (y, row) in self.framebuffer.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = ((x + y + frame as usize) % 4) as u8;
            }
        }
        self.cpu.pc = self.cpu.pc.wrapping_add(1);
    }

    fn framebuffer(&self) -> &RawFramebuffer {
        &self.framebuffer
    }

    fn cpu(&self) -> CpuSnapshot {
        self.cpu
    }
}

/// Frontend that records drains, presents and release into the shared log
pub struct RecordingFrontend {
    log: Log,
    /// Report a quit event on this drain (0-based)
    quit_on_drain: Option<usize>,
    drains: usize,
    pub last_frame: Option<MappedFramebuffer>,
    pub fail_present: bool,
}

impl RecordingFrontend {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            quit_on_drain: None,
            drains: 0,
            last_frame: None,
            fail_present: false,
        }
    }

    pub fn quit_on_drain(mut self, drain: usize) -> Self {
        self.quit_on_drain = Some(drain);
        self
    }
}

impl EventSource for RecordingFrontend {
    fn drain_events(&mut self) -> Vec<HostEvent> {
        let drain = self.drains;
        self.drains += 1;
        self.log.borrow_mut().push(Event::Drain);
        if self.quit_on_drain == Some(drain) {
            vec![HostEvent::Other, HostEvent::Quit]
        } else {
            vec![HostEvent::Other]
        }
    }
}

impl PresentationSink for RecordingFrontend {
    fn present(&mut self, frame: &MappedFramebuffer) -> Result<(), PresentError> {
        if self.fail_present {
            return Err(PresentError::Backend("surface lost".into()));
        }
        self.log.borrow_mut().push(Event::Present);
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(Event::SinkReleased);
    }
}

/// Clonable in-memory writer for capturing diagnostics after a session is
/// consumed
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// ROM image of `len` bytes where byte n is n & 0xFF
pub fn counting_rom(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i & 0xFF) as u8).collect()
}
