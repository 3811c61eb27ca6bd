//! DMG Desktop - windowed frontend for the DMG host harness
//!
//! Opens a minifb window, boots the stand-in core against the given ROM and
//! pumps frames at the DMG refresh rate until the window is closed or
//! Escape is pressed.

mod window;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dmg_harness::cartridge::CartridgeHeader;
use dmg_harness::rom_view::RomViewCore;
use dmg_harness::{
    FaultHandler, HostConfig, RecoveryMode, RomImage, RunReport, RunStatus, Session,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::window::WindowFrontend;

/// DMG Emulator Desktop App
#[derive(Parser, Debug)]
#[command(name = "dmg-desktop")]
#[command(about = "Run a DMG ROM in a window", long_about = None)]
struct Args {
    /// Path to the ROM image
    rom: PathBuf,

    /// Window scale factor (1, 2, 4 or 8)
    #[arg(short, long, default_value_t = 2, value_parser = parse_scale)]
    scale: u8,

    /// What to do when the core reports a fault: prompt, continue or terminate
    #[arg(long, default_value_t = RecoveryMode::Prompt)]
    on_fault: RecoveryMode,
}

fn parse_scale(s: &str) -> Result<u8, String> {
    match s.parse::<u8>() {
        Ok(n @ (1 | 2 | 4 | 8)) => Ok(n),
        _ => Err(format!("scale must be 1, 2, 4 or 8, got '{s}'")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(report) => {
            info!(frames = report.frames, status = ?report.status, "emulator closed");
            match report.status {
                RunStatus::Quit => {
                    println!("Emulator closed.");
                    ExitCode::SUCCESS
                }
                RunStatus::FaultTerminated => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<RunReport, Box<dyn Error>> {
    let rom = RomImage::load(&args.rom)?;
    let header = CartridgeHeader::parse(rom.as_bytes())?;

    println!("Loaded cartridge:");
    println!("  Title: {}", header.title);
    println!("  Type: ${:02X}", header.cartridge_type);
    println!("  ROM: {} bytes", rom.len());
    println!("  Save RAM: {} bytes", header.save_size());

    let rom_len = rom.len();
    let faults = FaultHandler::new(args.on_fault.into_policy());
    let session = Session::boot(rom, faults, HostConfig::default(), |host| {
        RomViewCore::init(host, rom_len)
    })?;

    let mut frontend = WindowFrontend::open(args.scale)?;
    println!("Press ESC or close the window to exit.");

    Ok(session.run(&mut frontend)?)
}
