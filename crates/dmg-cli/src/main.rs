//! DMG CLI - headless runner for the DMG host harness

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dmg_harness::cartridge::CartridgeHeader;
use dmg_harness::rom_view::RomViewCore;
use dmg_harness::sink::{write_ppm, HeadlessSink};
use dmg_harness::{
    FaultHandler, HostConfig, MappedFramebuffer, RecoveryMode, RomImage, RunReport, RunStatus,
    Session,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// DMG Emulator CLI
#[derive(Parser, Debug)]
#[command(name = "dmg-cli")]
#[command(about = "Run a DMG ROM headless for a fixed number of frames", long_about = None)]
struct Args {
    /// Path to the ROM image
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// What to do when the core reports a fault: prompt, continue or terminate
    #[arg(long, default_value_t = RecoveryMode::Prompt)]
    on_fault: RecoveryMode,

    /// Write the last presented frame to this file as PPM
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Pace frames at the DMG refresh rate instead of running flat out
    #[arg(long)]
    paced: bool,

    /// Dump CPU registers after execution
    #[arg(short = 'c', long)]
    dump_cpu: bool,
}

impl Args {
    fn host_config(&self) -> HostConfig {
        if self.paced {
            HostConfig {
                frame_limit: Some(self.frames),
                ..HostConfig::default()
            }
        } else {
            HostConfig::headless(self.frames)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(report) if report.status == RunStatus::Quit => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
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
    if !header.checksum_ok() {
        println!("  Header checksum: mismatch");
    }

    let rom_len = rom.len();
    let faults = FaultHandler::new(args.on_fault.into_policy());
    let session = Session::boot(rom, faults, args.host_config(), |host| {
        RomViewCore::init(host, rom_len)
    })?;

    println!("\nRunning {} frames...", args.frames);
    let mut sink = HeadlessSink::new();
    let report = session.run(&mut sink)?;

    match report.status {
        RunStatus::Quit => println!("Completed {} frames.", report.frames),
        RunStatus::FaultTerminated => {
            println!("Terminated after {} frames.", report.frames)
        }
    }

    if let Some(path) = &args.dump {
        let blank = MappedFramebuffer::new();
        let frame = sink.last_frame().unwrap_or(&blank);
        write_ppm(path, frame)?;
        info!(path = %path.display(), "frame written");
    }

    if args.dump_cpu {
        dump_cpu_state(&report);
    }

    Ok(report)
}

fn dump_cpu_state(report: &RunReport) {
    println!("\nCPU State:");
    println!("  PC:   ${:04X}", report.cpu.pc);
    println!("  SP:   ${:04X}", report.cpu.sp);
    println!("  Frames: {}", report.frames);
    println!(
        "  Released: {} ROM bytes, {} RAM bytes",
        report.released.rom_bytes, report.released.cart_ram_bytes
    );
}
