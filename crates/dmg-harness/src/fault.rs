//! Fault handler
//!
//! Classification of core-reported faults:
//!
//! | fault            | diagnostic | recovery policy consulted |
//! |------------------|------------|---------------------------|
//! | invalid opcode   | yes        | yes                       |
//! | invalid read     | no         | no, always continues      |
//! | invalid write    | no         | no, always continues      |
//! | unclassified     | yes        | yes                       |

use std::io::{self, Stdout, Write};

use tracing::{debug, error, warn};

use crate::emu_core::{CpuSnapshot, Fault, Resolution};
use crate::recovery::RecoveryPolicy;

/// A fault together with the registers at the time it was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultReport {
    pub fault: Fault,
    pub cpu: CpuSnapshot,
}

impl FaultReport {
    /// Console diagnostic line, e.g. `Invalid opcode 0xd3 at PC: 0x0150, SP: 0xfffe`
    pub fn diagnostic(&self) -> String {
        format!(
            "{} at PC: {:#06x}, SP: {:#06x}",
            self.fault, self.cpu.pc, self.cpu.sp
        )
    }
}

/// Resolves faults reported by the core
pub struct FaultHandler<P, W = Stdout> {
    policy: P,
    out: W,
    terminate_requested: bool,
    absorbed: u64,
    reported: u64,
}

impl<P: RecoveryPolicy> FaultHandler<P, Stdout> {
    /// Diagnostics go to stdout
    pub fn new(policy: P) -> Self {
        Self::with_output(policy, io::stdout())
    }
}

impl<P: RecoveryPolicy, W: Write> FaultHandler<P, W> {
    pub fn with_output(policy: P, out: W) -> Self {
        Self {
            policy,
            out,
            terminate_requested: false,
            absorbed: 0,
            reported: 0,
        }
    }

    /// Classify a fault and decide how the core proceeds
    ///
    /// Once any fault has resolved to [`Resolution::Terminate`] every later
    /// fault does too, without a diagnostic or a policy call.
    pub fn handle(&mut self, fault: Fault, cpu: CpuSnapshot) -> Resolution {
        if self.terminate_requested {
            debug!(%fault, "fault after termination");
            return Resolution::Terminate;
        }
        if matches!(fault, Fault::InvalidRead | Fault::InvalidWrite) {
            self.absorbed += 1;
            return Resolution::Continue;
        }

        let report = FaultReport { fault, cpu };
        self.reported += 1;
        error!(pc = cpu.pc, sp = cpu.sp, "{fault}");
        let written = writeln!(self.out, "{}", report.diagnostic()).and_then(|_| self.out.flush());
        if let Err(err) = written {
            warn!("failed to write fault diagnostic: {err}");
        }

        let resolution = self.policy.decide(&report);
        if resolution == Resolution::Terminate {
            self.terminate_requested = true;
        }
        debug!(?resolution, "fault resolved");
        resolution
    }

    /// Whether any fault ended with [`Resolution::Terminate`]
    pub fn terminate_requested(&self) -> bool {
        self.terminate_requested
    }

    /// Invalid read/write faults swallowed without a diagnostic
    pub fn absorbed(&self) -> u64 {
        self.absorbed
    }

    /// Faults that produced a diagnostic
    pub fn reported(&self) -> u64 {
        self.reported
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_parts(self) -> (P, W) {
        (self.policy, self.out)
    }
}
