use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sink::PresentError;

/// Harness error types
///
/// Everything here is a setup fault or a frontend failure. Faults reported
/// by the core at runtime never surface as a `HarnessError`; they are
/// resolved by the [`FaultHandler`](crate::fault::FaultHandler).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read ROM {}: {source}", path.display())]
    RomRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ROM is {len} bytes, smaller than the {required}-byte cartridge header")]
    RomTooSmall { len: usize, required: usize },

    #[error("unable to allocate {bytes} bytes for the {buffer}: {source}")]
    Allocation {
        buffer: &'static str,
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("cartridge RAM is already sized at {0} bytes")]
    CartRamAlreadySized(usize),

    #[error("core initialisation failed: {0}")]
    CoreInit(String),

    #[error("operator terminated the session during core initialisation")]
    TerminatedDuringInit,

    #[error(transparent)]
    Present(#[from] PresentError),
}
