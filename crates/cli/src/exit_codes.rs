//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 60-69   | run       | Reconciliation run codes                 |
//!
//! No output file is written when a run exits non-zero.

use titres_io::IoError;
use titres_recon::ReconError;

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, config file not found.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (60-69)
// =============================================================================

/// Config parsed but failed validation, or did not parse at all.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// A snapshot or the reference dataset could not be read or parsed.
pub const EXIT_INPUT_UNREADABLE: u8 = 61;

/// Snapshots reached the engine out of date order.
pub const EXIT_SNAPSHOT_ORDER: u8 = 62;

/// The output document could not be serialized or written.
pub const EXIT_OUTPUT_WRITE: u8 = 63;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::SnapshotOrder { .. } => EXIT_SNAPSHOT_ORDER,
    }
}

/// Map a boundary error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. }
        | IoError::Parse { .. }
        | IoError::UnsupportedFormat { .. }
        | IoError::ReferenceArea { .. } => EXIT_INPUT_UNREADABLE,
        IoError::Write { .. } | IoError::Serialize(_) => EXIT_OUTPUT_WRITE,
    }
}
