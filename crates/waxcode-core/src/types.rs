//! Shared types and errors for timecode decoding.
//!
//! All supported timecodes use registers of at most 23 bits, so a `u32`
//! holds any LFSR state or bitstream window with the bits above the
//! register width always zero.

use thiserror::Error;

/// Storage for an LFSR state or a bitstream window.
pub type Bits = u32;

/// Result type for timecode operations.
pub type TimecodeResult<T> = Result<T, TimecodeError>;

/// Errors raised while preparing a timecode for decoding.
///
/// Decoding itself never fails: audio that does not carry a valid
/// timecode simply produces no position until enough bits error-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    /// The requested variant name is not in the registry.
    #[error("timecode definition '{name}' is not known")]
    UnknownVariant {
        /// The name that was asked for.
        name: String,
    },

    /// The configured length exceeds the period of the LFSR sequence,
    /// so the lookup walk revisited a state. Indicates a misconfigured
    /// variant definition.
    #[error("timecode '{name}' wrapped after {cycle} cycles")]
    LfsrWrapped {
        /// Name of the offending variant.
        name: String,
        /// Cycle index at which the walk revisited a state.
        cycle: u32,
    },

    /// Lookup table or monitor allocation failed.
    #[error("allocation of {bytes} bytes failed")]
    OutOfMemory {
        /// Size of the failed request.
        bytes: usize,
    },
}
