//! # Control-Vinyl Timecode DSP Library
//!
//! This crate recovers an absolute playback position and a signed
//! instantaneous pitch from stereo PCM audio carrying a pre-mastered
//! timecode signal, as pressed on the control records and control CDs
//! used by digital DJ systems.
//!
//! ## Overview
//!
//! A timecode record carries a sine wave whose amplitude is keyed, one
//! bit per cycle, by a long LFSR sequence. The decoder pipeline is a
//! small phase-aware demodulator:
//!
//! ```text
//! stereo PCM ─► DC tracking ─► zero crossings ─► wave/bit machine
//!                    │               │                  │
//!                    ▼               ▼                  ▼
//!              signal level    direction/pitch    error-checked
//!               (liveness)      (quadrature)        bitstream
//!                                                       │
//!                                                       ▼
//!                                              LFSR lookup ─► position
//! ```
//!
//! - [`def`] names the supported timecode variants and their bit-exact
//!   LFSR constants.
//! - [`lfsr`] steps the register forwards and backwards.
//! - [`lookup`] builds the state-to-cycle table shared by decoders.
//! - [`channel`], [`monitor`] and [`decoder`] do the per-sample work.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use waxcode_core::{Timecode, TimecodeDecoder};
//!
//! // Build once, share with every deck decoding this record
//! let code = Arc::new(Timecode::build("serato_2a")?);
//!
//! let mut decoder = TimecodeDecoder::new(code);
//! decoder.submit(&[0i16; 4096], 44100); // interleaved L,R frames
//!
//! assert!(!decoder.alive());
//! assert_eq!(decoder.position(), None);
//! # Ok::<(), waxcode_core::TimecodeError>(())
//! ```

pub mod channel;
pub mod decoder;
pub mod def;
pub mod lfsr;
pub mod lookup;
pub mod monitor;
pub mod types;

pub use channel::ChannelTracker;
pub use decoder::TimecodeDecoder;
pub use def::{Polarity, TimecodeDef};
pub use lfsr::TimecodeLfsr;
pub use lookup::Timecode;
pub use monitor::ScopeMonitor;
pub use types::{Bits, TimecodeError, TimecodeResult};

pub mod prelude {
    pub use crate::decoder::TimecodeDecoder;
    pub use crate::def::{Polarity, TimecodeDef};
    pub use crate::lookup::Timecode;
    pub use crate::types::{Bits, TimecodeError, TimecodeResult};
}
