//! Timecode decoder: position and pitch from stereo PCM.
//!
//! The decoder consumes interleaved 16-bit stereo audio carrying a
//! timecode signal and tracks, sample by sample, everything needed to
//! answer four questions: is a record playing at all, in which
//! direction and at what speed, and where on the record the needle is.
//!
//! One bit is recovered per wave cycle. The mono sum of the two
//! channels drives a zero-crossing state machine; alternate crossings
//! mark the middle and the end of a cycle, and the summed peak level of
//! the two half-cycles against a rolling reference decides whether the
//! cycle encoded a one or a zero. The two channels are pressed in
//! quadrature, so comparing how long ago each channel last crossed zero
//! gives the playback direction at every crossing. Recovered bits slide
//! through a window that is simultaneously predicted by stepping the
//! variant's LFSR, and only after enough consecutive predictions match
//! is the window trusted and resolved through the lookup table to an
//! absolute cycle index.
//!
//! ```text
//!  L ──┬────────────────────────► ChannelTracker ──┐
//!      │                                           ├─► direction
//!  R ──┼─┬──────────────────────► ChannelTracker ──┘
//!      │ │
//!      └─┴─► mono sum ► ChannelTracker ► wave/bit machine ► bitstream
//!                                  │                            │
//!                                  ├─► signal level (liveness)  ▼
//!                                  └─► crossing counts       lookup ► position
//!                                          │
//!                                          └─► pitch
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use waxcode_core::{Timecode, TimecodeDecoder};
//!
//! let code = Arc::new(Timecode::build("serato_2a")?);
//! let mut decoder = TimecodeDecoder::new(code);
//!
//! // Silence carries no timecode
//! decoder.submit(&[0i16; 8192], 44100);
//! assert!(!decoder.alive());
//! assert!(decoder.position().is_none());
//! assert!(decoder.pitch().is_none());
//! # Ok::<(), waxcode_core::TimecodeError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::channel::ChannelTracker;
use crate::lookup::Timecode;
use crate::monitor::ScopeMonitor;
use crate::types::{Bits, TimecodeResult};

/// Signal level below which no record is considered playing, in 16-bit
/// PCM levels on the mono sum.
pub const SIGNAL_THRESHOLD: f32 = 256.0;

/// Number of consecutively error-checked bits before the bitstream is
/// declared valid. Too low and the position skips around (often into
/// blank areas of a track) during scratching.
pub const VALID_BITS: u32 = 24;

/// Time constant of the DC estimate filter, in seconds.
const ZERO_RC: f32 = 0.001;

/// Time constant of the signal level filter, in seconds.
const SIGNAL_RC: f32 = 0.004;

/// Window of the reference level rolling average, in wave cycles.
const REF_PEAKS_AVG: f32 = 48.0;

/// Decoder for one incoming timecode stream.
///
/// A decoder is bound to one built [`Timecode`] for its lifetime. The
/// handle is immutable and may be shared by any number of decoders;
/// the decoder itself is single-owner and all its operations take
/// `&mut self`.
pub struct TimecodeDecoder {
    timecode: Arc<Timecode>,

    left: ChannelTracker,
    right: ChannelTracker,
    mono: ChannelTracker,

    forwards: bool,
    wave_peak: f32,
    half_peak: f32,
    /// Rolling average of the per-cycle peak sum, -1.0 until the first
    /// full cycle seeds it.
    ref_level: f32,
    signal_level: f32,

    /// Signed zero-crossing count since the last pitch read.
    crossings: i64,
    /// Samples since the mono sum last crossed zero.
    crossing_ticker: u64,
    /// Samples accumulated against `crossings`.
    pitch_ticker: u64,

    /// Bits as physically placed on the record, newest at the MSB when
    /// playing forwards.
    bitstream: Bits,
    /// The bitstream the LFSR predicted.
    predicted: Bits,
    valid_counter: u32,
    /// Samples since the last bit was read.
    timecode_ticker: u64,

    rate: u32,
    zero_alpha: f32,
    signal_alpha: f32,

    monitor: Option<ScopeMonitor>,
    bit_observer: Option<Box<dyn FnMut(bool) + Send>>,
}

impl TimecodeDecoder {
    /// Create a decoder bound to a built timecode.
    pub fn new(timecode: Arc<Timecode>) -> Self {
        Self {
            timecode,
            left: ChannelTracker::new(),
            right: ChannelTracker::new(),
            mono: ChannelTracker::new(),
            forwards: true,
            wave_peak: 0.0,
            half_peak: 0.0,
            ref_level: -1.0,
            signal_level: 0.0,
            crossings: 0,
            crossing_ticker: 0,
            pitch_ticker: 0,
            bitstream: 0,
            predicted: 0,
            valid_counter: 0,
            timecode_ticker: 0,
            rate: 0,
            zero_alpha: 0.0,
            signal_alpha: 0.0,
            monitor: None,
            bit_observer: None,
        }
    }

    /// Reset all decoding state, as if the stream had just started.
    /// The bound timecode, the monitor and the bit observer stay.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.mono.reset();
        self.forwards = true;
        self.wave_peak = 0.0;
        self.half_peak = 0.0;
        self.ref_level = -1.0;
        self.signal_level = 0.0;
        self.crossings = 0;
        self.crossing_ticker = 0;
        self.pitch_ticker = 0;
        self.bitstream = 0;
        self.predicted = 0;
        self.valid_counter = 0;
        self.timecode_ticker = 0;
        self.rate = 0;
        self.zero_alpha = 0.0;
        self.signal_alpha = 0.0;
    }

    /// Pre-calculate the filter coefficients for a sample rate.
    fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
        let dt = 1.0 / rate as f32;
        self.zero_alpha = dt / (ZERO_RC + dt);
        self.signal_alpha = dt / (SIGNAL_RC + dt);
    }

    /// Decode a block of interleaved stereo PCM at the given sample
    /// rate. The rate may change between blocks; the filters follow.
    ///
    /// Splitting a buffer across several calls decodes identically to
    /// submitting it whole.
    pub fn submit(&mut self, pcm: &[i16], rate: u32) {
        self.set_rate(rate);
        for frame in pcm.chunks_exact(2) {
            self.advance(frame[0], frame[1]);
        }
    }

    /// Process one stereo frame.
    fn advance(&mut self, l: i16, r: i16) {
        self.left.process(l as i32, self.zero_alpha);
        self.right.process(r as i32, self.zero_alpha);

        let g = l as i32 + r as i32;
        if self.mono.process(g, self.zero_alpha) {
            self.on_crossing();
        }

        self.crossing_ticker += 1;
        self.timecode_ticker += 1;

        // Zero-normalised peak of the current half-cycle
        let m = (g as f32 - self.mono.zero()).abs();
        if m > self.wave_peak {
            self.wave_peak = m;
        }

        self.signal_level += self.signal_alpha * (m - self.signal_level);

        if let Some(mon) = &mut self.monitor {
            mon.plot(l, r, self.ref_level);
        }
    }

    /// The mono sum changed sign: log the peak information, and once
    /// per cycle recover a bit.
    fn on_crossing(&mut self) {
        // Whether this crossing is half way through a cycle depends on
        // the cycle polarity and the current playback direction.
        if self.mono.is_positive() == (self.timecode.polarity().is_positive() ^ self.forwards) {
            // Entering the second half of a wave cycle
            self.half_peak = self.wave_peak;
        } else {
            // A full cycle has finished; its level against the
            // reference decides the bit.
            let bit = self.wave_peak + self.half_peak > self.ref_level;

            if let Some(observer) = &mut self.bit_observer {
                observer(bit);
            }

            // The bitstream keeps the order the bits are physically
            // placed on the record, regardless of direction; the
            // prediction steps the LFSR the same way.
            let lfsr = *self.timecode.lfsr();
            if self.forwards {
                self.predicted = lfsr.forward(self.predicted);
                self.bitstream = (self.bitstream >> 1) | ((bit as Bits) << (lfsr.bits() - 1));
            } else {
                self.predicted = lfsr.reverse(self.predicted);
                self.bitstream = ((self.bitstream << 1) & lfsr.mask()) | bit as Bits;
            }

            if self.predicted == self.bitstream {
                self.valid_counter += 1;
            } else {
                self.predicted = self.bitstream;
                self.valid_counter = 0;
            }

            self.timecode_ticker = 0;

            // Adjust the reference to the peaks seen in this cycle
            if self.ref_level < 0.0 {
                self.ref_level = self.half_peak + self.wave_peak;
            } else {
                self.ref_level = (self.ref_level * (REF_PEAKS_AVG - 1.0)
                    + self.half_peak
                    + self.wave_peak)
                    / REF_PEAKS_AVG;
            }
        }

        // Immediate direction from the phase difference, based on which
        // channel crossed zero longer ago. Equal tickers read as
        // reverse.
        self.forwards = self.left.crossing_ticker() > self.right.crossing_ticker();

        if self.forwards {
            self.crossings += 1;
        } else {
            self.crossings -= 1;
        }

        self.pitch_ticker += self.crossing_ticker;
        self.crossing_ticker = 0;
        self.wave_peak = 0.0;
    }

    /// Playback speed relative to nominal since the last read, signed
    /// by direction, or `None` if no crossings were seen. Reading
    /// resets the accumulator; only one reader may call this.
    pub fn pitch(&mut self) -> Option<f32> {
        if self.crossings == 0 {
            return None;
        }

        // Two crossings per wave cycle
        let pitch = self.rate as f32 * self.crossings as f32
            / self.pitch_ticker as f32
            / (self.timecode.resolution() as f32 * 2.0);

        self.crossings = 0;
        self.pitch_ticker = 0;

        Some(pitch)
    }

    /// Absolute position in cycles, with the time in seconds since the
    /// underlying bit was read. `None` until enough bits have been
    /// error-checked against the LFSR prediction.
    pub fn position(&self) -> Option<(u32, f32)> {
        if self.valid_counter <= VALID_BITS {
            return None;
        }
        let cycle = self.timecode.position_of(self.bitstream)?;
        Some((cycle, self.timecode_ticker as f32 / self.rate as f32))
    }

    /// Whether any timecode signal is present at all.
    pub fn alive(&self) -> bool {
        self.signal_level >= SIGNAL_THRESHOLD
    }

    /// Last safe cycle of the bound timecode.
    pub fn safe(&self) -> u32 {
        self.timecode.safe()
    }

    /// Wave cycles per second of the bound timecode at nominal speed.
    pub fn resolution(&self) -> u32 {
        self.timecode.resolution()
    }

    /// Sample rate of the last submitted block.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// The timecode this decoder is bound to.
    pub fn timecode(&self) -> &Arc<Timecode> {
        &self.timecode
    }

    /// Attach a phase scope of the given edge length.
    pub fn monitor_init(&mut self, size: usize) -> TimecodeResult<()> {
        self.monitor = Some(ScopeMonitor::new(size)?);
        Ok(())
    }

    /// Detach and free the phase scope.
    pub fn monitor_clear(&mut self) {
        self.monitor = None;
    }

    /// The attached phase scope, if any.
    pub fn monitor(&self) -> Option<&ScopeMonitor> {
        self.monitor.as_ref()
    }

    /// Observe every recovered bit, in stream order. Replaces any
    /// previous observer.
    pub fn set_bit_observer(&mut self, observer: impl FnMut(bool) + Send + 'static) {
        self.bit_observer = Some(Box::new(observer));
    }

    /// Remove the bit observer.
    pub fn clear_bit_observer(&mut self) {
        self.bit_observer = None;
    }
}

impl fmt::Debug for TimecodeDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimecodeDecoder")
            .field("timecode", &self.timecode.name())
            .field("forwards", &self.forwards)
            .field("bitstream", &format_args!("{:#x}", self.bitstream))
            .field("valid_counter", &self.valid_counter)
            .field("signal_level", &self.signal_level)
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}
