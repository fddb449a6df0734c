//! Built timecode handle: LFSR-state to cycle-index lookup.
//!
//! Recovering an absolute position from the decoder's bitstream window
//! needs the inverse of the LFSR sequence. [`Timecode::build`] walks the
//! whole sequence once from the seed and records, for every state
//! visited, the cycle index at which it occurs. The resulting table is
//! immutable and may be shared read-only by any number of decoders
//! (wrap it in an `Arc`).
//!
//! The table is sized at `2^(bits+1)` entries so every possible state
//! indexes directly without masking on the hot read path; unvisited
//! entries hold a -1 sentinel.
//!
//! ## Example
//!
//! ```rust
//! use waxcode_core::lookup::Timecode;
//!
//! let code = Timecode::build("serato_2a").unwrap();
//! assert_eq!(code.position_of(code.seed()), Some(0));
//! assert_eq!(code.safe(), 707000);
//! ```

use crate::def::{self, Polarity, TimecodeDef};
use crate::lfsr::TimecodeLfsr;
use crate::types::{Bits, TimecodeError, TimecodeResult};

/// A timecode variant with its position lookup built and ready for use.
#[derive(Debug, Clone)]
pub struct Timecode {
    def: TimecodeDef,
    lfsr: TimecodeLfsr,
    table: Vec<i32>,
}

impl Timecode {
    /// Build the lookup for a named registry variant.
    ///
    /// Fails with [`TimecodeError::UnknownVariant`] if the name is not
    /// registered, [`TimecodeError::LfsrWrapped`] if the configured
    /// length exceeds the period of the LFSR, and
    /// [`TimecodeError::OutOfMemory`] if the table cannot be allocated.
    pub fn build(name: &str) -> TimecodeResult<Self> {
        let def = def::find(name).ok_or_else(|| TimecodeError::UnknownVariant {
            name: name.to_string(),
        })?;
        Self::build_def(*def)
    }

    /// Build the lookup for an explicit variant definition.
    pub fn build_def(def: TimecodeDef) -> TimecodeResult<Self> {
        let lfsr = TimecodeLfsr::new(def.bits, def.taps);

        // The reverse step must invert the forward step from the seed
        // onwards, or the direction handling cannot work.
        debug_assert_eq!(lfsr.reverse(lfsr.forward(def.seed)), def.seed);
        debug_assert_eq!(lfsr.forward(lfsr.reverse(def.seed)), def.seed);

        let slots = 2usize << def.bits;
        let bytes = slots * std::mem::size_of::<i32>();
        tracing::info!(
            name = def.name,
            bits = def.bits,
            slots,
            kib = bytes / 1024,
            "building timecode lookup"
        );

        let mut table = Vec::new();
        table
            .try_reserve_exact(slots)
            .map_err(|_| TimecodeError::OutOfMemory { bytes })?;
        table.resize(slots, -1);

        let mut current = def.seed;
        for n in 0..def.length {
            if table[current as usize] != -1 {
                tracing::warn!(name = def.name, cycle = n, "timecode wrapped");
                return Err(TimecodeError::LfsrWrapped {
                    name: def.name.to_string(),
                    cycle: n,
                });
            }
            table[current as usize] = n as i32;
            let last = current;
            current = lfsr.forward(current);
            debug_assert_eq!(lfsr.reverse(current), last);
        }

        Ok(Self { def, lfsr, table })
    }

    /// Cycle index of an LFSR state, or `None` if the state does not
    /// occur in the sequence.
    #[inline]
    pub fn position_of(&self, state: Bits) -> Option<u32> {
        match self.table[(state & self.lfsr.mask()) as usize] {
            -1 => None,
            n => Some(n as u32),
        }
    }

    /// The LFSR stepping over this variant's register.
    pub fn lfsr(&self) -> &TimecodeLfsr {
        &self.lfsr
    }

    /// The variant definition this lookup was built from.
    pub fn def(&self) -> &TimecodeDef {
        &self.def
    }

    /// Registry name of the variant.
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    /// Register width in bits.
    pub fn bits(&self) -> u32 {
        self.def.bits
    }

    /// LFSR state at timecode zero.
    pub fn seed(&self) -> Bits {
        self.def.seed
    }

    /// Polarity of the start of a cycle.
    pub fn polarity(&self) -> Polarity {
        self.def.polarity
    }

    /// Wave cycles per second at nominal playback speed.
    pub fn resolution(&self) -> u32 {
        self.def.resolution
    }

    /// Total sequence length in cycles.
    pub fn length(&self) -> u32 {
        self.def.length
    }

    /// Last safe cycle before the record label.
    pub fn safe(&self) -> u32 {
        self.def.safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variant() {
        let err = Timecode::build("serato_9z").unwrap_err();
        assert_eq!(
            err,
            TimecodeError::UnknownVariant {
                name: "serato_9z".into()
            }
        );
    }

    #[test]
    fn test_seed_maps_to_zero() {
        let code = Timecode::build("serato_2a").unwrap();
        assert_eq!(code.position_of(code.seed()), Some(0));
    }

    #[test]
    fn test_walk_matches_table() {
        let code = Timecode::build("serato_2a").unwrap();
        let mut state = code.seed();
        for n in 0..10_000 {
            assert_eq!(code.position_of(state), Some(n));
            state = code.lfsr().forward(state);
        }
    }

    #[test]
    fn test_coverage_is_bijective() {
        let code = Timecode::build("serato_2a").unwrap();
        let length = code.length() as usize;
        let mut seen = vec![false; length];
        let mut stored = 0usize;
        for state in 0..=code.lfsr().mask() {
            if let Some(n) = code.position_of(state) {
                assert!((n as usize) < length);
                assert!(!seen[n as usize], "cycle {} stored twice", n);
                seen[n as usize] = true;
                stored += 1;
            }
        }
        assert_eq!(stored, length);
    }

    #[test]
    fn test_wrapped_sequence_is_rejected() {
        // With no central taps the forward step is a plain rotation, so
        // the sequence period divides the register width and a length
        // of 100 must wrap almost immediately.
        let def = TimecodeDef {
            name: "short_cycle",
            description: "rotation register",
            bits: 8,
            resolution: 1000,
            polarity: Polarity::Positive,
            seed: 0x01,
            taps: 0x00,
            length: 100,
            safe: 90,
        };
        match Timecode::build_def(def) {
            Err(TimecodeError::LfsrWrapped { name, cycle }) => {
                assert_eq!(name, "short_cycle");
                assert!(cycle <= 8, "rotation wrapped late: {cycle}");
            }
            other => panic!("expected LfsrWrapped, got {:?}", other),
        }
    }

    #[test]
    fn test_accessors() {
        let code = Timecode::build("traktor_a").unwrap();
        assert_eq!(code.name(), "traktor_a");
        assert_eq!(code.bits(), 23);
        assert_eq!(code.resolution(), 2000);
        assert_eq!(code.length(), 1500000);
        assert_eq!(code.safe(), 1480000);
        assert_eq!(code.polarity(), Polarity::Positive);
        assert_eq!(code.def().taps, 0x041040);
    }

    #[test]
    fn test_out_of_sequence_state_is_none() {
        let code = Timecode::build("serato_2a").unwrap();
        // Zero never occurs: the all-zero state is a fixed point of the
        // LFSR and the seeds are non-zero.
        assert_eq!(code.position_of(0), None);
    }
}
