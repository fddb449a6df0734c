//! Registry of known timecode variants.
//!
//! Each control record or CD pressing is described by an immutable
//! [`TimecodeDef`]: the LFSR geometry (register width, seed, taps), the
//! wave resolution in cycles per second at nominal speed, the polarity
//! of the cycle, the total sequence length and the last "safe" cycle
//! before the needle reaches the label. The decoder's correctness
//! against pressed media depends on these constants being bit-exact.
//!
//! ## Example
//!
//! ```rust
//! use waxcode_core::def;
//!
//! let def = def::find("serato_2a").unwrap();
//! assert_eq!(def.bits, 20);
//! assert_eq!(def.resolution, 1000);
//! assert!(def::find("serato_9z").is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Bits;

/// Which half of the wave cycle carries the coded amplitude. This
/// decides which zero-crossing closes a cycle and which one is mid-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Cycle begins with the negative half.
    Negative,
    /// Cycle begins with the positive half.
    Positive,
}

impl Polarity {
    /// True for [`Polarity::Positive`].
    pub fn is_positive(self) -> bool {
        matches!(self, Polarity::Positive)
    }
}

/// Immutable descriptor of one timecode variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimecodeDef {
    /// Registry name, e.g. `"serato_2a"`.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Number of bits in the LFSR register.
    pub bits: u32,
    /// Wave cycles per second at nominal playback speed. Equals bits
    /// per second, since every cycle carries one bit.
    pub resolution: u32,
    /// Polarity of the start of a cycle.
    pub polarity: Polarity,
    /// LFSR state at timecode zero.
    pub seed: Bits,
    /// Central LFSR taps, excluding the end taps.
    pub taps: Bits,
    /// Total sequence length in cycles.
    pub length: u32,
    /// Last safe cycle; positions beyond this are on the record label.
    pub safe: u32,
}

/// All known timecode variants.
pub const REGISTRY: &[TimecodeDef] = &[
    TimecodeDef {
        name: "serato_2a",
        description: "Serato 2nd Ed., side A",
        bits: 20,
        resolution: 1000,
        polarity: Polarity::Positive,
        seed: 0x59017,
        taps: 0x361e4,
        length: 712000,
        safe: 707000,
    },
    TimecodeDef {
        name: "serato_2b",
        description: "Serato 2nd Ed., side B",
        bits: 20,
        resolution: 1000,
        polarity: Polarity::Positive,
        seed: 0x8f3c6,
        taps: 0x4f0d8, // reverse of side A
        length: 922000,
        safe: 917000,
    },
    TimecodeDef {
        name: "serato_cd",
        description: "Serato CD",
        bits: 20,
        resolution: 1000,
        polarity: Polarity::Positive,
        seed: 0x84c0c,
        taps: 0x34d54,
        length: 940000,
        safe: 930000,
    },
    TimecodeDef {
        name: "traktor_a",
        description: "Traktor Scratch, side A",
        bits: 23,
        resolution: 2000,
        polarity: Polarity::Positive,
        seed: 0x134503,
        taps: 0x041040,
        length: 1500000,
        safe: 1480000,
    },
    TimecodeDef {
        name: "traktor_b",
        description: "Traktor Scratch, side B",
        bits: 23,
        resolution: 2000,
        polarity: Polarity::Positive,
        seed: 0x32066c,
        taps: 0x041040, // same as side A
        length: 2110000,
        safe: 2090000,
    },
];

/// Look up a variant by registry name.
pub fn find(name: &str) -> Option<&'static TimecodeDef> {
    REGISTRY.iter().find(|def| def.name == name)
}

/// Names of all known variants, in registry order.
pub fn available() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|def| def.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_every_registered_name() {
        for def in REGISTRY {
            let found = find(def.name).unwrap();
            assert_eq!(found, def);
        }
    }

    #[test]
    fn test_find_unknown() {
        assert!(find("").is_none());
        assert!(find("serato").is_none());
        assert!(find("SERATO_2A").is_none());
    }

    #[test]
    fn test_available_names() {
        let names: Vec<_> = available().collect();
        assert_eq!(
            names,
            ["serato_2a", "serato_2b", "serato_cd", "traktor_a", "traktor_b"]
        );
    }

    #[test]
    fn test_registry_constants() {
        let def = find("traktor_b").unwrap();
        assert_eq!(def.bits, 23);
        assert_eq!(def.seed, 0x32066c);
        assert_eq!(def.taps, 0x041040);
        assert_eq!(def.length, 2110000);
        assert_eq!(def.safe, 2090000);
    }

    #[test]
    fn test_seed_and_taps_fit_register() {
        for def in REGISTRY {
            let mask = (1u32 << def.bits) - 1;
            assert!(def.seed <= mask, "{} seed exceeds register", def.name);
            assert!(def.taps <= mask, "{} taps exceed register", def.name);
            assert!(def.safe < def.length, "{} safe beyond length", def.name);
        }
    }

    #[test]
    fn test_polarity() {
        assert!(Polarity::Positive.is_positive());
        assert!(!Polarity::Negative.is_positive());
    }
}
