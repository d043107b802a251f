//! Dice specifications and rolling.
//!
//! A dice spec names a roll of `count` dice with `sides` faces each, plus an
//! optional flat modifier: `2d6`, `d20`, `3d4+1`. Rolling tables use the
//! reachable range of totals to check that every possible roll maps to an
//! item.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on dice rolled at once; larger specs are rejected.
pub const MAX_DICE: u32 = 1000;

/// Upper bound on faces per die; larger specs are rejected.
pub const MAX_SIDES: u32 = 1_000_000;

/// Errors from parsing a dice spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The text is not of the form `<count>d<sides>[+/-<modifier>]`.
    #[error("malformed dice spec: \"{0}\"")]
    Malformed(String),

    /// Count or sides was zero.
    #[error("dice spec \"{0}\" needs at least one die with at least one side")]
    Zero(String),

    /// More than [`MAX_DICE`] dice requested.
    #[error("dice spec \"{spec}\" rolls more than {limit} dice")]
    TooMany {
        /// The offending spec.
        spec: String,
        /// The configured limit.
        limit: u32,
    },

    /// A die has more than [`MAX_SIDES`] faces.
    #[error("dice spec \"{spec}\" has dice with more than {limit} sides")]
    TooManySides {
        /// The offending spec.
        spec: String,
        /// The configured limit.
        limit: u32,
    },
}

/// A parsed dice specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceSpec {
    /// Number of dice rolled.
    pub count: u32,
    /// Faces per die.
    pub sides: u32,
    /// Flat amount added to the total.
    pub modifier: i64,
}

impl DiceSpec {
    /// Create a spec for `count` dice with `sides` faces and no modifier.
    pub fn new(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            modifier: 0,
        }
    }

    /// Set the flat modifier.
    pub fn with_modifier(mut self, modifier: i64) -> Self {
        self.modifier = modifier;
        self
    }

    /// Smallest reachable total.
    pub fn min(&self) -> i64 {
        i64::from(self.count) + self.modifier
    }

    /// Largest reachable total.
    pub fn max(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides) + self.modifier
    }

    /// Every total this spec can roll.
    pub fn domain(&self) -> RangeInclusive<i64> {
        self.min()..=self.max()
    }

    /// Roll the dice and return the total.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let total: i64 = (0..self.count)
            .map(|_| i64::from(rng.random_range(1..=self.sides)))
            .sum();
        total + self.modifier
    }

    /// Returns true if `text` has dice syntax, even when its counts are out
    /// of bounds. Used to spot the dice column of a table header, so that an
    /// oversized spec still yields a rolling table that validation reports.
    pub fn looks_like(text: &str) -> bool {
        !matches!(text.parse::<DiceSpec>(), Err(DiceError::Malformed(_)))
    }
}

impl FromStr for DiceSpec {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DiceError::Malformed(s.to_string());
        let lower = s.trim().to_ascii_lowercase();

        let (count, rest) = lower.split_once('d').ok_or_else(malformed)?;
        let count = if count.is_empty() {
            1
        } else {
            parse_digits(count).ok_or_else(malformed)?
        };

        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(idx) => {
                let (sides, modifier) = rest.split_at(idx);
                let amount = parse_digits(&modifier[1..]).ok_or_else(malformed)?;
                let amount = i64::from(amount);
                let modifier = if modifier.starts_with('-') { -amount } else { amount };
                (sides, modifier)
            }
            None => (rest, 0),
        };
        let sides = parse_digits(sides).ok_or_else(malformed)?;

        if count == 0 || sides == 0 {
            return Err(DiceError::Zero(s.to_string()));
        }
        if count > MAX_DICE {
            return Err(DiceError::TooMany {
                spec: s.to_string(),
                limit: MAX_DICE,
            });
        }
        if sides > MAX_SIDES {
            return Err(DiceError::TooManySides {
                spec: s.to_string(),
                limit: MAX_SIDES,
            });
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

/// Parse a run of ASCII digits, rejecting signs and whitespace. Values too
/// large for a `u32` saturate so the bound checks can report them.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u32::MAX))
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parse_plain() {
        assert_eq!("2d4".parse::<DiceSpec>(), Ok(DiceSpec::new(2, 4)));
        assert_eq!(" 1D20 ".parse::<DiceSpec>(), Ok(DiceSpec::new(1, 20)));
        assert_eq!("d6".parse::<DiceSpec>(), Ok(DiceSpec::new(1, 6)));
    }

    #[test]
    fn parse_modifier() {
        assert_eq!(
            "3d4+1".parse::<DiceSpec>(),
            Ok(DiceSpec::new(3, 4).with_modifier(1))
        );
        assert_eq!(
            "1d6-2".parse::<DiceSpec>(),
            Ok(DiceSpec::new(1, 6).with_modifier(-2))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "d", "2d", "xd6", "2d6+", "2d6+x", "Name", "2 d6", "-1d6"] {
            assert!(bad.parse::<DiceSpec>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn parse_rejects_zero_and_huge() {
        assert!(matches!("0d6".parse::<DiceSpec>(), Err(DiceError::Zero(_))));
        assert!(matches!("2d0".parse::<DiceSpec>(), Err(DiceError::Zero(_))));
        assert!(matches!(
            "5000d6".parse::<DiceSpec>(),
            Err(DiceError::TooMany { .. })
        ));
        assert!(matches!(
            "1d4000000000".parse::<DiceSpec>(),
            Err(DiceError::TooManySides { .. })
        ));
        assert!(matches!(
            "99999999999d6".parse::<DiceSpec>(),
            Err(DiceError::TooMany { .. })
        ));
        assert!(matches!(
            "1d5000000".parse::<DiceSpec>(),
            Err(DiceError::TooManySides { limit: MAX_SIDES, .. })
        ));
        assert!("1000d1000000".parse::<DiceSpec>().is_ok());
    }

    #[test]
    fn domain_bounds() {
        assert_eq!(DiceSpec::new(2, 4).domain(), 2..=8);
        assert_eq!(DiceSpec::new(4, 1).domain(), 4..=4);
        assert_eq!(DiceSpec::new(1, 6).with_modifier(2).domain(), 3..=8);
    }

    #[test]
    fn display_round_trips_modifier() {
        assert_eq!(DiceSpec::new(2, 6).to_string(), "2d6");
        assert_eq!(DiceSpec::new(1, 8).with_modifier(3).to_string(), "1d8+3");
        assert_eq!(DiceSpec::new(1, 8).with_modifier(-3).to_string(), "1d8-3");
    }

    #[test]
    fn looks_like_header_cells() {
        assert!(DiceSpec::looks_like("2d4"));
        assert!(!DiceSpec::looks_like("Item"));
        assert!(!DiceSpec::looks_like("dagger"));
        assert!(DiceSpec::looks_like("1d4000000000"));
        assert!(DiceSpec::looks_like("0d6"));
    }

    #[test]
    fn roll_deterministic_with_seed() {
        let spec = DiceSpec::new(3, 20);
        let mut rng1 = StdRng::seed_from_u64(99);
        let mut rng2 = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(spec.roll(&mut rng1), spec.roll(&mut rng2));
        }
    }

    proptest! {
        #[test]
        fn rolls_stay_in_domain(count in 1u32..20, sides in 1u32..30, modifier in -10i64..10, seed: u64) {
            let spec = DiceSpec::new(count, sides).with_modifier(modifier);
            let mut rng = StdRng::seed_from_u64(seed);
            let total = spec.roll(&mut rng);
            prop_assert!(spec.domain().contains(&total));
        }

        #[test]
        fn display_parses_back(count in 1u32..100, sides in 1u32..1000, modifier in -50i64..50) {
            let spec = DiceSpec::new(count, sides).with_modifier(modifier);
            prop_assert_eq!(spec.to_string().parse::<DiceSpec>(), Ok(spec));
        }
    }
}
