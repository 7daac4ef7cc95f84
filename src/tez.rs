//! Tez amounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount of tez, stored in mutez (1 tez = 1 000 000 mutez).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tez(u64);

impl Tez {
    /// Zero amount.
    pub const ZERO: Self = Self(0);
    /// Number of mutez in one tez.
    pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

    pub const fn from_mutez(mutez: u64) -> Self {
        //! Amount in mutez.
        Self(mutez)
    }

    pub const fn from_tez(tez: u64) -> Option<Self> {
        //! Amount in whole tez; [`None`] on overflow.
        match tez.checked_mul(Self::MUTEZ_PER_TEZ) {
            Some(mutez) => Some(Self(mutez)),
            None => None,
        }
    }

    pub const fn as_mutez(&self) -> u64 {
        //! Amount in mutez.
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        //! Whether the amount is zero.
        self.0 == 0
    }
}

impl From<u64> for Tez {
    fn from(mutez: u64) -> Self {
        Self(mutez)
    }
}

impl FromStr for Tez {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        //! Parse a decimal amount in mutez, as nodes print them.
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for Tez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(Tez::from_tez(3), Some(Tez::from_mutez(3_000_000)));
        assert_eq!(Tez::from_tez(u64::MAX), None);
        assert_eq!("1500".parse::<Tez>().unwrap().as_mutez(), 1500);
        assert!("-1".parse::<Tez>().is_err());
        assert_eq!(Tez::from_mutez(42).to_string(), "42");
        assert!(Tez::default().is_zero());
    }
}
