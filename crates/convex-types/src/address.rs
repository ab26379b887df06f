use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An account number on the lattice.
///
/// Addresses are sequentially allocated non-negative integers, conventionally
/// rendered with a `#` prefix (e.g. `#42`). They are not hashes: an `Address`
/// names an account slot, not content.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Address(u64);

impl Address {
    /// The genesis address `#0`.
    pub const ZERO: Self = Self(0);

    /// Create an address from an account number.
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// The raw account number.
    pub const fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for Address {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Address::new)
            .map_err(|_| TypeError::InvalidAddress(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(format!("{}", Address::new(42)), "#42");
        assert_eq!(format!("{}", Address::ZERO), "#0");
    }

    #[test]
    fn parse_with_and_without_prefix() {
        assert_eq!("#123".parse::<Address>().unwrap(), Address::new(123));
        assert_eq!("123".parse::<Address>().unwrap(), Address::new(123));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("#-1".parse::<Address>().is_err());
        assert!("abc".parse::<Address>().is_err());
    }

    #[test]
    fn ordering_follows_number() {
        assert!(Address::new(1) < Address::new(2));
    }

    #[test]
    fn serde_roundtrip() {
        let a = Address::new(607);
        let json = serde_json::to_string(&a).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(a, parsed);
    }
}
