//! Names for keywords and symbols.

use crate::error::{FormatError, FormatResult};

/// Maximum name length in bytes.
pub const MAX_NAME_LENGTH: usize = 128;

/// The shared name payload of keywords and symbols: 1..=128 bytes of UTF-8.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbolic {
    name: String,
}

impl Symbolic {
    /// Create a name, validating the length bounds.
    pub fn new(name: impl Into<String>) -> FormatResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(FormatError::NonCanonical("empty name"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(FormatError::NonCanonical("name too long"));
        }
        Ok(Self { name })
    }

    /// The name string.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Symbolic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
