// ============================================================================
// Token Domain Model
// Fixed-width token symbols and external asset references
// ============================================================================

use crate::errors::{DexError, DexResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of a token symbol in bytes
pub const SYMBOL_WIDTH: usize = 32;

/// Fixed-width token identifier: a short ASCII tag, zero-padded to 32 bytes.
///
/// Two symbols are equal iff their padded byte arrays are equal, so the type
/// can be used directly as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenSymbol([u8; SYMBOL_WIDTH]);

impl TokenSymbol {
    /// Build a symbol from an ASCII tag such as `"LINK"`.
    ///
    /// # Errors
    /// `InvalidSymbol` if the tag is empty, longer than 32 bytes, not ASCII,
    /// or contains a NUL byte (which would be indistinguishable from padding).
    pub fn new(tag: &str) -> DexResult<Self> {
        if tag.is_empty() {
            return Err(DexError::InvalidSymbol("symbol cannot be empty".to_string()));
        }
        if tag.len() > SYMBOL_WIDTH {
            return Err(DexError::InvalidSymbol(format!(
                "symbol {tag:?} exceeds {SYMBOL_WIDTH} bytes"
            )));
        }
        if !tag.is_ascii() || tag.bytes().any(|b| b == 0) {
            return Err(DexError::InvalidSymbol(format!(
                "symbol {tag:?} must be printable ascii"
            )));
        }

        let mut bytes = [0u8; SYMBOL_WIDTH];
        bytes[..tag.len()].copy_from_slice(tag.as_bytes());
        Ok(Self(bytes))
    }

    /// Raw padded representation
    pub fn as_bytes(&self) -> &[u8; SYMBOL_WIDTH] {
        &self.0
    }

    /// The tag with its zero padding stripped
    pub fn as_str(&self) -> &str {
        let end = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SYMBOL_WIDTH);
        // Construction only admits ASCII, so this cannot fail.
        std::str::from_utf8(&self.0[..end]).unwrap_or_default()
    }
}

impl FromStr for TokenSymbol {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSymbol({})", self.as_str())
    }
}

/// Reference to an asset on the external ledger (contract address or handle)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetRef(Arc<str>);

impl AssetRef {
    pub fn new(reference: impl Into<Arc<str>>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
