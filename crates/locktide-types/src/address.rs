use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 20-byte account address.
///
/// Identifies lock owners, vote delegates, emission targets and the
/// custody/minter identities of the ledgers themselves.
/// Display format: `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        if slice.len() != Self::LEN {
            return Err(TypesError::InvalidAddressLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Deterministic address with every byte set to `byte`.
    /// Handy for fixtures and well-known system identities.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddressFormat(s.to_string()))?;
        let bytes = hex::decode(stripped)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
