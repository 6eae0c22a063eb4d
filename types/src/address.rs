//! Account identifiers, rendered as `0x`-prefixed hex.

use crate::error::AddressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque 20-byte account identifier.
///
/// Serialized as its `0x`-prefixed hex string so configuration files and
/// scripts stay human-readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Byte length of an account identifier.
    pub const LEN: usize = 20;

    /// The all-zero account.
    pub const ZERO: Self = Self([0u8; 20]);

    pub const PREFIX: &'static str = "0x";

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an account whose last byte is `n`. Handy for tests and demos.
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse a `0x`-prefixed hex string.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;
        let raw = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 20] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength {
                expected: Self::LEN,
                actual: raw.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}
