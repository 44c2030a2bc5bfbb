//! ChainAddress - Syntactically validated on-chain address
//!
//! Format: `0x` followed by 40 hex digits. Addresses are normalized to
//! lowercase so that lookups against the whitelist are case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A well-formed on-chain address.
///
/// Construction goes through [`ChainAddress::parse`], which rejects anything
/// that is not `0x` + 40 hex digits. Checksum casing is not preserved; the
/// stored form is lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainAddress(String);

impl ChainAddress {
    /// Parse and normalize an address string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.len() != 42 || !s.starts_with("0x") {
            return Err(CoreError::InvalidAddress(s.to_string()));
        }
        if !s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The normalized address string
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChainAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChainAddress> for String {
    fn from(addr: ChainAddress) -> Self {
        addr.0
    }
}
