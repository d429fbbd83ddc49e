//! Canonical account addresses.
//!
//! An [`Address`] is a `0x`-prefixed, 40-hex-digit account identifier held
//! in its checksummed form (uppercase hex digits selected by the
//! Keccak-256 hash of the lowercase body). Two casings of the same account
//! always parse to the same key, so ledgers never split one account across
//! map entries. All-lowercase and all-uppercase inputs are canonicalized;
//! mixed-case inputs must carry a valid checksum.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;

/// A canonical, checksummed account address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, bincode::Encode, bincode::Decode)]
pub struct Address(String);

impl Address {
    /// Parse and canonicalize an address string.
    ///
    /// Accepts `0x` / `0X` prefixes. Mixed-case bodies are verified against
    /// the checksum; uniform-case bodies are re-checksummed.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;

        if body.len() != 40 {
            return Err(AddressError::InvalidLength(body.len()));
        }
        if let Some(bad) = body.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidCharacter(bad));
        }

        let lower = body.to_ascii_lowercase();
        let checksummed = checksum_body(&lower);

        let uniform = body == lower || body == body.to_ascii_uppercase();
        if !uniform && body != checksummed {
            return Err(AddressError::ChecksumMismatch);
        }

        Ok(Self(format!("0x{checksummed}")))
    }

    /// The canonical checksummed form, `0x`-prefixed.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Apply the checksum casing to a lowercase 40-digit hex body.
///
/// A hex letter is uppercased when the corresponding nibble of
/// `keccak256(body)` is `>= 8`.
fn checksum_body(lower: &str) -> String {
    let digest = Keccak256::digest(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
