//! Content hashes for schema integrity verification

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json;
use crate::error::{CatalogError, Result};

/// Label recorded in the manifest for the hash algorithm
pub const HASH_ALGORITHM: &str = "sha256/64";

/// Number of hex characters in a schema hash (64 bits of SHA-256)
pub const HASH_HEX_LEN: usize = 16;

/// Truncated SHA-256 over the canonical serialization of a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaHash(String);

impl SchemaHash {
    /// Hash a schema document
    pub fn of(document: &serde_json::Value) -> Self {
        Self::of_canonical(&canonical_json(document))
    }

    /// Hash an already canonicalized document
    pub fn of_canonical(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        let hex = digest[..HASH_HEX_LEN / 2]
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect();
        Self(hex)
    }

    /// Parse a stored hash, rejecting anything but 16 lowercase hex characters
    pub fn parse(s: &str) -> Result<Self> {
        let well_formed = s.len() == HASH_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(CatalogError::InvalidHash(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive comparison against an untrusted candidate
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    /// Recompute the hash of `document` and compare
    pub fn verify(&self, document: &serde_json::Value) -> bool {
        *self == Self::of(document)
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SchemaHash {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaHash {
    type Error = CatalogError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SchemaHash> for String {
    fn from(hash: SchemaHash) -> Self {
        hash.0
    }
}
