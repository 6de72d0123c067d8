//! Hashing for Commitments and Receipts
//!
//! Provides the SHA-256 primitives behind:
//! - Server-seed commitments (`sha256(raw_seed)`, no domain prefix, so any
//!   off-the-shelf tool can check a revealed seed)
//! - Round receipt digests (domain-separated, field-ordered)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::fixed::{Amount, Multiplier};

/// Raw 256-bit digest.
pub type Digest32 = [u8; 32];

/// SHA-256 of a raw server seed, published before any bet is accepted.
///
/// Serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitmentHash(pub Digest32);

impl CommitmentHash {
    /// Commit to a raw seed string.
    pub fn of_seed(raw_seed: &str) -> Self {
        Self(hash_bytes(raw_seed.as_bytes()))
    }

    /// Does `raw_seed` open this commitment?
    pub fn matches(&self, raw_seed: &str) -> bool {
        Self::of_seed(raw_seed) == *self
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentHash({})", self.to_hex())
    }
}

impl fmt::Display for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for CommitmentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl TryFrom<String> for CommitmentHash {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommitmentHash> for String {
    fn from(value: CommitmentHash) -> Self {
        value.to_hex()
    }
}

/// Field-ordered SHA-256 hasher.
///
/// Order of updates is part of the digest format.
pub struct ReceiptHasher {
    hasher: Sha256,
}

impl ReceiptHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for settled round receipts.
    pub fn for_round_receipt() -> Self {
        Self::new(b"PENNY_WAGER_RECEIPT_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an amount (u128 little-endian).
    #[inline]
    pub fn update_amount(&mut self, value: Amount) {
        self.hasher.update(value.units().to_le_bytes());
    }

    /// Update with a multiplier.
    #[inline]
    pub fn update_multiplier(&mut self, value: Multiplier) {
        self.update_u64(value.hundredths());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Digest32 {
        self.hasher.finalize().into()
    }
}

/// Compute a simple hash of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================
