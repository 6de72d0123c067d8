//! Provably-Fair Byte Stream
//!
//! HMAC-SHA256 keyed by the raw server seed over `client_seed:nonce`.
//! Anyone holding the three inputs reproduces the exact byte sequence.
//!
//! ```text
//! block 0 = HMAC(server_seed, "{client_seed}:{nonce}")
//! block k = HMAC(server_seed, "{client_seed}:{nonce}:{k}")   k >= 1
//! stream  = block 0 || block 1 || block 2 || ...
//! ```
//!
//! Ranges that do not divide 256 (or 2^32) are mapped with rejection
//! sampling, so no value is favoured by modulo bias.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// HMAC-SHA256.
pub type HmacSha256 = Hmac<Sha256>;

/// Bytes per HMAC block.
const BLOCK_LEN: usize = 32;

/// Deterministic byte stream for one `(server_seed, client_seed, nonce)` triple.
///
/// # Example
///
/// ```
/// use penny_wager::core::rng::FairRng;
///
/// let mut a = FairRng::new("server", "client", 1);
/// let mut b = FairRng::new("server", "client", 1);
/// assert_eq!(a.next_byte(), b.next_byte()); // Always the same!
/// ```
#[derive(Clone)]
pub struct FairRng {
    key: Vec<u8>,
    message: String,
    block_index: u64,
    block: [u8; BLOCK_LEN],
    cursor: usize,
}

impl FairRng {
    /// Create the stream for a seed pair and nonce.
    pub fn new(server_seed: &str, client_seed: &str, nonce: u64) -> Self {
        let key = server_seed.as_bytes().to_vec();
        let message = format!("{}:{}", client_seed, nonce);
        let block = hmac_block(&key, message.as_bytes());
        Self {
            key,
            message,
            block_index: 0,
            block,
            cursor: 0,
        }
    }

    /// The first HMAC block (what most verifiers display).
    pub fn first_block(server_seed: &str, client_seed: &str, nonce: u64) -> [u8; BLOCK_LEN] {
        let message = format!("{}:{}", client_seed, nonce);
        hmac_block(server_seed.as_bytes(), message.as_bytes())
    }

    /// Next byte of the stream.
    pub fn next_byte(&mut self) -> u8 {
        if self.cursor == BLOCK_LEN {
            self.refill();
        }
        let byte = self.block[self.cursor];
        self.cursor += 1;
        byte
    }

    /// Next four bytes as a big-endian u32.
    pub fn next_u32(&mut self) -> u32 {
        let bytes = [self.next_byte(), self.next_byte(), self.next_byte(), self.next_byte()];
        u32::from_be_bytes(bytes)
    }

    /// Uniform integer in `[0, n)` for `1 <= n <= 256`, one byte per draw.
    ///
    /// Bytes at or above the largest multiple of `n` are discarded.
    pub fn below(&mut self, n: u16) -> u8 {
        debug_assert!((1..=256).contains(&n), "below() takes 1..=256, got {}", n);
        let n = n.clamp(1, 256);
        let limit = 256 - (256 % n);
        loop {
            let byte = self.next_byte() as u16;
            if byte < limit {
                return (byte % n) as u8;
            }
        }
    }

    /// Uniform u32 in `[1, 2^32)`; zero draws are rejected.
    ///
    /// Read as `r / 2^32`, this is a uniform fraction in the open interval (0, 1).
    pub fn next_unit_numerator(&mut self) -> u32 {
        loop {
            let value = self.next_u32();
            if value != 0 {
                return value;
            }
        }
    }

    /// Number of bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.block_index * BLOCK_LEN as u64 + self.cursor as u64
    }

    fn refill(&mut self) {
        self.block_index += 1;
        let message = format!("{}:{}", self.message, self.block_index);
        self.block = hmac_block(&self.key, message.as_bytes());
        self.cursor = 0;
    }
}

impl std::fmt::Debug for FairRng {
    // The key is the unrevealed server seed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FairRng")
            .field("message", &self.message)
            .field("block_index", &self.block_index)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

fn hmac_block(key: &[u8], message: &[u8]) -> [u8; BLOCK_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

// =============================================================================
// TESTS
// =============================================================================
