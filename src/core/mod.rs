//! Core deterministic primitives.
//!
//! Everything an outside verifier needs to recompute a round lives here:
//! integer money, the commitment hash and the HMAC byte stream.

pub mod fixed;
pub mod hash;
pub mod rng;
pub mod clock;

// Re-export core types
pub use fixed::{Amount, Multiplier, FixedError, AMOUNT_ONE, BASIS_POINTS};
pub use hash::{CommitmentHash, Digest32, ReceiptHasher};
pub use rng::FairRng;
pub use clock::{Clock, ManualClock, Millis, SystemClock};
