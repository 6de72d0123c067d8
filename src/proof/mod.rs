//! Provably-Fair Proof System
//!
//! Provides verifiable round outcomes through:
//! - Server seed commitments published before any bet
//! - Timed reveal once every referencing round has finished
//! - Offline verification by re-derivation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - Seed generation, hashing, reveal         │
//! │  verify.rs       - Outcome and receipt verification         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod verify;

// Re-export key types
pub use commitment::{
    verify_commitment, Commitment, CommitmentError, CommitmentStore, EntropySource,
    OsEntropy, SeedBinding, SeedId, SeedKind, ServerSeed,
};
pub use verify::{
    verify_outcome, verify_outcome_with, verify_receipt, RoundReceipt, VerificationError,
};
