//! # Penny Wager Server
//!
//! Provably-fair outcome engine and round server for the Penny Wager
//! minigames: Coin Flip, Card Pick and Aviator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PENNY WAGER SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure primitives                           │
//! │  ├── fixed.rs    - Amount (18 dp) and Multiplier (2 dp)      │
//! │  ├── hash.rs     - SHA-256 commitments, receipt hashing      │
//! │  ├── rng.rs      - HMAC-SHA256 byte stream                   │
//! │  └── clock.rs    - Server-authoritative time                 │
//! │                                                              │
//! │  game/           - Round rules                               │
//! │  ├── state.rs    - Round, bet and choice types               │
//! │  ├── outcome.rs  - Outcome derivation per game               │
//! │  ├── rules.rs    - Limits, payout tables, flight curve       │
//! │  ├── round.rs    - Round state machine                       │
//! │  ├── settlement.rs - Payout calculation                      │
//! │  └── events.rs   - Lifecycle events                          │
//! │                                                              │
//! │  proof/          - Commit / reveal / verify                  │
//! │  ledger.rs       - Persistence contract                      │
//! │  engine.rs       - Facade over all of the above              │
//! │                                                              │
//! │  network/        - WebSocket binding                         │
//! │  ├── server.rs   - Accept loop, dispatch, sweep              │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── auth.rs     - Wallet JWT validation                     │
//! │  └── session.rs  - Per-player push routing                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! Every outcome is a pure function of
//! `(server_seed, client_seed, nonce, game_type)`. The server publishes
//! `sha256(server_seed)` before any bet and reveals the seed once every
//! round using it has finished, so anyone can recompute the result with
//! [`proof::verify_outcome`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod error;
pub mod game;
pub mod ledger;
pub mod network;
pub mod proof;

// Re-export commonly used types
pub use crate::core::fixed::{Amount, Multiplier};
pub use crate::core::hash::CommitmentHash;
pub use engine::{EngineConfig, RoundStatus, WagerEngine};
pub use error::{ErrorKind, WagerError, WagerResult};
pub use game::outcome::{generate_outcome, Outcome, OutcomeParams};
pub use game::state::{GameType, PlayerChoice, PlayerId, RoundId, RoundState, Wager};
pub use proof::verify::verify_outcome;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
