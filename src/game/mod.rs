//! Game Logic Module
//!
//! Round model, outcome derivation and payouts. 100% deterministic:
//! time always comes in as an argument.
//!
//! ## Module Structure
//!
//! - `state`: Identifiers, round, bet and cash-out records
//! - `outcome`: Seed + nonce to coin side / card / crash point
//! - `rules`: Bet limits, payout tables, flight curve
//! - `round`: Round state machine
//! - `settlement`: Payout calculation
//! - `events`: Round events for session routing

pub mod state;
pub mod outcome;
pub mod rules;
pub mod round;
pub mod settlement;
pub mod events;

// Re-export key types
pub use state::{Bet, CashOut, GameType, PlayerChoice, PlayerId, Round, RoundId, RoundState, Wager};
pub use outcome::{generate_outcome, CardRank, CardSuit, CoinSide, Outcome, OutcomeError, OutcomeParams};
pub use rules::{BetLimits, CardPayoutTable, FlightCurve, GameRules};
pub use round::{RoundBook, RoundError};
pub use settlement::{compute_payout, Settlement, SettlementError};
pub use events::{RoundEvent, RoundEventData};
