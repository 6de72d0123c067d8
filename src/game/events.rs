//! Round Events
//!
//! Emitted on every round mutation. The server routes each event to the
//! round owner's session; tests inspect them through `take_events`.

use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier};
use crate::core::hash::CommitmentHash;
use crate::game::outcome::Outcome;
use crate::game::state::{GameType, PlayerId, RoundId};
use crate::proof::commitment::SeedId;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundEventData {
    /// Round opened with a published commitment.
    Opened {
        /// Game of the round.
        game_type: GameType,
        /// Published seed hash.
        commitment_hash: CommitmentHash,
        /// Round nonce.
        nonce: u64,
        /// Server time betting closes.
        bet_deadline: Millis,
    },

    /// Bet accepted.
    BetPlaced {
        /// Stake.
        amount: Amount,
    },

    /// Betting closed. For Aviator this is the flight start.
    Closed {
        /// Server time betting closed.
        closed_at: Millis,
    },

    /// Aviator cash-out locked in.
    CashedOut {
        /// Locked multiplier.
        multiplier: Multiplier,
        /// Flight time at cash-out.
        elapsed_ms: Millis,
    },

    /// Outcome and payout fixed.
    Settled {
        /// Derived outcome.
        outcome: Outcome,
        /// Amount owed.
        payout: Amount,
        /// Nonzero payout?
        won: bool,
    },

    /// Round cancelled without a payout.
    Cancelled {
        /// Why the round ended.
        reason: String,
    },

    /// Server seed disclosed.
    SeedRevealed {
        /// Seed disclosed.
        seed_id: SeedId,
        /// Its raw hex value.
        raw_seed: String,
    },
}

/// A round event with its owner and server time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEvent {
    /// Server time the event happened.
    pub at: Millis,

    /// Round owner.
    pub player_id: PlayerId,

    /// Round, if the event concerns one.
    pub round_id: Option<RoundId>,

    /// Event data.
    pub data: RoundEventData,
}

impl RoundEvent {
    /// Create an event for a round.
    pub fn new(at: Millis, player_id: PlayerId, round_id: RoundId, data: RoundEventData) -> Self {
        Self { at, player_id, round_id: Some(round_id), data }
    }

    /// Create a seed reveal event (not tied to a single round).
    pub fn seed_revealed(at: Millis, player_id: PlayerId, seed_id: SeedId, raw_seed: String) -> Self {
        Self {
            at,
            player_id,
            round_id: None,
            data: RoundEventData::SeedRevealed { seed_id, raw_seed },
        }
    }

    /// Create a cancelled event.
    pub fn cancelled(at: Millis, player_id: PlayerId, round_id: RoundId, reason: impl Into<String>) -> Self {
        Self::new(at, player_id, round_id, RoundEventData::Cancelled { reason: reason.into() })
    }

    /// Is this a terminal event for its round?
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, RoundEventData::Settled { .. } | RoundEventData::Cancelled { .. })
    }
}
