//! Unified Engine Errors
//!
//! Every engine operation returns [`WagerError`]. Callers that only need to
//! decide how to react (retry later, fix input, give up) use [`ErrorKind`].

use thiserror::Error;

use crate::game::outcome::OutcomeError;
use crate::game::round::RoundError;
use crate::game::settlement::SettlementError;
use crate::game::state::RoundId;
use crate::ledger::LedgerError;
use crate::proof::commitment::CommitmentError;
use crate::proof::verify::VerificationError;

/// Coarse error class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input; retrying the same request fails again.
    Validation,
    /// The round or seed is in the wrong state for this request.
    StateConflict,
    /// Too early or too late; may succeed at another time.
    Timing,
    /// Randomness source failed.
    Entropy,
    /// Bug or backend failure.
    Internal,
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum WagerError {
    /// Seed store failure.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// Outcome derivation rejected its inputs.
    #[error(transparent)]
    Outcome(#[from] OutcomeError),

    /// Round state machine rejection.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// Payout computation failed.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Durable store failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Receipt did not verify.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The player already has an unfinished round of this game.
    #[error("round {round_id} is still in progress")]
    RoundInProgress {
        /// The unfinished round.
        round_id: RoundId,
    },

    /// The round belongs to someone else.
    #[error("round {0} belongs to another player")]
    NotRoundOwner(RoundId),

    /// Settled round whose seed is not disclosed yet.
    #[error("receipt unavailable: {0}")]
    ReceiptUnavailable(String),

    /// Bad configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Engine result type.
pub type WagerResult<T> = Result<T, WagerError>;

impl WagerError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WagerError::Commitment(err) => match err {
                CommitmentError::EntropySourceUnavailable(_) => ErrorKind::Entropy,
                CommitmentError::UnknownSeed(_) => ErrorKind::Validation,
                CommitmentError::NotYetRevealable { .. } => ErrorKind::Timing,
                CommitmentError::SeedRetired(_) | CommitmentError::SeedNotOwned(_) => ErrorKind::StateConflict,
            },
            WagerError::Outcome(_) => ErrorKind::Validation,
            WagerError::Round(err) => match err {
                RoundError::UnknownRound(_)
                | RoundError::BetOutOfRange { .. }
                | RoundError::ChoiceMismatch { .. }
                | RoundError::InvalidClientSeed(_)
                | RoundError::InvalidAutoCashOut(_)
                | RoundError::CashOutUnsupported(_) => ErrorKind::Validation,
                RoundError::RoundNotOpen { .. }
                | RoundError::RoundNotResolving { .. }
                | RoundError::DuplicateBet(_)
                | RoundError::AlreadyCashedOut(_)
                | RoundError::AlreadyCrashed { .. }
                | RoundError::RoundCancelled(_)
                | RoundError::AlreadySettled { .. } => ErrorKind::StateConflict,
                RoundError::BetWindowClosed { .. }
                | RoundError::FlightNotStarted(_)
                | RoundError::RoundInFlight(_) => ErrorKind::Timing,
                RoundError::Settlement(_) | RoundError::Corrupt { .. } | RoundError::IllegalTransition { .. } => {
                    ErrorKind::Internal
                }
            },
            WagerError::Settlement(_) | WagerError::Ledger(_) | WagerError::Config(_) => ErrorKind::Internal,
            WagerError::Verification(_) | WagerError::NotRoundOwner(_) => ErrorKind::Validation,
            WagerError::RoundInProgress { .. } => ErrorKind::StateConflict,
            WagerError::ReceiptUnavailable(_) => ErrorKind::Timing,
        }
    }
}
