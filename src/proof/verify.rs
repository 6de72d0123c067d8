//! Verification API
//!
//! Re-derive any settled round from its revealed inputs.
//! Needs no server state: a receipt plus the published rules is enough.

use serde::{Deserialize, Serialize};

use crate::core::fixed::Amount;
use crate::core::hash::CommitmentHash;
use crate::game::outcome::{generate_outcome, Outcome, OutcomeParams};
use crate::game::rules::GameRules;
use crate::game::settlement::compute_payout;
use crate::game::state::{Bet, CashOut, GameType, PlayerId, Round, RoundDigest, RoundId};
use crate::proof::commitment::verify_commitment;

/// Recompute an outcome with the default published parameters.
pub fn verify_outcome(server_seed: &str, client_seed: &str, nonce: u64, game_type: GameType) -> Outcome {
    verify_outcome_with(server_seed, client_seed, nonce, game_type, &OutcomeParams::default())
}

/// Recompute an outcome with explicit parameters.
pub fn verify_outcome_with(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    game_type: GameType,
    params: &OutcomeParams,
) -> Outcome {
    generate_outcome(server_seed, client_seed, nonce, game_type, params)
}

/// Everything needed to check one settled round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReceipt {
    /// Round identifier.
    pub round_id: RoundId,
    /// Owning player.
    pub player_id: PlayerId,
    /// Game played.
    pub game_type: GameType,
    /// Revealed server seed.
    pub server_seed: String,
    /// Commitment published when the round opened.
    pub commitment_hash: CommitmentHash,
    /// Player seed.
    pub client_seed: String,
    /// Round nonce.
    pub nonce: u64,
    /// Accepted bet.
    pub bet: Bet,
    /// Aviator manual cash-out.
    pub cash_out: Option<CashOut>,
    /// Outcome the server settled with.
    pub outcome: Outcome,
    /// Payout the server settled with.
    pub payout: Amount,
    /// Hex digest of the settled round record.
    pub round_hash: String,
}

impl RoundReceipt {
    /// Build from a settled round and its revealed seed.
    ///
    /// Returns `None` if the round has not settled.
    pub fn from_round(round: &Round, server_seed: &str) -> Option<Self> {
        Some(Self {
            round_id: round.id,
            player_id: round.player_id.clone(),
            game_type: round.game_type,
            server_seed: server_seed.to_string(),
            commitment_hash: round.commitment_hash,
            client_seed: round.client_seed.clone()?,
            nonce: round.nonce,
            bet: round.bet.clone()?,
            cash_out: round.cash_out,
            outcome: round.outcome?,
            payout: round.settlement?.payout,
            round_hash: hex::encode(round.compute_hash()),
        })
    }

    /// Hex digest of the fields this receipt carries, computed the way the
    /// server hashes the round record.
    pub fn compute_hash(&self) -> String {
        let digest = RoundDigest {
            id: self.round_id,
            player_id: &self.player_id,
            game_type: self.game_type,
            commitment_hash: &self.commitment_hash,
            nonce: self.nonce,
            client_seed: &self.client_seed,
            bet: Some(&self.bet),
            cash_out: self.cash_out.as_ref(),
            outcome: Some(&self.outcome),
            payout: Some(self.payout),
        };
        hex::encode(digest.compute())
    }
}

/// Check a receipt end to end.
///
/// 1. The revealed seed opens the commitment.
/// 2. The outcome re-derives from the seeds and nonce.
/// 3. Any cash-out sits on the flight curve, below the crash point.
/// 4. The payout recomputes from bet, outcome and cash-out.
/// 5. `round_hash` covers exactly the fields on the receipt.
pub fn verify_receipt(receipt: &RoundReceipt, rules: &GameRules) -> Result<(), VerificationError> {
    if !verify_commitment(&receipt.commitment_hash, &receipt.server_seed) {
        return Err(VerificationError::CommitmentMismatch {
            commitment: receipt.commitment_hash,
            computed: CommitmentHash::of_seed(&receipt.server_seed),
        });
    }

    let expected = verify_outcome_with(
        &receipt.server_seed,
        &receipt.client_seed,
        receipt.nonce,
        receipt.game_type,
        &rules.outcome,
    );
    if expected != receipt.outcome {
        return Err(VerificationError::OutcomeMismatch { expected, got: receipt.outcome });
    }

    if let Some(cash_out) = &receipt.cash_out {
        let on_curve = rules.flight.multiplier_at(cash_out.elapsed_ms) == cash_out.multiplier;
        let before_crash = expected.crash_point().is_some_and(|crash| cash_out.multiplier < crash);
        if !on_curve || !before_crash {
            return Err(VerificationError::InvalidCashOut(*cash_out));
        }
    }

    let payout = compute_payout(&receipt.bet, &expected, receipt.cash_out.as_ref(), rules)
        .map_err(|e| VerificationError::Payout(e.to_string()))?;
    if payout.amount != receipt.payout {
        return Err(VerificationError::PayoutMismatch { expected: payout.amount, got: receipt.payout });
    }

    let round_hash = receipt.compute_hash();
    if !round_hash.eq_ignore_ascii_case(&receipt.round_hash) {
        return Err(VerificationError::RoundHashMismatch { expected: round_hash, got: receipt.round_hash.clone() });
    }
    Ok(())
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Revealed seed does not hash to the commitment.
    CommitmentMismatch {
        /// Published commitment.
        commitment: CommitmentHash,
        /// Hash of the revealed seed.
        computed: CommitmentHash,
    },

    /// Outcome does not re-derive.
    OutcomeMismatch {
        /// Recomputed outcome.
        expected: Outcome,
        /// Outcome on the receipt.
        got: Outcome,
    },

    /// Cash-out is off the flight curve or at/after the crash.
    InvalidCashOut(CashOut),

    /// Payout does not recompute.
    PayoutMismatch {
        /// Recomputed payout.
        expected: Amount,
        /// Payout on the receipt.
        got: Amount,
    },

    /// Payout could not be computed at all.
    Payout(String),

    /// Round hash does not match the receipt's fields.
    RoundHashMismatch {
        /// Digest of the receipt's fields.
        expected: String,
        /// Digest on the receipt.
        got: String,
    },
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitmentMismatch { commitment, computed } => {
                write!(f, "Seed hashes to {}, commitment was {}", computed, commitment)
            }
            Self::OutcomeMismatch { expected, got } => {
                write!(f, "Outcome mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::InvalidCashOut(cash_out) => {
                write!(f, "Invalid cash-out at {}x after {}ms", cash_out.multiplier, cash_out.elapsed_ms)
            }
            Self::PayoutMismatch { expected, got } => {
                write!(f, "Payout mismatch: expected {}, got {}", expected, got)
            }
            Self::Payout(reason) => write!(f, "Payout failed: {}", reason),
            Self::RoundHashMismatch { expected, got } => {
                write!(f, "Round hash mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for VerificationError {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::Multiplier;
    use crate::game::outcome::CoinSide;
    use crate::game::settlement::{Payout, Settlement};
    use crate::game::state::PlayerChoice;
    use crate::proof::commitment::{Commitment, SeedId};

    fn sealed(mut receipt: RoundReceipt) -> RoundReceipt {
        receipt.round_hash = receipt.compute_hash();
        receipt
    }

    fn coin_receipt() -> RoundReceipt {
        sealed(RoundReceipt {
            round_id: RoundId::new_v4(),
            player_id: PlayerId::from_address("0xplayer").unwrap(),
            game_type: GameType::CoinFlip,
            server_seed: "abc123".to_string(),
            commitment_hash: CommitmentHash::of_seed("abc123"),
            client_seed: "player1".to_string(),
            nonce: 1,
            bet: Bet {
                amount: "0.1".parse().unwrap(),
                choice: PlayerChoice::CoinFlip { side: CoinSide::Heads },
                placed_at: 0,
            },
            cash_out: None,
            outcome: Outcome::CoinFlip { side: CoinSide::Heads },
            payout: "0.2".parse().unwrap(),
            round_hash: String::new(),
        })
    }

    #[test]
    fn test_verify_outcome_matches_generator() {
        let outcome = verify_outcome("abc123", "player1", 1, GameType::CoinFlip);
        assert_eq!(outcome, Outcome::CoinFlip { side: CoinSide::Heads });
    }

    #[test]
    fn test_valid_receipt() {
        assert_eq!(verify_receipt(&coin_receipt(), &GameRules::default()), Ok(()));
    }

    #[test]
    fn test_tampered_receipts() {
        let rules = GameRules::default();

        let mut wrong_seed = coin_receipt();
        wrong_seed.server_seed = "abc124".to_string();
        assert!(matches!(
            verify_receipt(&wrong_seed, &rules),
            Err(VerificationError::CommitmentMismatch { .. })
        ));

        let mut wrong_outcome = coin_receipt();
        wrong_outcome.outcome = Outcome::CoinFlip { side: CoinSide::Tails };
        assert!(matches!(
            verify_receipt(&wrong_outcome, &rules),
            Err(VerificationError::OutcomeMismatch { .. })
        ));

        let mut wrong_payout = coin_receipt();
        wrong_payout.payout = Amount::from_whole(1);
        assert_eq!(
            verify_receipt(&wrong_payout, &rules),
            Err(VerificationError::PayoutMismatch {
                expected: "0.2".parse().unwrap(),
                got: Amount::from_whole(1),
            })
        );
    }

    #[test]
    fn test_round_hash_binds_receipt() {
        let rules = GameRules::default();

        let mut other_player = coin_receipt();
        other_player.player_id = PlayerId::from_address("0xsomeone").unwrap();
        assert!(matches!(
            verify_receipt(&other_player, &rules),
            Err(VerificationError::RoundHashMismatch { .. })
        ));

        let mut blank = coin_receipt();
        blank.round_hash = String::new();
        assert!(matches!(verify_receipt(&blank, &rules), Err(VerificationError::RoundHashMismatch { .. })));

        let mut upper = coin_receipt();
        upper.round_hash = upper.round_hash.to_uppercase();
        assert_eq!(verify_receipt(&upper, &rules), Ok(()));
    }

    #[test]
    fn test_hash_matches_server_round() {
        let mut round = Round::new(
            RoundId::new_v4(),
            PlayerId::from_address("0xplayer").unwrap(),
            GameType::CoinFlip,
            Commitment { seed_id: SeedId::new_v4(), commitment_hash: CommitmentHash::of_seed("abc123") },
            1,
            0,
            60_000,
        );
        let template = coin_receipt();
        round.client_seed = Some(template.client_seed.clone());
        round.bet = Some(template.bet.clone());
        round.outcome = Some(template.outcome);
        round.settlement = Some(Settlement::new(
            Payout { amount: template.payout, multiplier: Multiplier::from_hundredths(200) },
            10,
        ));

        let receipt = RoundReceipt::from_round(&round, "abc123").unwrap();
        assert_eq!(receipt.round_hash, receipt.compute_hash());
        assert_eq!(verify_receipt(&receipt, &GameRules::default()), Ok(()));

        // same round, opposite call
        let mut tails = round.clone();
        tails.bet = Some(Bet { choice: PlayerChoice::CoinFlip { side: CoinSide::Tails }, ..template.bet });
        assert_ne!(RoundReceipt::from_round(&tails, "abc123").unwrap().round_hash, receipt.round_hash);
    }

    #[test]
    fn test_aviator_cash_out_checked() {
        let rules = GameRules::default();
        // ("abc123", "lucky-2588", 1) crashes at 2.50x
        let mut receipt = coin_receipt();
        receipt.game_type = GameType::Aviator;
        receipt.client_seed = "lucky-2588".to_string();
        receipt.bet.amount = Amount::from_whole(1);
        receipt.bet.choice = PlayerChoice::Aviator { auto_cash_out: None };
        receipt.outcome = Outcome::Aviator { crash_point: Multiplier::from_hundredths(250) };
        receipt.cash_out = Some(CashOut {
            at: 3_796,
            elapsed_ms: 3_796,
            multiplier: Multiplier::from_hundredths(210),
        });
        receipt.payout = "2.1".parse().unwrap();
        let receipt = sealed(receipt);
        assert_eq!(verify_receipt(&receipt, &rules), Ok(()));

        // claims a multiplier the curve never shows at that instant
        let mut forged = receipt.clone();
        forged.cash_out = Some(CashOut { at: 3_796, elapsed_ms: 3_796, multiplier: Multiplier::from_hundredths(240) });
        forged.payout = "2.4".parse().unwrap();
        assert!(matches!(verify_receipt(&forged, &rules), Err(VerificationError::InvalidCashOut(_))));
    }
}
