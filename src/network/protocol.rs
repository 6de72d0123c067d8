//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every message is a JSON object tagged by `"type"`. Amounts and
//! multipliers travel as decimal strings so no precision is lost in
//! JavaScript clients.

use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier};
use crate::core::hash::CommitmentHash;
use crate::engine::RoundStatus;
use crate::error::{ErrorKind, WagerError};
use crate::game::events::RoundEvent;
use crate::game::outcome::Outcome;
use crate::game::settlement::Settlement;
use crate::game::state::{GameType, PlayerChoice, RoundId};
use crate::proof::commitment::SeedId;
use crate::proof::verify::RoundReceipt;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authenticate with the server.
    Auth(AuthRequest),

    /// Open a round, on a fresh seed or on an existing seed pair.
    OpenRound {
        /// Game to play.
        game: GameType,
        /// Seed pair to reuse; a fresh seed when absent.
        #[serde(default)]
        seed_id: Option<SeedId>,
    },

    /// Create a reusable seed pair.
    CreateSeedPair {
        /// Game the pair is bound to.
        game: GameType,
    },

    /// Place the round's bet.
    PlaceBet {
        /// Target round.
        round_id: RoundId,
        /// Stake.
        amount: Amount,
        /// The player's call.
        choice: PlayerChoice,
        /// Player seed mixed into the outcome.
        client_seed: String,
    },

    /// Close betting.
    CloseRound {
        /// Target round.
        round_id: RoundId,
    },

    /// Aviator cash-out, stamped by the server on receipt.
    CashOut {
        /// Target round.
        round_id: RoundId,
    },

    /// Settle a resolving round.
    Settle {
        /// Target round.
        round_id: RoundId,
    },

    /// Request the current state of a round.
    RoundStatus {
        /// Target round.
        round_id: RoundId,
    },

    /// Reveal a seed pair.
    RevealSeed {
        /// Seed to disclose.
        seed_id: SeedId,
    },

    /// Recompute an outcome from public inputs.
    Verify {
        /// Revealed server seed.
        server_seed: String,
        /// Player seed.
        client_seed: String,
        /// Round nonce.
        nonce: u64,
        /// Game to derive.
        game: GameType,
    },

    /// Request the verification receipt of a settled round.
    Receipt {
        /// Target round.
        round_id: RoundId,
    },

    /// Request the last Aviator crash points.
    RecentCrashes,

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

/// Authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Wallet address the player connected with.
    pub address: String,
    /// JWT whose subject is `address`. Optional when anonymous play is on.
    #[serde(default)]
    pub token: Option<String>,
    /// Client version for compatibility check.
    pub client_version: String,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authentication result.
    AuthResult(AuthResult),

    /// Round snapshot after any round operation.
    Round(RoundStatus),

    /// Seed pair created.
    SeedPair {
        /// New seed.
        seed_id: SeedId,
        /// Its published hash.
        commitment_hash: CommitmentHash,
        /// Game it is bound to.
        game: GameType,
    },

    /// Cash-out accepted.
    CashedOut {
        /// Round cashed out.
        round_id: RoundId,
        /// Locked multiplier.
        multiplier: Multiplier,
        /// Flight time at cash-out.
        elapsed_ms: Millis,
    },

    /// Round settled. Repeated settle requests receive the same payload.
    Settled {
        /// Round settled.
        round_id: RoundId,
        /// Stored payout record.
        settlement: Settlement,
    },

    /// Seed pair revealed.
    SeedRevealed {
        /// Seed disclosed.
        seed_id: SeedId,
        /// Its raw value.
        server_seed: String,
    },

    /// Recomputed outcome.
    Verified {
        /// Outcome for the given inputs.
        outcome: Outcome,
    },

    /// Verification receipt.
    Receipt(RoundReceipt),

    /// Last crash points, newest first.
    RecentCrashes {
        /// Crash points.
        crashes: Vec<Multiplier>,
    },

    /// Pushed lifecycle event for one of the player's rounds.
    RoundEvent(RoundEvent),

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server clock in milliseconds.
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),

    /// Server shutting down.
    Shutdown {
        /// Why the server is stopping.
        reason: String,
    },
}

/// Authentication result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    /// Whether authentication succeeded.
    pub success: bool,
    /// Normalized player id, on success.
    pub player_id: Option<String>,
    /// Error message, on failure.
    pub error: Option<String>,
    /// Server version.
    pub server_version: String,
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Build an error with a message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<&WagerError> for ServerError {
    fn from(err: &WagerError) -> Self {
        Self::new(ErrorCode::from(err.kind()), err.to_string())
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Authentication failed.
    AuthFailed,
    /// Not authenticated.
    NotAuthenticated,
    /// Token expired.
    TokenExpired,
    /// Malformed message or invalid argument.
    InvalidInput,
    /// Round or seed in the wrong state.
    StateConflict,
    /// Too early or too late.
    Timing,
    /// Server could not draw a seed.
    EntropyUnavailable,
    /// Too many connections.
    ServerOverloaded,
    /// Internal server error.
    InternalError,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::InvalidInput,
            ErrorKind::StateConflict => ErrorCode::StateConflict,
            ErrorKind::Timing => ErrorCode::Timing,
            ErrorKind::Entropy => ErrorCode::EntropyUnavailable,
            ErrorKind::Internal => ErrorCode::InternalError,
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcome::CoinSide;
    use crate::game::round::RoundError;

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::Auth(AuthRequest {
            address: "0xAbC".to_string(),
            token: Some("jwt".to_string()),
            client_version: "1.0.0".to_string(),
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"auth""#));
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_place_bet_wire_format() {
        let round_id = RoundId::new_v4();
        let json = format!(
            r#"{{"type":"place_bet","round_id":"{}","amount":"0.1","choice":{{"coin_flip":{{"side":"heads"}}}},"client_seed":"player1"}}"#,
            round_id
        );
        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::PlaceBet { round_id: id, amount, choice, client_seed } => {
                assert_eq!(id, round_id);
                assert_eq!(amount, "0.1".parse::<Amount>().unwrap());
                assert_eq!(choice, PlayerChoice::CoinFlip { side: CoinSide::Heads });
                assert_eq!(client_seed, "player1");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_open_round_seed_optional() {
        let msg = ClientMessage::from_json(r#"{"type":"open_round","game":"aviator"}"#).unwrap();
        assert_eq!(msg, ClientMessage::OpenRound { game: GameType::Aviator, seed_id: None });

        let msg = ClientMessage::from_json(r#"{"type":"recent_crashes"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RecentCrashes);
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::RecentCrashes {
            crashes: vec![Multiplier::from_hundredths(250), Multiplier::ONE],
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""crashes":["2.50","1.00"]"#));
        assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);

        let pong = ServerMessage::Pong { timestamp: 1, server_time: 2 };
        assert_eq!(ServerMessage::from_json(&pong.to_json().unwrap()).unwrap(), pong);
    }

    #[test]
    fn test_error_codes() {
        let err = WagerError::from(RoundError::DuplicateBet(RoundId::new_v4()));
        let wire = ServerError::from(&err);
        assert_eq!(wire.code, ErrorCode::StateConflict);
        assert_eq!(wire.message, err.to_string());

        let json = ServerMessage::Error(wire).to_json().unwrap();
        assert!(json.contains(r#""code":"state_conflict""#));

        assert_eq!(ErrorCode::from(ErrorKind::Entropy), ErrorCode::EntropyUnavailable);
        assert_eq!(ErrorCode::from(ErrorKind::Validation), ErrorCode::InvalidInput);
    }
}
