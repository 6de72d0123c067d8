//! Round State Definitions
//!
//! All data carried by a round, from open to archive.
//! Transitions live in [`crate::game::round`]; this module only describes shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier};
use crate::core::hash::{CommitmentHash, Digest32, ReceiptHasher};
use crate::game::outcome::{CardRank, CardSuit, CoinSide, Outcome, OutcomeError};
use crate::game::settlement::Settlement;
use crate::proof::commitment::{Commitment, SeedId};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Player identifier: the wallet address supplied by the session layer.
///
/// Stored lowercased so `0xAbC` and `0xabc` are the same player.
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    /// Maximum accepted address length.
    pub const MAX_LEN: usize = 128;

    /// Create from a wallet address or session id.
    ///
    /// Returns `None` for empty, oversized or non-printable input.
    pub fn from_address(address: &str) -> Option<Self> {
        let trimmed = address.trim();
        if trimmed.is_empty()
            || trimmed.len() > Self::MAX_LEN
            || !trimmed.bytes().all(|b| b.is_ascii_graphic())
        {
            return None;
        }
        Some(Self(trimmed.to_ascii_lowercase()))
    }

    /// Address as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique round identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub uuid::Uuid);

impl RoundId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RoundId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

// =============================================================================
// GAME TYPE
// =============================================================================

/// The minigames the engine can resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Heads or tails, 2x on a correct call.
    CoinFlip,
    /// Guess a card's rank and suit.
    CardPick,
    /// Cash out before the plane crashes.
    Aviator,
}

impl GameType {
    /// All supported games.
    pub const ALL: [GameType; 3] = [GameType::CoinFlip, GameType::CardPick, GameType::Aviator];

    /// Stable slug used by the front-end routes.
    pub fn slug(self) -> &'static str {
        match self {
            GameType::CoinFlip => "coin-flip",
            GameType::CardPick => "card-pick",
            GameType::Aviator => "aviator",
        }
    }

    /// Stable byte for hashing.
    pub fn tag(self) -> u8 {
        match self {
            GameType::CoinFlip => 0,
            GameType::CardPick => 1,
            GameType::Aviator => 2,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for GameType {
    type Err = OutcomeError;

    /// Accepts slugs (`coin-flip`), snake case (`coin_flip`) and run-together
    /// names (`coinflip`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "coinflip" => Ok(GameType::CoinFlip),
            "cardpick" => Ok(GameType::CardPick),
            "aviator" => Ok(GameType::Aviator),
            _ => Err(OutcomeError::UnsupportedGameType(s.to_string())),
        }
    }
}

// =============================================================================
// ROUND STATE
// =============================================================================

/// Lifecycle of a round. Transitions only move forward.
///
/// ```text
/// Open ──bet + close──▶ Resolving ──settle──▶ Settled
///   │
///   └──close without bet / deadline──▶ Cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    /// Accepting the single bet.
    #[default]
    Open,
    /// Bet locked; outcome pending (Aviator: in flight).
    Resolving,
    /// Outcome and payout fixed.
    Settled,
    /// No valid bet before the deadline.
    Cancelled,
}

impl RoundState {
    /// Is this a terminal state?
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundState::Settled | RoundState::Cancelled)
    }

    /// Is `next` a legal forward transition from `self`?
    pub fn can_transition_to(self, next: RoundState) -> bool {
        matches!(
            (self, next),
            (RoundState::Open, RoundState::Resolving)
                | (RoundState::Open, RoundState::Cancelled)
                | (RoundState::Resolving, RoundState::Settled)
        )
    }
}

// =============================================================================
// BETS
// =============================================================================

/// What the player is betting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerChoice {
    /// Called side of the coin.
    CoinFlip {
        /// Heads or tails.
        side: CoinSide,
    },
    /// Guessed card.
    CardPick {
        /// Guessed rank.
        rank: CardRank,
        /// Guessed suit.
        suit: CardSuit,
    },
    /// Aviator needs no call up front; an auto cash-out target is optional.
    Aviator {
        /// Cash out automatically once the multiplier reaches this value.
        #[serde(default)]
        auto_cash_out: Option<Multiplier>,
    },
}

impl PlayerChoice {
    /// Game this choice belongs to.
    pub fn game_type(&self) -> GameType {
        match self {
            PlayerChoice::CoinFlip { .. } => GameType::CoinFlip,
            PlayerChoice::CardPick { .. } => GameType::CardPick,
            PlayerChoice::Aviator { .. } => GameType::Aviator,
        }
    }

    /// Auto cash-out target, if this is an Aviator choice with one.
    pub fn auto_cash_out(&self) -> Option<Multiplier> {
        match self {
            PlayerChoice::Aviator { auto_cash_out } => *auto_cash_out,
            _ => None,
        }
    }

    /// Feed the full call into a receipt digest.
    pub fn hash_into(&self, hasher: &mut ReceiptHasher) {
        hasher.update_u8(self.game_type().tag());
        match self {
            PlayerChoice::CoinFlip { side } => hasher.update_u8(*side as u8),
            PlayerChoice::CardPick { rank, suit } => {
                hasher.update_u8(rank.index());
                hasher.update_u8(suit.index());
            }
            PlayerChoice::Aviator { auto_cash_out } => {
                hasher.update_multiplier(auto_cash_out.unwrap_or(Multiplier::ZERO))
            }
        }
    }
}

/// A wager as submitted: amount plus choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    /// Amount staked.
    pub amount: Amount,
    /// What the player called.
    pub choice: PlayerChoice,
}

/// A bet accepted into a round. Immutable once the round leaves Open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Amount staked.
    pub amount: Amount,
    /// What the player called.
    pub choice: PlayerChoice,
    /// Server time the bet was accepted.
    pub placed_at: Millis,
}

/// A locked-in Aviator cash-out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashOut {
    /// Server time of the request.
    pub at: Millis,
    /// Milliseconds since the flight started.
    pub elapsed_ms: Millis,
    /// Multiplier implied by `elapsed_ms`.
    pub multiplier: Multiplier,
}

// =============================================================================
// ROUND
// =============================================================================

/// One instance of a game for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier.
    pub id: RoundId,
    /// Owning player.
    pub player_id: PlayerId,
    /// Game being played.
    pub game_type: GameType,
    /// Server seed committed to this round.
    pub server_seed_id: SeedId,
    /// Published commitment of the server seed.
    pub commitment_hash: CommitmentHash,
    /// Per (player, game) nonce.
    pub nonce: u64,
    /// Lifecycle state.
    pub state: RoundState,
    /// When the round opened.
    pub opened_at: Millis,
    /// Open rounds without a bet are cancelled at this instant.
    pub bet_deadline: Millis,
    /// Player seed, fixed with the bet.
    pub client_seed: Option<String>,
    /// The single bet.
    pub bet: Option<Bet>,
    /// When betting closed (Aviator: flight start).
    pub closed_at: Option<Millis>,
    /// Precomputed Aviator crash point. Not shown to clients before the crash.
    pub crash_point: Option<Multiplier>,
    /// Aviator manual cash-out.
    pub cash_out: Option<CashOut>,
    /// Set exactly once at settlement.
    pub outcome: Option<Outcome>,
    /// Payout record, set exactly once at settlement.
    pub settlement: Option<Settlement>,
    /// When the round reached a terminal state.
    pub finished_at: Option<Millis>,
}

impl Round {
    /// Create an open round on a published commitment.
    pub fn new(
        id: RoundId,
        player_id: PlayerId,
        game_type: GameType,
        commitment: Commitment,
        nonce: u64,
        opened_at: Millis,
        bet_deadline: Millis,
    ) -> Self {
        Self {
            id,
            player_id,
            game_type,
            server_seed_id: commitment.seed_id,
            commitment_hash: commitment.commitment_hash,
            nonce,
            state: RoundState::Open,
            opened_at,
            bet_deadline,
            client_seed: None,
            bet: None,
            closed_at: None,
            crash_point: None,
            cash_out: None,
            outcome: None,
            settlement: None,
            finished_at: None,
        }
    }

    /// Payout if settled.
    pub fn payout(&self) -> Option<Amount> {
        self.settlement.as_ref().map(|s| s.payout)
    }

    /// Digest of every field a verifier re-derives, in fixed order.
    pub fn compute_hash(&self) -> Digest32 {
        RoundDigest {
            id: self.id,
            player_id: &self.player_id,
            game_type: self.game_type,
            commitment_hash: &self.commitment_hash,
            nonce: self.nonce,
            client_seed: self.client_seed.as_deref().unwrap_or(""),
            bet: self.bet.as_ref(),
            cash_out: self.cash_out.as_ref(),
            outcome: self.outcome.as_ref(),
            payout: self.payout(),
        }
        .compute()
    }
}

/// Borrowed view of the round fields a receipt commits to.
///
/// Built from a live [`Round`] by the server and from a receipt by a
/// verifier; both must produce the same bytes.
#[derive(Clone, Copy, Debug)]
pub struct RoundDigest<'a> {
    /// Round identifier.
    pub id: RoundId,
    /// Owning player.
    pub player_id: &'a PlayerId,
    /// Game played.
    pub game_type: GameType,
    /// Published seed commitment.
    pub commitment_hash: &'a CommitmentHash,
    /// Round nonce.
    pub nonce: u64,
    /// Player seed, empty before the bet.
    pub client_seed: &'a str,
    /// Accepted bet.
    pub bet: Option<&'a Bet>,
    /// Aviator cash-out.
    pub cash_out: Option<&'a CashOut>,
    /// Settled outcome.
    pub outcome: Option<&'a Outcome>,
    /// Settled payout.
    pub payout: Option<Amount>,
}

impl RoundDigest<'_> {
    /// Hash the fields in fixed order.
    pub fn compute(&self) -> Digest32 {
        let mut hasher = ReceiptHasher::for_round_receipt();
        hasher.update_uuid(self.id.as_bytes());
        hasher.update_str(self.player_id.as_str());
        hasher.update_u8(self.game_type.tag());
        hasher.update_bytes(&self.commitment_hash.0);
        hasher.update_u64(self.nonce);
        hasher.update_str(self.client_seed);

        if let Some(bet) = self.bet {
            hasher.update_amount(bet.amount);
            bet.choice.hash_into(&mut hasher);
        }
        if let Some(cash_out) = self.cash_out {
            hasher.update_u64(cash_out.elapsed_ms);
            hasher.update_multiplier(cash_out.multiplier);
        }
        if let Some(outcome) = self.outcome {
            outcome.hash_into(&mut hasher);
        }
        if let Some(payout) = self.payout {
            hasher.update_amount(payout);
            hasher.update_bool(!payout.is_zero());
        }
        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
