//! Outcome Generation
//!
//! Pure function of `(server_seed, client_seed, nonce, game_type, params)`.
//! No clock, no global RNG, no floating point.
//!
//! ```text
//! CoinFlip  byte 0            even ─▶ Heads   odd ─▶ Tails
//! CardPick  below(13) ─▶ rank, then below(4) ─▶ suit
//! Aviator   r = u32 (BE, r != 0)
//!           crash = (10000 - edge_bps) * 2^32 / (100 * (2^32 - r))   hundredths
//!           clamp to [1.00x, max_crash]
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::fixed::{Multiplier, BASIS_POINTS};
use crate::core::hash::ReceiptHasher;
use crate::core::rng::FairRng;
use crate::game::state::GameType;

/// 2^32 as u128.
const TWO_POW_32: u128 = 1 << 32;

/// Outcome generation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    /// Game name not recognised.
    #[error("unsupported game type: {0}")]
    UnsupportedGameType(String),
    /// Published parameters are unusable.
    #[error("invalid outcome parameters: {0}")]
    InvalidParams(String),
}

// =============================================================================
// COIN / CARD VALUES
// =============================================================================

/// Coin side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    /// Even byte.
    Heads,
    /// Odd byte.
    Tails,
}

/// Card rank, Ace low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CardRank {
    Ace = 0,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl CardRank {
    /// Ranks in index order.
    pub const ALL: [CardRank; 13] = [
        CardRank::Ace,
        CardRank::Two,
        CardRank::Three,
        CardRank::Four,
        CardRank::Five,
        CardRank::Six,
        CardRank::Seven,
        CardRank::Eight,
        CardRank::Nine,
        CardRank::Ten,
        CardRank::Jack,
        CardRank::Queen,
        CardRank::King,
    ];

    /// Rank for an index in `0..13`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Index in `0..13`.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Face label as printed on the card ("A", "2", .., "K").
    pub fn label(self) -> &'static str {
        const LABELS: [&str; 13] = ["A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K"];
        LABELS[self as usize]
    }
}

/// Card suit, in the order the card table lays them out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CardSuit {
    Spades = 0,
    Hearts,
    Clubs,
    Diamonds,
}

impl CardSuit {
    /// Suits in index order.
    pub const ALL: [CardSuit; 4] = [CardSuit::Spades, CardSuit::Hearts, CardSuit::Clubs, CardSuit::Diamonds];

    /// Suit for an index in `0..4`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Index in `0..4`.
    pub fn index(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Resolved result of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Coin landed on `side`.
    CoinFlip {
        /// Side shown.
        side: CoinSide,
    },
    /// Card drawn.
    CardPick {
        /// Drawn rank.
        rank: CardRank,
        /// Drawn suit.
        suit: CardSuit,
    },
    /// Plane crashed at `crash_point`.
    Aviator {
        /// Crash multiplier, at least 1.00x.
        crash_point: Multiplier,
    },
}

impl Outcome {
    /// Game this outcome belongs to.
    pub fn game_type(&self) -> GameType {
        match self {
            Outcome::CoinFlip { .. } => GameType::CoinFlip,
            Outcome::CardPick { .. } => GameType::CardPick,
            Outcome::Aviator { .. } => GameType::Aviator,
        }
    }

    /// Crash point, for Aviator outcomes.
    pub fn crash_point(&self) -> Option<Multiplier> {
        match self {
            Outcome::Aviator { crash_point } => Some(*crash_point),
            _ => None,
        }
    }

    /// Feed into a receipt digest.
    pub fn hash_into(&self, hasher: &mut ReceiptHasher) {
        hasher.update_u8(self.game_type().tag());
        match self {
            Outcome::CoinFlip { side } => hasher.update_u8(*side as u8),
            Outcome::CardPick { rank, suit } => {
                hasher.update_u8(rank.index());
                hasher.update_u8(suit.index());
            }
            Outcome::Aviator { crash_point } => hasher.update_multiplier(*crash_point),
        }
    }
}

/// Published parameters of the crash distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeParams {
    /// House edge in basis points (100 = 1%).
    pub house_edge_bps: u32,
    /// Upper clamp on the crash point.
    pub max_crash: Multiplier,
}

impl Default for OutcomeParams {
    fn default() -> Self {
        Self {
            house_edge_bps: 100,
            max_crash: Multiplier::from_hundredths(100_000_000), // 1,000,000.00x
        }
    }
}

impl OutcomeParams {
    /// Reject parameters that would produce a degenerate distribution.
    pub fn validate(&self) -> Result<(), OutcomeError> {
        if self.house_edge_bps >= BASIS_POINTS {
            return Err(OutcomeError::InvalidParams(format!(
                "house edge {} bps must be below {}",
                self.house_edge_bps, BASIS_POINTS
            )));
        }
        if self.max_crash < Multiplier::ONE {
            return Err(OutcomeError::InvalidParams(format!(
                "max crash {} must be at least 1.00",
                self.max_crash
            )));
        }
        Ok(())
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Derive the outcome of a round.
///
/// Same inputs always give the same outcome.
pub fn generate_outcome(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    game_type: GameType,
    params: &OutcomeParams,
) -> Outcome {
    let mut rng = FairRng::new(server_seed, client_seed, nonce);
    match game_type {
        GameType::CoinFlip => {
            let side = if rng.next_byte() % 2 == 0 {
                CoinSide::Heads
            } else {
                CoinSide::Tails
            };
            Outcome::CoinFlip { side }
        }
        GameType::CardPick => {
            let rank = CardRank::ALL[rng.below(13) as usize];
            let suit = CardSuit::ALL[rng.below(4) as usize];
            Outcome::CardPick { rank, suit }
        }
        GameType::Aviator => Outcome::Aviator {
            crash_point: crash_point_from_draw(rng.next_unit_numerator(), params),
        },
    }
}

/// Map a nonzero u32 draw to a crash multiplier.
///
/// With `u = r / 2^32`, this is `floor(100 * (1 - edge) / (1 - u))` hundredths.
/// `P(crash >= m) = (1 - edge) / m` for every `m` between the clamps.
pub fn crash_point_from_draw(r: u32, params: &OutcomeParams) -> Multiplier {
    let keep = BASIS_POINTS.saturating_sub(params.house_edge_bps) as u128;
    let tail = TWO_POW_32 - r as u128;
    let hundredths = (keep * TWO_POW_32) / (100 * tail);

    let floor = Multiplier::ONE.hundredths() as u128;
    let ceiling = params.max_crash.hundredths().max(Multiplier::ONE.hundredths()) as u128;
    Multiplier::from_hundredths(hundredths.clamp(floor, ceiling) as u64)
}

// =============================================================================
// TESTS
// =============================================================================
