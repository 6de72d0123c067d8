//! Game Rules
//!
//! Bet limits, payout tables and the Aviator flight curve.
//! Everything here is published configuration; nothing is secret.

use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier, AMOUNT_ONE};
use crate::game::outcome::{OutcomeError, OutcomeParams};
use crate::game::state::GameType;

/// Inclusive stake bounds for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    /// Smallest accepted stake.
    pub min: Amount,
    /// Largest accepted stake.
    pub max: Amount,
}

impl BetLimits {
    /// Create limits.
    pub const fn new(min: Amount, max: Amount) -> Self {
        Self { min, max }
    }

    /// Is `amount` within bounds?
    pub fn contains(&self, amount: Amount) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// CardPick payout tiers.
///
/// With the defaults the return to player is
/// `(32 + 3*5 + 12*0.25) / 52 = 96.15%`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayoutTable {
    /// Rank and suit both correct.
    pub exact: Multiplier,
    /// Rank correct, suit wrong.
    pub rank_only: Multiplier,
    /// Suit correct, rank wrong.
    pub suit_only: Multiplier,
}

impl Default for CardPayoutTable {
    fn default() -> Self {
        Self {
            exact: Multiplier::from_hundredths(3_200),
            rank_only: Multiplier::from_hundredths(500),
            suit_only: Multiplier::from_hundredths(25),
        }
    }
}

impl CardPayoutTable {
    /// Expected return in basis points.
    pub fn return_to_player_bps(&self) -> u64 {
        // 1 exact, 3 rank-only, 12 suit-only cards out of 52
        let weighted = self.exact.hundredths()
            + 3 * self.rank_only.hundredths()
            + 12 * self.suit_only.hundredths();
        weighted * 100 / 52
    }
}

/// Analytic Aviator multiplier curve.
///
/// ```text
/// m(t) = 1.00 + linear * t + quadratic * t^2      (t in seconds)
///      = 100 + (linear * t_ms * 1000 + quadratic * t_ms^2) / 1_000_000   hundredths
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightCurve {
    /// Hundredths gained per second.
    pub linear: u64,
    /// Hundredths gained per second squared.
    pub quadratic: u64,
}

impl Default for FlightCurve {
    fn default() -> Self {
        Self { linear: 10, quadratic: 5 }
    }
}

impl FlightCurve {
    /// Multiplier after `elapsed` milliseconds of flight.
    pub fn multiplier_at(&self, elapsed: Millis) -> Multiplier {
        let t = elapsed as u128;
        let growth = (self.linear as u128 * t * 1_000 + self.quadratic as u128 * t * t) / 1_000_000;
        let hundredths = (Multiplier::ONE.hundredths() as u128).saturating_add(growth);
        Multiplier::from_hundredths(hundredths.min(u64::MAX as u128) as u64)
    }

    /// Earliest elapsed time at which the curve reaches `target`.
    ///
    /// Returns `None` for a flat curve that never gets there.
    pub fn time_to_reach(&self, target: Multiplier) -> Option<Millis> {
        if target <= Multiplier::ONE {
            return Some(0);
        }
        if self.linear == 0 && self.quadratic == 0 {
            return None;
        }

        let mut hi: Millis = 1_000;
        while self.multiplier_at(hi) < target {
            hi = hi.checked_mul(2)?;
        }
        let mut lo: Millis = 0;
        // invariant: m(lo) < target <= m(hi)
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.multiplier_at(mid) >= target {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Some(hi)
    }
}

/// All published rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    /// CoinFlip stake bounds.
    pub coin_flip_limits: BetLimits,
    /// CardPick stake bounds.
    pub card_pick_limits: BetLimits,
    /// Aviator stake bounds.
    pub aviator_limits: BetLimits,
    /// CoinFlip pays this on a correct call.
    pub coin_flip_multiplier: Multiplier,
    /// CardPick tiers.
    pub card_payouts: CardPayoutTable,
    /// Aviator flight curve.
    pub flight: FlightCurve,
    /// Crash distribution parameters.
    pub outcome: OutcomeParams,
}

impl Default for GameRules {
    fn default() -> Self {
        let cent = Amount::from_units(AMOUNT_ONE / 100);
        Self {
            coin_flip_limits: BetLimits::new(cent, Amount::from_whole(2)),
            card_pick_limits: BetLimits::new(cent, Amount::from_whole(5)),
            aviator_limits: BetLimits::new(cent, Amount::from_whole(10)),
            coin_flip_multiplier: Multiplier::from_hundredths(200),
            card_payouts: CardPayoutTable::default(),
            flight: FlightCurve::default(),
            outcome: OutcomeParams::default(),
        }
    }
}

impl GameRules {
    /// Stake bounds for a game.
    pub fn limits_for(&self, game_type: GameType) -> &BetLimits {
        match game_type {
            GameType::CoinFlip => &self.coin_flip_limits,
            GameType::CardPick => &self.card_pick_limits,
            GameType::Aviator => &self.aviator_limits,
        }
    }

    /// Mutable stake bounds for a game.
    pub fn limits_for_mut(&mut self, game_type: GameType) -> &mut BetLimits {
        match game_type {
            GameType::CoinFlip => &mut self.coin_flip_limits,
            GameType::CardPick => &mut self.card_pick_limits,
            GameType::Aviator => &mut self.aviator_limits,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), OutcomeError> {
        self.outcome.validate()?;
        for game in GameType::ALL {
            let limits = self.limits_for(game);
            if limits.min.is_zero() || limits.min > limits.max {
                return Err(OutcomeError::InvalidParams(format!(
                    "{} bet limits {}..{} are empty or start at zero",
                    game, limits.min, limits.max
                )));
            }
        }
        if self.flight.linear == 0 && self.flight.quadratic == 0 {
            return Err(OutcomeError::InvalidParams("flight curve is flat".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
