//! Settlement Calculator
//!
//! Pure payout function. Depends only on stored round data and the
//! published rules, so a verifier can recompute it from a receipt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier};
use crate::game::outcome::Outcome;
use crate::game::rules::GameRules;
use crate::game::state::{Bet, CashOut, PlayerChoice};

/// Settlement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// `bet * multiplier` does not fit in an amount.
    #[error("payout overflow: {amount} x {multiplier}")]
    PayoutOverflow {
        /// Stake.
        amount: Amount,
        /// Multiplier applied.
        multiplier: Multiplier,
    },
    /// The bet and the outcome belong to different games.
    #[error("choice does not match outcome")]
    ChoiceMismatch,
}

/// Computed payout before it is stamped with a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Amount owed to the player (0 on a loss).
    pub amount: Amount,
    /// Multiplier applied to the stake.
    pub multiplier: Multiplier,
}

impl Payout {
    fn lost() -> Self {
        Self { amount: Amount::ZERO, multiplier: Multiplier::ZERO }
    }

    fn of(bet: Amount, multiplier: Multiplier) -> Result<Self, SettlementError> {
        let amount = bet
            .checked_mul_multiplier(multiplier)
            .map_err(|_| SettlementError::PayoutOverflow { amount: bet, multiplier })?;
        Ok(Self { amount, multiplier })
    }
}

/// Final payout record of a settled round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Amount owed to the player.
    pub payout: Amount,
    /// Multiplier applied to the stake.
    pub effective_multiplier: Multiplier,
    /// Did the player get anything back?
    pub won: bool,
    /// Server time of settlement.
    pub settled_at: Millis,
}

impl Settlement {
    /// Stamp a payout.
    pub fn new(payout: Payout, settled_at: Millis) -> Self {
        Self {
            payout: payout.amount,
            effective_multiplier: payout.multiplier,
            won: !payout.amount.is_zero(),
            settled_at,
        }
    }
}

/// Multiplier at which an Aviator bet left the flight, if it did.
///
/// A manual cash-out always wins over the auto target; the auto target only
/// counts when it is strictly below the crash point.
pub fn aviator_exit(bet: &Bet, cash_out: Option<&CashOut>, crash_point: Multiplier) -> Option<Multiplier> {
    if let Some(cash_out) = cash_out {
        return Some(cash_out.multiplier);
    }
    bet.choice.auto_cash_out().filter(|target| *target < crash_point)
}

/// Compute what a bet pays for an outcome.
///
/// Rounds down to the smallest amount unit.
pub fn compute_payout(
    bet: &Bet,
    outcome: &Outcome,
    cash_out: Option<&CashOut>,
    rules: &GameRules,
) -> Result<Payout, SettlementError> {
    match (&bet.choice, outcome) {
        (PlayerChoice::CoinFlip { side: called }, Outcome::CoinFlip { side }) => {
            if called == side {
                Payout::of(bet.amount, rules.coin_flip_multiplier)
            } else {
                Ok(Payout::lost())
            }
        }
        (PlayerChoice::CardPick { rank: called_rank, suit: called_suit }, Outcome::CardPick { rank, suit }) => {
            let table = &rules.card_payouts;
            let tier = match (called_rank == rank, called_suit == suit) {
                (true, true) => Some(table.exact),
                (true, false) => Some(table.rank_only),
                (false, true) => Some(table.suit_only),
                (false, false) => None,
            };
            match tier {
                Some(multiplier) if multiplier > Multiplier::ZERO => Payout::of(bet.amount, multiplier),
                _ => Ok(Payout::lost()),
            }
        }
        (PlayerChoice::Aviator { .. }, Outcome::Aviator { crash_point }) => {
            match aviator_exit(bet, cash_out, *crash_point) {
                Some(multiplier) => Payout::of(bet.amount, multiplier),
                None => Ok(Payout::lost()),
            }
        }
        _ => Err(SettlementError::ChoiceMismatch),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcome::{CardRank, CardSuit, CoinSide};

    fn bet(amount: &str, choice: PlayerChoice) -> Bet {
        Bet { amount: amount.parse().unwrap(), choice, placed_at: 0 }
    }

    fn m(hundredths: u64) -> Multiplier {
        Multiplier::from_hundredths(hundredths)
    }

    #[test]
    fn test_coin_flip_payout() {
        let rules = GameRules::default();
        let wager = bet("0.1", PlayerChoice::CoinFlip { side: CoinSide::Heads });

        let win = compute_payout(&wager, &Outcome::CoinFlip { side: CoinSide::Heads }, None, &rules).unwrap();
        assert_eq!(win.amount, "0.2".parse().unwrap());
        assert_eq!(win.multiplier, m(200));

        let loss = compute_payout(&wager, &Outcome::CoinFlip { side: CoinSide::Tails }, None, &rules).unwrap();
        assert_eq!(loss.amount, Amount::ZERO);
    }

    #[test]
    fn test_card_pick_tiers() {
        let rules = GameRules::default();
        let wager = bet("1", PlayerChoice::CardPick { rank: CardRank::Queen, suit: CardSuit::Hearts });
        let pay = |rank, suit| {
            compute_payout(&wager, &Outcome::CardPick { rank, suit }, None, &rules).unwrap().amount
        };

        assert_eq!(pay(CardRank::Queen, CardSuit::Hearts), Amount::from_whole(32));
        assert_eq!(pay(CardRank::Queen, CardSuit::Spades), Amount::from_whole(5));
        assert_eq!(pay(CardRank::Two, CardSuit::Hearts), "0.25".parse().unwrap());
        assert_eq!(pay(CardRank::Two, CardSuit::Clubs), Amount::ZERO);
    }

    #[test]
    fn test_aviator_cash_out_before_crash() {
        let rules = GameRules::default();
        let wager = bet("1", PlayerChoice::Aviator { auto_cash_out: None });
        let outcome = Outcome::Aviator { crash_point: m(250) };
        let cash_out = CashOut { at: 5_000, elapsed_ms: 4_000, multiplier: m(210) };

        let payout = compute_payout(&wager, &outcome, Some(&cash_out), &rules).unwrap();
        assert_eq!(payout.amount, "2.1".parse().unwrap());

        let crashed = compute_payout(&wager, &outcome, None, &rules).unwrap();
        assert_eq!(crashed.amount, Amount::ZERO);
    }

    #[test]
    fn test_aviator_auto_cash_out() {
        let rules = GameRules::default();
        let wager = bet("0.5", PlayerChoice::Aviator { auto_cash_out: Some(m(150)) });

        let hit = compute_payout(&wager, &Outcome::Aviator { crash_point: m(151) }, None, &rules).unwrap();
        assert_eq!(hit.amount, "0.75".parse().unwrap());

        // target equal to crash point does not cash out
        let miss = compute_payout(&wager, &Outcome::Aviator { crash_point: m(150) }, None, &rules).unwrap();
        assert_eq!(miss.amount, Amount::ZERO);
    }

    #[test]
    fn test_rounds_down() {
        let rules = GameRules::default();
        let wager = Bet {
            amount: Amount::from_units(3),
            choice: PlayerChoice::CardPick { rank: CardRank::Ace, suit: CardSuit::Spades },
            placed_at: 0,
        };
        let outcome = Outcome::CardPick { rank: CardRank::Two, suit: CardSuit::Spades };
        // 3 * 0.25 = 0.75 units, floored
        let payout = compute_payout(&wager, &outcome, None, &rules).unwrap();
        assert_eq!(payout.amount, Amount::ZERO);
    }

    #[test]
    fn test_overflow_and_mismatch() {
        let rules = GameRules::default();
        let huge = Bet {
            amount: Amount::from_units(u128::MAX / 2),
            choice: PlayerChoice::CoinFlip { side: CoinSide::Heads },
            placed_at: 0,
        };
        assert!(matches!(
            compute_payout(&huge, &Outcome::CoinFlip { side: CoinSide::Heads }, None, &rules),
            Err(SettlementError::PayoutOverflow { .. })
        ));

        let wager = bet("1", PlayerChoice::CoinFlip { side: CoinSide::Heads });
        assert_eq!(
            compute_payout(&wager, &Outcome::Aviator { crash_point: m(300) }, None, &rules),
            Err(SettlementError::ChoiceMismatch)
        );
    }

    #[test]
    fn test_settlement_won_flag() {
        let settled = Settlement::new(Payout { amount: Amount::from_whole(2), multiplier: m(200) }, 42);
        assert!(settled.won);
        assert_eq!(settled.settled_at, 42);
        assert!(!Settlement::new(Payout::lost(), 42).won);
    }
}
