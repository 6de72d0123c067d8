//! Round State Machine
//!
//! Owns every active round and enforces forward-only transitions.
//!
//! ```text
//! ┌────────┐ place_bet ┌────────┐ close_round ┌───────────┐ settle ┌─────────┐
//! │  Open  │──────────▶│  Open  │────────────▶│ Resolving │───────▶│ Settled │
//! │ no bet │           │ + bet  │             │ (flight)  │        └─────────┘
//! └───┬────┘           └────────┘             └─────┬─────┘
//!     │ close_round / deadline                      │ cash_out (Aviator)
//!     ▼                                             ▼
//! ┌───────────┐                               records multiplier
//! │ Cancelled │
//! └───────────┘
//! ```
//!
//! Every rejected call leaves the round exactly as it was: all checks run
//! before the first field is written.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::clock::Millis;
use crate::core::fixed::{Amount, Multiplier};
use crate::game::outcome::{generate_outcome, Outcome};
use crate::game::rules::GameRules;
use crate::game::settlement::{compute_payout, Settlement, SettlementError};
use crate::game::state::{
    Bet, CashOut, GameType, PlayerId, Round, RoundId, RoundState, Wager,
};
use crate::proof::commitment::Commitment;

/// Longest accepted client seed.
pub const MAX_CLIENT_SEED_LEN: usize = 64;

/// Round state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// No such round in the book.
    #[error("unknown round {0}")]
    UnknownRound(RoundId),

    /// Betting operation on a round that left Open.
    #[error("round {id} is {state:?}, not open")]
    RoundNotOpen {
        /// Round.
        id: RoundId,
        /// Its current state.
        state: RoundState,
    },

    /// Cash-out or settle on a round that is not Resolving.
    #[error("round {id} is {state:?}, not resolving")]
    RoundNotResolving {
        /// Round.
        id: RoundId,
        /// Its current state.
        state: RoundState,
    },

    /// Bet arrived at or after the deadline.
    #[error("betting on round {id} closed at {deadline}")]
    BetWindowClosed {
        /// Round.
        id: RoundId,
        /// Server time betting closed.
        deadline: Millis,
    },

    /// Second bet on the same round.
    #[error("round {0} already has a bet")]
    DuplicateBet(RoundId),

    /// Stake outside the configured limits.
    #[error("bet {amount} outside limits {min}..={max}")]
    BetOutOfRange {
        /// Requested stake.
        amount: Amount,
        /// Minimum stake.
        min: Amount,
        /// Maximum stake.
        max: Amount,
    },

    /// Choice for a different game than the round's.
    #[error("{got} choice placed on a {expected} round")]
    ChoiceMismatch {
        /// The round's game.
        expected: GameType,
        /// Game of the submitted choice.
        got: GameType,
    },

    /// Client seed empty, too long, or with forbidden characters.
    #[error("invalid client seed: {0}")]
    InvalidClientSeed(String),

    /// Auto cash-out target at or below 1.00x.
    #[error("auto cash-out target {0} must exceed 1.00")]
    InvalidAutoCashOut(Multiplier),

    /// Cash-out on a game without a flight.
    #[error("{0} rounds cannot cash out")]
    CashOutUnsupported(GameType),

    /// Manual or automatic cash-out already recorded.
    #[error("round {0} already cashed out")]
    AlreadyCashedOut(RoundId),

    /// Cash-out at or past the crash point.
    #[error("crashed at {crash_point}")]
    AlreadyCrashed {
        /// Where the flight ended.
        crash_point: Multiplier,
    },

    /// Cash-out stamped before the flight started.
    #[error("flight of round {0} has not started")]
    FlightNotStarted(RoundId),

    /// Settle before the Aviator flight resolved.
    #[error("round {0} is still in flight")]
    RoundInFlight(RoundId),

    /// Settle on a cancelled round.
    #[error("round {0} was cancelled")]
    RoundCancelled(RoundId),

    /// Settle on a settled round; carries the stored result.
    #[error("round already settled")]
    AlreadySettled {
        /// The settlement fixed by the first call.
        settlement: Settlement,
    },

    /// Payout could not be computed.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Field required by the current state is absent.
    #[error("round {id} is missing {field}")]
    Corrupt {
        /// Round.
        id: RoundId,
        /// Missing field.
        field: &'static str,
    },

    /// State change outside the forward-only lifecycle.
    #[error("round {id} cannot move from {from:?} to {to:?}")]
    IllegalTransition {
        /// Round.
        id: RoundId,
        /// Current state.
        from: RoundState,
        /// Requested state.
        to: RoundState,
    },
}

/// Can `round` be settled now, state-wise?
///
/// A settled round answers with its stored settlement. Works on archived
/// copies too, so a late repeat sees the same result.
pub fn check_settleable(round: &Round) -> Result<(), RoundError> {
    let id = round.id;
    match round.state {
        RoundState::Resolving => Ok(()),
        RoundState::Settled => {
            let settlement = round.settlement.ok_or(RoundError::Corrupt { id, field: "settlement" })?;
            Err(RoundError::AlreadySettled { settlement })
        }
        RoundState::Cancelled => Err(RoundError::RoundCancelled(id)),
        RoundState::Open => Err(RoundError::RoundNotResolving { id, state: round.state }),
    }
}

/// Move a round to `to`, refusing anything but a forward step.
fn advance(round: &mut Round, to: RoundState) -> Result<(), RoundError> {
    if !round.state.can_transition_to(to) {
        return Err(RoundError::IllegalTransition { id: round.id, from: round.state, to });
    }
    round.state = to;
    Ok(())
}

/// Validate a player-supplied client seed.
///
/// 1..=64 printable ASCII characters, no `:` (the HMAC message separator).
pub fn validate_client_seed(client_seed: &str) -> Result<(), RoundError> {
    if client_seed.is_empty() || client_seed.len() > MAX_CLIENT_SEED_LEN {
        return Err(RoundError::InvalidClientSeed(format!(
            "length must be 1..={}, got {}",
            MAX_CLIENT_SEED_LEN,
            client_seed.len()
        )));
    }
    if let Some(bad) = client_seed.chars().find(|c| !matches!(c, ' '..='~') || *c == ':') {
        return Err(RoundError::InvalidClientSeed(format!("character {:?} not allowed", bad)));
    }
    Ok(())
}

/// Active round book.
pub struct RoundBook {
    rules: GameRules,
    open_timeout: Millis,
    rounds: BTreeMap<RoundId, Round>,
}

impl RoundBook {
    /// Create an empty book.
    pub fn new(rules: GameRules, open_timeout: Millis) -> Self {
        Self { rules, open_timeout, rounds: BTreeMap::new() }
    }

    /// Published rules.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Look up a round.
    pub fn get(&self, id: RoundId) -> Option<&Round> {
        self.rounds.get(&id)
    }

    /// All rounds in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    /// Number of rounds held.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Is the book empty?
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// The player's unfinished round for a game, if any.
    pub fn active_for(&self, player_id: &PlayerId, game_type: GameType) -> Option<&Round> {
        self.rounds
            .values()
            .find(|r| r.player_id == *player_id && r.game_type == game_type && !r.state.is_terminal())
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Open a round on a published commitment.
    pub fn open_round(
        &mut self,
        player_id: PlayerId,
        game_type: GameType,
        commitment: Commitment,
        nonce: u64,
        now: Millis,
    ) -> &Round {
        let id = RoundId::new_v4();
        let round = Round::new(
            id,
            player_id,
            game_type,
            commitment,
            nonce,
            now,
            now.saturating_add(self.open_timeout),
        );
        self.rounds.entry(id).or_insert(round)
    }

    /// Accept the round's single bet.
    pub fn place_bet(
        &mut self,
        id: RoundId,
        wager: Wager,
        client_seed: &str,
        now: Millis,
    ) -> Result<&Round, RoundError> {
        let round = self.rounds.get(&id).ok_or(RoundError::UnknownRound(id))?;

        if round.state != RoundState::Open {
            return Err(RoundError::RoundNotOpen { id, state: round.state });
        }
        if now >= round.bet_deadline {
            return Err(RoundError::BetWindowClosed { id, deadline: round.bet_deadline });
        }
        if round.bet.is_some() {
            return Err(RoundError::DuplicateBet(id));
        }
        let got = wager.choice.game_type();
        if got != round.game_type {
            return Err(RoundError::ChoiceMismatch { expected: round.game_type, got });
        }
        let limits = self.rules.limits_for(round.game_type);
        if !limits.contains(wager.amount) {
            return Err(RoundError::BetOutOfRange {
                amount: wager.amount,
                min: limits.min,
                max: limits.max,
            });
        }
        if let Some(target) = wager.choice.auto_cash_out() {
            if target <= Multiplier::ONE {
                return Err(RoundError::InvalidAutoCashOut(target));
            }
        }
        validate_client_seed(client_seed)?;

        let round = self.rounds.get_mut(&id).ok_or(RoundError::UnknownRound(id))?;
        round.client_seed = Some(client_seed.to_string());
        round.bet = Some(Bet {
            amount: wager.amount,
            choice: wager.choice,
            placed_at: now,
        });
        Ok(round)
    }

    /// Stop accepting bets.
    ///
    /// With a bet the round moves to Resolving (Aviator: the flight starts
    /// and the crash point is fixed). Without one it is cancelled.
    pub fn close_round(&mut self, id: RoundId, now: Millis, raw_seed: &str) -> Result<&Round, RoundError> {
        let params = self.rules.outcome;
        let round = self.rounds.get_mut(&id).ok_or(RoundError::UnknownRound(id))?;
        if round.state != RoundState::Open {
            return Err(RoundError::RoundNotOpen { id, state: round.state });
        }

        if round.bet.is_none() {
            advance(round, RoundState::Cancelled)?;
            round.finished_at = Some(now);
            return Ok(round);
        }

        let crash_point = if round.game_type == GameType::Aviator {
            let client_seed = round
                .client_seed
                .as_deref()
                .ok_or(RoundError::Corrupt { id, field: "client_seed" })?;
            generate_outcome(raw_seed, client_seed, round.nonce, GameType::Aviator, &params).crash_point()
        } else {
            None
        };
        advance(round, RoundState::Resolving)?;
        round.crash_point = crash_point;
        round.closed_at = Some(now);
        Ok(round)
    }

    /// Lock in an Aviator cash-out at server time `at`.
    pub fn cash_out(&mut self, id: RoundId, at: Millis) -> Result<CashOut, RoundError> {
        let curve = self.rules.flight;
        let round = self.rounds.get_mut(&id).ok_or(RoundError::UnknownRound(id))?;

        if round.game_type != GameType::Aviator {
            return Err(RoundError::CashOutUnsupported(round.game_type));
        }
        if round.state != RoundState::Resolving {
            return Err(RoundError::RoundNotResolving { id, state: round.state });
        }
        if round.cash_out.is_some() {
            return Err(RoundError::AlreadyCashedOut(id));
        }
        let closed_at = round.closed_at.ok_or(RoundError::Corrupt { id, field: "closed_at" })?;
        if at < closed_at {
            return Err(RoundError::FlightNotStarted(id));
        }
        let crash_point = round.crash_point.ok_or(RoundError::Corrupt { id, field: "crash_point" })?;

        let elapsed_ms = at - closed_at;
        let multiplier = curve.multiplier_at(elapsed_ms);

        let auto = round.bet.as_ref().and_then(|bet| bet.choice.auto_cash_out());
        if let Some(target) = auto {
            if target < crash_point && multiplier >= target {
                return Err(RoundError::AlreadyCashedOut(id));
            }
        }
        if multiplier >= crash_point {
            return Err(RoundError::AlreadyCrashed { crash_point });
        }

        let cash_out = CashOut { at, elapsed_ms, multiplier };
        round.cash_out = Some(cash_out);
        Ok(cash_out)
    }

    /// Fix the outcome and payout.
    ///
    /// A second call returns [`RoundError::AlreadySettled`] carrying the
    /// stored settlement, never a recomputed one.
    pub fn settle(&mut self, id: RoundId, now: Millis, raw_seed: &str) -> Result<&Round, RoundError> {
        let round = self.rounds.get(&id).ok_or(RoundError::UnknownRound(id))?;
        check_settleable(round)?;
        if round.game_type == GameType::Aviator && !self.flight_resolved(round, now) {
            return Err(RoundError::RoundInFlight(id));
        }

        let bet = round.bet.as_ref().ok_or(RoundError::Corrupt { id, field: "bet" })?;
        let outcome = match round.game_type {
            GameType::Aviator => Outcome::Aviator {
                crash_point: round.crash_point.ok_or(RoundError::Corrupt { id, field: "crash_point" })?,
            },
            game => {
                let client_seed = round
                    .client_seed
                    .as_deref()
                    .ok_or(RoundError::Corrupt { id, field: "client_seed" })?;
                generate_outcome(raw_seed, client_seed, round.nonce, game, &self.rules.outcome)
            }
        };
        let payout = compute_payout(bet, &outcome, round.cash_out.as_ref(), &self.rules)?;

        let round = self.rounds.get_mut(&id).ok_or(RoundError::UnknownRound(id))?;
        advance(round, RoundState::Settled)?;
        round.outcome = Some(outcome);
        round.settlement = Some(Settlement::new(payout, now));
        round.finished_at = Some(now);
        Ok(round)
    }

    // =========================================================================
    // FLIGHT
    // =========================================================================

    /// Multiplier shown to the player at `now`, while the flight is live.
    pub fn live_multiplier(&self, round: &Round, now: Millis) -> Option<Multiplier> {
        if round.game_type != GameType::Aviator || round.state != RoundState::Resolving {
            return None;
        }
        let closed_at = round.closed_at?;
        let crash_point = round.crash_point?;
        let current = self.rules.flight.multiplier_at(now.saturating_sub(closed_at));
        // never display the crash point itself before settlement
        Some(current.min(Multiplier::from_hundredths(crash_point.hundredths().saturating_sub(1)).max(Multiplier::ONE)))
    }

    /// Server time at which the plane crashes.
    pub fn crash_time(&self, round: &Round) -> Option<Millis> {
        let closed_at = round.closed_at?;
        let elapsed = self.rules.flight.time_to_reach(round.crash_point?)?;
        Some(closed_at.saturating_add(elapsed))
    }

    /// Has the Aviator flight been decided by `now`?
    ///
    /// True once cashed out, once an auto target below the crash point has
    /// been reached, or once the plane has crashed.
    pub fn flight_resolved(&self, round: &Round, now: Millis) -> bool {
        if round.cash_out.is_some() {
            return true;
        }
        let (Some(closed_at), Some(crash_point)) = (round.closed_at, round.crash_point) else {
            return false;
        };
        let auto = round.bet.as_ref().and_then(|bet| bet.choice.auto_cash_out());
        let decided_at = match auto {
            Some(target) if target < crash_point => self.rules.flight.time_to_reach(target),
            _ => self.rules.flight.time_to_reach(crash_point),
        };
        match decided_at {
            Some(elapsed) => now >= closed_at.saturating_add(elapsed),
            None => false,
        }
    }

    // =========================================================================
    // TIMEOUTS
    // =========================================================================

    /// Open rounds without a bet whose window has expired.
    pub fn due_for_cancel(&self, now: Millis) -> Vec<RoundId> {
        self.rounds
            .values()
            .filter(|r| r.state == RoundState::Open && r.bet.is_none() && now >= r.bet_deadline)
            .map(|r| r.id)
            .collect()
    }

    /// Open rounds holding a bet whose window has expired.
    pub fn due_for_close(&self, now: Millis) -> Vec<RoundId> {
        self.rounds
            .values()
            .filter(|r| r.state == RoundState::Open && r.bet.is_some() && now >= r.bet_deadline)
            .map(|r| r.id)
            .collect()
    }

    /// Resolving rounds that can settle now.
    pub fn due_for_settle(&self, now: Millis) -> Vec<RoundId> {
        self.rounds
            .values()
            .filter(|r| r.state == RoundState::Resolving)
            .filter(|r| r.game_type != GameType::Aviator || self.flight_resolved(r, now))
            .map(|r| r.id)
            .collect()
    }

    /// Remove terminal rounds that finished before `older_than`.
    pub fn archive(&mut self, older_than: Millis) -> Vec<Round> {
        let ids: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| r.state.is_terminal() && r.finished_at.is_some_and(|t| t < older_than))
            .map(|r| r.id)
            .collect();
        ids.iter().filter_map(|id| self.rounds.remove(id)).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::CommitmentHash;
    use crate::game::outcome::{CardRank, CardSuit, CoinSide};
    use crate::game::state::PlayerChoice;
    use crate::proof::commitment::SeedId;

    const SEED: &str = "abc123";
    const TIMEOUT: Millis = 60_000;

    fn book() -> RoundBook {
        RoundBook::new(GameRules::default(), TIMEOUT)
    }

    fn open(book: &mut RoundBook, game: GameType, now: Millis) -> RoundId {
        let commitment = Commitment {
            seed_id: SeedId::new_v4(),
            commitment_hash: CommitmentHash::of_seed(SEED),
        };
        book.open_round(PlayerId::from_address("0xplayer").unwrap(), game, commitment, 1, now)
            .id
    }

    fn coin(amount: &str, side: CoinSide) -> Wager {
        Wager { amount: amount.parse().unwrap(), choice: PlayerChoice::CoinFlip { side } }
    }

    fn aviator(amount: &str, auto: Option<u64>) -> Wager {
        Wager {
            amount: amount.parse().unwrap(),
            choice: PlayerChoice::Aviator { auto_cash_out: auto.map(Multiplier::from_hundredths) },
        }
    }

    #[test]
    fn test_coin_flip_happy_path() {
        let mut book = book();
        let id = open(&mut book, GameType::CoinFlip, 1_000);

        book.place_bet(id, coin("0.1", CoinSide::Heads), "player1", 2_000).unwrap();
        book.close_round(id, 3_000, SEED).unwrap();
        let round = book.settle(id, 3_000, SEED).unwrap();

        // ("abc123", "player1", 1) lands Heads
        assert_eq!(round.outcome, Some(Outcome::CoinFlip { side: CoinSide::Heads }));
        assert_eq!(round.payout(), Some("0.2".parse().unwrap()));
        assert_eq!(round.state, RoundState::Settled);
    }

    #[test]
    fn test_duplicate_bet_leaves_original() {
        let mut book = book();
        let id = open(&mut book, GameType::CoinFlip, 0);
        book.place_bet(id, coin("0.1", CoinSide::Heads), "player1", 1).unwrap();
        let before = book.get(id).unwrap().clone();

        let err = book.place_bet(id, coin("1", CoinSide::Tails), "other", 2).unwrap_err();
        assert_eq!(err, RoundError::DuplicateBet(id));
        assert_eq!(book.get(id).unwrap(), &before);
    }

    #[test]
    fn test_bet_validation() {
        let mut book = book();
        let id = open(&mut book, GameType::CoinFlip, 0);

        assert!(matches!(
            book.place_bet(id, coin("5", CoinSide::Heads), "s", 1),
            Err(RoundError::BetOutOfRange { .. })
        ));
        assert!(matches!(
            book.place_bet(id, aviator("1", None), "s", 1),
            Err(RoundError::ChoiceMismatch { expected: GameType::CoinFlip, got: GameType::Aviator })
        ));
        assert!(matches!(
            book.place_bet(id, coin("1", CoinSide::Heads), "a:b", 1),
            Err(RoundError::InvalidClientSeed(_))
        ));
        assert!(matches!(
            book.place_bet(id, coin("1", CoinSide::Heads), "", 1),
            Err(RoundError::InvalidClientSeed(_))
        ));
        assert_eq!(
            book.place_bet(id, coin("1", CoinSide::Heads), "s", TIMEOUT),
            Err(RoundError::BetWindowClosed { id, deadline: TIMEOUT })
        );
        assert!(book.get(id).unwrap().bet.is_none());

        let avi = open(&mut book, GameType::Aviator, 0);
        assert_eq!(
            book.place_bet(avi, aviator("1", Some(100)), "s", 1),
            Err(RoundError::InvalidAutoCashOut(Multiplier::ONE))
        );
    }

    #[test]
    fn test_advance_refuses_backward_steps() {
        let mut book = book();
        let id = open(&mut book, GameType::CoinFlip, 0);
        book.place_bet(id, coin("1", CoinSide::Heads), "s", 1).unwrap();
        book.close_round(id, 2, SEED).unwrap();

        let round = book.rounds.get_mut(&id).unwrap();
        assert_eq!(
            advance(round, RoundState::Open),
            Err(RoundError::IllegalTransition { id, from: RoundState::Resolving, to: RoundState::Open })
        );
        assert_eq!(
            advance(round, RoundState::Cancelled),
            Err(RoundError::IllegalTransition { id, from: RoundState::Resolving, to: RoundState::Cancelled })
        );
        assert_eq!(round.state, RoundState::Resolving);

        advance(round, RoundState::Settled).unwrap();
        assert!(advance(round, RoundState::Settled).is_err());
    }

    #[test]
    fn test_close_without_bet_cancels() {
        let mut book = book();
        let id = open(&mut book, GameType::CardPick, 0);
        let round = book.close_round(id, 10, SEED).unwrap();
        assert_eq!(round.state, RoundState::Cancelled);

        assert_eq!(book.settle(id, 20, SEED), Err(RoundError::RoundCancelled(id)));
        assert!(matches!(
            book.place_bet(id, coin("1", CoinSide::Heads), "s", 20),
            Err(RoundError::RoundNotOpen { state: RoundState::Cancelled, .. })
        ));
    }

    #[test]
    fn test_settle_twice_returns_cached() {
        let mut book = book();
        let id = open(&mut book, GameType::CardPick, 0);
        let wager = Wager {
            amount: "1".parse().unwrap(),
            choice: PlayerChoice::CardPick { rank: CardRank::Five, suit: CardSuit::Clubs },
        };
        book.place_bet(id, wager, "player1", 1).unwrap();
        book.close_round(id, 2, SEED).unwrap();
        let first = book.settle(id, 3, SEED).unwrap().settlement.unwrap();

        // exact card: ("abc123", "player1", 1) draws Five of Clubs
        assert_eq!(first.payout, Amount::from_whole(32));

        match book.settle(id, 99, "a different seed") {
            Err(RoundError::AlreadySettled { settlement }) => assert_eq!(settlement, first),
            other => panic!("expected AlreadySettled, got {:?}", other),
        }
    }

    #[test]
    fn test_aviator_cash_out_before_crash() {
        // ("abc123", "lucky-2588", 1) crashes at 2.50x
        let mut book = book();
        let id = open(&mut book, GameType::Aviator, 0);
        book.place_bet(id, aviator("1", None), "lucky-2588", 10).unwrap();
        book.close_round(id, 1_000, SEED).unwrap();
        assert_eq!(book.get(id).unwrap().crash_point, Some(Multiplier::from_hundredths(250)));

        assert_eq!(book.settle(id, 2_000, SEED), Err(RoundError::RoundInFlight(id)));

        // m(3796ms) = 2.10x
        let cash_out = book.cash_out(id, 1_000 + 3_796).unwrap();
        assert_eq!(cash_out.multiplier, Multiplier::from_hundredths(210));
        assert_eq!(book.cash_out(id, 1_000 + 3_900), Err(RoundError::AlreadyCashedOut(id)));

        let round = book.settle(id, 5_000, SEED).unwrap();
        assert_eq!(round.payout(), Some("2.1".parse().unwrap()));
        assert_eq!(round.outcome, Some(Outcome::Aviator { crash_point: Multiplier::from_hundredths(250) }));
    }

    #[test]
    fn test_aviator_cash_out_after_crash() {
        let mut book = book();
        let id = open(&mut book, GameType::Aviator, 0);
        book.place_bet(id, aviator("1", None), "lucky-2588", 10).unwrap();
        book.close_round(id, 1_000, SEED).unwrap();

        // m(4568ms) = 2.50x
        assert_eq!(
            book.cash_out(id, 1_000 + 4_568),
            Err(RoundError::AlreadyCrashed { crash_point: Multiplier::from_hundredths(250) })
        );
        assert_eq!(book.cash_out(id, 999), Err(RoundError::FlightNotStarted(id)));

        let round = book.get(id).unwrap();
        assert_eq!(book.crash_time(round), Some(1_000 + 4_568));
        assert!(book.flight_resolved(round, 1_000 + 4_568));
        assert_eq!(book.due_for_settle(1_000 + 4_568), vec![id]);

        let round = book.settle(id, 1_000 + 4_568, SEED).unwrap();
        assert_eq!(round.payout(), Some(Amount::ZERO));
    }

    #[test]
    fn test_aviator_auto_cash_out() {
        let mut book = book();
        let id = open(&mut book, GameType::Aviator, 0);
        book.place_bet(id, aviator("1", Some(150)), "lucky-2588", 10).unwrap();
        book.close_round(id, 0, SEED).unwrap();

        // target 1.50x is reached at 2317ms
        assert!(!book.flight_resolved(book.get(id).unwrap(), 2_316));
        assert!(book.flight_resolved(book.get(id).unwrap(), 2_317));
        assert_eq!(book.cash_out(id, 3_000), Err(RoundError::AlreadyCashedOut(id)));

        let round = book.settle(id, 2_317, SEED).unwrap();
        assert_eq!(round.payout(), Some("1.5".parse().unwrap()));
    }

    #[test]
    fn test_cash_out_rules_other_games() {
        let mut book = book();
        let id = open(&mut book, GameType::CoinFlip, 0);
        assert_eq!(book.cash_out(id, 5), Err(RoundError::CashOutUnsupported(GameType::CoinFlip)));

        let avi = open(&mut book, GameType::Aviator, 0);
        assert!(matches!(
            book.cash_out(avi, 5),
            Err(RoundError::RoundNotResolving { state: RoundState::Open, .. })
        ));
    }

    #[test]
    fn test_live_multiplier_hides_crash() {
        let mut book = book();
        let id = open(&mut book, GameType::Aviator, 0);
        book.place_bet(id, aviator("1", None), "lucky-2588", 10).unwrap();
        book.close_round(id, 0, SEED).unwrap();
        let round = book.get(id).unwrap();

        assert_eq!(book.live_multiplier(round, 0), Some(Multiplier::ONE));
        assert_eq!(book.live_multiplier(round, 3_796), Some(Multiplier::from_hundredths(210)));
        assert_eq!(book.live_multiplier(round, 60_000), Some(Multiplier::from_hundredths(249)));
    }

    #[test]
    fn test_timeouts_and_archive() {
        let mut book = book();
        let idle = open(&mut book, GameType::CoinFlip, 0);
        let betted = open(&mut book, GameType::CardPick, 0);
        let wager = Wager {
            amount: "1".parse().unwrap(),
            choice: PlayerChoice::CardPick { rank: CardRank::Ace, suit: CardSuit::Spades },
        };
        book.place_bet(betted, wager, "s", 1).unwrap();

        assert!(book.due_for_cancel(TIMEOUT - 1).is_empty());
        assert_eq!(book.due_for_cancel(TIMEOUT), vec![idle]);
        assert_eq!(book.due_for_close(TIMEOUT), vec![betted]);

        book.close_round(idle, TIMEOUT, SEED).unwrap();
        assert!(book.archive(TIMEOUT).is_empty());
        let archived = book.archive(TIMEOUT + 1);
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, idle);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_client_seed_rules() {
        assert!(validate_client_seed("hello world").is_ok());
        assert!(validate_client_seed(&"x".repeat(64)).is_ok());
        assert!(validate_client_seed(&"x".repeat(65)).is_err());
        assert!(validate_client_seed("tab\there").is_err());
        assert!(validate_client_seed("ünï").is_err());
    }
}
