//! Wager Engine
//!
//! Facade over the commitment store, round book, nonce counters and ledger.
//! Every public operation stamps time from the server clock, writes the
//! touched records through to the ledger and queues a [`RoundEvent`].
//!
//! ```text
//! open_round ──▶ CommitmentStore::create + attach ──▶ RoundBook::open_round
//! place_bet  ──▶ RoundBook::place_bet
//! close_round──▶ RoundBook::close_round (Aviator: crash point fixed)
//! cash_out   ──▶ RoundBook::cash_out
//! settle     ──▶ RoundBook::settle ──▶ nonce += 1 ──▶ detach (+ reveal)
//! ```
//!
//! The engine is synchronous. The server wraps it in `Arc<RwLock<_>>`.

use std::collections::{BTreeMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::clock::{Clock, Millis, SystemClock};
use crate::core::fixed::{Amount, Multiplier};
use crate::core::hash::CommitmentHash;
use crate::error::{WagerError, WagerResult};
use crate::game::events::{RoundEvent, RoundEventData};
use crate::game::outcome::Outcome;
use crate::game::round::{check_settleable, RoundBook, RoundError};
use crate::game::rules::{FlightCurve, GameRules};
use crate::game::settlement::Settlement;
use crate::game::state::{CashOut, GameType, PlayerChoice, PlayerId, Round, RoundId, RoundState, Wager};
use crate::ledger::{Ledger, MemoryLedger};
use crate::proof::commitment::{
    Commitment, CommitmentError, CommitmentStore, SeedBinding, SeedId, SeedKind, ServerSeed,
};
use crate::proof::verify::{verify_outcome_with, RoundReceipt};

/// Crash points kept for the history strip.
pub const RECENT_CRASHES: usize = 5;

// =============================================================================
// CONFIG
// =============================================================================

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Published game rules.
    pub rules: GameRules,
    /// How long an open round accepts its bet.
    pub open_timeout_ms: Millis,
    /// Terminal rounds older than this leave the active book.
    pub archive_after_ms: Millis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            open_timeout_ms: 60_000,
            archive_after_ms: 10 * 60_000,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> WagerResult<Self> {
        let mut config = Self::default();
        if let Some(ms) = env_parse("PENNY_OPEN_TIMEOUT_MS")? {
            config.open_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("PENNY_ARCHIVE_AFTER_MS")? {
            config.archive_after_ms = ms;
        }
        if let Some(bps) = env_parse("PENNY_HOUSE_EDGE_BPS")? {
            config.rules.outcome.house_edge_bps = bps;
        }
        if let Some(max) = env_parse::<Multiplier>("PENNY_MAX_CRASH")? {
            config.rules.outcome.max_crash = max;
        }
        if let Some(linear) = env_parse("PENNY_FLIGHT_LINEAR")? {
            config.rules.flight = FlightCurve { linear, ..config.rules.flight };
        }
        if let Some(quadratic) = env_parse("PENNY_FLIGHT_QUADRATIC")? {
            config.rules.flight = FlightCurve { quadratic, ..config.rules.flight };
        }
        for game in GameType::ALL {
            let prefix = game.slug().replace('-', "_").to_ascii_uppercase();
            if let Some(min) = env_parse::<Amount>(&format!("PENNY_{}_MIN_BET", prefix))? {
                config.rules.limits_for_mut(game).min = min;
            }
            if let Some(max) = env_parse::<Amount>(&format!("PENNY_{}_MAX_BET", prefix))? {
                config.rules.limits_for_mut(game).max = max;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> WagerResult<()> {
        self.rules.validate()?;
        if self.open_timeout_ms == 0 {
            return Err(WagerError::Config("open timeout must be positive".into()));
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> WagerResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| WagerError::Config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Client-safe view of a round.
///
/// The crash point appears only once the round has settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStatus {
    /// Round identifier.
    pub round_id: RoundId,
    /// Owning player.
    pub player_id: PlayerId,
    /// Game played.
    pub game_type: GameType,
    /// Lifecycle state.
    pub state: RoundState,
    /// Server seed backing the round.
    pub seed_id: SeedId,
    /// Published hash of that seed.
    pub commitment_hash: CommitmentHash,
    /// Round nonce.
    pub nonce: u64,
    /// Server time the round opened.
    pub opened_at: Millis,
    /// Server time betting closes.
    pub bet_deadline: Millis,
    /// Player seed, once a bet is placed.
    pub client_seed: Option<String>,
    /// Stake, once a bet is placed.
    pub bet_amount: Option<Amount>,
    /// The player's call.
    pub choice: Option<PlayerChoice>,
    /// Server time betting closed.
    pub closed_at: Option<Millis>,
    /// Current multiplier while the plane is flying.
    pub live_multiplier: Option<Multiplier>,
    /// Aviator cash-out, if any.
    pub cash_out: Option<CashOut>,
    /// Outcome, after settlement.
    pub outcome: Option<Outcome>,
    /// Payout record, after settlement.
    pub settlement: Option<Settlement>,
    /// Disclosed server seed, once revealed.
    pub server_seed: Option<String>,
}

/// What one sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rounds cancelled for lack of a bet.
    pub cancelled: Vec<RoundId>,
    /// Rounds whose betting window expired with a bet in place.
    pub closed: Vec<RoundId>,
    /// Rounds settled.
    pub settled: Vec<RoundId>,
}

impl SweepReport {
    /// Did the sweep change anything?
    pub fn is_empty(&self) -> bool {
        self.cancelled.is_empty() && self.closed.is_empty() && self.settled.is_empty()
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Provably-fair round engine.
pub struct WagerEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    store: CommitmentStore,
    book: RoundBook,
    nonces: BTreeMap<(PlayerId, GameType), u64>,
    ledger: Box<dyn Ledger>,
    events: Vec<RoundEvent>,
    recent_crashes: VecDeque<Multiplier>,
}

impl WagerEngine {
    /// Engine with the system clock, OS entropy and an in-memory ledger.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(SystemClock),
            CommitmentStore::new(),
            Box::new(MemoryLedger::new()),
        )
    }

    /// Engine with explicit collaborators.
    pub fn with_parts(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        store: CommitmentStore,
        ledger: Box<dyn Ledger>,
    ) -> Self {
        let book = RoundBook::new(config.rules.clone(), config.open_timeout_ms);
        Self {
            config,
            clock,
            store,
            book,
            nonces: BTreeMap::new(),
            ledger,
            events: Vec::new(),
            recent_crashes: VecDeque::with_capacity(RECENT_CRASHES),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Published rules.
    pub fn rules(&self) -> &GameRules {
        self.book.rules()
    }

    /// Current server time.
    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Ledger handle.
    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    /// Nonce the next round of this player and game will use.
    pub fn next_nonce(&self, player_id: &PlayerId, game_type: GameType) -> u64 {
        self.nonces.get(&(player_id.clone(), game_type)).copied().unwrap_or(0) + 1
    }

    // =========================================================================
    // ROUND LIFECYCLE
    // =========================================================================

    /// Open a round on a fresh single-use server seed.
    ///
    /// The seed is revealed automatically once the round finishes.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn open_round(&mut self, player_id: &PlayerId, game_type: GameType) -> WagerResult<RoundStatus> {
        self.ensure_no_active_round(player_id, game_type)?;
        let now = self.now();
        let binding = SeedBinding::new(player_id.clone(), game_type);
        let commitment = self.store.create_commitment(now, binding, SeedKind::SingleRound)?;
        self.start_round(player_id, game_type, commitment, now)
    }

    /// Create a seed bound to `(player, game)` for reuse across rounds.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn create_seed_pair(&mut self, player_id: &PlayerId, game_type: GameType) -> WagerResult<Commitment> {
        let now = self.now();
        let binding = SeedBinding::new(player_id.clone(), game_type);
        let commitment = self.store.create_commitment(now, binding, SeedKind::Pair)?;
        self.persist_seed(commitment.seed_id)?;
        info!("Seed pair {} created for {}", commitment.seed_id, game_type);
        Ok(commitment)
    }

    /// Open a round on an existing seed pair.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn open_round_on_seed(
        &mut self,
        player_id: &PlayerId,
        game_type: GameType,
        seed_id: SeedId,
    ) -> WagerResult<RoundStatus> {
        self.ensure_no_active_round(player_id, game_type)?;
        let commitment = match self.store.get(seed_id) {
            Some(seed) => seed.commitment(),
            None => {
                self.retired_seed(seed_id)?;
                return Err(CommitmentError::SeedRetired(seed_id).into());
            }
        };
        let now = self.now();
        self.start_round(player_id, game_type, commitment, now)
    }

    fn start_round(
        &mut self,
        player_id: &PlayerId,
        game_type: GameType,
        commitment: Commitment,
        now: Millis,
    ) -> WagerResult<RoundStatus> {
        let binding = SeedBinding::new(player_id.clone(), game_type);
        self.store.attach(commitment.seed_id, &binding)?;

        let nonce = self.next_nonce(player_id, game_type);
        let round = self
            .book
            .open_round(player_id.clone(), game_type, commitment, nonce, now)
            .clone();

        self.persist_seed(commitment.seed_id)?;
        self.ledger.put_round(&round)?;
        self.events.push(RoundEvent::new(
            now,
            player_id.clone(),
            round.id,
            RoundEventData::Opened {
                game_type,
                commitment_hash: commitment.commitment_hash,
                nonce,
                bet_deadline: round.bet_deadline,
            },
        ));
        info!("Round {} opened: {} nonce {} commit {}", round.id, game_type, nonce, commitment.commitment_hash);
        self.status_of(&round)
    }

    /// Place the round's single bet.
    #[instrument(skip(self, wager), fields(player = %player_id))]
    pub fn place_bet(
        &mut self,
        player_id: &PlayerId,
        round_id: RoundId,
        wager: Wager,
        client_seed: &str,
    ) -> WagerResult<RoundStatus> {
        if let Some(archived) = self.ensure_owner(player_id, round_id)? {
            return Err(RoundError::RoundNotOpen { id: round_id, state: archived.state }.into());
        }
        let now = self.now();
        let round = self.book.place_bet(round_id, wager, client_seed, now)?.clone();

        self.ledger.put_round(&round)?;
        self.events.push(RoundEvent::new(
            now,
            round.player_id.clone(),
            round_id,
            RoundEventData::BetPlaced { amount: wager.amount },
        ));
        debug!("Bet {} on round {}", wager.amount, round_id);
        self.status_of(&round)
    }

    /// Close betting.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn close_round(&mut self, player_id: &PlayerId, round_id: RoundId) -> WagerResult<RoundStatus> {
        if let Some(archived) = self.ensure_owner(player_id, round_id)? {
            return Err(RoundError::RoundNotOpen { id: round_id, state: archived.state }.into());
        }
        let now = self.now();
        self.close_at(round_id, now)
    }

    fn close_at(&mut self, round_id: RoundId, now: Millis) -> WagerResult<RoundStatus> {
        let round = self.book.get(round_id).ok_or(RoundError::UnknownRound(round_id))?;
        if round.state != RoundState::Open {
            return Err(RoundError::RoundNotOpen { id: round_id, state: round.state }.into());
        }
        let seed_id = round.server_seed_id;
        let raw_seed = self.store.secret(seed_id)?.to_string();
        let round = self.book.close_round(round_id, now, &raw_seed)?.clone();
        self.ledger.put_round(&round)?;

        if round.state == RoundState::Cancelled {
            self.events.push(RoundEvent::cancelled(now, round.player_id.clone(), round_id, "closed without a bet"));
            info!("Round {} cancelled", round_id);
            self.finish_round(&round, now)?;
        } else {
            self.events.push(RoundEvent::new(
                now,
                round.player_id.clone(),
                round_id,
                RoundEventData::Closed { closed_at: now },
            ));
            debug!("Round {} resolving", round_id);
        }
        self.status_of(&round)
    }

    /// Lock in an Aviator cash-out at the current server time.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn cash_out(&mut self, player_id: &PlayerId, round_id: RoundId) -> WagerResult<CashOut> {
        if let Some(archived) = self.ensure_owner(player_id, round_id)? {
            return Err(RoundError::RoundNotResolving { id: round_id, state: archived.state }.into());
        }
        let now = self.now();
        let cash_out = self.book.cash_out(round_id, now)?;
        if let Some(round) = self.book.get(round_id) {
            self.ledger.put_round(round)?;
        }
        self.events.push(RoundEvent::new(
            now,
            player_id.clone(),
            round_id,
            RoundEventData::CashedOut {
                multiplier: cash_out.multiplier,
                elapsed_ms: cash_out.elapsed_ms,
            },
        ));
        info!("Round {} cashed out at {}x", round_id, cash_out.multiplier);
        Ok(cash_out)
    }

    /// Fix outcome and payout.
    ///
    /// A repeated call fails with `AlreadySettled` carrying the stored
    /// settlement, so the payout a caller sees never changes. That holds
    /// after the round is archived as well.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn settle(&mut self, player_id: &PlayerId, round_id: RoundId) -> WagerResult<Settlement> {
        if let Some(archived) = self.ensure_owner(player_id, round_id)? {
            check_settleable(&archived)?;
            return Err(RoundError::Corrupt { id: round_id, field: "settlement" }.into());
        }
        let now = self.now();
        self.settle_at(round_id, now)
    }

    fn settle_at(&mut self, round_id: RoundId, now: Millis) -> WagerResult<Settlement> {
        let round = self.book.get(round_id).ok_or(RoundError::UnknownRound(round_id))?;
        check_settleable(round)?;
        let seed_id = round.server_seed_id;
        let raw_seed = self.store.secret(seed_id)?.to_string();
        let round = self.book.settle(round_id, now, &raw_seed)?.clone();
        let settlement = round
            .settlement
            .ok_or(RoundError::Corrupt { id: round_id, field: "settlement" })?;
        let outcome = round.outcome.ok_or(RoundError::Corrupt { id: round_id, field: "outcome" })?;

        *self.nonces.entry((round.player_id.clone(), round.game_type)).or_insert(0) += 1;
        if let Some(crash_point) = outcome.crash_point() {
            if self.recent_crashes.len() == RECENT_CRASHES {
                self.recent_crashes.pop_back();
            }
            self.recent_crashes.push_front(crash_point);
        }

        self.ledger.put_round(&round)?;
        self.events.push(RoundEvent::new(
            now,
            round.player_id.clone(),
            round_id,
            RoundEventData::Settled {
                outcome,
                payout: settlement.payout,
                won: settlement.won,
            },
        ));
        info!(
            "Round {} settled: {:?}, payout {} ({}x)",
            round_id, outcome, settlement.payout, settlement.effective_multiplier
        );
        self.finish_round(&round, now)?;
        Ok(settlement)
    }

    /// Release the round's seed and reveal it if it was single-use.
    fn finish_round(&mut self, round: &Round, now: Millis) -> WagerResult<()> {
        let remaining = self.store.detach(round.server_seed_id)?;
        let single_use = self
            .store
            .get(round.server_seed_id)
            .is_some_and(|seed| seed.kind == SeedKind::SingleRound);
        if single_use && remaining == 0 {
            let raw_seed = self.store.reveal(round.server_seed_id, now)?;
            self.events.push(RoundEvent::seed_revealed(
                now,
                round.player_id.clone(),
                round.server_seed_id,
                raw_seed,
            ));
        }
        self.persist_seed(round.server_seed_id)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Client-safe view of a round, active or archived.
    pub fn get_round_status(&self, round_id: RoundId) -> WagerResult<RoundStatus> {
        match self.book.get(round_id) {
            Some(round) => self.status_of(round),
            None => {
                let round = self
                    .ledger
                    .get_round(round_id)?
                    .ok_or(RoundError::UnknownRound(round_id))?;
                self.status_of(&round)
            }
        }
    }

    fn status_of(&self, round: &Round) -> WagerResult<RoundStatus> {
        let now = self.now();
        let server_seed = self.revealed_seed(round.server_seed_id)?;
        Ok(RoundStatus {
            round_id: round.id,
            player_id: round.player_id.clone(),
            game_type: round.game_type,
            state: round.state,
            seed_id: round.server_seed_id,
            commitment_hash: round.commitment_hash,
            nonce: round.nonce,
            opened_at: round.opened_at,
            bet_deadline: round.bet_deadline,
            client_seed: round.client_seed.clone(),
            bet_amount: round.bet.as_ref().map(|bet| bet.amount),
            choice: round.bet.as_ref().map(|bet| bet.choice),
            closed_at: round.closed_at,
            live_multiplier: self.book.live_multiplier(round, now),
            cash_out: round.cash_out,
            outcome: round.outcome,
            settlement: round.settlement,
            server_seed,
        })
    }

    /// Disclose a seed the player owns.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn reveal(&mut self, player_id: &PlayerId, seed_id: SeedId) -> WagerResult<String> {
        let seed = match self.store.get(seed_id) {
            Some(seed) => seed.clone(),
            None => self.retired_seed(seed_id)?,
        };
        if seed.binding.player_id != *player_id {
            return Err(CommitmentError::SeedNotOwned(seed_id).into());
        }
        if self.store.get(seed_id).is_none() {
            // Retired seeds were revealed before they left the store.
            return seed
                .revealed_value()
                .map(str::to_string)
                .ok_or_else(|| CommitmentError::UnknownSeed(seed_id).into());
        }
        let now = self.now();
        let raw_seed = self.store.reveal(seed_id, now)?;
        self.persist_seed(seed_id)?;
        self.events.push(RoundEvent::seed_revealed(now, player_id.clone(), seed_id, raw_seed.clone()));
        info!("Seed {} revealed", seed_id);
        Ok(raw_seed)
    }

    /// Recompute an outcome with this engine's published parameters.
    pub fn verify_outcome(&self, server_seed: &str, client_seed: &str, nonce: u64, game_type: GameType) -> Outcome {
        verify_outcome_with(server_seed, client_seed, nonce, game_type, &self.rules().outcome)
    }

    /// Receipt for a settled round whose seed has been revealed.
    pub fn receipt(&self, round_id: RoundId) -> WagerResult<RoundReceipt> {
        let round = match self.book.get(round_id) {
            Some(round) => round.clone(),
            None => self
                .ledger
                .get_round(round_id)?
                .ok_or(RoundError::UnknownRound(round_id))?,
        };
        let server_seed = self
            .revealed_seed(round.server_seed_id)?
            .ok_or_else(|| WagerError::ReceiptUnavailable(format!("seed {} not revealed", round.server_seed_id)))?;
        RoundReceipt::from_round(&round, &server_seed)
            .ok_or_else(|| WagerError::ReceiptUnavailable(format!("round {} not settled", round_id)))
    }

    /// Last crash points, newest first.
    pub fn recent_crashes(&self) -> Vec<Multiplier> {
        self.recent_crashes.iter().copied().collect()
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Apply deadlines: cancel idle rounds, close expired betting windows,
    /// settle rounds whose outcome is decided.
    pub fn sweep(&mut self, now: Millis) -> SweepReport {
        let mut report = SweepReport::default();

        for id in self.book.due_for_cancel(now) {
            match self.close_at(id, now) {
                Ok(_) => report.cancelled.push(id),
                Err(e) => warn!("Sweep could not cancel {}: {}", id, e),
            }
        }
        for id in self.book.due_for_close(now) {
            match self.close_at(id, now) {
                Ok(_) => report.closed.push(id),
                Err(e) => warn!("Sweep could not close {}: {}", id, e),
            }
        }
        for id in self.book.due_for_settle(now) {
            match self.settle_at(id, now) {
                Ok(_) => report.settled.push(id),
                Err(e) => warn!("Sweep could not settle {}: {}", id, e),
            }
        }

        if !report.is_empty() {
            debug!(
                "Sweep: {} cancelled, {} closed, {} settled",
                report.cancelled.len(),
                report.closed.len(),
                report.settled.len()
            );
        }
        report
    }

    /// Drop terminal rounds older than the configured age from the active
    /// book, and revealed seeds from the commitment store. Both stay
    /// readable through the ledger.
    pub fn archive(&mut self, now: Millis) -> usize {
        let cutoff = now.saturating_sub(self.config.archive_after_ms);
        let archived = self.book.archive(cutoff);
        let retired = self.store.retire_revealed();
        if !archived.is_empty() || retired > 0 {
            debug!("Archived {} rounds, retired {} seeds", archived.len(), retired);
        }
        archived.len()
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn ensure_no_active_round(&self, player_id: &PlayerId, game_type: GameType) -> WagerResult<()> {
        match self.book.active_for(player_id, game_type) {
            Some(round) => Err(WagerError::RoundInProgress { round_id: round.id }),
            None => Ok(()),
        }
    }

    /// Owner check over active and archived rounds. Returns the ledger
    /// copy when the round has left the book.
    fn ensure_owner(&self, player_id: &PlayerId, round_id: RoundId) -> WagerResult<Option<Round>> {
        let (owner, archived) = match self.book.get(round_id) {
            Some(round) => (round.player_id.clone(), None),
            None => {
                let round = self
                    .ledger
                    .get_round(round_id)?
                    .ok_or(RoundError::UnknownRound(round_id))?;
                (round.player_id.clone(), Some(round))
            }
        };
        if owner != *player_id {
            return Err(WagerError::NotRoundOwner(round_id));
        }
        Ok(archived)
    }

    fn retired_seed(&self, seed_id: SeedId) -> WagerResult<ServerSeed> {
        self.ledger
            .get_seed(seed_id)?
            .ok_or_else(|| CommitmentError::UnknownSeed(seed_id).into())
    }

    /// Disclosed value of a seed, live or retired.
    fn revealed_seed(&self, seed_id: SeedId) -> WagerResult<Option<String>> {
        if let Some(seed) = self.store.get(seed_id) {
            return Ok(seed.revealed_value().map(str::to_string));
        }
        Ok(self
            .ledger
            .get_seed(seed_id)?
            .and_then(|seed| seed.revealed_value().map(str::to_string)))
    }

    fn persist_seed(&mut self, seed_id: SeedId) -> WagerResult<()> {
        if let Some(seed) = self.store.get(seed_id) {
            self.ledger.put_seed(seed)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
