//! Round Ledger
//!
//! Persistence contract for seeds and rounds. The engine writes through on
//! every mutation; storage design beyond get/put is left to implementors.
//!
//! `MemoryLedger` keeps every written version (bincode-encoded), so the
//! full history of a round can be audited after the fact.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::game::state::{Round, RoundId};
use crate::proof::commitment::{SeedId, ServerSeed};

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Record could not be encoded or decoded.
    #[error("ledger codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Backend refused the write.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Ledger result type.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Storage interface for seeds and rounds.
pub trait Ledger: Send + Sync {
    /// Store the latest version of a seed.
    fn put_seed(&mut self, seed: &ServerSeed) -> LedgerResult<()>;

    /// Latest version of a seed.
    fn get_seed(&self, id: SeedId) -> LedgerResult<Option<ServerSeed>>;

    /// Store the latest version of a round.
    fn put_round(&mut self, round: &Round) -> LedgerResult<()>;

    /// Latest version of a round.
    fn get_round(&self, id: RoundId) -> LedgerResult<Option<Round>>;
}

/// Append-only in-memory ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    seeds: BTreeMap<SeedId, Vec<Vec<u8>>>,
    rounds: BTreeMap<RoundId, Vec<Vec<u8>>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored version of a round, oldest first.
    pub fn round_history(&self, id: RoundId) -> LedgerResult<Vec<Round>> {
        self.rounds
            .get(&id)
            .map(|versions| versions.iter().map(|bytes| bincode::deserialize(bytes)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(LedgerError::from)
    }

    /// Number of rounds ever written.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

impl Ledger for MemoryLedger {
    fn put_seed(&mut self, seed: &ServerSeed) -> LedgerResult<()> {
        let bytes = bincode::serialize(seed)?;
        self.seeds.entry(seed.id).or_default().push(bytes);
        Ok(())
    }

    fn get_seed(&self, id: SeedId) -> LedgerResult<Option<ServerSeed>> {
        match self.seeds.get(&id).and_then(|versions| versions.last()) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_round(&mut self, round: &Round) -> LedgerResult<()> {
        let bytes = bincode::serialize(round)?;
        self.rounds.entry(round.id).or_default().push(bytes);
        Ok(())
    }

    fn get_round(&self, id: RoundId) -> LedgerResult<Option<Round>> {
        match self.rounds.get(&id).and_then(|versions| versions.last()) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}
