//! Server Seed Commitments
//!
//! Publish `sha256(seed)` before any bet, reveal the seed afterwards.
//!
//! ```text
//! create ──▶ attach (round opens) ──▶ detach (round terminal) ──▶ reveal
//!               ▲         │
//!               └─────────┘  seed pairs: many rounds, one seed
//! ```
//!
//! A seed cannot be revealed while any round referencing it is still
//! Open or Resolving, and a revealed seed is never attached again.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::hash::CommitmentHash;
use crate::game::state::{GameType, PlayerId};

/// Random bytes per server seed.
pub const SEED_BYTES: usize = 32;

/// Server seed identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedId(pub uuid::Uuid);

impl SeedId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SeedId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

// =============================================================================
// ENTROPY
// =============================================================================

/// Source of seed randomness.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` with cryptographically secure random bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// Operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        rand::rngs::OsRng.try_fill_bytes(dest)
    }
}

// =============================================================================
// SEEDS
// =============================================================================

/// Who may use a seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedBinding {
    /// Owning player.
    pub player_id: PlayerId,
    /// Game the seed is used for.
    pub game_type: GameType,
}

impl SeedBinding {
    /// Create a binding.
    pub fn new(player_id: PlayerId, game_type: GameType) -> Self {
        Self { player_id, game_type }
    }
}

/// How a seed is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedKind {
    /// One round, revealed as soon as it finishes.
    SingleRound,
    /// Reused across rounds until the player asks for the reveal.
    Pair,
}

/// A server seed and its reveal state.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSeed {
    /// Seed identifier.
    pub id: SeedId,
    /// 64 lowercase hex chars. Secret until revealed.
    raw_value: String,
    /// `sha256(raw_value)`.
    pub commitment_hash: CommitmentHash,
    /// Creation time.
    pub created_at: Millis,
    /// Set once, at the first reveal.
    pub revealed_at: Option<Millis>,
    /// Owner and game.
    pub binding: SeedBinding,
    /// Single round or pair.
    pub kind: SeedKind,
    /// Rounds currently Open or Resolving on this seed.
    pub active_rounds: u32,
    /// Rounds ever attached.
    pub rounds_used: u64,
}

impl ServerSeed {
    /// Has the seed been disclosed?
    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }

    /// Raw value, only once revealed.
    pub fn revealed_value(&self) -> Option<&str> {
        self.revealed_at.map(|_| self.raw_value.as_str())
    }

    /// Public view.
    pub fn commitment(&self) -> Commitment {
        Commitment { seed_id: self.id, commitment_hash: self.commitment_hash }
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSeed")
            .field("id", &self.id)
            .field("commitment_hash", &self.commitment_hash)
            .field("revealed_at", &self.revealed_at)
            .field("binding", &self.binding)
            .field("kind", &self.kind)
            .field("active_rounds", &self.active_rounds)
            .field("rounds_used", &self.rounds_used)
            .finish_non_exhaustive()
    }
}

/// Published half of a seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Seed identifier.
    pub seed_id: SeedId,
    /// `sha256(raw_seed)`.
    pub commitment_hash: CommitmentHash,
}

/// Does `raw_seed` open `hash`?
///
/// Needs nothing but the two values, so any third party can run it.
pub fn verify_commitment(hash: &CommitmentHash, raw_seed: &str) -> bool {
    hash.matches(raw_seed)
}

// =============================================================================
// STORE
// =============================================================================

/// Owns every server seed the engine has issued.
pub struct CommitmentStore {
    entropy: Box<dyn EntropySource>,
    seeds: BTreeMap<SeedId, ServerSeed>,
}

impl CommitmentStore {
    /// Store backed by the OS CSPRNG.
    pub fn new() -> Self {
        Self::with_entropy(Box::new(OsEntropy))
    }

    /// Store with a custom entropy source.
    pub fn with_entropy(entropy: Box<dyn EntropySource>) -> Self {
        Self { entropy, seeds: BTreeMap::new() }
    }

    /// Generate a seed and publish its hash.
    ///
    /// On entropy failure nothing is stored.
    pub fn create_commitment(
        &mut self,
        now: Millis,
        binding: SeedBinding,
        kind: SeedKind,
    ) -> Result<Commitment, CommitmentError> {
        let mut bytes = [0u8; SEED_BYTES];
        self.entropy
            .fill(&mut bytes)
            .map_err(|e| CommitmentError::EntropySourceUnavailable(e.to_string()))?;

        let raw_value = hex::encode(bytes);
        let seed = ServerSeed {
            id: SeedId::new_v4(),
            commitment_hash: CommitmentHash::of_seed(&raw_value),
            raw_value,
            created_at: now,
            revealed_at: None,
            binding,
            kind,
            active_rounds: 0,
            rounds_used: 0,
        };
        let commitment = seed.commitment();
        self.seeds.insert(seed.id, seed);
        Ok(commitment)
    }

    /// Reference a seed from a new round.
    pub fn attach(&mut self, seed_id: SeedId, binding: &SeedBinding) -> Result<&ServerSeed, CommitmentError> {
        let seed = self.seeds.get_mut(&seed_id).ok_or(CommitmentError::UnknownSeed(seed_id))?;
        if seed.is_revealed() || (seed.kind == SeedKind::SingleRound && seed.rounds_used > 0) {
            return Err(CommitmentError::SeedRetired(seed_id));
        }
        if seed.binding != *binding {
            return Err(CommitmentError::SeedNotOwned(seed_id));
        }
        seed.active_rounds += 1;
        seed.rounds_used += 1;
        Ok(seed)
    }

    /// Release a round's reference. Returns the remaining count.
    pub fn detach(&mut self, seed_id: SeedId) -> Result<u32, CommitmentError> {
        let seed = self.seeds.get_mut(&seed_id).ok_or(CommitmentError::UnknownSeed(seed_id))?;
        seed.active_rounds = seed.active_rounds.saturating_sub(1);
        Ok(seed.active_rounds)
    }

    /// Disclose a seed. Permanent; repeated calls return the same value.
    pub fn reveal(&mut self, seed_id: SeedId, now: Millis) -> Result<String, CommitmentError> {
        let seed = self.seeds.get_mut(&seed_id).ok_or(CommitmentError::UnknownSeed(seed_id))?;
        if seed.active_rounds > 0 {
            return Err(CommitmentError::NotYetRevealable {
                seed_id,
                active_rounds: seed.active_rounds,
            });
        }
        if seed.revealed_at.is_none() {
            seed.revealed_at = Some(now);
        }
        Ok(seed.raw_value.clone())
    }

    /// Raw seed for internal outcome derivation. Never sent to clients
    /// before reveal.
    pub(crate) fn secret(&self, seed_id: SeedId) -> Result<&str, CommitmentError> {
        self.seeds
            .get(&seed_id)
            .map(|seed| seed.raw_value.as_str())
            .ok_or(CommitmentError::UnknownSeed(seed_id))
    }

    /// Drop revealed seeds no open round references. Returns how many
    /// went. Revealed seeds can never back another round, so only the
    /// caller's durable copy is still needed.
    pub fn retire_revealed(&mut self) -> usize {
        let before = self.seeds.len();
        self.seeds.retain(|_, seed| !seed.is_revealed() || seed.active_rounds > 0);
        before - self.seeds.len()
    }

    /// Look up a seed.
    pub fn get(&self, seed_id: SeedId) -> Option<&ServerSeed> {
        self.seeds.get(&seed_id)
    }

    /// Number of seeds held.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// No seeds issued yet?
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

impl Default for CommitmentStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Commitment store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    /// The CSPRNG failed; no seed was created.
    EntropySourceUnavailable(String),

    /// No seed with this id.
    UnknownSeed(SeedId),

    /// A referencing round is still Open or Resolving.
    NotYetRevealable {
        /// Seed.
        seed_id: SeedId,
        /// Rounds still holding it.
        active_rounds: u32,
    },

    /// Revealed or single-round seed already used.
    SeedRetired(SeedId),

    /// Seed is bound to another player or game.
    SeedNotOwned(SeedId),
}

impl fmt::Display for CommitmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntropySourceUnavailable(reason) => write!(f, "Entropy source unavailable: {}", reason),
            Self::UnknownSeed(id) => write!(f, "Unknown server seed {}", id),
            Self::NotYetRevealable { seed_id, active_rounds } => {
                write!(f, "Seed {} still backs {} active round(s)", seed_id, active_rounds)
            }
            Self::SeedRetired(id) => write!(f, "Seed {} is retired", id),
            Self::SeedNotOwned(id) => write!(f, "Seed {} belongs to another player or game", id),
        }
    }
}

impl std::error::Error for CommitmentError {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Entropy source that always fails.
    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device unplugged",
            )))
        }
    }

    fn binding(player: &str, game: GameType) -> SeedBinding {
        SeedBinding::new(PlayerId::from_address(player).unwrap(), game)
    }

    #[test]
    fn test_commitment_matches_seed() {
        let mut store = CommitmentStore::new();
        let commitment = store
            .create_commitment(0, binding("0xa", GameType::CoinFlip), SeedKind::SingleRound)
            .unwrap();

        let raw = store.reveal(commitment.seed_id, 10).unwrap();
        assert_eq!(raw.len(), 64);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(verify_commitment(&commitment.commitment_hash, &raw));
    }

    #[test]
    fn test_seeds_are_unique() {
        let mut store = CommitmentStore::new();
        let owner = binding("0xa", GameType::CoinFlip);
        let a = store.create_commitment(0, owner.clone(), SeedKind::SingleRound).unwrap();
        let b = store.create_commitment(0, owner, SeedKind::SingleRound).unwrap();
        assert_ne!(a.commitment_hash, b.commitment_hash);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reveal_blocked_while_active() {
        let mut store = CommitmentStore::new();
        let owner = binding("0xa", GameType::Aviator);
        let c = store.create_commitment(0, owner.clone(), SeedKind::Pair).unwrap();

        store.attach(c.seed_id, &owner).unwrap();
        assert!(matches!(
            store.reveal(c.seed_id, 5),
            Err(CommitmentError::NotYetRevealable { active_rounds: 1, .. })
        ));

        assert_eq!(store.detach(c.seed_id).unwrap(), 0);
        let first = store.reveal(c.seed_id, 6).unwrap();
        let second = store.reveal(c.seed_id, 99).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get(c.seed_id).unwrap().revealed_at, Some(6));
    }

    #[test]
    fn test_retire_only_finished_seeds() {
        let mut store = CommitmentStore::new();
        let owner = binding("0xa", GameType::CoinFlip);
        let c = store.create_commitment(0, owner.clone(), SeedKind::Pair).unwrap();

        let fresh = store.create_commitment(0, owner.clone(), SeedKind::SingleRound).unwrap();

        store.attach(c.seed_id, &owner).unwrap();
        assert_eq!(store.retire_revealed(), 0);

        store.detach(c.seed_id).unwrap();
        assert_eq!(store.retire_revealed(), 0, "unrevealed seeds stay");

        store.reveal(c.seed_id, 5).unwrap();
        assert_eq!(store.retire_revealed(), 1);
        assert!(store.get(c.seed_id).is_none());
        assert!(store.get(fresh.seed_id).is_some());
        assert_eq!(store.retire_revealed(), 0);
    }

    #[test]
    fn test_attach_rules() {
        let mut store = CommitmentStore::new();
        let owner = binding("0xa", GameType::CardPick);
        let single = store.create_commitment(0, owner.clone(), SeedKind::SingleRound).unwrap();
        store.attach(single.seed_id, &owner).unwrap();
        store.detach(single.seed_id).unwrap();
        assert_eq!(
            store.attach(single.seed_id, &owner).unwrap_err(),
            CommitmentError::SeedRetired(single.seed_id)
        );

        let pair = store.create_commitment(0, owner.clone(), SeedKind::Pair).unwrap();
        assert_eq!(
            store.attach(pair.seed_id, &binding("0xb", GameType::CardPick)).unwrap_err(),
            CommitmentError::SeedNotOwned(pair.seed_id)
        );
        store.attach(pair.seed_id, &owner).unwrap();
        store.detach(pair.seed_id).unwrap();
        store.attach(pair.seed_id, &owner).unwrap();
        store.detach(pair.seed_id).unwrap();
        assert_eq!(store.get(pair.seed_id).unwrap().rounds_used, 2);

        store.reveal(pair.seed_id, 1).unwrap();
        assert_eq!(
            store.attach(pair.seed_id, &owner).unwrap_err(),
            CommitmentError::SeedRetired(pair.seed_id)
        );

        let unknown = SeedId::new_v4();
        assert_eq!(store.reveal(unknown, 0).unwrap_err(), CommitmentError::UnknownSeed(unknown));
    }

    #[test]
    fn test_entropy_failure_creates_nothing() {
        let mut store = CommitmentStore::with_entropy(Box::new(BrokenEntropy));
        let err = store
            .create_commitment(0, binding("0xa", GameType::CoinFlip), SeedKind::SingleRound)
            .unwrap_err();
        assert!(matches!(err, CommitmentError::EntropySourceUnavailable(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_debug_hides_raw_seed() {
        let mut store = CommitmentStore::new();
        let c = store
            .create_commitment(0, binding("0xa", GameType::CoinFlip), SeedKind::SingleRound)
            .unwrap();
        let raw = store.secret(c.seed_id).unwrap().to_string();
        let debug = format!("{:?}", store.get(c.seed_id).unwrap());
        assert!(!debug.contains(&raw));
        assert!(store.get(c.seed_id).unwrap().revealed_value().is_none());
    }
}
