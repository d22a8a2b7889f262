use crate::lineup::metadata::LineupMetadata;
use crate::matchup::{all_components_unique, MatchupError, WinRateTable};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Number of decks a player brings in a lineup
pub const PLAYER_DECK_COUNT: usize = 3;

/// The immutable identity of a lineup: three deck indices and their names.
///
/// Equality and hashing use the set of indices, so construction order does not matter.
#[derive(Debug, Clone)]
pub struct DeckSet {
    decks: [usize; PLAYER_DECK_COUNT],
    names: [String; PLAYER_DECK_COUNT],
    key: [usize; PLAYER_DECK_COUNT],
}

impl DeckSet {
    /// Create a deck set from indices into `table`
    pub fn from_indices(table: &WinRateTable, decks: [usize; PLAYER_DECK_COUNT]) -> Result<Self, MatchupError> {
        let names = [
            table.deck_name(decks[0])?.to_string(),
            table.deck_name(decks[1])?.to_string(),
            table.deck_name(decks[2])?.to_string(),
        ];
        Ok(Self::from_parts(decks, names))
    }

    /// Create a deck set from deck names known to `table`
    pub fn from_names(table: &WinRateTable, names: [&str; PLAYER_DECK_COUNT]) -> Result<Self, MatchupError> {
        let decks = [
            table.deck_index(names[0])?,
            table.deck_index(names[1])?,
            table.deck_index(names[2])?,
        ];
        Ok(Self::from_parts(decks, names.map(str::to_string)))
    }

    fn from_parts(decks: [usize; PLAYER_DECK_COUNT], names: [String; PLAYER_DECK_COUNT]) -> Self {
        let mut key = decks;
        key.sort_unstable();
        DeckSet { decks, names, key }
    }

    pub fn decks(&self) -> &[usize; PLAYER_DECK_COUNT] {
        &self.decks
    }

    pub fn deck(&self, slot: usize) -> usize {
        self.decks[slot]
    }

    pub fn names(&self) -> &[String; PLAYER_DECK_COUNT] {
        &self.names
    }

    pub fn name(&self, slot: usize) -> &str {
        &self.names[slot]
    }

    pub fn contains(&self, deck: usize) -> bool {
        self.decks.contains(&deck)
    }

    /// A deck set is valid when its decks are distinct and share no name component
    pub fn is_valid(&self) -> bool {
        let distinct = self.key[0] != self.key[1] && self.key[1] != self.key[2];
        distinct && all_components_unique(self.names.iter().map(|s| s.as_str()))
    }
}

impl PartialEq for DeckSet {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DeckSet {}

impl Hash for DeckSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for DeckSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.names[0], self.names[1], self.names[2])
    }
}

/// A deck set together with the statistics gathered for it during a scoring pass.
///
/// Cloning shares the deck set and deep-copies the metadata, so a cloned snapshot
/// is unaffected by later rounds.
#[derive(Debug, Clone)]
pub struct Lineup {
    decks: Arc<DeckSet>,
    metadata: LineupMetadata,
}

impl Lineup {
    pub fn new(decks: Arc<DeckSet>, num_decks: usize) -> Self {
        Lineup {
            decks,
            metadata: LineupMetadata::new(num_decks),
        }
    }

    /// Create a lineup from deck indices
    pub fn of_indices(table: &WinRateTable, decks: [usize; PLAYER_DECK_COUNT]) -> Result<Self, MatchupError> {
        let set = DeckSet::from_indices(table, decks)?;
        Ok(Self::new(Arc::new(set), table.num_decks()))
    }

    /// Create a lineup from deck names
    pub fn of_names(table: &WinRateTable, names: [&str; PLAYER_DECK_COUNT]) -> Result<Self, MatchupError> {
        let set = DeckSet::from_names(table, names)?;
        Ok(Self::new(Arc::new(set), table.num_decks()))
    }

    pub fn decks(&self) -> &Arc<DeckSet> {
        &self.decks
    }

    pub fn metadata(&self) -> &LineupMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut LineupMetadata {
        &mut self.metadata
    }

    /// Clear all gathered statistics before a new scoring pass
    pub fn reset_metadata(&mut self) -> &mut Self {
        self.metadata.reset();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.decks.is_valid()
    }
}

impl PartialEq for Lineup {
    fn eq(&self, other: &Self) -> bool {
        self.decks == other.decks
    }
}

impl Eq for Lineup {}

impl Hash for Lineup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.decks.hash(state);
    }
}

impl fmt::Display for Lineup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.decks.fmt(f)
    }
}
