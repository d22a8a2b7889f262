pub mod catalog;
pub mod metadata;
pub mod types;

pub use catalog::{can_play, LineupCatalog, LineupWeightType, ValidLineups};
pub use metadata::{LineupMetadata, MatchupRecord, MatchupTracker, NUM_BEST_WORST_MATCHUPS};
pub use types::{DeckSet, Lineup, PLAYER_DECK_COUNT};
