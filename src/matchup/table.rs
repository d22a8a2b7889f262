use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Largest disagreement tolerated between two win rates describing the same matchup
pub const WIN_RATE_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchupError {
    #[error("Invalid matchup data: {0}")]
    InvalidData(String),
    #[error("Inconsistent matchup data: {0}")]
    InconsistentData(String),
    #[error("Deck not found: {0}")]
    NotFound(String),
    #[error("Incomplete matchup data: {0}")]
    IncompleteData(String),
}

/// One observed matchup between a player deck and an opponent deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub player: String,
    pub opponent: String,
    pub games: u32,
    pub wins: u32,
    /// Pre-computed win rate, checked against `wins / games` when present
    #[serde(default)]
    pub win_rate: Option<f64>,
}

impl Observation {
    pub fn new(player: &str, opponent: &str, games: u32, wins: u32) -> Self {
        Observation {
            player: player.to_string(),
            opponent: opponent.to_string(),
            games,
            wins,
            win_rate: None,
        }
    }

    /// Validate this observation and return its win rate
    pub fn checked_win_rate(&self) -> Result<f64, MatchupError> {
        if self.games == 0 {
            return Err(MatchupError::InvalidData(format!(
                "{} vs {} has no games",
                self.player, self.opponent
            )));
        }
        if self.wins > self.games {
            return Err(MatchupError::InvalidData(format!(
                "{} vs {} has {} wins in {} games",
                self.player, self.opponent, self.wins, self.games
            )));
        }

        let win_rate = self.wins as f64 / self.games as f64;
        if let Some(supplied) = self.win_rate {
            if !supplied.is_finite() || (supplied - win_rate).abs() > WIN_RATE_TOLERANCE {
                return Err(MatchupError::InvalidData(format!(
                    "{} vs {} claims win rate {} but {}/{} is {}",
                    self.player, self.opponent, supplied, self.wins, self.games, win_rate
                )));
            }
        }
        Ok(win_rate)
    }
}

/// Symmetric win-rate lookup over a fixed universe of named decks.
///
/// Decks are indexed in ascending name order. Every present entry obeys
/// `win_rate(i, j) == 1 - win_rate(j, i)` and mirror matches are exactly 0.5.
/// Missing entries mean "no data", which is distinct from a 0 or 1 win rate.
#[derive(Debug, Clone)]
pub struct WinRateTable {
    names: Vec<String>,
    indices: HashMap<String, usize>,
    rates: Vec<Option<f64>>,
    weights: Vec<f64>,
    player_decks: Vec<usize>,
    opponent_decks: Vec<usize>,
}

impl WinRateTable {
    /// Build a table from raw observations, deriving mirror entries as `1 - win_rate`
    pub fn build<I>(observations: I) -> Result<Self, MatchupError>
    where
        I: IntoIterator<Item = Observation>,
    {
        let observations: Vec<Observation> = observations.into_iter().collect();

        let names: Vec<String> = observations
            .iter()
            .flat_map(|o| [o.player.clone(), o.opponent.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let indices: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let n = names.len();
        let mut rates: Vec<Option<f64>> = vec![None; n * n];
        let mut explicit = vec![false; n * n];
        let mut games_played = vec![0u64; n];
        let mut counted_pairs: HashSet<(usize, usize)> = HashSet::new();
        let mut player_side = BTreeSet::new();
        let mut opponent_side = BTreeSet::new();

        for observation in &observations {
            let win_rate = observation.checked_win_rate()?;
            let row = indices[&observation.player];
            let col = indices[&observation.opponent];

            if row == col && win_rate != 0.5 {
                return Err(MatchupError::InvalidData(format!(
                    "Mirror match {} must have win rate 0.5, found {}",
                    observation.player, win_rate
                )));
            }

            let cell = row * n + col;
            if let Some(existing) = rates[cell] {
                if (existing - win_rate).abs() > WIN_RATE_TOLERANCE {
                    return Err(MatchupError::InconsistentData(format!(
                        "Duplicate matchup {} vs {}: {} and {}",
                        observation.player, observation.opponent, existing, win_rate
                    )));
                }
                continue;
            }
            rates[cell] = Some(win_rate);
            explicit[cell] = true;
            player_side.insert(row);
            opponent_side.insert(col);

            // Games of one pairing are counted once, whichever side reported them
            if counted_pairs.insert((row.min(col), row.max(col))) {
                games_played[row] += observation.games as u64;
                if row != col {
                    games_played[col] += observation.games as u64;
                }
            }
        }

        for row in 0..n {
            for col in 0..n {
                let cell = row * n + col;
                if !explicit[cell] || row == col {
                    continue;
                }
                let expected = 1.0 - rates[cell].unwrap_or_default();
                let mirror = col * n + row;
                if explicit[mirror] {
                    let found = rates[mirror].unwrap_or_default();
                    if (found - expected).abs() > WIN_RATE_TOLERANCE {
                        return Err(MatchupError::InconsistentData(format!(
                            "{} vs {} is {} but {} vs {} is {}",
                            names[row], names[col], 1.0 - expected, names[col], names[row], found
                        )));
                    }
                } else {
                    rates[mirror] = Some(expected);
                }
            }
        }

        let total_games: u64 = games_played.iter().sum();
        let weights = games_played
            .iter()
            .map(|&g| if total_games > 0 { g as f64 / total_games as f64 } else { 0.0 })
            .collect();

        Ok(WinRateTable {
            names,
            indices,
            rates,
            weights,
            player_decks: player_side.into_iter().collect(),
            opponent_decks: opponent_side.into_iter().collect(),
        })
    }

    /// Replace the computed deck weights with externally observed play rates.
    ///
    /// Rates are normalized to sum to 1; decks missing from `play_rates` get weight 0.
    pub fn with_play_rates(mut self, play_rates: &HashMap<String, f64>) -> Result<Self, MatchupError> {
        let mut weights = vec![0.0; self.names.len()];
        for (name, &rate) in play_rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(MatchupError::InvalidData(format!(
                    "Play rate for {} must be a non-negative number, found {}",
                    name, rate
                )));
            }
            weights[self.deck_index(name)?] = rate;
        }

        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        self.weights = weights;
        Ok(self)
    }

    /// Get the number of distinct decks
    pub fn num_decks(&self) -> usize {
        self.names.len()
    }

    /// Get all deck names, in index order
    pub fn deck_names(&self) -> &[String] {
        &self.names
    }

    /// Get the index of a deck by name
    pub fn deck_index(&self, name: &str) -> Result<usize, MatchupError> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| MatchupError::NotFound(name.to_string()))
    }

    /// Get the name of a deck by index
    pub fn deck_name(&self, index: usize) -> Result<&str, MatchupError> {
        self.names
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| MatchupError::NotFound(format!("index {}", index)))
    }

    /// Win rate of `player` against `opponent`, or `None` when the pair was never observed
    pub fn win_rate(&self, player: usize, opponent: usize) -> Result<Option<f64>, MatchupError> {
        let n = self.names.len();
        if player >= n {
            return Err(MatchupError::NotFound(format!("player index {}", player)));
        }
        if opponent >= n {
            return Err(MatchupError::NotFound(format!("opponent index {}", opponent)));
        }
        Ok(self.rates[player * n + opponent])
    }

    /// Win rate of `player` against `opponent` by deck name
    pub fn win_rate_by_name(&self, player: &str, opponent: &str) -> Result<Option<f64>, MatchupError> {
        self.win_rate(self.deck_index(player)?, self.deck_index(opponent)?)
    }

    /// Check whether a win rate is known for the pair. Out of range indices have no matchup.
    pub fn has_matchup(&self, player: usize, opponent: usize) -> bool {
        matches!(self.win_rate(player, opponent), Ok(Some(_)))
    }

    /// Share of total observed play for the named deck
    pub fn deck_weight(&self, name: &str) -> Result<f64, MatchupError> {
        Ok(self.weights[self.deck_index(name)?])
    }

    /// Share of total observed play for the deck at `index`
    pub fn deck_weight_by_index(&self, index: usize) -> Result<f64, MatchupError> {
        self.weights
            .get(index)
            .copied()
            .ok_or_else(|| MatchupError::NotFound(format!("index {}", index)))
    }

    /// Decks seen on the player side of at least one observation
    pub fn player_decks(&self) -> &[usize] {
        &self.player_decks
    }

    /// Decks seen on the opponent side of at least one observation
    pub fn opponent_decks(&self) -> &[usize] {
        &self.opponent_decks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> WinRateTable {
        WinRateTable::build(vec![
            Observation::new("A", "A", 4, 2),
            Observation::new("A", "B", 3, 2),
            Observation::new("B", "A", 3, 1),
        ])
        .expect("Failed to build table")
    }

    #[test]
    fn test_build_and_get_win_rate() {
        let table = sample_table();
        assert_eq!(table.num_decks(), 2);
        assert_eq!(table.deck_names(), &["A".to_string(), "B".to_string()]);

        let ab = table.win_rate_by_name("A", "B").unwrap().unwrap();
        assert!((ab - 2.0 / 3.0).abs() < 1e-12);
        let ba = table.win_rate_by_name("B", "A").unwrap().unwrap();
        assert!((ba - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(table.win_rate_by_name("A", "A").unwrap(), Some(0.5));
        assert_eq!(table.win_rate_by_name("B", "B").unwrap(), None);
    }

    #[test]
    fn test_derives_mirror_entry() {
        let table = WinRateTable::build(vec![Observation::new("A", "B", 10, 7)]).unwrap();
        let ba = table.win_rate_by_name("B", "A").unwrap().unwrap();
        assert!((ba - 0.3).abs() < 1e-12);
        assert_eq!(table.player_decks(), &[0]);
        assert_eq!(table.opponent_decks(), &[1]);
    }

    #[test]
    fn test_symmetry_invariant() {
        let table = WinRateTable::build(vec![
            Observation::new("A", "B", 7, 4),
            Observation::new("A", "C", 9, 2),
            Observation::new("B", "C", 13, 11),
            Observation::new("C", "C", 2, 1),
        ])
        .unwrap();

        for i in 0..table.num_decks() {
            for j in 0..table.num_decks() {
                if let (Some(ij), Some(ji)) =
                    (table.win_rate(i, j).unwrap(), table.win_rate(j, i).unwrap())
                {
                    assert!((ij + ji - 1.0).abs() < 1e-9, "{} {} breaks symmetry", i, j);
                }
            }
        }
    }

    #[test]
    fn test_zero_games_is_invalid() {
        let result = WinRateTable::build(vec![Observation::new("A", "B", 0, 0)]);
        assert!(matches!(result, Err(MatchupError::InvalidData(_))));
    }

    #[test]
    fn test_more_wins_than_games_is_invalid() {
        let result = WinRateTable::build(vec![Observation::new("A", "B", 3, 4)]);
        assert!(matches!(result, Err(MatchupError::InvalidData(_))));
    }

    #[test]
    fn test_supplied_win_rate_must_match() {
        let mut observation = Observation::new("A", "B", 4, 1);
        observation.win_rate = Some(0.25);
        assert!(WinRateTable::build(vec![observation.clone()]).is_ok());

        observation.win_rate = Some(0.3);
        let result = WinRateTable::build(vec![observation]);
        assert!(matches!(result, Err(MatchupError::InvalidData(_))));
    }

    #[test]
    fn test_mirror_match_must_be_even() {
        let result = WinRateTable::build(vec![Observation::new("A", "A", 4, 3)]);
        assert!(matches!(result, Err(MatchupError::InvalidData(_))));
    }

    #[test]
    fn test_inconsistent_explicit_mirror() {
        let result = WinRateTable::build(vec![
            Observation::new("A", "B", 4, 3),
            Observation::new("B", "A", 4, 3),
        ]);
        assert!(matches!(result, Err(MatchupError::InconsistentData(_))));
    }

    #[test]
    fn test_conflicting_duplicate() {
        let result = WinRateTable::build(vec![
            Observation::new("A", "B", 4, 3),
            Observation::new("A", "B", 4, 1),
        ]);
        assert!(matches!(result, Err(MatchupError::InconsistentData(_))));
    }

    #[test]
    fn test_consistent_duplicate_is_accepted() {
        let table = WinRateTable::build(vec![
            Observation::new("A", "B", 4, 3),
            Observation::new("A", "B", 8, 6),
        ])
        .unwrap();
        assert_eq!(table.win_rate_by_name("A", "B").unwrap(), Some(0.75));
    }

    #[test]
    fn test_not_found() {
        let table = sample_table();
        assert!(matches!(table.win_rate(0, 5), Err(MatchupError::NotFound(_))));
        assert!(matches!(table.win_rate(5, 0), Err(MatchupError::NotFound(_))));
        assert!(matches!(
            table.win_rate_by_name("A", "Nonexistent Deck"),
            Err(MatchupError::NotFound(_))
        ));
        assert!(table.deck_name(2).is_err());
        assert!(!table.has_matchup(0, 9));
    }

    #[test]
    fn test_has_matchup() {
        let table = sample_table();
        assert!(table.has_matchup(0, 1));
        assert!(table.has_matchup(0, 0));
        assert!(!table.has_matchup(1, 1));
    }

    #[test]
    fn test_deck_weights_from_games() {
        let table = WinRateTable::build(vec![
            Observation::new("A", "B", 10, 5),
            Observation::new("B", "A", 10, 5),
            Observation::new("A", "C", 30, 15),
        ])
        .unwrap();

        // A: 10 + 30, B: 10, C: 30 -> total 80
        assert!((table.deck_weight("A").unwrap() - 0.5).abs() < 1e-12);
        assert!((table.deck_weight("B").unwrap() - 0.125).abs() < 1e-12);
        assert!((table.deck_weight("C").unwrap() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_with_play_rates() {
        let rates = HashMap::from([("A".to_string(), 3.0), ("B".to_string(), 1.0)]);
        let table = sample_table().with_play_rates(&rates).unwrap();
        assert!((table.deck_weight("A").unwrap() - 0.75).abs() < 1e-12);
        assert!((table.deck_weight("B").unwrap() - 0.25).abs() < 1e-12);

        let unknown = HashMap::from([("Z".to_string(), 1.0)]);
        assert!(matches!(
            sample_table().with_play_rates(&unknown),
            Err(MatchupError::NotFound(_))
        ));

        let negative = HashMap::from([("A".to_string(), -1.0)]);
        assert!(matches!(
            sample_table().with_play_rates(&negative),
            Err(MatchupError::InvalidData(_))
        ));
    }
}
