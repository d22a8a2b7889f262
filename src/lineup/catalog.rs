use crate::lineup::types::{DeckSet, Lineup, PLAYER_DECK_COUNT};
use crate::matchup::{MatchupError, WinRateTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ways of computing a lineup's weight from its deck weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LineupWeightType {
    /// Arithmetic mean of the deck weights
    #[default]
    Average,
    /// Geometric mean of the deck weights
    Geometric,
}

impl LineupWeightType {
    pub fn combine(&self, weights: [f64; PLAYER_DECK_COUNT]) -> f64 {
        match self {
            LineupWeightType::Average => weights.iter().sum::<f64>() / PLAYER_DECK_COUNT as f64,
            LineupWeightType::Geometric => {
                weights.iter().product::<f64>().powf(1.0 / PLAYER_DECK_COUNT as f64)
            }
        }
    }
}

/// True iff every cross pair of decks between the two lineups has a known win rate
pub fn can_play(table: &WinRateTable, player: &DeckSet, opponent: &DeckSet) -> bool {
    player
        .decks()
        .iter()
        .all(|&p| opponent.decks().iter().all(|&o| table.has_matchup(p, o)))
}

/// Enumerates lineups over the decks of a [`WinRateTable`]
pub struct LineupCatalog<'a> {
    table: &'a WinRateTable,
}

impl<'a> LineupCatalog<'a> {
    pub fn new(table: &'a WinRateTable) -> Self {
        LineupCatalog { table }
    }

    /// All valid 3-deck lineups of `deck_pool`, in ascending index-triple order.
    ///
    /// The iterator is lazy and can be cloned to restart from its current position.
    pub fn all_valid_lineups(&self, deck_pool: &[usize]) -> Result<ValidLineups<'a>, MatchupError> {
        let mut pool = deck_pool.to_vec();
        pool.sort_unstable();
        pool.dedup();
        for &deck in &pool {
            self.table.deck_name(deck)?;
        }

        Ok(ValidLineups {
            table: self.table,
            pool,
            next: Some([0, 1, 2]),
        })
    }

    /// All valid lineups of `deck_pool`, each paired with its play-rate weight
    pub fn weighted_lineups(
        &self,
        deck_pool: &[usize],
        weight_type: LineupWeightType,
    ) -> Result<Vec<(Lineup, f64)>, MatchupError> {
        self.all_valid_lineups(deck_pool)?
            .map(|lineup| {
                let decks = lineup.decks().decks();
                let weights = [
                    self.table.deck_weight_by_index(decks[0])?,
                    self.table.deck_weight_by_index(decks[1])?,
                    self.table.deck_weight_by_index(decks[2])?,
                ];
                Ok((lineup, weight_type.combine(weights)))
            })
            .collect()
    }

    pub fn can_play(&self, player: &DeckSet, opponent: &DeckSet) -> bool {
        can_play(self.table, player, opponent)
    }
}

/// Lazy iterator over valid lineups, see [`LineupCatalog::all_valid_lineups`]
#[derive(Clone)]
pub struct ValidLineups<'a> {
    table: &'a WinRateTable,
    pool: Vec<usize>,
    next: Option<[usize; PLAYER_DECK_COUNT]>,
}

impl ValidLineups<'_> {
    /// Advance positions (i, j, k) to the next ascending combination
    fn advance(&mut self, [i, j, k]: [usize; PLAYER_DECK_COUNT]) {
        let n = self.pool.len();
        self.next = if k + 1 < n {
            Some([i, j, k + 1])
        } else if j + 2 < n {
            Some([i, j + 1, j + 2])
        } else if i + 3 < n {
            Some([i + 1, i + 2, i + 3])
        } else {
            None
        };
    }
}

impl Iterator for ValidLineups<'_> {
    type Item = Lineup;

    fn next(&mut self) -> Option<Lineup> {
        while let Some(positions) = self.next {
            if positions[2] >= self.pool.len() {
                self.next = None;
                return None;
            }
            self.advance(positions);

            let decks = positions.map(|p| self.pool[p]);
            // Pool indices were checked when the iterator was created
            if let Ok(set) = DeckSet::from_indices(self.table, decks) {
                if set.is_valid() {
                    return Some(Lineup::new(Arc::new(set), self.table.num_decks()));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchup::Observation;

    fn full_table(names: &[&str]) -> WinRateTable {
        let mut observations = Vec::new();
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i) {
                observations.push(Observation::new(a, b, 2, 1));
            }
        }
        WinRateTable::build(observations).unwrap()
    }

    #[test]
    fn test_enumerates_all_combinations_in_order() {
        let table = full_table(&["A", "B", "C", "D", "E"]);
        let catalog = LineupCatalog::new(&table);
        let all: Vec<[usize; 3]> = catalog
            .all_valid_lineups(&[0, 1, 2, 3, 4])
            .unwrap()
            .map(|l| *l.decks().decks())
            .collect();

        assert_eq!(all.len(), 10);
        assert_eq!(all[0], [0, 1, 2]);
        assert_eq!(all[1], [0, 1, 3]);
        assert_eq!(all[9], [2, 3, 4]);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }

    #[test]
    fn test_skips_invalid_lineups() {
        let table = full_table(&["A (IO/NX)", "B (IO/NX)", "C (DE/FJ)", "D (IO/SH)"]);
        let catalog = LineupCatalog::new(&table);
        let names: Vec<String> = catalog
            .all_valid_lineups(&[0, 1, 2, 3])
            .unwrap()
            .map(|l| l.to_string())
            .collect();

        assert_eq!(
            names,
            vec!["A (IO/NX) | C (DE/FJ) | D (IO/SH)", "B (IO/NX) | C (DE/FJ) | D (IO/SH)"]
        );
    }

    #[test]
    fn test_small_pools() {
        let table = full_table(&["A", "B", "C"]);
        let catalog = LineupCatalog::new(&table);
        assert_eq!(catalog.all_valid_lineups(&[0, 1]).unwrap().count(), 0);
        assert_eq!(catalog.all_valid_lineups(&[]).unwrap().count(), 0);
        assert_eq!(catalog.all_valid_lineups(&[2, 0, 1, 1]).unwrap().count(), 1);
    }

    #[test]
    fn test_unknown_pool_deck() {
        let table = full_table(&["A", "B", "C"]);
        let catalog = LineupCatalog::new(&table);
        assert!(catalog.all_valid_lineups(&[0, 1, 7]).is_err());
    }

    #[test]
    fn test_restartable() {
        let table = full_table(&["A", "B", "C", "D"]);
        let catalog = LineupCatalog::new(&table);
        let mut iter = catalog.all_valid_lineups(&[0, 1, 2, 3]).unwrap();
        iter.next();
        let restarted = iter.clone();
        assert_eq!(iter.count(), 3);
        assert_eq!(restarted.count(), 3);
        assert_eq!(catalog.all_valid_lineups(&[0, 1, 2, 3]).unwrap().count(), 4);
    }

    #[test]
    fn test_weight_types() {
        assert!((LineupWeightType::Average.combine([1.0, 2.0, 6.0]) - 3.0).abs() < 1e-12);
        assert!((LineupWeightType::Geometric.combine([1.0, 2.0, 4.0]) - 2.0).abs() < 1e-12);
        assert!((LineupWeightType::Geometric.combine([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_lineups() {
        let table = WinRateTable::build(vec![
            Observation::new("A", "B", 10, 5),
            Observation::new("C", "D", 30, 15),
        ])
        .unwrap();
        let catalog = LineupCatalog::new(&table);
        let weighted = catalog
            .weighted_lineups(&[0, 1, 2, 3], LineupWeightType::Average)
            .unwrap();

        assert_eq!(weighted.len(), 4);
        // Weights: A = B = 10/80, C = D = 30/80
        let (lineup, weight) = &weighted[0];
        assert_eq!(lineup.decks().decks(), &[0, 1, 2]);
        assert!((weight - (10.0 + 10.0 + 30.0) / 80.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_can_play() {
        let table = WinRateTable::build(vec![
            Observation::new("A", "X", 2, 1),
            Observation::new("A", "Y", 2, 1),
            Observation::new("A", "Z", 2, 1),
            Observation::new("B", "X", 2, 1),
            Observation::new("B", "Y", 2, 1),
            Observation::new("B", "Z", 2, 1),
            Observation::new("C", "X", 2, 1),
            Observation::new("C", "Y", 2, 1),
        ])
        .unwrap();
        let catalog = LineupCatalog::new(&table);
        let player = DeckSet::from_names(&table, ["A", "B", "C"]).unwrap();
        let covered = DeckSet::from_names(&table, ["X", "Y", "A"]).unwrap();
        let missing = DeckSet::from_names(&table, ["X", "Y", "Z"]).unwrap();

        // C vs Z and A vs A were never observed
        assert!(!catalog.can_play(&player, &missing));
        assert!(!catalog.can_play(&player, &covered));

        let two_decks = DeckSet::from_names(&table, ["A", "B", "B"]).unwrap();
        assert!(catalog.can_play(&two_decks, &missing));
    }
}
