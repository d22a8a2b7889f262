//! Synthetic metagames for demos, benchmarks and property tests.

use crate::matchup::table::Observation;
use crate::rng::MetaRng;

/// Components used to build deck group names, e.g. "Deck07 (IO/NX)"
pub const GROUP_COMPONENTS: &[&str] = &["AS", "BH", "DE", "FJ", "IO", "NX", "SH", "TA"];

/// Parameters for generating a synthetic metagame
#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub num_decks: usize,
    /// Fraction of deck pairs that receive observations
    pub coverage: f64,
    pub min_games: u32,
    pub max_games: u32,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        SyntheticParams {
            num_decks: 12,
            coverage: 1.0,
            min_games: 20,
            max_games: 120,
        }
    }
}

/// Generate canonical deck names with randomly assigned groups
pub fn synthetic_deck_names(num_decks: usize, rng: &mut MetaRng) -> Vec<String> {
    (0..num_decks)
        .map(|i| {
            let (a, b) = rng.distinct_pair(GROUP_COMPONENTS.len());
            let (a, b) = (a.min(b), a.max(b));
            format!("Deck{:02} ({}/{})", i, GROUP_COMPONENTS[a], GROUP_COMPONENTS[b])
        })
        .collect()
}

/// Generate one observation per covered deck pair, plus an even mirror per deck.
///
/// Each deck gets a hidden strength; pair win rates lean toward the stronger deck,
/// so the resulting metagame has a real ranking rather than pure noise.
pub fn synthetic_observations(params: &SyntheticParams, rng: &mut MetaRng) -> Vec<Observation> {
    let names = synthetic_deck_names(params.num_decks, rng);
    let strengths: Vec<f64> = (0..params.num_decks).map(|_| rng.random()).collect();
    let spread = (params.max_games.max(params.min_games) - params.min_games) as usize + 1;

    let mut observations = Vec::new();
    for i in 0..params.num_decks {
        let mirror_games = 2 * (params.min_games.max(1));
        observations.push(Observation::new(&names[i], &names[i], mirror_games, mirror_games / 2));

        for j in (i + 1)..params.num_decks {
            if rng.random() >= params.coverage {
                continue;
            }
            let games = (params.min_games as usize + rng.random_range(spread)).max(1) as u32;
            let edge = 0.5 + (strengths[i] - strengths[j]) * 0.3 + (rng.random() - 0.5) * 0.2;
            let wins = (edge.clamp(0.0, 1.0) * games as f64).round() as u32;
            observations.push(Observation::new(&names[i], &names[j], games, wins.min(games)));
        }
    }
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchup::table::WinRateTable;

    #[test]
    fn test_synthetic_table_builds() {
        let mut rng = MetaRng::new(Some(42));
        let observations = synthetic_observations(&SyntheticParams::default(), &mut rng);
        let table = WinRateTable::build(observations).expect("Synthetic data should be consistent");
        assert_eq!(table.num_decks(), 12);

        for i in 0..table.num_decks() {
            for j in 0..table.num_decks() {
                assert!(table.has_matchup(i, j), "Full coverage should fill every cell");
            }
        }
    }

    #[test]
    fn test_same_seed_same_metagame() {
        let params = SyntheticParams::default();
        let a = synthetic_observations(&params, &mut MetaRng::new(Some(9)));
        let b = synthetic_observations(&params, &mut MetaRng::new(Some(9)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_coverage_leaves_gaps() {
        let params = SyntheticParams {
            num_decks: 20,
            coverage: 0.3,
            ..SyntheticParams::default()
        };
        let observations = synthetic_observations(&params, &mut MetaRng::new(Some(3)));
        let pairs = observations.iter().filter(|o| o.player != o.opponent).count();
        assert!(pairs < 20 * 19 / 2);
    }
}
