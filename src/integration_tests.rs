//! Integration tests for the lineup simulator
//! Runs data ingestion, ban resolution and the full driver together

use crate::ingest::{parse_long_csv, parse_matrix_csv};
use crate::lineup::{DeckSet, Lineup, LineupCatalog};
use crate::matchup::{synthetic_observations, Observation, SyntheticParams, WinRateTable};
use crate::rng::MetaRng;
use crate::simulation::{BanStrategy, SimulationConfig, SimulationDriver, SimulationError, SortType};

/// A beats B, B beats C and C beats A, each two games out of three
fn rock_paper_scissors() -> WinRateTable {
    WinRateTable::build(vec![
        Observation::new("A", "A", 2, 1),
        Observation::new("B", "B", 2, 1),
        Observation::new("C", "C", 2, 1),
        Observation::new("A", "B", 3, 2),
        Observation::new("B", "C", 3, 2),
        Observation::new("C", "A", 3, 2),
    ])
    .expect("Failed to build table")
}

#[test]
fn test_rock_paper_scissors_lineup() {
    let table = rock_paper_scissors();
    let opponent = DeckSet::from_names(&table, ["A", "B", "C"]).expect("Decks should exist");

    for strategy in [BanStrategy::Naive, BanStrategy::Nash] {
        let mut player = Lineup::of_names(&table, ["A", "B", "C"]).expect("Decks should exist");
        let win_rate = strategy
            .resolve(&mut player, &opponent, &table)
            .expect("Grid is complete");

        assert!(win_rate > 0.0 && win_rate < 1.0, "{:?} gave {}", strategy, win_rate);
        assert!((win_rate - 0.5).abs() < 1e-8, "Symmetric metagame should be even");
        assert_eq!(player.metadata().played_against(), &[1, 1, 1]);

        let banned = player.metadata().banned();
        assert!((banned.iter().sum::<f64>() - 1.0).abs() < 1e-8);
        if strategy == BanStrategy::Nash {
            for &b in banned {
                assert!((b - 1.0 / 3.0).abs() < 1e-6, "Cyclic grid should ban uniformly");
            }
        }
    }
}

#[test]
fn test_table_symmetry_from_synthetic_data() {
    let params = SyntheticParams {
        num_decks: 10,
        coverage: 0.7,
        ..SyntheticParams::default()
    };
    let table = WinRateTable::build(synthetic_observations(&params, &mut MetaRng::new(Some(21))))
        .expect("Synthetic data should be consistent");

    for i in 0..table.num_decks() {
        assert_eq!(table.win_rate(i, i).unwrap(), Some(0.5));
        for j in 0..table.num_decks() {
            match (table.win_rate(i, j).unwrap(), table.win_rate(j, i).unwrap()) {
                (Some(a), Some(b)) => assert!((a + b - 1.0).abs() < 1e-9),
                (None, None) => {}
                other => panic!("Asymmetric presence for ({}, {}): {:?}", i, j, other),
            }
        }
    }
}

#[test]
fn test_matrix_file_to_ranking() {
    let content = "\
_,Aggro (IO/NX),Control (DE/FJ),Midrange (AS/BH),Ramp (SH/TA)
_,0.4,0.3,0.2,0.1
Aggro (IO/NX),50,60,45,70
Control (DE/FJ),40,50,55,35
Midrange (AS/BH),55,45,50,60
Ramp (SH/TA),30,65,40,50
";
    let table = parse_matrix_csv(content)
        .and_then(|data| Ok(data.into_table()?))
        .expect("Matrix should load");
    assert_eq!(table.num_decks(), 4);

    let config = SimulationConfig {
        prune_ratios: vec![1.0, 0.5, 0.0],
        output_limit: 4,
        ..SimulationConfig::default()
    };
    let reports = SimulationDriver::new(&table, config)
        .expect("Config is valid")
        .run()
        .expect("Simulation should run");

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].candidates, 4);
    assert_eq!(reports[2].candidates, 2);

    let last = &reports[2].output;
    assert!(!last.top_lineups.is_empty());
    let shares: f64 = last.meta_composition.iter().map(|s| s.share).sum();
    assert!((shares - 3.0).abs() < 1e-9);
    for report in &last.top_lineups {
        assert!(report.metric.unweighted_mean > 0.0 && report.metric.unweighted_mean < 1.0);
    }
}

#[test]
fn test_long_file_with_gaps_skips_unplayable_pairs() {
    let content = "\
player,opponent,games,wins
A,A,2,1
B,B,2,1
C,C,2,1
D,D,2,1
A,B,10,6
A,C,10,4
B,C,10,5
D,A,10,5
D,B,10,5
";
    let table = parse_long_csv(content)
        .and_then(|data| Ok(data.into_table()?))
        .expect("Long file should load");
    let catalog = LineupCatalog::new(&table);
    let abc = Lineup::of_names(&table, ["A", "B", "C"]).expect("Decks should exist");
    let abd = Lineup::of_names(&table, ["A", "B", "D"]).expect("Decks should exist");
    // C vs D was never observed
    assert!(!catalog.can_play(abc.decks(), abd.decks()));
    assert!(catalog.can_play(abc.decks(), abc.decks()));

    let mut player = abc.clone();
    let result = BanStrategy::Nash.resolve(&mut player, abd.decks(), &table);
    assert!(matches!(result, Err(SimulationError::Matchup(_))));

    let config = SimulationConfig {
        sort_type: SortType::WeightedMean,
        output_limit: 10,
        ..SimulationConfig::default()
    };
    let reports = SimulationDriver::new(&table, config)
        .expect("Config is valid")
        .run()
        .expect("Simulation should run");
    assert_eq!(reports[0].pairs_skipped, 0, "Unplayable pairs are filtered, not skipped");
    assert!(reports[0].matchups_resolved > 0);
}

#[test]
fn test_synthetic_run_is_deterministic() {
    let params = SyntheticParams::default();
    let table = WinRateTable::build(synthetic_observations(&params, &mut MetaRng::new(Some(2024))))
        .expect("Synthetic data should be consistent");
    let config = SimulationConfig {
        prune_ratios: vec![0.5, 0.2, 0.0],
        output_limit: 5,
        ..SimulationConfig::default()
    };

    let first = SimulationDriver::new(&table, config.clone()).unwrap().run().unwrap();
    let second = SimulationDriver::new(&table, config).unwrap().run().unwrap();

    let names = |reports: &[crate::simulation::RoundReport]| -> Vec<Vec<String>> {
        reports
            .iter()
            .map(|r| r.output.top_lineups.iter().map(|l| l.decks.join(" | ")).collect())
            .collect()
    };
    assert_eq!(names(&first), names(&second));

    let best = &first[2].output.top_lineups[0];
    assert!(best.best_matchups.len() <= 5);
    assert!(best.worst_matchups.len() <= 5);
    assert!(best
        .best_matchups
        .windows(2)
        .all(|w| w[0].win_rate >= w[1].win_rate));
}
