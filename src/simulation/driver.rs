//! Iterative scoring of the lineup population.
//!
//! Each round scores every remaining candidate lineup against the field, ranks the candidates,
//! records best and worst matchups for the leaders, reports, then prunes to a fraction of the
//! original population before the next round.

use crate::lineup::{can_play, DeckSet, Lineup, LineupCatalog, LineupWeightType};
use crate::matchup::{sanitize, MatchupError, WinRateTable};
use crate::simulation::bans::{win_rate_grid, BanStrategy};
use crate::simulation::error::SimulationError;
use crate::simulation::output::SimulationOutput;
use crate::simulation::progress::{NoProgress, ProgressSink};
use crate::simulation::stats::WeightedMetric;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which statistic ranks lineups after a round, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    UnweightedMean,
    WeightedMean,
    UnweightedMedian,
}

impl SortType {
    pub fn key(&self, metric: &WeightedMetric) -> f64 {
        match self {
            SortType::UnweightedMean => metric.unweighted_mean,
            SortType::WeightedMean => metric.weighted_mean,
            SortType::UnweightedMedian => metric.median,
        }
    }
}

/// Parameters of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ban_strategy: BanStrategy,
    pub sort_type: SortType,
    /// After round `i`, keep the top `prune_ratios[i]` of the original population.
    /// The number of ratios is the number of rounds; the last ratio is never applied.
    pub prune_ratios: Vec<f64>,
    /// How many top lineups get best and worst matchup analysis
    pub analysis_receivers: usize,
    /// How many top lineups serve as opponents in that analysis
    pub analysis_participants: usize,
    /// How many lineups each round's output reports
    pub output_limit: usize,
    pub weight_type: LineupWeightType,
    /// Score lineups on the rayon thread pool
    pub parallel: bool,
    /// Decks the candidate lineups are built from; defaults to every deck seen on the player side
    pub player_pool: Option<Vec<String>>,
    /// Decks of a fixed opponent field; by default the candidates are also the field
    pub opponent_pool: Option<Vec<String>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            ban_strategy: BanStrategy::default(),
            sort_type: SortType::default(),
            prune_ratios: vec![0.0],
            analysis_receivers: 25,
            analysis_participants: 100,
            output_limit: 25,
            weight_type: LineupWeightType::default(),
            parallel: true,
            player_pool: None,
            opponent_pool: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.prune_ratios.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "At least one prune ratio is required".to_string(),
            ));
        }
        if let Some(ratio) = self.prune_ratios.iter().find(|r| !(0.0..=1.0).contains(*r)) {
            return Err(SimulationError::InvalidConfig(format!(
                "Prune ratio {} is outside [0, 1]",
                ratio
            )));
        }
        if self.output_limit == 0 {
            return Err(SimulationError::InvalidConfig(
                "Output limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of one scoring round
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub candidates: usize,
    pub field_size: usize,
    pub matchups_resolved: usize,
    pub pairs_skipped: usize,
    pub output: SimulationOutput,
}

/// A player lineup under evaluation
struct Candidate {
    /// Enumeration order, used to break ranking ties
    index: usize,
    lineup: Lineup,
    weight: f64,
    metric: WeightedMetric,
}

#[derive(Debug, Default, Clone, Copy)]
struct ScoreCounts {
    resolved: usize,
    skipped: usize,
}

type Field = Vec<(Arc<DeckSet>, f64)>;

pub struct SimulationDriver<'a> {
    table: &'a WinRateTable,
    config: SimulationConfig,
    player_pool: Vec<usize>,
    opponent_pool: Option<Vec<usize>>,
    progress: Box<dyn ProgressSink + 'a>,
}

/// Look up sanitized deck names in the table
fn resolve_pool(table: &WinRateTable, names: &[String]) -> Result<Vec<usize>, MatchupError> {
    names.iter().map(|name| table.deck_index(&sanitize(name))).collect()
}

impl<'a> SimulationDriver<'a> {
    pub fn new(table: &'a WinRateTable, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let player_pool = match &config.player_pool {
            Some(names) => resolve_pool(table, names)?,
            None => table.player_decks().to_vec(),
        };
        let opponent_pool = config
            .opponent_pool
            .as_deref()
            .map(|names| resolve_pool(table, names))
            .transpose()?;

        Ok(SimulationDriver {
            table,
            config,
            player_pool,
            opponent_pool,
            progress: Box::new(NoProgress),
        })
    }

    /// Report scoring progress to `progress`
    pub fn with_progress(mut self, progress: impl ProgressSink + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every round, returning one report per round; the last is the final result
    pub fn run(&self) -> Result<Vec<RoundReport>, SimulationError> {
        let catalog = LineupCatalog::new(self.table);
        let weight_type = self.config.weight_type;

        let mut candidates: Vec<Candidate> = catalog
            .weighted_lineups(&self.player_pool, weight_type)?
            .into_iter()
            .enumerate()
            .map(|(index, (lineup, weight))| Candidate {
                index,
                lineup,
                weight,
                metric: WeightedMetric::default(),
            })
            .collect();
        let fixed_field: Option<Field> = match &self.opponent_pool {
            Some(pool) => Some(
                catalog
                    .weighted_lineups(pool, weight_type)?
                    .into_iter()
                    .map(|(lineup, weight)| (lineup.decks().clone(), weight))
                    .collect(),
            ),
            None => None,
        };

        let original_size = candidates.len();
        info!("Matchups contain {} decks", self.table.num_decks());
        info!("Created {} lineups", original_size);

        let mut reports = Vec::with_capacity(self.config.prune_ratios.len());
        for (round, &ratio) in self.config.prune_ratios.iter().enumerate() {
            let field: Field = match &fixed_field {
                Some(field) => field.clone(),
                None => candidates
                    .iter()
                    .map(|c| (c.lineup.decks().clone(), c.weight))
                    .collect(),
            };

            info!(
                "Round {}: scoring {} lineups against a field of {}",
                round,
                candidates.len(),
                field.len()
            );
            let counts = self.score_round(round, &mut candidates, &field)?;
            self.rank(&mut candidates);

            info!("Round {}: best and worst matchup analysis", round);
            self.analyze(&mut candidates);

            let ranked: Vec<(&Lineup, WeightedMetric)> =
                candidates.iter().map(|c| (&c.lineup, c.metric)).collect();
            let output = SimulationOutput::build(&ranked, self.table, self.config.output_limit);
            if let Some(best) = output.top_lineups.first() {
                debug!(
                    "Round {} leader: {} ({:.4})",
                    round,
                    best.decks.join(" | "),
                    self.config.sort_type.key(&best.metric)
                );
            }

            reports.push(RoundReport {
                round,
                candidates: candidates.len(),
                field_size: field.len(),
                matchups_resolved: counts.resolved,
                pairs_skipped: counts.skipped,
                output,
            });

            if round + 1 < self.config.prune_ratios.len() {
                let keep = (original_size as f64 * ratio).floor() as usize;
                candidates.truncate(keep);
                debug!("Round {}: pruned to {} lineups", round, candidates.len());
                if candidates.is_empty() {
                    warn!("No lineups left after round {}", round);
                }
            }
        }

        Ok(reports)
    }

    fn score_round(
        &self,
        round: usize,
        candidates: &mut [Candidate],
        field: &[(Arc<DeckSet>, f64)],
    ) -> Result<ScoreCounts, SimulationError> {
        self.progress.start_round(round, candidates.len());
        let score = |candidate: &mut Candidate| {
            let counts = self.score(candidate, field);
            self.progress.lineup_scored();
            counts
        };
        let per_candidate: Vec<ScoreCounts> = if self.config.parallel {
            candidates.par_iter_mut().map(score).collect::<Result<_, _>>()?
        } else {
            candidates.iter_mut().map(score).collect::<Result<_, _>>()?
        };
        self.progress.finish_round();

        Ok(per_candidate.iter().fold(ScoreCounts::default(), |total, c| ScoreCounts {
            resolved: total.resolved + c.resolved,
            skipped: total.skipped + c.skipped,
        }))
    }

    /// Score one candidate against the whole field, resetting its metadata first
    fn score(&self, candidate: &mut Candidate, field: &[(Arc<DeckSet>, f64)]) -> Result<ScoreCounts, SimulationError> {
        candidate.lineup.reset_metadata();
        let mut builder = WeightedMetric::builder();
        let mut counts = ScoreCounts::default();

        for (opponent, weight) in field {
            if !can_play(self.table, candidate.lineup.decks(), opponent) {
                continue;
            }
            match self.config.ban_strategy.resolve(&mut candidate.lineup, opponent, self.table) {
                Ok(win_rate) => {
                    // Lineups nobody plays still count toward the unweighted statistics
                    if *weight == 0.0 {
                        builder.add_without_weight(win_rate)?;
                    } else {
                        builder.add(win_rate, *weight)?;
                    }
                    counts.resolved += 1;
                }
                Err(SimulationError::Matchup(
                    error @ (MatchupError::IncompleteData(_) | MatchupError::NotFound(_)),
                )) => {
                    warn!("Skipping {} vs {}: {}", candidate.lineup, opponent, error);
                    counts.skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }

        candidate.metric = builder.build();
        Ok(counts)
    }

    /// Sort best first; equal scores keep enumeration order
    fn rank(&self, candidates: &mut [Candidate]) {
        let sort_type = self.config.sort_type;
        candidates.sort_by(|a, b| {
            sort_type
                .key(&b.metric)
                .total_cmp(&sort_type.key(&a.metric))
                .then(a.index.cmp(&b.index))
        });
    }

    /// Record matchups of the top receivers against the top participants they can play
    fn analyze(&self, candidates: &mut [Candidate]) {
        let participants: Field = candidates
            .iter()
            .take(self.config.analysis_participants)
            .map(|c| (c.lineup.decks().clone(), c.weight))
            .collect();
        let receivers = self.config.analysis_receivers.min(candidates.len());

        let analyze_one = |candidate: &mut Candidate| {
            for (opponent, weight) in &participants {
                if !can_play(self.table, candidate.lineup.decks(), opponent) {
                    continue;
                }
                let outcome = win_rate_grid(self.table, candidate.lineup.decks(), opponent)
                    .map_err(SimulationError::from)
                    .and_then(|grid| self.config.ban_strategy.evaluate(&grid));
                match outcome {
                    Ok(outcome) => candidate
                        .lineup
                        .metadata_mut()
                        .apply_matchup(opponent.clone(), outcome.win_rate, *weight),
                    Err(error) => warn!("Skipping analysis of {} vs {}: {}", candidate.lineup, opponent, error),
                }
            }
        };

        if self.config.parallel {
            candidates[..receivers].par_iter_mut().for_each(analyze_one);
        } else {
            candidates[..receivers].iter_mut().for_each(analyze_one);
        }
    }
}
