use crate::lineup::{Lineup, MatchupRecord, PLAYER_DECK_COUNT};
use crate::matchup::WinRateTable;
use crate::simulation::stats::WeightedMetric;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A best or worst matchup, by opponent deck names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupSummary {
    pub opponent: [String; PLAYER_DECK_COUNT],
    pub win_rate: f64,
    pub weight: f64,
}

impl From<&MatchupRecord> for MatchupSummary {
    fn from(record: &MatchupRecord) -> Self {
        MatchupSummary {
            opponent: record.opponent.names().clone(),
            win_rate: record.win_rate,
            weight: record.weight,
        }
    }
}

/// How often one opponent deck was banned when faced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckBanSummary {
    pub deck: String,
    pub played_against: u32,
    pub banned: f64,
    pub ban_rate: f64,
}

/// Everything reported for one retained lineup
#[derive(Debug, Clone, Serialize)]
pub struct LineupReport {
    pub decks: [String; PLAYER_DECK_COUNT],
    pub metric: WeightedMetric,
    pub best_matchups: Vec<MatchupSummary>,
    pub worst_matchups: Vec<MatchupSummary>,
    /// Faced decks, most banned first
    pub bans: Vec<DeckBanSummary>,
    /// Snapshot of the lineup, unaffected by later rounds
    #[serde(skip)]
    pub lineup: Lineup,
}

impl LineupReport {
    fn new(lineup: &Lineup, metric: WeightedMetric, table: &WinRateTable) -> Self {
        let lineup = lineup.clone();
        let metadata = lineup.metadata();

        let mut bans: Vec<DeckBanSummary> = metadata
            .played_against()
            .iter()
            .zip(metadata.banned())
            .enumerate()
            .filter_map(|(deck, (&played, &banned))| {
                if played == 0 {
                    return None;
                }
                table.deck_name(deck).ok().map(|name| DeckBanSummary {
                    deck: name.to_string(),
                    played_against: played,
                    banned,
                    ban_rate: banned / played as f64,
                })
            })
            .collect();
        bans.sort_by(|a, b| b.ban_rate.total_cmp(&a.ban_rate));

        LineupReport {
            decks: lineup.decks().names().clone(),
            metric,
            best_matchups: metadata.best_matchups().iter().map(MatchupSummary::from).collect(),
            worst_matchups: metadata.worst_matchups().iter().map(MatchupSummary::from).collect(),
            bans,
            lineup,
        }
    }
}

/// Share of ranked lineups containing a deck
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaShare {
    pub deck: String,
    pub share: f64,
}

/// Terminal result of a simulation round
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    /// Best lineups first
    pub top_lineups: Vec<LineupReport>,
    /// Every deck of the table, most played first; shares sum to 3
    pub meta_composition: Vec<MetaShare>,
}

impl SimulationOutput {
    /// Build the output from lineups already sorted best first
    pub fn build(ranked: &[(&Lineup, WeightedMetric)], table: &WinRateTable, limit: usize) -> Self {
        SimulationOutput {
            top_lineups: limit_and_copy_top_lineups(ranked, table, limit),
            meta_composition: meta_composition(ranked.iter().map(|&(lineup, _)| lineup), table),
        }
    }
}

/// Report the first `limit` ranked lineups, copying them so later rounds leave them untouched
pub fn limit_and_copy_top_lineups(
    ranked: &[(&Lineup, WeightedMetric)],
    table: &WinRateTable,
    limit: usize,
) -> Vec<LineupReport> {
    ranked
        .iter()
        .take(limit)
        .map(|&(lineup, metric)| LineupReport::new(lineup, metric, table))
        .collect()
}

/// Fraction of `lineups` each table deck appears in, sorted descending.
///
/// Decks of equal share keep table order.
pub fn meta_composition<'a, I>(lineups: I, table: &WinRateTable) -> Vec<MetaShare>
where
    I: IntoIterator<Item = &'a Lineup>,
{
    let mut counts: HashMap<usize, usize> = HashMap::new();
    let mut total = 0usize;
    for lineup in lineups {
        total += 1;
        for &deck in lineup.decks().decks() {
            *counts.entry(deck).or_insert(0) += 1;
        }
    }

    let mut shares: Vec<MetaShare> = table
        .deck_names()
        .iter()
        .enumerate()
        .map(|(deck, name)| {
            let count = counts.get(&deck).copied().unwrap_or(0);
            MetaShare {
                deck: name.clone(),
                share: if total > 0 { count as f64 / total as f64 } else { 0.0 },
            }
        })
        .collect();
    shares.sort_by(|a, b| b.share.total_cmp(&a.share));
    shares
}

impl fmt::Display for SimulationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top lineups:")?;
        for (rank, report) in self.top_lineups.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {:<60} mean {:>6.2}%  weighted {:>6.2}%  median {:>6.2}%  sd {:.4}",
                rank + 1,
                report.decks.join(" | "),
                report.metric.unweighted_mean * 100.0,
                report.metric.weighted_mean * 100.0,
                report.metric.median * 100.0,
                report.metric.std_dev,
            )?;
            for best in &report.best_matchups {
                writeln!(f, "       + {:>6.2}% vs {}", best.win_rate * 100.0, best.opponent.join(" | "))?;
            }
            for worst in &report.worst_matchups {
                writeln!(f, "       - {:>6.2}% vs {}", worst.win_rate * 100.0, worst.opponent.join(" | "))?;
            }
            if let Some(top_ban) = report.bans.first() {
                writeln!(f, "       most banned: {} ({:.1}%)", top_ban.deck, top_ban.ban_rate * 100.0)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Meta composition:")?;
        for share in self.meta_composition.iter().filter(|s| s.share > 0.0) {
            writeln!(f, "  {:<40} {:>6.2}%", share.deck, share.share * 100.0)?;
        }
        Ok(())
    }
}
