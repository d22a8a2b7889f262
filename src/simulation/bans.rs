use crate::lineup::{DeckSet, Lineup, PLAYER_DECK_COUNT};
use crate::matchup::{MatchupError, WinRateTable};
use crate::simulation::best_of_three::{drop_banned_and_flatten, post_ban_grid, win_rate_best_of_three, WinRateGrid};
use crate::simulation::error::SimulationError;
use crate::solver::ZeroSumGame;
use serde::{Deserialize, Serialize};

/// How both sides choose which opponent deck to ban
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BanStrategy {
    /// Each side bans the deck with the best aggregate matchups
    Naive,
    /// Both sides play the equilibrium of the ban game
    #[default]
    Nash,
}

/// Result of resolving one 3x3 grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BanOutcome {
    /// Player's win rate after bans
    pub win_rate: f64,
    /// Ban amount credited to each opponent deck slot; sums to 1
    pub bans: [f64; PLAYER_DECK_COUNT],
}

/// Read the player vs opponent win rates for every deck pairing
pub fn win_rate_grid(table: &WinRateTable, player: &DeckSet, opponent: &DeckSet) -> Result<WinRateGrid, MatchupError> {
    let mut grid = [[0.0; PLAYER_DECK_COUNT]; PLAYER_DECK_COUNT];
    for (i, row) in grid.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = table.win_rate(player.deck(i), opponent.deck(j))?.ok_or_else(|| {
                MatchupError::IncompleteData(format!("{} vs {}", player.name(i), opponent.name(j)))
            })?;
        }
    }
    Ok(grid)
}

/// Index of the first maximum
fn first_max(values: &[f64; PLAYER_DECK_COUNT]) -> usize {
    let mut best = 0;
    for i in 1..PLAYER_DECK_COUNT {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}

/// Index of the first minimum
fn first_min(values: &[f64; PLAYER_DECK_COUNT]) -> usize {
    let mut best = 0;
    for i in 1..PLAYER_DECK_COUNT {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

impl BanStrategy {
    /// Pick bans for `grid` and compute the post-ban win rate without touching any lineup
    pub fn evaluate(&self, grid: &WinRateGrid) -> Result<BanOutcome, SimulationError> {
        match self {
            BanStrategy::Naive => Self::evaluate_naive(grid),
            BanStrategy::Nash => Self::evaluate_nash(grid),
        }
    }

    fn evaluate_naive(grid: &WinRateGrid) -> Result<BanOutcome, SimulationError> {
        // The opponent bans our deck with the best total, we ban their deck we do worst against
        let row_sums: [f64; PLAYER_DECK_COUNT] = std::array::from_fn(|i| grid[i].iter().sum());
        let mut column_sums = [0.0; PLAYER_DECK_COUNT];
        for row in grid {
            for (j, rate) in row.iter().enumerate() {
                column_sums[j] += rate;
            }
        }

        let player_ban = first_max(&row_sums);
        let opponent_ban = first_min(&column_sums);
        let win_rate = win_rate_best_of_three(&drop_banned_and_flatten(grid, player_ban, opponent_ban)?)?;

        let mut bans = [0.0; PLAYER_DECK_COUNT];
        bans[opponent_ban] = 1.0;
        Ok(BanOutcome { win_rate, bans })
    }

    fn evaluate_nash(grid: &WinRateGrid) -> Result<BanOutcome, SimulationError> {
        let post_ban = post_ban_grid(grid)?;

        // The player maximizes over rows; their row strategy is credited to opponent deck slots
        let payoff: Vec<Vec<f64>> = post_ban.iter().map(|row| row.to_vec()).collect();
        let game = ZeroSumGame::solve(&payoff)?;

        let mut bans = [0.0; PLAYER_DECK_COUNT];
        bans.copy_from_slice(game.row_strategy());
        Ok(BanOutcome {
            win_rate: game.value(),
            bans,
        })
    }

    /// Resolve `player` against `opponent`, recording exposure and bans on the player's metadata.
    ///
    /// Exposure to the opponent's decks is recorded even when the grid turns out incomplete.
    pub fn resolve(&self, player: &mut Lineup, opponent: &DeckSet, table: &WinRateTable) -> Result<f64, SimulationError> {
        let metadata = player.metadata_mut();
        for &deck in opponent.decks() {
            metadata.increment_played_against(deck)?;
        }

        let grid = win_rate_grid(table, player.decks(), opponent)?;
        let outcome = self.evaluate(&grid)?;

        let metadata = player.metadata_mut();
        for (slot, &amount) in outcome.bans.iter().enumerate() {
            if amount > 0.0 {
                metadata.increment_banned_by(opponent.deck(slot), amount)?;
            }
        }
        Ok(outcome.win_rate)
    }
}
