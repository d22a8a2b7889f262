//! Best-of-three resolution after bans.
//!
//! Once each side has banned one deck, both players hold two decks. A game winner may not
//! play the deck they won with again, the loser may. The first game's pairing is uniform.

use crate::lineup::PLAYER_DECK_COUNT;
use crate::simulation::error::SimulationError;

/// A 3x3 grid of player-deck vs opponent-deck win rates
pub type WinRateGrid = [[f64; PLAYER_DECK_COUNT]; PLAYER_DECK_COUNT];

/// Win probability of a best-of-three given the flattened 2x2 post-ban grid
/// `[red_red, red_blue, blue_red, blue_blue]` (player deck, opponent deck).
pub fn win_rate_best_of_three(win_rates: &[f64]) -> Result<f64, SimulationError> {
    let [red_red, red_blue, blue_red, blue_blue] = match win_rates {
        &[a, b, c, d] => [a, b, c, d],
        _ => {
            return Err(SimulationError::InvalidInput(format!(
                "Expected 4 win rates, got {}",
                win_rates.len()
            )))
        }
    };
    if let Some(bad) = win_rates.iter().find(|w| !(0.0..=1.0).contains(*w)) {
        return Err(SimulationError::InvalidInput(format!(
            "Win rate {} is outside [0, 1]",
            bad
        )));
    }

    // Won game 1 with one deck: the other deck needs one win out of the two remaining games
    let win_either_red = 1.0 - (1.0 - red_red) * (1.0 - red_blue);
    let win_either_blue = 1.0 - (1.0 - blue_red) * (1.0 - blue_blue);
    let win_either_avg = (win_either_red + win_either_blue) / 2.0;

    // Lost game 1: both of our decks must beat the deck that just won
    let win_both_red = red_red * blue_red;
    let win_both_blue = red_blue * blue_blue;
    let win_both_avg = (win_both_red + win_both_blue) / 2.0;

    let win_first_game = (red_red + red_blue + blue_red + blue_blue) / 4.0;
    let lose_first_game = 1.0 - win_first_game;

    Ok(win_first_game * win_either_avg + lose_first_game * win_both_avg)
}

/// Remove the banned player deck row and opponent deck column, flattening row-major
pub fn drop_banned_and_flatten(
    grid: &WinRateGrid,
    player_ban: usize,
    opponent_ban: usize,
) -> Result<[f64; 4], SimulationError> {
    if player_ban >= PLAYER_DECK_COUNT || opponent_ban >= PLAYER_DECK_COUNT {
        return Err(SimulationError::InvalidInput(format!(
            "Ban slots ({}, {}) out of range",
            player_ban, opponent_ban
        )));
    }

    let mut flat = [0.0; 4];
    let mut next = 0;
    for (i, row) in grid.iter().enumerate() {
        if i == player_ban {
            continue;
        }
        for (j, &rate) in row.iter().enumerate() {
            if j != opponent_ban {
                flat[next] = rate;
                next += 1;
            }
        }
    }
    Ok(flat)
}

/// Best-of-three win rate for every pair of bans: `P[i][j]` is the result when player
/// deck `i` and opponent deck `j` are banned.
pub fn post_ban_grid(grid: &WinRateGrid) -> Result<WinRateGrid, SimulationError> {
    let mut post_ban = [[0.0; PLAYER_DECK_COUNT]; PLAYER_DECK_COUNT];
    for (i, row) in post_ban.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = win_rate_best_of_three(&drop_banned_and_flatten(grid, i, j)?)?;
        }
    }
    Ok(post_ban)
}
