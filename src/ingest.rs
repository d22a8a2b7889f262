//! Readers for matchup data files.
//!
//! Three formats are supported:
//! - matrix CSV: the first row holds opponent deck names, the second their play rates, and every
//!   following row a player deck name and its wins per 100 games against each opponent
//! - long CSV: a `player,opponent,games,wins` header followed by one observation per row
//! - JSON: an array of observations
//!
//! Blank lines and lines starting with `#` or `//` are ignored in both CSV formats.

use crate::matchup::{sanitize, MatchupError, Observation, WinRateTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Games assumed behind each matrix cell, whose values are wins per 100 games
pub const MATRIX_GAMES: u32 = 100;

const LONG_HEADER: [&str; 4] = ["player", "opponent", "games", "wins"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid matchup file at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Matchup error: {0}")]
    Matchup(#[from] MatchupError),
}

/// Layout of a matchup data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Matrix,
    Long,
    Json,
}

impl DataFormat {
    /// Guess the format from the file extension and first data line
    pub fn detect(path: &Path, content: &str) -> DataFormat {
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            return DataFormat::Json;
        }
        match data_lines(content).next() {
            Some((_, line)) if is_long_header(line) => DataFormat::Long,
            _ => DataFormat::Matrix,
        }
    }
}

/// Observations read from a file, plus opponent play rates when the file carries them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupData {
    pub observations: Vec<Observation>,
    pub play_rates: Option<HashMap<String, f64>>,
}

impl MatchupData {
    /// Build the win-rate table, using the file's play rates as deck weights when present
    pub fn into_table(self) -> Result<WinRateTable, MatchupError> {
        let table = WinRateTable::build(self.observations)?;
        match self.play_rates {
            Some(play_rates) => table.with_play_rates(&play_rates),
            None => Ok(table),
        }
    }
}

/// Non-comment lines with their 1-based line numbers
fn data_lines<'a>(content: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
}

fn is_long_header(line: &str) -> bool {
    let fields: Vec<String> = line.split(',').map(|f| f.trim().to_ascii_lowercase()).collect();
    fields.len() == LONG_HEADER.len() && fields.iter().zip(LONG_HEADER).all(|(f, h)| f == h)
}

fn invalid(line: usize, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidFormat {
        line,
        reason: reason.into(),
    }
}

/// Read and parse a matchup file, detecting its format unless one is given
pub fn read_matchup_file(path: impl AsRef<Path>, format: Option<DataFormat>) -> Result<MatchupData, IngestError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    match format.unwrap_or_else(|| DataFormat::detect(path, &content)) {
        DataFormat::Matrix => parse_matrix_csv(&content),
        DataFormat::Long => parse_long_csv(&content),
        DataFormat::Json => parse_json(&content),
    }
}

/// Parse the matrix CSV layout.
///
/// Empty cells are matchups without data. Mirror cells always become an even matchup.
pub fn parse_matrix_csv(content: &str) -> Result<MatchupData, IngestError> {
    let mut lines = data_lines(content);
    let (header_line, header) = lines
        .next()
        .ok_or_else(|| invalid(1, "Missing opponent header row"))?;
    let opponents: Vec<String> = header.split(',').skip(1).map(sanitize).collect();
    if opponents.is_empty() {
        return Err(invalid(header_line, "Header row has no opponent decks"));
    }

    let (rates_line, rates) = lines
        .next()
        .ok_or_else(|| invalid(header_line + 1, "Missing play rate row"))?;
    let rate_fields: Vec<&str> = rates.split(',').skip(1).collect();
    if rate_fields.len() != opponents.len() {
        return Err(invalid(
            rates_line,
            format!("Expected {} play rates, found {}", opponents.len(), rate_fields.len()),
        ));
    }
    let mut play_rates = HashMap::new();
    for (opponent, field) in opponents.iter().zip(rate_fields) {
        let rate: f64 = field
            .trim()
            .parse()
            .map_err(|_| invalid(rates_line, format!("'{}' is not a valid play rate", field.trim())))?;
        play_rates.insert(opponent.clone(), rate);
    }

    let mut observations = Vec::new();
    for (line_num, line) in lines {
        let mut fields = line.split(',');
        let player = sanitize(fields.next().unwrap_or_default());
        if player.is_empty() {
            return Err(invalid(line_num, "Missing player deck name"));
        }
        let cells: Vec<&str> = fields.collect();
        if cells.len() > opponents.len() {
            return Err(invalid(
                line_num,
                format!("Expected at most {} win values, found {}", opponents.len(), cells.len()),
            ));
        }

        for (opponent, cell) in opponents.iter().zip(cells) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            if *opponent == player {
                observations.push(Observation::new(&player, opponent, MATRIX_GAMES, MATRIX_GAMES / 2));
                continue;
            }
            let wins: f64 = cell
                .parse()
                .map_err(|_| invalid(line_num, format!("'{}' is not a valid win count", cell)))?;
            if !(0.0..=MATRIX_GAMES as f64).contains(&wins) {
                return Err(invalid(
                    line_num,
                    format!("Win count {} is outside [0, {}]", wins, MATRIX_GAMES),
                ));
            }
            // Fractional percentages are truncated to whole wins
            observations.push(Observation::new(&player, opponent, MATRIX_GAMES, wins as u32));
        }
    }

    Ok(MatchupData {
        observations,
        play_rates: Some(play_rates),
    })
}

/// Parse the long CSV layout, one `player,opponent,games,wins` observation per row
pub fn parse_long_csv(content: &str) -> Result<MatchupData, IngestError> {
    let mut lines = data_lines(content);
    match lines.next() {
        Some((_, header)) if is_long_header(header) => {}
        Some((line_num, _)) => {
            return Err(invalid(line_num, "Expected header 'player,opponent,games,wins'"));
        }
        None => return Err(invalid(1, "Missing header row")),
    }

    let mut observations = Vec::new();
    for (line_num, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != LONG_HEADER.len() {
            return Err(invalid(
                line_num,
                format!("Expected 4 fields, found {}", fields.len()),
            ));
        }
        let games: u32 = fields[2]
            .parse()
            .map_err(|_| invalid(line_num, format!("'{}' is not a valid game count", fields[2])))?;
        let wins: u32 = fields[3]
            .parse()
            .map_err(|_| invalid(line_num, format!("'{}' is not a valid win count", fields[3])))?;
        observations.push(Observation::new(&sanitize(fields[0]), &sanitize(fields[1]), games, wins));
    }

    Ok(MatchupData {
        observations,
        play_rates: None,
    })
}

/// Parse a JSON array of observations
pub fn parse_json(content: &str) -> Result<MatchupData, IngestError> {
    let mut observations: Vec<Observation> = serde_json::from_str(content)?;
    for observation in &mut observations {
        observation.player = sanitize(&observation.player);
        observation.opponent = sanitize(&observation.opponent);
    }
    Ok(MatchupData {
        observations,
        play_rates: None,
    })
}
