use crate::matchup::MatchupError;
use crate::simulation::stats::MetricError;
use crate::solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Matchup(#[from] MatchupError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<MetricError> for SimulationError {
    fn from(error: MetricError) -> Self {
        match error {
            MetricError::InvalidInput(reason) => SimulationError::InvalidInput(reason),
        }
    }
}
