pub mod ingest;
pub mod lineup;
pub mod matchup;
pub mod rng;
pub mod simulation;
pub mod solver;

#[cfg(test)]
mod integration_tests;
