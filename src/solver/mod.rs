pub mod simplex;
pub mod zero_sum;

pub use simplex::{LinearProgram, SolverError};
pub use zero_sum::ZeroSumGame;
