pub mod names;
pub mod synthetic;
pub mod table;

pub use names::{all_components_unique, sanitize};
pub use synthetic::{synthetic_observations, SyntheticParams};
pub use table::{MatchupError, Observation, WinRateTable, WIN_RATE_TOLERANCE};
