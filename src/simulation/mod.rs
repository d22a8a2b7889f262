pub mod bans;
pub mod best_of_three;
pub mod driver;
pub mod error;
pub mod output;
pub mod progress;
pub mod stats;

pub use bans::{win_rate_grid, BanOutcome, BanStrategy};
pub use best_of_three::{drop_banned_and_flatten, post_ban_grid, win_rate_best_of_three, WinRateGrid};
pub use driver::{RoundReport, SimulationConfig, SimulationDriver, SortType};
pub use error::SimulationError;
pub use output::{meta_composition, LineupReport, MetaShare, SimulationOutput};
pub use progress::{BarProgress, NoProgress, ProgressSink};
pub use stats::{MetricError, WeightedMetric, WeightedMetricBuilder};
