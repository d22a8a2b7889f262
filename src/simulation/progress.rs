use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Receives progress updates while the driver scores a round.
///
/// Called from worker threads, so implementations must be `Sync`.
pub trait ProgressSink: Sync {
    /// A round starts scoring `total` player lineups
    fn start_round(&self, _round: usize, _total: usize) {}

    /// One more player lineup has been scored
    fn lineup_scored(&self) {}

    fn finish_round(&self) {}
}

/// Discards all progress updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Terminal progress bar, one bar per round
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|bar| bar.clone())
    }
}

impl ProgressSink for BarProgress {
    fn start_round(&self, round: usize, total: usize) {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len} lineups ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message(format!("Round {}", round + 1));

        if let Ok(mut current) = self.bar.lock() {
            if let Some(previous) = current.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn lineup_scored(&self) {
        if let Some(bar) = self.current() {
            bar.inc(1);
        }
    }

    fn finish_round(&self) {
        if let Ok(mut current) = self.bar.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }
    }
}
