use crate::lineup::types::DeckSet;
use crate::matchup::MatchupError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// How many best and worst matchups to keep track of
pub const NUM_BEST_WORST_MATCHUPS: usize = 5;

/// Ban increments are rounded to 1e-8 to keep solver noise out of the counts
const BAN_ROUNDING_SCALE: f64 = 1e8;

/// One recorded matchup against an opponent lineup
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupRecord {
    pub opponent: Arc<DeckSet>,
    pub win_rate: f64,
    pub weight: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    record: MatchupRecord,
}

/// Heap order for the best tracker: the top is the entry to evict
/// (lowest win rate, latest insertion on ties)
#[derive(Debug, Clone)]
struct BestEntry(Entry);

/// Heap order for the worst tracker: the top is the entry to evict
/// (highest win rate, latest insertion on ties)
#[derive(Debug, Clone)]
struct WorstEntry(Entry);

impl Ord for BestEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .record
            .win_rate
            .total_cmp(&self.0.record.win_rate)
            .then(self.0.seq.cmp(&other.0.seq))
    }
}

impl PartialOrd for BestEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BestEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BestEntry {}

impl Ord for WorstEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .record
            .win_rate
            .total_cmp(&other.0.record.win_rate)
            .then(self.0.seq.cmp(&other.0.seq))
    }
}

impl PartialOrd for WorstEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for WorstEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WorstEntry {}

/// Bounded recorder of the best and worst matchups seen during a pass
#[derive(Debug, Clone)]
pub struct MatchupTracker {
    capacity: usize,
    next_seq: u64,
    best: BinaryHeap<BestEntry>,
    worst: BinaryHeap<WorstEntry>,
}

impl MatchupTracker {
    pub fn new(capacity: usize) -> Self {
        MatchupTracker {
            capacity,
            next_seq: 0,
            best: BinaryHeap::with_capacity(capacity + 1),
            worst: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    /// Record a matchup, evicting from each side once it exceeds capacity
    pub fn apply_matchup(&mut self, opponent: Arc<DeckSet>, win_rate: f64, weight: f64) {
        let entry = Entry {
            seq: self.next_seq,
            record: MatchupRecord {
                opponent,
                win_rate,
                weight,
            },
        };
        self.next_seq += 1;

        self.best.push(BestEntry(entry.clone()));
        if self.best.len() > self.capacity {
            self.best.pop();
        }
        self.worst.push(WorstEntry(entry));
        if self.worst.len() > self.capacity {
            self.worst.pop();
        }
    }

    /// Best matchups, highest win rate first
    pub fn best_matchups(&self) -> Vec<MatchupRecord> {
        // Eviction candidates sort last, so ascending heap order is best-first
        self.best
            .clone()
            .into_sorted_vec()
            .into_iter()
            .map(|e| e.0.record)
            .collect()
    }

    /// Worst matchups, lowest win rate first
    pub fn worst_matchups(&self) -> Vec<MatchupRecord> {
        self.worst
            .clone()
            .into_sorted_vec()
            .into_iter()
            .map(|e| e.0.record)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn clear(&mut self) {
        self.next_seq = 0;
        self.best.clear();
        self.worst.clear();
    }
}

impl PartialEq for MatchupTracker {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity
            && self.best_matchups() == other.best_matchups()
            && self.worst_matchups() == other.worst_matchups()
    }
}

/// Mutable statistics gathered for one lineup during a scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct LineupMetadata {
    played_against: Vec<u32>,
    banned: Vec<f64>,
    matchups: MatchupTracker,
}

impl LineupMetadata {
    pub fn new(num_decks: usize) -> Self {
        LineupMetadata {
            played_against: vec![0; num_decks],
            banned: vec![0.0; num_decks],
            matchups: MatchupTracker::new(NUM_BEST_WORST_MATCHUPS),
        }
    }

    fn check_deck(&self, deck: usize) -> Result<(), MatchupError> {
        if deck >= self.played_against.len() {
            return Err(MatchupError::NotFound(format!("deck index {}", deck)));
        }
        Ok(())
    }

    pub fn increment_played_against(&mut self, deck: usize) -> Result<(), MatchupError> {
        self.check_deck(deck)?;
        self.played_against[deck] += 1;
        Ok(())
    }

    pub fn increment_banned(&mut self, deck: usize) -> Result<(), MatchupError> {
        self.increment_banned_by(deck, 1.0)
    }

    /// Add a fractional ban, rounded to 1e-8
    pub fn increment_banned_by(&mut self, deck: usize, amount: f64) -> Result<(), MatchupError> {
        self.check_deck(deck)?;
        self.banned[deck] += (amount * BAN_ROUNDING_SCALE).round() / BAN_ROUNDING_SCALE;
        Ok(())
    }

    pub fn apply_matchup(&mut self, opponent: Arc<DeckSet>, win_rate: f64, weight: f64) {
        self.matchups.apply_matchup(opponent, win_rate, weight);
    }

    pub fn played_against(&self) -> &[u32] {
        &self.played_against
    }

    pub fn banned(&self) -> &[f64] {
        &self.banned
    }

    pub fn best_matchups(&self) -> Vec<MatchupRecord> {
        self.matchups.best_matchups()
    }

    pub fn worst_matchups(&self) -> Vec<MatchupRecord> {
        self.matchups.worst_matchups()
    }

    /// Clear every field, keeping the deck universe size
    pub fn reset(&mut self) {
        self.played_against.iter_mut().for_each(|c| *c = 0);
        self.banned.iter_mut().for_each(|b| *b = 0.0);
        self.matchups.clear();
    }
}
