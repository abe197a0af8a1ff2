//! Non-repeating shuffle order over the indices of the active track list.

use std::collections::HashSet;

use rand::seq::IteratorRandom;

/// Remembers which indices of a list of `size` tracks were already played in
/// the current cycle, and hands out random unplayed ones.
///
/// Picking and marking are separate steps: `next_unplayed_index` never
/// consumes the index, `mark_played` does.
#[derive(Debug, Default)]
pub struct ShuffleTracker {
    size: usize,
    played: HashSet<usize>,
}

impl ShuffleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over for a list of `size` tracks.
    pub fn initialize(&mut self, size: usize) {
        self.size = size;
        self.played.clear();
    }

    /// Out-of-range indices are ignored.
    pub fn mark_played(&mut self, index: usize) {
        if index < self.size {
            self.played.insert(index);
        }
    }

    pub fn is_all_played(&self) -> bool {
        self.size > 0 && self.played.len() >= self.size
    }

    /// Forget the current cycle; the list size is kept.
    pub fn reset(&mut self) {
        self.played.clear();
    }

    pub fn next_unplayed_index(&self) -> Option<usize> {
        (0..self.size)
            .filter(|i| !self.played.contains(i))
            .choose(&mut rand::rng())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn played_count(&self) -> usize {
        self.played.len()
    }
}
