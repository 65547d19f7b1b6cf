use std::collections::VecDeque;

use crate::models::Reading;

/// Bounded FIFO of recent smoothed readings; the oldest entry is evicted first
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<Reading>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        History {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.entries.iter().cloned().collect()
    }
}
