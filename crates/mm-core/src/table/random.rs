//! Uniform random pick over an ordered list.

use std::sync::Mutex;

use rand::Rng;
use rand::rngs::StdRng;

use super::{TableIssue, table_rng, with_rng};

/// An append-only list of items drawn uniformly at random.
#[derive(Debug)]
pub struct RandomTable {
    items: Vec<String>,
    rng: Mutex<StdRng>,
}

impl Default for RandomTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomTable {
    /// Create an empty table seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            rng: table_rng(None),
        }
    }

    /// Create an empty table with a deterministic random source.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            items: Vec::new(),
            rng: table_rng(Some(seed)),
        }
    }

    /// Create an empty table drawing from the given random source.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            items: Vec::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Append an item.
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// Pick one item uniformly, or `None` if the table is empty.
    pub fn get_item(&self) -> Option<&str> {
        if self.items.is_empty() {
            return None;
        }
        let idx = with_rng(&self.rng, |rng| rng.random_range(0..self.items.len()));
        Some(&self.items[idx])
    }

    /// The items in insertion order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Every item, duplicates preserved.
    pub fn all_items(&self) -> Vec<String> {
        self.items.clone()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// An empty random table is the only structural problem.
    pub fn validate(&self) -> Vec<TableIssue> {
        if self.items.is_empty() {
            vec![TableIssue::Empty]
        } else {
            Vec::new()
        }
    }
}
