//! Dice-indexed tables.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use rand::rngs::StdRng;
use tracing::warn;

use super::{TableIssue, table_rng, with_rng};
use crate::dice::DiceSpec;

/// A sparse map from roll totals to items, rolled with a dice spec.
///
/// One row may cover several totals (a `3-6` row maps 3, 4, 5 and 6 to the
/// same text).
#[derive(Debug)]
pub struct RollingTable {
    dice: String,
    spec: Option<DiceSpec>,
    items: BTreeMap<i64, String>,
    duplicates: Vec<(i64, String)>,
    rng: Mutex<StdRng>,
}

impl RollingTable {
    /// Create an empty table rolled with `dice`, seeded from OS entropy.
    ///
    /// An unparsable spec is kept as-is: the table draws nothing and
    /// [`validate`](Self::validate) reports it.
    pub fn new(dice: impl Into<String>) -> Self {
        let dice = dice.into();
        let spec = dice.parse().ok();
        Self {
            dice,
            spec,
            items: BTreeMap::new(),
            duplicates: Vec::new(),
            rng: table_rng(None),
        }
    }

    /// Build a table from `(roll, item)` pairs without duplicate tracking.
    pub fn from_items(
        dice: impl Into<String>,
        items: impl IntoIterator<Item = (i64, String)>,
    ) -> Self {
        let mut table = Self::new(dice);
        table.items.extend(items);
        table
    }

    /// Replace the random source with a deterministic one.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: table_rng(Some(seed)),
            ..self
        }
    }

    /// Replace the random source.
    pub fn with_rng(self, rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ..self
        }
    }

    /// Map `item` to every total in `positions`. A total that already has
    /// an item is overwritten and logged.
    pub fn add_item(&mut self, item: impl Into<String>, positions: &[i64]) {
        let item = item.into();
        for &roll in positions {
            if self.items.contains_key(&roll) {
                warn!(dice = %self.dice, roll, item = %item, "duplicate item for roll");
                self.duplicates.push((roll, item.clone()));
            }
            self.items.insert(roll, item.clone());
        }
    }

    /// Roll the dice and return the mapped item, or `None` when the total
    /// has no item or the dice spec is invalid.
    pub fn get_item(&self) -> Option<&str> {
        let spec = self.spec?;
        let roll = with_rng(&self.rng, |rng| spec.roll(rng));
        self.items.get(&roll).map(String::as_str)
    }

    /// The dice spec text.
    pub fn dice(&self) -> &str {
        &self.dice
    }

    /// The parsed dice spec, if valid.
    pub fn spec(&self) -> Option<DiceSpec> {
        self.spec
    }

    /// The roll-to-item map.
    pub fn entries(&self) -> &BTreeMap<i64, String> {
        &self.items
    }

    /// Distinct item texts in roll order.
    pub fn all_items(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .values()
            .filter(|item| seen.insert(item.as_str()))
            .cloned()
            .collect()
    }

    /// Number of mapped totals.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no totals are mapped.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check dice coverage: every mapped total must be rollable and every
    /// rollable total must be mapped. Unmapped totals are reported as runs.
    /// Duplicate rows are reported too.
    pub fn validate(&self) -> Vec<TableIssue> {
        let mut issues: Vec<TableIssue> = self
            .duplicates
            .iter()
            .map(|(roll, item)| TableIssue::DuplicateRoll {
                roll: *roll,
                item: item.clone(),
            })
            .collect();

        let Some(spec) = self.spec else {
            issues.push(TableIssue::InvalidDice {
                dice: self.dice.clone(),
            });
            return issues;
        };

        let (min, max) = (spec.min(), spec.max());
        for &roll in self.items.keys() {
            if roll < min || roll > max {
                issues.push(TableIssue::OutOfRange { roll, min, max });
            }
        }

        // Gaps are found between mapped keys, so the cost follows the number
        // of rows rather than the width of the dice range.
        let mut next = min;
        for &roll in self.items.range(min..=max).map(|(roll, _)| roll) {
            if roll > next {
                issues.push(TableIssue::NotRollable {
                    from: next,
                    to: roll - 1,
                });
            }
            next = roll + 1;
        }
        if next <= max {
            issues.push(TableIssue::NotRollable { from: next, to: max });
        }

        issues
    }
}
