//! Table variants and their selection strategies.
//!
//! - **Random**: uniform pick over an ordered list of items
//! - **Rolling**: dice-indexed map from roll totals to items
//! - **Text**: a single block of text assembled from fragments

pub mod random;
pub mod rolling;
pub mod text;

pub use random::RandomTable;
pub use rolling::RollingTable;
pub use text::TextTable;

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Which variant a [`Table`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// A [`RandomTable`].
    Random,
    /// A [`RollingTable`].
    Rolling,
    /// A [`TextTable`].
    Text,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Rolling => write!(f, "rolling"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A structural problem found by [`Table::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableIssue {
    /// An item is mapped to a total the dice can never roll.
    OutOfRange {
        /// The unreachable total.
        roll: i64,
        /// Smallest reachable total.
        min: i64,
        /// Largest reachable total.
        max: i64,
    },
    /// A run of reachable totals has no item mapped to it.
    NotRollable {
        /// First unmapped total.
        from: i64,
        /// Last unmapped total.
        to: i64,
    },
    /// Two rows claimed the same total; the later one won.
    DuplicateRoll {
        /// The contested total.
        roll: i64,
        /// The item that overwrote the earlier one.
        item: String,
    },
    /// The dice spec of a rolling table does not parse.
    InvalidDice {
        /// The unparsable spec.
        dice: String,
    },
    /// The table has no items.
    Empty,
}

impl fmt::Display for TableIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { roll, min, max } => {
                write!(f, "{roll} is outside of the dice range {min}-{max}")
            }
            Self::NotRollable { from, to } if from == to => write!(f, "{from} is not rollable"),
            Self::NotRollable { from, to } => write!(f, "{from}-{to} are not rollable"),
            Self::DuplicateRoll { roll, item } => {
                write!(f, "duplicate item \"{item}\" for roll {roll}")
            }
            Self::InvalidDice { dice } => write!(f, "invalid dice spec \"{dice}\""),
            Self::Empty => write!(f, "table has no items"),
        }
    }
}

/// A random table of any variant.
#[derive(Debug)]
pub enum Table {
    /// Uniform pick over a list.
    Random(RandomTable),
    /// Dice-indexed lookup.
    Rolling(RollingTable),
    /// Single text block.
    Text(TextTable),
}

impl Table {
    /// Draw one raw (unrendered) item. `None` when nothing can be drawn:
    /// an empty random table, or a roll with no mapped item.
    pub fn get_item(&self) -> Option<&str> {
        match self {
            Self::Random(t) => t.get_item(),
            Self::Rolling(t) => t.get_item(),
            Self::Text(t) => Some(t.get_item()),
        }
    }

    /// Add an item. `positions` are the roll totals it maps to and only
    /// matter for rolling tables.
    pub fn add_item(&mut self, item: impl Into<String>, positions: &[i64]) {
        match self {
            Self::Random(t) => t.add_item(item),
            Self::Rolling(t) => t.add_item(item, positions),
            Self::Text(t) => t.add_item(item),
        }
    }

    /// Check the table for structural problems.
    pub fn validate(&self) -> Vec<TableIssue> {
        match self {
            Self::Random(t) => t.validate(),
            Self::Rolling(t) => t.validate(),
            Self::Text(_) => Vec::new(),
        }
    }

    /// Every item text the table can produce.
    pub fn all_items(&self) -> Vec<String> {
        match self {
            Self::Random(t) => t.all_items(),
            Self::Rolling(t) => t.all_items(),
            Self::Text(t) => t.all_items(),
        }
    }

    /// The table's variant.
    pub fn kind(&self) -> TableKind {
        match self {
            Self::Random(_) => TableKind::Random,
            Self::Rolling(_) => TableKind::Rolling,
            Self::Text(_) => TableKind::Text,
        }
    }

    /// Number of stored entries (roll totals for rolling tables).
    pub fn len(&self) -> usize {
        match self {
            Self::Random(t) => t.len(),
            Self::Rolling(t) => t.len(),
            Self::Text(_) => 1,
        }
    }

    /// Returns true if the table stores no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<RandomTable> for Table {
    fn from(t: RandomTable) -> Self {
        Self::Random(t)
    }
}

impl From<RollingTable> for Table {
    fn from(t: RollingTable) -> Self {
        Self::Rolling(t)
    }
}

impl From<TextTable> for Table {
    fn from(t: TextTable) -> Self {
        Self::Text(t)
    }
}

/// A table-owned random source, seeded once at construction.
pub(crate) fn table_rng(seed: Option<u64>) -> Mutex<StdRng> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    Mutex::new(rng)
}

/// Run `f` with exclusive access to a table's random source.
pub(crate) fn with_rng<T>(rng: &Mutex<StdRng>, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}
