//! Builds a registry from a document's structural events.
//!
//! A document walker (markdown or otherwise) reports headings, table rows,
//! titled blocks, and links as [`TableEvent`]s. The loader keeps track of the
//! heading namespace and the columns of the table being read, and turns
//! each event into registry writes:
//!
//! - headings nest the namespace
//! - each header cell starts a table named after the cell; if one cell is a
//!   dice spec, the other columns become rolling tables indexed by it
//! - data rows add one item per column
//! - titled blocks become text tables
//! - links become aliases
//!
//! Names wrapped in `_underscores_` or `*asterisks*` create hidden tables.
//! Problems in the input are logged and skipped; loading never fails.

use tracing::{debug, warn};

use crate::dice::DiceSpec;
use crate::namespace::NamespaceStack;
use crate::registry::Registry;
use crate::table::{Table, TextTable};

/// Widest `low-high` range a single row may claim.
const MAX_ROW_SPAN: i64 = 10_000;

/// A structural element of a table document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A heading of `level` (1 = top level).
    Heading {
        /// Heading depth, starting at 1.
        level: usize,
        /// Heading text.
        text: String,
    },
    /// The header row of a table: one cell per column.
    HeaderRow(Vec<String>),
    /// A data row of the current table.
    DataRow(Vec<String>),
    /// A fenced block. Only titled blocks become tables.
    FencedBlock {
        /// The block's title (the info string after the fence).
        title: Option<String>,
        /// The block's lines, without line terminators.
        lines: Vec<String>,
    },
    /// A link; registers `text` in the current namespace as an alias.
    Link {
        /// Link text.
        text: String,
        /// Link destination, a table path.
        target: String,
    },
    /// The current table ended.
    EndTable,
}

/// What a column of the current table feeds.
#[derive(Debug, Clone)]
enum Column {
    /// The dice index column.
    Dice,
    /// A table at this path.
    Table(String),
    /// A header cell with no usable name.
    Skip,
}

/// Applies [`TableEvent`]s to a registry.
#[derive(Debug)]
pub struct TableLoader<'r> {
    registry: &'r mut Registry,
    namespace: NamespaceStack,
    columns: Vec<Column>,
}

impl<'r> TableLoader<'r> {
    /// Load into `registry`, starting at the top-level namespace.
    pub fn new(registry: &'r mut Registry) -> Self {
        Self {
            registry,
            namespace: NamespaceStack::new(),
            columns: Vec::new(),
        }
    }

    /// The current heading namespace.
    pub fn namespace(&self) -> &NamespaceStack {
        &self.namespace
    }

    /// Apply every event in order.
    pub fn apply_all(&mut self, events: impl IntoIterator<Item = TableEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Apply one event.
    pub fn apply(&mut self, event: TableEvent) {
        match event {
            TableEvent::Heading { level, text } => {
                self.columns.clear();
                self.namespace.enter_heading(level, &text);
            }
            TableEvent::HeaderRow(cells) => self.header_row(&cells),
            TableEvent::DataRow(cells) => self.data_row(&cells),
            TableEvent::FencedBlock { title, lines } => self.fenced_block(title.as_deref(), &lines),
            TableEvent::Link { text, target } => {
                let path = self.namespace.table_path(&text);
                self.registry.add_link(&path, &target);
            }
            TableEvent::EndTable => self.columns.clear(),
        }
    }

    fn header_row(&mut self, cells: &[String]) {
        let dice = cells
            .iter()
            .map(|cell| cell.trim())
            .rev()
            .find(|cell| DiceSpec::looks_like(cell))
            .map(str::to_string);

        self.columns = cells
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                if dice.as_deref() == Some(cell) {
                    return Column::Dice;
                }
                let (name, hidden) = strip_hidden(cell);
                if name.is_empty() {
                    debug!(namespace = %self.namespace.namespace(), "header cell has no name");
                    return Column::Skip;
                }
                let path = self.namespace.table_path(name);
                let table: Table = match &dice {
                    Some(dice) => self.registry.rolling_table(dice.as_str()).into(),
                    None => self.registry.random_table().into(),
                };
                self.registry.add_table(&path, table, hidden);
                Column::Table(path)
            })
            .collect();
    }

    fn data_row(&mut self, cells: &[String]) {
        if self.columns.is_empty() {
            debug!(namespace = %self.namespace.namespace(), "data row outside of a table");
            return;
        }
        if cells.len() > self.columns.len() {
            debug!(
                extra = cells.len() - self.columns.len(),
                "row has more cells than the header"
            );
        }

        let positions = match self.columns.iter().rposition(|c| matches!(c, Column::Dice)) {
            Some(idx) => {
                let index = cells.get(idx).map(|c| c.trim()).unwrap_or_default();
                match parse_positions(index) {
                    Some(positions) => positions,
                    None => {
                        warn!(index, "malformed roll index, row skipped");
                        return;
                    }
                }
            }
            None => Vec::new(),
        };

        for (idx, column) in self.columns.iter().enumerate() {
            let Column::Table(path) = column else {
                continue;
            };
            let Some(text) = cells.get(idx).map(|c| c.trim()) else {
                debug!(table = %path, "row is missing a cell");
                continue;
            };
            if text.is_empty() {
                debug!(table = %path, "empty cell skipped");
                continue;
            }
            match self.registry.table_mut(path) {
                Some(table) => table.add_item(text, &positions),
                None => warn!(table = %path, "table vanished while loading"),
            }
        }
    }

    fn fenced_block(&mut self, title: Option<&str>, lines: &[String]) {
        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            debug!("untitled block ignored");
            return;
        };
        let (name, hidden) = strip_hidden(title);
        let mut table = TextTable::new();
        for line in lines {
            table.add_item(format!("{line}\n"));
        }
        let path = self.namespace.table_path(name);
        self.registry.add_table(&path, table, hidden);
    }
}

/// Split a hidden marker off a table name: `_name_` and `*name*` are hidden.
fn strip_hidden(name: &str) -> (&str, bool) {
    for marker in ['_', '*'] {
        if let Some(inner) = name
            .strip_prefix(marker)
            .and_then(|n| n.strip_suffix(marker))
        {
            return (inner.trim(), true);
        }
    }
    (name, false)
}

/// Parse a roll index cell: a single total (`4`) or an inclusive range
/// (`3-6`, `3–6`).
fn parse_positions(cell: &str) -> Option<Vec<i64>> {
    let number = |s: &str| -> Option<i64> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };

    match cell.split_once(['-', '–']) {
        Some((low, high)) => {
            let (low, high) = (number(low)?, number(high)?);
            if low > high || high - low >= MAX_ROW_SPAN {
                return None;
            }
            Some((low..=high).collect())
        }
        None => Some(vec![number(cell)?]),
    }
}
