//! The table registry: normalized paths mapped to tables and links.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{TableError, TableResult};
use crate::format::Formatter;
use crate::path;
use crate::table::{RandomTable, RollingTable, Table};

/// Increment of the SplitMix64 sequence.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer: spreads consecutive inputs into independent seeds.
fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// An entry in the registry.
#[derive(Debug)]
pub enum Node {
    /// A table, optionally hidden from listings.
    Table {
        /// The table itself.
        table: Table,
        /// Hidden tables are left out of default listings but can still be
        /// drawn from by exact path.
        hidden: bool,
    },
    /// An alias redirecting to another path.
    Link {
        /// The path the alias points at.
        target: String,
    },
}

/// Stores tables under normalized paths and resolves items from them.
///
/// A registry is built during a single-writer load phase and then shared
/// read-only. Item resolution lives in [`crate::resolve`]; validation in
/// [`crate::validate`].
#[derive(Debug)]
pub struct Registry {
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) config: RegistryConfig,
    pub(crate) formatter: Box<dyn Formatter>,
    seed_base: u64,
    seeds_drawn: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry.
    pub fn with_config(config: RegistryConfig) -> Self {
        let seed_base = match config.seed {
            Some(seed) => seed,
            None => StdRng::from_os_rng().random(),
        };
        Self {
            nodes: BTreeMap::new(),
            formatter: config.formatter.build(),
            config,
            seed_base,
            seeds_drawn: AtomicU64::new(0),
        }
    }

    /// Replace the configured formatter.
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// The registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The active formatter.
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    /// Draw a fresh seed from the registry's seed source without locking.
    pub(crate) fn next_seed(&self) -> u64 {
        let n = self.seeds_drawn.fetch_add(1, Ordering::Relaxed);
        splitmix64(self.seed_base.wrapping_add(n.wrapping_mul(GOLDEN_GAMMA)))
    }

    /// A new empty random table seeded from this registry.
    pub fn random_table(&self) -> RandomTable {
        RandomTable::with_seed(self.next_seed())
    }

    /// A new empty rolling table seeded from this registry.
    pub fn rolling_table(&self, dice: impl Into<String>) -> RollingTable {
        RollingTable::new(dice).with_seed(self.next_seed())
    }

    /// Store `table` under `path`, replacing whatever was there.
    ///
    /// Replacing a path that already resolves is logged but not an error.
    pub fn add_table(&mut self, path: &str, table: impl Into<Table>, hidden: bool) {
        let key = path::normalize(path);
        if self.get_table(&key).is_ok() {
            warn!(table = %key, "duplicate table entry, replacing");
        }
        debug!(table = %key, hidden, "adding table");
        self.nodes.insert(
            key,
            Node::Table {
                table: table.into(),
                hidden,
            },
        );
    }

    /// Store an alias at `path` that redirects to `target`.
    pub fn add_link(&mut self, path: &str, target: &str) {
        let key = path::normalize(path);
        let target = path::normalize(target);
        if self.nodes.contains_key(&key) {
            warn!(table = %key, target = %target, "link replaces existing entry");
        }
        debug!(table = %key, target = %target, "adding link");
        self.nodes.insert(key, Node::Link { target });
    }

    /// Look up a table, following links.
    ///
    /// Returns the table and its canonical path: the normalized path of the
    /// node that actually holds the table, which callers need for relative
    /// lookups.
    pub fn get_table(&self, path: &str) -> TableResult<(&Table, String)> {
        let start = path::normalize(path);
        let mut current = start.clone();
        for _ in 0..=self.config.max_link_depth {
            match self.nodes.get(&current) {
                None => return Err(TableError::NotFound(current)),
                Some(Node::Table { table, .. }) => return Ok((table, current)),
                Some(Node::Link { target }) => current = target.clone(),
            }
        }
        Err(TableError::LinkDepthExceeded {
            path: start,
            limit: self.config.max_link_depth,
        })
    }

    /// Mutable access to the table stored at exactly `path` (links are not
    /// followed). Used while loading.
    pub fn table_mut(&mut self, path: &str) -> Option<&mut Table> {
        match self.nodes.get_mut(&path::normalize(path)) {
            Some(Node::Table { table, .. }) => Some(table),
            _ => None,
        }
    }

    /// Set the hidden flag on the table stored at exactly `path`.
    /// Returns false if there is no table there.
    pub fn set_hidden(&mut self, path: &str, hidden: bool) -> bool {
        match self.nodes.get_mut(&path::normalize(path)) {
            Some(Node::Table { hidden: flag, .. }) => {
                *flag = hidden;
                true
            }
            _ => false,
        }
    }

    /// The raw node stored at `path`.
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.get(&path::normalize(path))
    }

    /// All paths starting with `prefix`, sorted.
    ///
    /// Hidden tables are listed only when `show_hidden` is set; links are
    /// always listed.
    pub fn list_tables(&self, prefix: &str, show_hidden: bool) -> Vec<String> {
        let prefix = path::normalize(prefix);
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, node)| match node {
                Node::Table { hidden, .. } => show_hidden || !hidden,
                Node::Link { .. } => true,
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Iterate over every `(path, node)` pair in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
