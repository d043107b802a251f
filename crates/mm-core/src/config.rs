//! Configuration for a table registry.

use serde::{Deserialize, Serialize};

use crate::format::FormatterKind;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Nested lookup/fudge draws allowed within one top-level request.
    pub max_lookup_depth: usize,
    /// Links followed before a lookup is abandoned.
    pub max_link_depth: usize,
    /// Formatter applied to every drawn item.
    pub formatter: FormatterKind,
    /// Master seed. When set, every table and every request draws from a
    /// deterministic random source derived from it.
    pub seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_lookup_depth: 100,
            max_link_depth: 16,
            formatter: FormatterKind::Plain,
            seed: None,
        }
    }
}

impl RegistryConfig {
    /// Set the nested lookup budget.
    pub fn with_max_lookup_depth(mut self, depth: usize) -> Self {
        self.max_lookup_depth = depth;
        self
    }

    /// Set the link-chain limit (at least one hop).
    pub fn with_max_link_depth(mut self, depth: usize) -> Self {
        self.max_link_depth = depth.max(1);
        self
    }

    /// Set the formatter.
    pub fn with_formatter(mut self, formatter: FormatterKind) -> Self {
        self.formatter = formatter;
        self
    }

    /// Set the master seed for reproducible draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
