//! Random table registry and item resolution engine for makemea.
//!
//! Authors describe nested lookup tables in a structured document; a loader
//! turns the document's structural events into a [`Registry`] that maps
//! normalized slash-delimited paths to tables. Callers then draw items with
//! [`Registry::get_item`], which expands `{{lookup}}`, `{{roll}}`,
//! `{{fudge}}`, `{{pick}}`, and `{{chance}}` calls in the drawn text with
//! bounded recursion.

pub mod config;
pub mod dice;
pub mod error;
pub mod format;
pub mod loader;
pub mod namespace;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod shared;
pub mod table;
pub mod validate;

pub use config::RegistryConfig;
pub use dice::{DiceError, DiceSpec};
pub use error::{TableError, TableResult};
pub use format::{Formatter, FormatterKind, HtmlFormatter, PlainFormatter};
pub use loader::{TableEvent, TableLoader};
pub use namespace::NamespaceStack;
pub use registry::{Node, Registry};
pub use resolve::ResolveContext;
pub use shared::SharedRegistry;
pub use table::{RandomTable, RollingTable, Table, TableIssue, TableKind, TextTable};
pub use validate::{IssueKind, ValidationIssue, ValidationReport};
