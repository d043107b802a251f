//! Error types for table lookup and item resolution.

use mm_template::TemplateError;

/// Alias for `Result<T, TableError>`.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur when looking up tables or resolving items.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// No table or link is registered under the path.
    #[error("table not found: {0}")]
    NotFound(String),

    /// Following links from the path did not reach a table within the limit.
    #[error("link chain from \"{path}\" exceeds {limit} hops")]
    LinkDepthExceeded {
        /// The path the lookup started from.
        path: String,
        /// The configured maximum number of hops.
        limit: usize,
    },

    /// An item template is malformed or a template function failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Rendering an item drawn from `table` failed.
    #[error("in table \"{table}\": {source}")]
    Item {
        /// Canonical path of the table whose item failed to render.
        table: String,
        /// The underlying failure.
        source: Box<TableError>,
    },
}

impl TableError {
    pub(crate) fn in_table(table: &str, source: TableError) -> Self {
        Self::Item {
            table: table.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping `Item` wrappers.
    pub fn root_cause(&self) -> &TableError {
        match self {
            Self::Item { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if the root cause is a missing table.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound(_))
    }
}
