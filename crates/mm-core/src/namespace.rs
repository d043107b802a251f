//! Heading-driven namespaces.

use crate::path;

/// A stack of section names that prefixes table paths.
///
/// Heading events pop sections until the stack is shallower than the new
/// heading's level, then push the heading text. Nested sections therefore
/// compose into nested paths even when heading levels are skipped.
#[derive(Debug, Clone, Default)]
pub struct NamespaceStack {
    sections: Vec<String>,
}

impl NamespaceStack {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a heading of `level` (1 = top level) titled `text`.
    pub fn enter_heading(&mut self, level: usize, text: &str) {
        while !self.sections.is_empty() && self.sections.len() >= level {
            self.sections.pop();
        }
        self.push(text);
    }

    /// Push a section.
    pub fn push(&mut self, name: &str) {
        self.sections.push(name.to_string());
    }

    /// Pop the innermost section, if any.
    pub fn pop(&mut self) -> Option<String> {
        self.sections.pop()
    }

    /// Number of open sections.
    pub fn depth(&self) -> usize {
        self.sections.len()
    }

    /// Drop all sections, e.g. at the start of a new document.
    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// The current namespace as a normalized path.
    pub fn namespace(&self) -> String {
        path::join(&self.sections)
    }

    /// The canonical path of a table named `name` in the current namespace.
    pub fn table_path(&self, name: &str) -> String {
        path::join(self.sections.iter().map(String::as_str).chain([name]))
    }
}
