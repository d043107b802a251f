//! Single-item text blocks.

/// A table with exactly one item: text accumulated from successive
/// fragments, e.g. the lines of a fenced block.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    text: String,
}

impl TextTable {
    /// Create an empty text table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to the text.
    pub fn add_item(&mut self, fragment: impl Into<String>) {
        self.text.push_str(&fragment.into());
    }

    /// The accumulated text.
    pub fn get_item(&self) -> &str {
        &self.text
    }

    /// The single item.
    pub fn all_items(&self) -> Vec<String> {
        vec![self.text.clone()]
    }
}
