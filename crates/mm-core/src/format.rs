//! Output formatters applied to drawn items before rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decorates a raw item with information about the table it came from.
///
/// The formatter runs on the raw item text before template rendering, so
/// nested lookups are decorated with their own tables.
pub trait Formatter: fmt::Debug + Send + Sync {
    /// Format `item`, drawn from the table at canonical path `table`.
    fn format(&self, item: &str, table: &str) -> String;
}

/// Leaves items untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, item: &str, _table: &str) -> String {
        item.to_string()
    }
}

/// Wraps items in a `RandomElement` tag naming the source table, for
/// clients that highlight or re-roll individual fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl Formatter for HtmlFormatter {
    fn format(&self, item: &str, table: &str) -> String {
        let table = escape_attribute(table);
        format!("<RandomElement table='{table}'>{item}</RandomElement>")
    }
}

/// Escape a table path for a single-quoted attribute. Braces are escaped
/// too, since the formatted text is parsed as a template afterwards.
fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            other => out.push(other),
        }
    }
    out
}

/// Formatter selection for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// [`PlainFormatter`].
    #[default]
    Plain,
    /// [`HtmlFormatter`].
    Html,
}

impl FormatterKind {
    /// Construct the selected formatter.
    pub fn build(self) -> Box<dyn Formatter> {
        match self {
            Self::Plain => Box::new(PlainFormatter),
            Self::Html => Box::new(HtmlFormatter),
        }
    }
}
