//! Load-time checks across a whole registry.
//!
//! Validation runs each table's structural checks, renders every distinct
//! item once to surface template errors before serving, and confirms that
//! every link leads to a table. Findings are logged and returned; none of
//! them stop the registry from being used.

use std::collections::HashSet;
use std::fmt;

use tracing::{info, warn};

use crate::registry::{Node, Registry};
use crate::table::{Table, TableIssue};

/// What went wrong with a table.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// A structural problem reported by the table itself.
    Table(TableIssue),
    /// An item failed to render.
    Render {
        /// The rendering error.
        message: String,
        /// A source-annotated report for malformed item syntax.
        report: Option<String>,
    },
    /// A link that does not lead to a table.
    Link(String),
}

/// A problem found in one table or link.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Path of the table or link where the issue was found.
    pub table: String,
    /// The problem.
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Table(issue) => write!(f, "{}: {issue}", self.table),
            IssueKind::Render { message, .. } => write!(f, "{}: {message}", self.table),
            IssueKind::Link(message) => write!(f, "{}: {message}", self.table),
        }
    }
}

/// All issues found by [`Registry::validate_tables`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Issues in path order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true if nothing was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Iterate over the issues.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter()
    }

    /// Issues reported against `table`.
    pub fn for_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.table == table)
    }
}

impl Registry {
    /// Check every table and link, logging each finding.
    pub fn validate_tables(&self) -> ValidationReport {
        let mut issues = Vec::new();
        for (path, node) in &self.nodes {
            match node {
                Node::Table { table, .. } => self.validate_table(path, table, &mut issues),
                Node::Link { target } => {
                    if let Err(e) = self.get_table(path) {
                        issues.push(ValidationIssue {
                            table: path.clone(),
                            kind: IssueKind::Link(format!("link to \"{target}\" is broken: {e}")),
                        });
                    }
                }
            }
        }

        for issue in &issues {
            warn!(table = %issue.table, "{issue}");
            if let IssueKind::Render {
                report: Some(report),
                ..
            } = &issue.kind
            {
                warn!("\n{report}");
            }
        }
        info!(tables = self.nodes.len(), issues = issues.len(), "validated tables");

        ValidationReport { issues }
    }

    fn validate_table(&self, path: &str, table: &Table, issues: &mut Vec<ValidationIssue>) {
        issues.extend(table.validate().into_iter().map(|issue| ValidationIssue {
            table: path.to_string(),
            kind: IssueKind::Table(issue),
        }));

        let mut seen = HashSet::new();
        for item in table.all_items() {
            if !seen.insert(item.clone()) {
                continue;
            }
            if let Err(e) = mm_template::parse(&item) {
                issues.push(ValidationIssue {
                    table: path.to_string(),
                    kind: IssueKind::Render {
                        message: e.to_string(),
                        report: Some(mm_template::render_diagnostic(&item, path, &e)),
                    },
                });
                continue;
            }
            let formatted = self.formatter.format(&item, path);
            let mut ctx = self.context();
            if let Err(e) = self.render_in(&formatted, path, &mut ctx) {
                issues.push(ValidationIssue {
                    table: path.to_string(),
                    kind: IssueKind::Render {
                        message: e.to_string(),
                        report: None,
                    },
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::table::{RollingTable, TextTable};

    fn text(item: &str) -> TextTable {
        let mut t = TextTable::new();
        t.add_item(item);
        t
    }

    #[test]
    fn clean_registry() {
        let mut reg = Registry::with_config(RegistryConfig::default().with_seed(1));
        reg.add_table("a", text("alpha"), false);
        reg.add_table("b", text(r#"{{lookup "a"}}"#), false);
        reg.add_link("c", "b");
        assert!(reg.validate_tables().is_clean());
    }

    #[test]
    fn reports_coverage_gaps() {
        let mut reg = Registry::new();
        let mut t = RollingTable::new("1d3");
        t.add_item("x", &[1, 2]);
        reg.add_table("gaps", t, false);

        let report = reg.validate_tables();
        assert_eq!(
            report.issues,
            vec![ValidationIssue {
                table: "gaps".to_string(),
                kind: IssueKind::Table(TableIssue::NotRollable { from: 3, to: 3 }),
            }]
        );
        assert_eq!(report.issues[0].to_string(), "gaps: 3 is not rollable");
    }

    #[test]
    fn reports_malformed_items_with_source() {
        let mut reg = Registry::new();
        reg.add_table("things/fancy", text(r#"Shiny {{lookup "things/item" )}}"#), false);

        let report = reg.validate_tables();
        assert_eq!(report.len(), 1);
        match &report.issues[0].kind {
            IssueKind::Render {
                report: Some(rendered),
                ..
            } => assert!(rendered.contains("things/fancy")),
            other => panic!("expected render issue with report, got {other:?}"),
        }
    }

    #[test]
    fn reports_missing_lookup_targets() {
        let mut reg = Registry::new();
        reg.add_table("orphan", text(r#"{{lookup "nowhere"}}"#), false);

        let report = reg.validate_tables();
        assert_eq!(report.len(), 1);
        assert!(matches!(
            &report.issues[0].kind,
            IssueKind::Render { message, report: None } if message.contains("nowhere")
        ));
    }

    #[test]
    fn reports_broken_links() {
        let mut reg = Registry::new();
        reg.add_link("alias", "gone");
        let report = reg.validate_tables();
        assert_eq!(report.for_table("alias").count(), 1);
        assert!(matches!(report.issues[0].kind, IssueKind::Link(_)));
    }

    #[test]
    fn distinct_items_render_once() {
        let mut reg = Registry::new();
        let mut t = RollingTable::new("1d4");
        t.add_item(r#"{{lookup "missing"}}"#, &[1, 2, 3, 4]);
        reg.add_table("many", t, false);
        assert_eq!(reg.validate_tables().len(), 1);
    }
}
