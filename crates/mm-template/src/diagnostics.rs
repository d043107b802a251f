//! Pretty rendering of template errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::TemplateError;

/// Render a template error against its source for terminal output.
///
/// Parse errors get an ariadne report pointing at the offending span;
/// other errors carry no location and render as their message.
pub fn render_diagnostic(source: &str, name: &str, err: &TemplateError) -> String {
    let Some(span) = err.span() else {
        return format!("error: {name}: {err}");
    };
    let span = span.start.min(source.len())..span.end.min(source.len());

    let message = match err {
        TemplateError::Parse { message, .. } => message.as_str(),
        _ => "template error",
    };

    let mut output = Vec::new();
    Report::build(ReportKind::Error, (name, span.clone()))
        .with_config(Config::default().with_color(false))
        .with_message("malformed table item")
        .with_label(
            Label::new((name, span))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .write((name, Source::from(source)), &mut output)
        .ok();

    String::from_utf8(output).unwrap_or_default()
}
