//! Error types for template parsing and evaluation.

use crate::ast::Span;

/// Alias for `Result<T, TemplateError>`.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while parsing or evaluating a template.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    /// The template source is malformed.
    #[error("template parse error at {}..{}: {message}", span.start, span.end)]
    Parse {
        /// Human-readable description of the problem.
        message: String,
        /// Byte range of the offending input.
        span: Span,
    },

    /// An action called a function the host does not provide.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("{function}: expected {expected} arguments, got {got}")]
    Arity {
        /// The function name.
        function: String,
        /// Accepted argument count, e.g. `"1 to 2"`.
        expected: String,
        /// Number of arguments actually passed.
        got: usize,
    },

    /// A function argument could not be used.
    #[error("{function}: {message}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// What was wrong with the argument.
        message: String,
    },
}

impl TemplateError {
    pub(crate) fn parse(span: Span, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            span,
        }
    }

    /// The source span for parse errors.
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Parse { span, .. } => Some(span),
            _ => None,
        }
    }
}
