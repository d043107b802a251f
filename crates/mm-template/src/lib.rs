//! Item template language for makemea random tables.
//!
//! Table items are literal text interleaved with `{{ ... }}` actions. An
//! action is a pipeline of function calls (`{{lookup "things/item" 2}}`,
//! `{{ "gem" | chance 0.25 "coin" }}`). This crate lexes, parses, and
//! evaluates templates; the functions themselves are supplied by a
//! [`FunctionHost`], so the language knows nothing about tables.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Command, Node, Operand, Pipeline, Template};
pub use diagnostics::render_diagnostic;
pub use error::{TemplateError, TemplateResult};
pub use eval::{FunctionHost, Value, check_arity, render};

/// Parse item source text into a [`Template`].
pub fn parse(source: &str) -> TemplateResult<Template> {
    parser::parse(source)
}
