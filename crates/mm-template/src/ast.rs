//! Parsed template representation.

/// Byte range into the template source.
pub type Span = std::ops::Range<usize>;

/// A parsed item template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    /// Literal text and actions in source order.
    pub nodes: Vec<Node>,
}

impl Template {
    /// Returns true if the template contains no actions.
    pub fn is_literal(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, copied to the output unchanged.
    Text(String),
    /// A `{{ ... }}` action whose value is written to the output.
    Action(Pipeline),
}

/// Commands joined by `|`. Each command's value is passed as the last
/// argument of the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// The commands, left to right. Never empty.
    pub commands: Vec<Command>,
    /// Source span of the whole pipeline.
    pub span: Span,
}

/// A single stage of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A function call: `name arg1 arg2 ...`.
    Call {
        /// Function name.
        name: String,
        /// Positional arguments.
        args: Vec<Operand>,
        /// Source span of the call.
        span: Span,
    },
    /// A bare operand, only valid as the first stage of a pipeline.
    Operand(Operand),
}

/// A function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// String literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// A bare function name in argument position, called with no arguments.
    Func(String),
    /// A parenthesised sub-pipeline.
    Pipeline(Box<Pipeline>),
}
