//! Template evaluation against a function host.

use std::fmt;

use crate::ast::{Command, Node, Operand, Pipeline, Template};
use crate::error::TemplateError;

/// A value flowing through a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text.
    Str(String),
    /// Whole number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
}

impl Value {
    /// Interpret the value as an integer. Numeric strings are parsed;
    /// floats convert only when they have no fractional part.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Float(_) => None,
            Self::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the value as a float. Numeric strings are parsed.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Supplies the named functions a template may call.
pub trait FunctionHost {
    /// Error type returned by host functions.
    type Error: From<TemplateError>;

    /// Call function `name` with already-evaluated arguments.
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Self::Error>;
}

/// Check that `args` holds between `min` and `max` values (inclusive).
pub fn check_arity(
    function: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), TemplateError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {min}")
    } else {
        format!("{min} to {max}")
    };
    Err(TemplateError::Arity {
        function: function.to_string(),
        expected,
        got: args.len(),
    })
}

/// Render a template, writing literal text as-is and each action's value
/// in its place.
pub fn render<H: FunctionHost>(template: &Template, host: &mut H) -> Result<String, H::Error> {
    let mut out = String::new();
    for node in &template.nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Action(pipeline) => {
                let value = eval_pipeline(pipeline, host)?;
                out.push_str(&value.to_string());
            }
        }
    }
    Ok(out)
}

fn eval_pipeline<H: FunctionHost>(pipeline: &Pipeline, host: &mut H) -> Result<Value, H::Error> {
    let mut carried: Option<Value> = None;
    for command in &pipeline.commands {
        let value = match command {
            Command::Call { name, args, .. } => {
                let mut values = args
                    .iter()
                    .map(|arg| eval_operand(arg, host))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(prev) = carried.take() {
                    values.push(prev);
                }
                host.call(name, values)?
            }
            Command::Operand(op) => eval_operand(op, host)?,
        };
        carried = Some(value);
    }
    Ok(carried.unwrap_or_else(|| Value::Str(String::new())))
}

fn eval_operand<H: FunctionHost>(operand: &Operand, host: &mut H) -> Result<Value, H::Error> {
    match operand {
        Operand::Str(s) => Ok(Value::Str(s.clone())),
        Operand::Int(n) => Ok(Value::Int(*n)),
        Operand::Float(n) => Ok(Value::Float(*n)),
        Operand::Func(name) => host.call(name, Vec::new()),
        Operand::Pipeline(inner) => eval_pipeline(inner, host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    /// Test host with `upper`, `join`, and `count` functions.
    #[derive(Default)]
    struct EchoHost {
        calls: Vec<String>,
    }

    impl FunctionHost for EchoHost {
        type Error = TemplateError;

        fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
            self.calls.push(name.to_string());
            match name {
                "upper" => {
                    check_arity(name, &args, 1, 1)?;
                    Ok(Value::Str(args[0].to_string().to_uppercase()))
                }
                "join" => Ok(Value::Str(
                    args.iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join("+"),
                )),
                "count" => Ok(Value::Int(self.calls.len() as i64)),
                other => Err(TemplateError::UnknownFunction(other.to_string())),
            }
        }
    }

    fn render_str(source: &str) -> Result<String, TemplateError> {
        let template = parse(source)?;
        render(&template, &mut EchoHost::default())
    }

    #[test]
    fn literal_passthrough() {
        assert_eq!(render_str("Dagger").unwrap(), "Dagger");
    }

    #[test]
    fn call_replaces_action() {
        assert_eq!(render_str(r#"a {{upper "b"}} c"#).unwrap(), "a B c");
    }

    #[test]
    fn nested_calls_compose() {
        assert_eq!(
            render_str(r#"{{join (upper "x") 2 1.5}}"#).unwrap(),
            "X+2+1.5"
        );
    }

    #[test]
    fn pipeline_passes_last_argument() {
        assert_eq!(render_str(r#"{{ "a" | join "b" | join "c" }}"#).unwrap(), "c+b+a");
    }

    #[test]
    fn bare_function_argument_is_called() {
        assert_eq!(render_str("{{join count count}}").unwrap(), "1+2");
    }

    #[test]
    fn operand_action_prints_value() {
        assert_eq!(render_str(r#"{{ 42 }}-{{ "s" }}"#).unwrap(), "42-s");
    }

    #[test]
    fn unknown_function_errors() {
        let err = render_str("{{nope}}").unwrap_err();
        assert_eq!(err, TemplateError::UnknownFunction("nope".to_string()));
    }

    #[test]
    fn arity_errors() {
        let err = render_str(r#"{{upper "a" "b"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "upper: expected 1 arguments, got 2");
    }

    #[test]
    fn value_coercions() {
        assert_eq!(Value::Str(" 3 ".to_string()).as_int(), Some(3));
        assert_eq!(Value::Str("three".to_string()).as_int(), None);
        assert_eq!(Value::Float(2.0).as_int(), Some(2));
        assert_eq!(Value::Float(2.5).as_int(), None);
        assert_eq!(Value::Str("0.25".to_string()).as_float(), Some(0.25));
        assert_eq!(Value::Int(7).as_float(), Some(7.0));
    }

    #[test]
    fn check_arity_messages() {
        let args = vec![Value::Int(1)];
        assert!(check_arity("f", &args, 1, 2).is_ok());
        let err = check_arity("f", &[], 1, usize::MAX).unwrap_err();
        assert_eq!(err.to_string(), "f: expected at least 1 arguments, got 0");
    }
}
