//! Template parsing: turns lexed actions into pipelines with chumsky.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::{Command, Node, Operand, Pipeline, Template};
use crate::error::{TemplateError, TemplateResult};
use crate::lexer::{self, Segment, Token};

type Span = SimpleSpan;

/// Deepest parenthesis nesting accepted inside one action.
pub const MAX_NESTING: usize = 64;

/// Build the action parser: `command ('|' command)*`.
///
/// A command is either a function call (`name operand*`) or a lone operand.
/// Operands nest through parenthesised sub-pipelines.
fn pipeline_parser<'a, I>() -> impl Parser<'a, I, Pipeline, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|pipeline| {
        let literal = select! {
            Token::Str(s) => Operand::Str(s),
            Token::Int(n) => Operand::Int(n),
            Token::Float(n) => Operand::Float(n),
        }
        .labelled("literal");
        let ident = select! { Token::Ident(name) => name }.labelled("function name");

        let nested = pipeline
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|p: Pipeline| Operand::Pipeline(Box::new(p)))
            .labelled("sub-pipeline");

        let operand = choice((literal.clone(), nested.clone(), ident.clone().map(Operand::Func)))
            .labelled("argument");

        let call = ident
            .then(operand.repeated().collect::<Vec<Operand>>())
            .map_with(|(name, args), e| Command::Call {
                name,
                args,
                span: {
                    let span: Span = e.span();
                    span.into_range()
                },
            });

        let command = choice((call, literal.or(nested).map(Command::Operand)));

        command
            .separated_by(just(Token::Pipe))
            .at_least(1)
            .collect::<Vec<Command>>()
            .map_with(|commands, e| Pipeline {
                commands,
                span: {
                    let span: Span = e.span();
                    span.into_range()
                },
            })
    })
}

/// Parse the tokens of a single action into a [`Pipeline`].
pub fn parse_action(
    tokens: &[(Token, std::ops::Range<usize>)],
    body_end: usize,
) -> TemplateResult<Pipeline> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let eoi: Span = (body_end..body_end).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = pipeline_parser()
        .then_ignore(end())
        .parse(stream)
        .into_output_errors();

    if let Some(err) = errors.into_iter().next() {
        return Err(TemplateError::parse(err.span().into_range(), err.to_string()));
    }
    let pipeline = output.ok_or_else(|| TemplateError::parse(body_end..body_end, "invalid action"))?;
    check_stages(&pipeline)?;
    Ok(pipeline)
}

/// Only the first stage of a pipeline may be a bare operand; later stages
/// receive the previous value as an argument and must be calls.
fn check_stages(pipeline: &Pipeline) -> TemplateResult<()> {
    for command in pipeline.commands.iter().skip(1) {
        if let Command::Operand(_) = command {
            return Err(TemplateError::parse(
                pipeline.span.clone(),
                "cannot pipe a value into a non-function",
            ));
        }
    }
    for command in &pipeline.commands {
        let args: &[Operand] = match command {
            Command::Call { args, .. } => args,
            Command::Operand(op) => std::slice::from_ref(op),
        };
        for arg in args {
            if let Operand::Pipeline(inner) = arg {
                check_stages(inner)?;
            }
        }
    }
    Ok(())
}

/// Reject actions nested deeper than [`MAX_NESTING`] before the recursive
/// parser sees them.
fn check_nesting(tokens: &[(Token, std::ops::Range<usize>)]) -> TemplateResult<()> {
    let mut depth = 0usize;
    for (token, span) in tokens {
        match token {
            Token::LParen => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(TemplateError::parse(
                        span.clone(),
                        format!("parentheses nested deeper than {MAX_NESTING}"),
                    ));
                }
            }
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Parse template source text.
pub fn parse(source: &str) -> TemplateResult<Template> {
    let mut nodes = Vec::new();
    for segment in lexer::split(source)? {
        match segment {
            Segment::Text(text) => nodes.push(Node::Text(text)),
            Segment::Action { body, offset } => {
                let tokens = lexer::lex(body, offset)?;
                let end = offset + body.len();
                if tokens.is_empty() {
                    return Err(TemplateError::parse(offset..end, "empty action"));
                }
                check_nesting(&tokens)?;
                nodes.push(Node::Action(parse_action(&tokens, end)?));
            }
        }
    }
    Ok(Template { nodes })
}
