//! Template lexing.
//!
//! Lexing happens in two passes. [`split`] separates literal text from
//! `{{ ... }}` action bodies, applying trim markers and dropping comments.
//! [`lex`] then tokenizes a single action body with logos.

use std::fmt;

use logos::Logos;

use crate::ast::Span;
use crate::error::{TemplateError, TemplateResult};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Token type for the inside of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Pipe `|`.
    Pipe,
    /// String literal, escapes already processed.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Function name.
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Pipe => write!(f, "|"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Ident(w) => write!(f, "{w}"),
        }
    }
}

#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("|")]
    Pipe,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"`[^`]*`")]
    RawStr,

    #[regex(r"-?[0-9]+\.[0-9]+")]
    Float,

    #[regex(r"-?[0-9]+")]
    Int,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// A piece of template source.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// Literal text with trim markers applied.
    Text(String),
    /// The body of an action, without delimiters or trim markers.
    Action {
        /// Action body source.
        body: &'a str,
        /// Byte offset of `body` within the template source.
        offset: usize,
    },
}

/// Split template source into literal text and action bodies.
///
/// `{{- ` trims whitespace before an action and ` -}}` trims whitespace
/// after it. `{{/* ... */}}` comments produce no segment.
pub fn split(source: &str) -> TemplateResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut cursor = 0;
    let mut trim_next = false;

    while let Some(rel) = source[cursor..].find(OPEN) {
        let open = cursor + rel;
        let mut chunk = &source[cursor..open];
        if trim_next {
            chunk = chunk.trim_start();
        }

        let mut body_start = open + OPEN.len();
        if has_left_trim(&source[body_start..]) {
            chunk = chunk.trim_end();
            body_start += 1;
        }
        text.push_str(chunk);

        let close = find_close(source, body_start)
            .ok_or_else(|| TemplateError::parse(open..source.len(), "unclosed action"))?;
        let mut body_end = close;
        trim_next = has_right_trim(&source[body_start..close]);
        if trim_next {
            body_end -= 1;
        }

        let body = &source[body_start..body_end];
        if !is_comment(body) {
            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            segments.push(Segment::Action {
                body,
                offset: body_start,
            });
        }
        cursor = close + CLOSE.len();
    }

    let mut tail = &source[cursor..];
    if trim_next {
        tail = tail.trim_start();
    }
    text.push_str(tail);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}

fn has_left_trim(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn has_right_trim(body: &str) -> bool {
    body.strip_suffix('-')
        .is_some_and(|rest| rest.ends_with(char::is_whitespace))
}

fn is_comment(body: &str) -> bool {
    let body = body.trim();
    body.starts_with("/*") && body.ends_with("*/")
}

/// Find the byte offset of the `}}` closing the action starting at `from`,
/// skipping over string literals.
fn find_close(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += 1;
                }
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Lex one action body into `(Token, Span)` pairs.
///
/// Spans are shifted by `offset` so they index the full template source.
pub fn lex(body: &str, offset: usize) -> TemplateResult<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(body);

    while let Some(result) = lexer.next() {
        let local = lexer.span();
        let span = local.start + offset..local.end + offset;
        let slice = lexer.slice();
        let token = match result {
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Pipe) => Token::Pipe,
            Ok(RawToken::Str) => Token::Str(unescape(&slice[1..slice.len() - 1])),
            Ok(RawToken::RawStr) => Token::Str(slice[1..slice.len() - 1].to_string()),
            Ok(RawToken::Float) => match slice.parse::<f64>() {
                Ok(n) => Token::Float(n),
                Err(_) => {
                    return Err(TemplateError::parse(
                        span,
                        format!("invalid float literal: {slice}"),
                    ));
                }
            },
            Ok(RawToken::Int) => match slice.parse::<i64>() {
                Ok(n) => Token::Int(n),
                Err(_) => {
                    return Err(TemplateError::parse(
                        span,
                        format!("invalid integer literal: {slice}"),
                    ));
                }
            },
            Ok(RawToken::Ident) => Token::Ident(slice.to_string()),
            Err(()) => {
                let message = if slice.starts_with('"') || slice.starts_with('`') {
                    "unterminated string".to_string()
                } else {
                    format!("unexpected character: {slice:?}")
                };
                return Err(TemplateError::parse(span, message));
            }
        };
        tokens.push((token, span));
    }

    Ok(tokens)
}

/// Process escape sequences in a string literal.
///
/// Supports `\\`, `\n`, `\t`, `\"`. Unknown sequences are kept as-is.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
