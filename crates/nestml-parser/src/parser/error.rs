//! Parse error types.

use nestml_ast::foundation::Span;
use nestml_lexer::{LexError, Token};
use std::fmt;

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Input that does not form any token.
    InvalidToken,

    /// A specific token was expected but a different one was found.
    ///
    /// Example: `state` not followed by `:`.
    UnexpectedToken,

    /// Input ended inside an unfinished construct (unclosed block,
    /// dangling operator).
    UnexpectedEof,

    /// Tokens are present but violate a grammar rule.
    ///
    /// Example: an equation whose left-hand side has no prime.
    InvalidSyntax,
}

impl ParseError {
    pub fn expected_token(expected: Token, found: Option<Token>, span: Span) -> Self {
        let message = match &found {
            Some(token) => format!("expected `{}`, found `{}`", expected, token),
            None => format!("expected `{}`, found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected `{}` {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    pub fn from_lex(err: &LexError, file_id: u16) -> Self {
        Self {
            kind: ParseErrorKind::InvalidToken,
            span: Span::new(
                file_id,
                err.range.start as u32,
                err.range.end as u32,
                err.line,
            ),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.span.start_line)
    }
}

impl std::error::Error for ParseError {}
