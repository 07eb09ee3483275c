//! Atom parsing: literals, names, calls and parenthesized expressions.

use super::super::{ParseError, TokenStream};
use nestml_ast::{Expr, ExprKind, Ident};
use nestml_lexer::Token;

pub(super) fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    let kind = match stream.advance() {
        Some(Token::IntLit(n)) => {
            let n = *n;
            match parse_unit_suffix(stream) {
                Some(unit) => ExprKind::Quantity {
                    value: n as f64,
                    integral: true,
                    unit,
                },
                None => ExprKind::IntLiteral(n),
            }
        }
        Some(Token::FloatLit(x)) => {
            let x = *x;
            match parse_unit_suffix(stream) {
                Some(unit) => ExprKind::Quantity {
                    value: x,
                    integral: false,
                    unit,
                },
                None => ExprKind::RealLiteral(x),
            }
        }
        Some(Token::True) => ExprKind::BoolLiteral(true),
        Some(Token::False) => ExprKind::BoolLiteral(false),
        Some(Token::StringLit(s)) => ExprKind::StringLiteral(s.to_string()),
        Some(Token::Ident(name)) => {
            if stream.check(&Token::LParen) {
                let args = parse_call_args(stream)?;
                ExprKind::Call {
                    callee: Ident::new(name.as_ref(), span),
                    args,
                }
            } else {
                ExprKind::Name(name.to_string())
            }
        }
        Some(Token::LParen) => {
            let inner = super::parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            ExprKind::Paren(Box::new(inner))
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "where an expression was expected",
                span,
            ));
        }
    };

    let span = stream.span_from(start);
    Ok(Expr::new(stream.fresh_id(), kind, span))
}

/// A unit name directly after a number on the same line forms a quantity
/// literal (`10 mV`).
fn parse_unit_suffix(stream: &mut TokenStream) -> Option<Ident> {
    let Some(Token::Ident(name)) = stream.peek() else {
        return None;
    };
    if stream.peek_line() != stream.previous_line() {
        return None;
    }
    let span = stream.current_span();
    stream.advance();
    Some(Ident::new(name.as_ref(), span))
}

/// Parse function call arguments.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        args.push(super::parse_expr(stream)?);

        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}
