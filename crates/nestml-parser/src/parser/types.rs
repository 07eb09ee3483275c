//! Type and unit-type parsing.
//!
//! ```text
//! type       := "real" | "integer" | "boolean" | "string" | "void" | unit_type
//! unit_type  := unit_factor (("*" | "/") unit_factor)*
//! unit_factor:= (NAME | "1" | "(" unit_type ")") ["**" ["-"] INTEGER]
//! ```

use super::{ParseError, TokenStream};
use nestml_ast::{Ident, PrimitiveType, TypeExpr, TypeExprKind, UnitExpr};
use nestml_lexer::Token;

/// Whether the current token can start a type.
pub(super) fn starts_type(stream: &TokenStream) -> bool {
    matches!(
        stream.peek(),
        Some(Token::Real)
            | Some(Token::Integer)
            | Some(Token::Boolean)
            | Some(Token::StringType)
            | Some(Token::Void)
            | Some(Token::Ident(_))
            | Some(Token::IntLit(1))
            | Some(Token::LParen)
    )
}

pub(super) fn parse_type(stream: &mut TokenStream) -> Result<TypeExpr, ParseError> {
    let start = stream.current_pos();
    let primitive = match stream.peek() {
        Some(Token::Real) => Some(PrimitiveType::Real),
        Some(Token::Integer) => Some(PrimitiveType::Integer),
        Some(Token::Boolean) => Some(PrimitiveType::Boolean),
        Some(Token::StringType) => Some(PrimitiveType::String),
        Some(Token::Void) => Some(PrimitiveType::Void),
        _ => None,
    };

    let kind = match primitive {
        Some(p) => {
            stream.advance();
            TypeExprKind::Primitive(p)
        }
        None => TypeExprKind::Unit(parse_unit_type(stream)?),
    };

    let span = stream.span_from(start);
    Ok(TypeExpr {
        id: stream.fresh_id(),
        kind,
        span,
    })
}

fn parse_unit_type(stream: &mut TokenStream) -> Result<UnitExpr, ParseError> {
    let mut left = parse_unit_factor(stream)?;
    loop {
        if stream.eat(&Token::Star) {
            let right = parse_unit_factor(stream)?;
            left = UnitExpr::Mul(Box::new(left), Box::new(right));
        } else if stream.eat(&Token::Slash) {
            let right = parse_unit_factor(stream)?;
            left = UnitExpr::Div(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn parse_unit_factor(stream: &mut TokenStream) -> Result<UnitExpr, ParseError> {
    let span = stream.current_span();
    let base = match stream.advance() {
        Some(Token::Ident(name)) => UnitExpr::Name(Ident::new(name.as_ref(), span)),
        Some(Token::IntLit(1)) => UnitExpr::One,
        Some(Token::LParen) => {
            let inner = parse_unit_type(stream)?;
            stream.expect(Token::RParen)?;
            inner
        }
        other => {
            return Err(ParseError::unexpected_token(other, "in unit type", span));
        }
    };

    if !stream.eat(&Token::StarStar) {
        return Ok(base);
    }

    let negative = stream.eat(&Token::Minus);
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::IntLit(n)) => {
            let exp = i32::try_from(*n)
                .map_err(|_| ParseError::invalid_syntax("unit exponent out of range", span))?;
            Ok(UnitExpr::Pow(
                Box::new(base),
                if negative { -exp } else { exp },
            ))
        }
        other => Err(ParseError::unexpected_token(
            other,
            "as unit exponent (expected an integer)",
            span,
        )),
    }
}
