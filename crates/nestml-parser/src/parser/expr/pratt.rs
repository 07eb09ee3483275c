//! Pratt parser core - precedence climbing for binary and unary operators.

use super::super::{ParseError, TokenStream};
use super::atoms;
use nestml_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use nestml_lexer::Token;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power of the operand of `not`.
const NOT_OPERAND_PREC: u8 = 30;
/// Binding power of the operand of unary `-`/`+`; tighter than `*`, looser than `**`.
const SIGN_OPERAND_PREC: u8 = 60;

/// Get binary operator metadata (precedence, associativity, and operator enum).
///
/// Higher precedence binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Or => Some((10, Assoc::Left, BinaryOp::Or)),
        Token::And => Some((20, Assoc::Left, BinaryOp::And)),
        Token::EqEq => Some((30, Assoc::Left, BinaryOp::Eq)),
        Token::NotEq => Some((30, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((30, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((30, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        Token::Percent => Some((50, Assoc::Left, BinaryOp::Mod)),
        Token::StarStar => Some((70, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

/// Pratt parser - handles binary operators with precedence climbing.
pub(super) fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, assoc, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }

        stream.advance();
        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(stream, next_prec)?;

        let span = stream.span_from(start);
        left = Expr::new(
            stream.fresh_id(),
            ExprKind::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            },
            span,
        );
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, atoms).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Plus) | Some(Token::Not) => parse_unary(stream),
        _ => atoms::parse_atom(stream),
    }
}

/// Parse unary operators.
fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    let (op, operand_prec) = match stream.advance() {
        Some(Token::Minus) => (UnaryOp::Neg, SIGN_OPERAND_PREC),
        Some(Token::Plus) => (UnaryOp::Plus, SIGN_OPERAND_PREC),
        Some(Token::Not) => (UnaryOp::Not, NOT_OPERAND_PREC),
        other => {
            return Err(ParseError::unexpected_token(other, "as unary operator", span));
        }
    };

    let operand = parse_pratt(stream, operand_prec)?;
    let span = stream.span_from(start);

    Ok(Expr::new(
        stream.fresh_id(),
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}
