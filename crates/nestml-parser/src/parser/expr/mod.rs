//! Expression parsing.
//!
//! Precedence, loosest first:
//!
//! | Level | Operators | Assoc |
//! |-------|-----------|-------|
//! | ternary | `c ? a : b` | right |
//! | 10 | `or` | left |
//! | 20 | `and` | left |
//! | 25 | `not` (prefix) | |
//! | 30 | `== != < <= > >=` | left |
//! | 40 | `+ -` | left |
//! | 50 | `* / %` | left |
//! | 60 | unary `- +` | |
//! | 70 | `**` | right |

mod atoms;
mod pratt;

use super::{ParseError, TokenStream};
use nestml_ast::{Expr, ExprKind};
use nestml_lexer::Token;

/// Parse a full expression, including the ternary operator.
pub(crate) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let condition = pratt::parse_pratt(stream, 0)?;

    if !stream.eat(&Token::Question) {
        return Ok(condition);
    }

    let then_branch = parse_expr(stream)?;
    stream.expect(Token::Colon)?;
    let else_branch = parse_expr(stream)?;
    let span = stream.span_from(start);

    Ok(Expr::new(
        stream.fresh_id(),
        ExprKind::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        span,
    ))
}
