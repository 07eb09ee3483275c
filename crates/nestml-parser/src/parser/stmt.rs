//! Declarations and statements.

use super::decl::parse_ident;
use super::{expr, types, ParseError, TokenStream};
use nestml_ast::*;
use nestml_lexer::Token;

/// `[alias] a, b T [= init] [[[guard]]]`
pub(crate) fn parse_declaration(stream: &mut TokenStream) -> Result<Declaration, ParseError> {
    let start = stream.current_pos();
    let is_alias = stream.eat(&Token::Alias);

    let mut names = vec![parse_ident(stream, "as declared variable name")?];
    while stream.eat(&Token::Comma) {
        names.push(parse_ident(stream, "as declared variable name")?);
    }

    if !types::starts_type(stream) {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "(expected the type of the declared variable)",
            stream.current_span(),
        ));
    }
    let ty = types::parse_type(stream)?;

    let initializer = if stream.eat(&Token::Eq) {
        Some(parse_initializer(stream)?)
    } else {
        None
    };

    let guard = if stream.check(&Token::LBracket) && stream.peek_nth(1) == Some(&Token::LBracket) {
        stream.advance();
        stream.advance();
        let guard = expr::parse_expr(stream)?;
        stream.expect(Token::RBracket)?;
        stream.expect(Token::RBracket)?;
        Some(guard)
    } else {
        None
    };

    let span = stream.span_from(start);
    Ok(Declaration {
        id: stream.fresh_id(),
        names,
        is_alias,
        ty,
        initializer,
        guard,
        span,
    })
}

fn parse_initializer(stream: &mut TokenStream) -> Result<Initializer, ParseError> {
    if !stream.eat(&Token::LBracket) {
        return expr::parse_expr(stream).map(Initializer::Single);
    }

    let mut items = Vec::new();
    while !stream.check(&Token::RBracket) {
        items.push(expr::parse_expr(stream)?);
        if !stream.check(&Token::RBracket) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RBracket)?;
    Ok(Initializer::List(items))
}

/// Parse statements until one of `terminators` (not consumed).
pub(crate) fn parse_block_until(
    stream: &mut TokenStream,
    terminators: &[Token],
) -> Result<Block, ParseError> {
    let start = stream.current_pos();
    let mut stmts = Vec::new();
    while !terminators.iter().any(|t| stream.check(t)) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "inside a block (missing `end`)",
                stream.current_span(),
            ));
        }
        stmts.push(parse_stmt(stream)?);
    }

    let span = if stream.current_pos() > start {
        stream.span_from(start)
    } else {
        stream.current_span()
    };
    Ok(Block {
        id: stream.fresh_id(),
        stmts,
        span,
    })
}

fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let kind = match stream.peek() {
        Some(Token::Alias) => StmtKind::Declaration(parse_declaration(stream)?),
        Some(Token::Return) => parse_return(stream)?,
        Some(Token::If) => parse_if(stream)?,
        Some(Token::For) => parse_for(stream)?,
        Some(Token::While) => parse_while(stream)?,
        Some(Token::Ident(_)) => match stream.peek_nth(1) {
            Some(Token::LParen) => StmtKind::Call(expr::parse_expr(stream)?),
            Some(
                Token::Eq | Token::PlusEq | Token::MinusEq | Token::StarEq | Token::SlashEq,
            ) => parse_assignment(stream)?,
            _ => StmtKind::Declaration(parse_declaration(stream)?),
        },
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "at start of statement",
                stream.current_span(),
            ))
        }
    };

    let span = stream.span_from(start);
    Ok(Stmt {
        id: stream.fresh_id(),
        kind,
        span,
    })
}

fn parse_assignment(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    let target = parse_ident(stream, "as assignment target")?;
    let span = stream.current_span();
    let op = match stream.advance() {
        Some(Token::Eq) => AssignOp::Assign,
        Some(Token::PlusEq) => AssignOp::AddAssign,
        Some(Token::MinusEq) => AssignOp::SubAssign,
        Some(Token::StarEq) => AssignOp::MulAssign,
        Some(Token::SlashEq) => AssignOp::DivAssign,
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "(expected an assignment operator)",
                span,
            ))
        }
    };
    let value = expr::parse_expr(stream)?;
    Ok(StmtKind::Assignment(Assignment { target, op, value }))
}

/// `return` takes a value only when one follows on the same line.
fn parse_return(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.advance();
    let has_value = !stream.at_end()
        && !stream.check(&Token::End)
        && stream.peek_line() == stream.previous_line();
    let value = if has_value {
        Some(expr::parse_expr(stream)?)
    } else {
        None
    };
    Ok(StmtKind::Return(value))
}

fn parse_if(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    const BRANCH_END: [Token; 3] = [Token::Elif, Token::Else, Token::End];

    stream.advance();
    let mut branches = Vec::new();

    let condition = expr::parse_expr(stream)?;
    stream.expect(Token::Colon)?;
    branches.push((condition, parse_block_until(stream, &BRANCH_END)?));

    while stream.eat(&Token::Elif) {
        let condition = expr::parse_expr(stream)?;
        stream.expect(Token::Colon)?;
        branches.push((condition, parse_block_until(stream, &BRANCH_END)?));
    }

    let else_block = if stream.eat(&Token::Else) {
        stream.expect(Token::Colon)?;
        Some(parse_block_until(stream, &[Token::End])?)
    } else {
        None
    };
    stream.expect(Token::End)?;

    Ok(StmtKind::If(IfStmt {
        branches,
        else_block,
    }))
}

/// `for i in a ... b [step s]:` statements `end`
fn parse_for(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.advance();
    let var = parse_ident(stream, "as loop variable")?;
    stream.expect(Token::In)?;
    let from = expr::parse_expr(stream)?;
    stream.expect(Token::Ellipsis)?;
    let to = expr::parse_expr(stream)?;
    let step = if stream.eat(&Token::Step) {
        Some(expr::parse_expr(stream)?)
    } else {
        None
    };
    stream.expect(Token::Colon)?;
    let body = parse_block_until(stream, &[Token::End])?;
    stream.expect(Token::End)?;

    Ok(StmtKind::For(ForStmt {
        var,
        from,
        to,
        step,
        body,
    }))
}

fn parse_while(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.advance();
    let condition = expr::parse_expr(stream)?;
    stream.expect(Token::Colon)?;
    let body = parse_block_until(stream, &[Token::End])?;
    stream.expect(Token::End)?;
    Ok(StmtKind::While { condition, body })
}
