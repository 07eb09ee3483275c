//! Hand-written recursive descent parser for NESTML.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead, line tracking and node ids
//! - `error`: ParseError
//! - `expr`: Expression parser using Pratt parsing
//! - `decl`: Entity and body-block parsers (keyword-dispatched)
//! - `stmt`: Declarations and statements
//! - `types`: Type and unit-type parsers

mod decl;
mod error;
mod expr;
mod stmt;
mod stream;
mod types;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use nestml_ast::{CompilationUnit, Declaration, Expr};
use nestml_lexer::tokenize;

/// Parse a whole `.nestml` source file.
///
/// # Parameters
/// - `source`: File contents
/// - `file_id`: Id of the file in the caller's `SourceMap`
///
/// # Returns
/// - `Ok(CompilationUnit)` if parsing succeeds
/// - `Err(Vec<ParseError>)` with one error per entity that failed to parse
pub fn parse_compilation_unit(
    source: &str,
    file_id: u16,
) -> Result<CompilationUnit, Vec<ParseError>> {
    let tokens = tokenize(source).map_err(|e| vec![ParseError::from_lex(&e, file_id)])?;
    let mut stream = TokenStream::new(&tokens, file_id);

    let (entities, errors) = decl::parse_entities(&mut stream);
    if !errors.is_empty() {
        return Err(errors);
    }

    let span = nestml_ast::Span::new(file_id, 0, source.len() as u32, 1);
    let id = stream.fresh_id();
    Ok(CompilationUnit {
        id,
        file_id,
        entities,
        span,
        node_count: stream.node_count(),
    })
}

/// Parse a standalone expression.
pub fn parse_expression(source: &str, file_id: u16) -> Result<Expr, Vec<ParseError>> {
    let tokens = tokenize(source).map_err(|e| vec![ParseError::from_lex(&e, file_id)])?;
    let mut stream = TokenStream::new(&tokens, file_id);
    let expr = expr::parse_expr(&mut stream).map_err(|e| vec![e])?;
    expect_eof(&stream)?;
    Ok(expr)
}

/// Parse a single declaration line such as
/// `P00 real = -Tau*tau_in*(Tau*h*exp(h/Tau) + 1) # PXX`.
///
/// Used to turn lines produced by external ODE solvers back into AST.
pub fn parse_declaration_line(line: &str) -> Result<Declaration, Vec<ParseError>> {
    let tokens = tokenize(line).map_err(|e| vec![ParseError::from_lex(&e, 0)])?;
    let mut stream = TokenStream::new(&tokens, 0);
    let decl = stmt::parse_declaration(&mut stream).map_err(|e| vec![e])?;
    expect_eof(&stream)?;
    Ok(decl)
}

fn expect_eof(stream: &TokenStream) -> Result<(), Vec<ParseError>> {
    if stream.at_end() {
        return Ok(());
    }
    Err(vec![ParseError::unexpected_token(
        stream.peek(),
        "after end of input was expected",
        stream.current_span(),
    )])
}
