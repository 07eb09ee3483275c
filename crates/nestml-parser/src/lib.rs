//! Hand-written recursive descent parser for NESTML.
//!
//! Turns source text into the [`nestml_ast`] tree consumed by the semantic
//! core. The parser only checks syntax; names, types and units are resolved
//! later.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod parser;

pub use parser::{
    parse_compilation_unit, parse_declaration_line, parse_expression, ParseError,
    ParseErrorKind,
};

// Re-export lexer
pub use nestml_lexer::Token;
