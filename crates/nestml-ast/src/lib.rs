//! NESTML AST and source tracking.
//!
//! Shared by the parser (which builds the tree) and the semantic core
//! (which reads it).
//!
//! # Pipeline Position
//!
//! ```text
//! Lexer -> Parser -> AST -> Symbol table -> Type inference -> CoCos
//!                    ^^^
//!                 YOU ARE HERE
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ast;
pub mod foundation;

pub use ast::walk::{self, walk_expr, walk_unit, NodeKind, NodeRef};
pub use ast::*;
pub use foundation::{NodeId, NodeIdGen, SourceFile, SourceMap, SourcePosition, Span};
