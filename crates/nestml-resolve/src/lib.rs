//! Semantic analysis for NESTML.
//!
//! Builds the scoped symbol table of a parsed compilation unit, infers a
//! type and physical unit for every expression, and runs the context
//! conditions (CoCos) that report what the grammar cannot express.
//!
//! # Pipeline Position
//!
//! ```text
//! Lexer -> Parser -> AST -> Symbol table -> Type inference -> CoCos
//!                           ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!                                     YOU ARE HERE
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use nestml_resolve::{analyze, AnalysisConfig};
//!
//! let analysis = analyze(&unit, &sources, &AnalysisConfig::collect_all())?;
//! for finding in analysis.findings.errors() {
//!     println!("{}", finding);
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod builder;
pub mod cocos;
pub mod config;
pub mod findings;
pub mod inference;
pub mod pipeline;
pub mod predefined;
pub mod resolver;
pub mod symbols;
pub mod types;

pub use builder::{build_symbol_table, BUILDER_ID};
pub use cocos::{Coco, CocoContext, CocoRunner};
pub use config::AnalysisConfig;
pub use findings::{AnalysisError, Finding, FindingCode, FindingKind, FindingSink, Findings};
pub use inference::{infer_types, ExprTypes, TypeIssue};
pub use pipeline::{analyze, Analysis};
pub use predefined::Predefined;
pub use symbols::{
    ScopeId, ScopeKind, Symbol, SymbolData, SymbolId, SymbolKind, SymbolTable, SymbolType,
    VariableBlock,
};
pub use types::{BaseType, ExprType, TypeRecord};
