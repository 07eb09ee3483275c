//! NESTML abstract syntax tree.
//!
//! Every node carries a [`NodeId`](crate::foundation::NodeId) and a
//! [`Span`](crate::foundation::Span). Node ids are unique within one
//! compilation unit; analysis results are keyed by them instead of by
//! pointers into the tree.

pub mod entity;
pub mod expr;
pub mod stmt;
pub mod types;
pub mod walk;

pub use entity::*;
pub use expr::*;
pub use stmt::*;
pub use types::*;
