//! Core identity and location types shared by every front-end stage.

pub mod span;

pub use span::{SourceFile, SourceMap, SourcePosition, Span};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an AST node within one compilation unit.
///
/// Assigned by the parser in creation order; analysis results (enclosing
/// scopes, type records, declared symbols) are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`NodeId`]s.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> u32 {
        self.next
    }
}
