//! Declarations, statements and blocks.

use super::expr::{Expr, Ident};
use super::types::TypeExpr;
use crate::foundation::{NodeId, Span};
use serde::{Deserialize, Serialize};

/// `[alias] a, b mV = -70 mV [[ a < 0 mV ]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: NodeId,
    pub names: Vec<Ident>,
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub initializer: Option<Initializer>,
    /// Invariant guard written as `[[ expr ]]`.
    pub guard: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Single(Expr),
    /// Array initializer `[e1, e2, ...]`.
    List(Vec<Expr>),
}

impl Initializer {
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Initializer::Single(e) => vec![e],
            Initializer::List(items) => items.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Declaration(Declaration),
    Assignment(Assignment),
    /// A call evaluated for its effect (`emit_spike()`).
    Call(Expr),
    Return(Option<Expr>),
    If(IfStmt),
    For(ForStmt),
    While { condition: Expr, body: Block },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: Ident,
    pub op: AssignOp,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        }
    }
}

/// `if`/`elif` branches in source order, then the optional `else`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub branches: Vec<(Expr, Block)>,
    pub else_block: Option<Block>,
}

/// `for i in from ... to step s:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub var: Ident,
    pub from: Expr,
    pub to: Expr,
    pub step: Option<Expr>,
    pub body: Block,
}
