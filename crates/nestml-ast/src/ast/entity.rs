//! Top-level entities (neurons and components) and their body blocks.

use super::expr::{Expr, Ident};
use super::stmt::{Block, Declaration};
use super::types::TypeExpr;
use crate::foundation::{NodeId, Span};
use serde::{Deserialize, Serialize};

/// One parsed `.nestml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub file_id: u16,
    pub entities: Vec<Entity>,
    pub span: Span,
    /// Number of node ids assigned while building this unit.
    pub node_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Neuron,
    /// Reusable bundle; `get_instance` is reserved by the compiler.
    Component,
}

impl EntityKind {
    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::Neuron => "neuron",
            EntityKind::Component => "component",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: NodeId,
    pub kind: EntityKind,
    pub name: Ident,
    pub body: Vec<BodyElement>,
    pub span: Span,
}

impl Entity {
    pub fn var_blocks(&self) -> impl Iterator<Item = &VarBlock> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Block(b) => Some(b),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Function(f) => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyElement {
    Block(VarBlock),
    Equations(EquationsBlock),
    Input(InputBlock),
    Output(OutputBlock),
    Update(UpdateBlock),
    Function(FunctionDef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    State,
    Parameters,
    Internals,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::State => "state",
            BlockKind::Parameters => "parameters",
            BlockKind::Internals => "internals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarBlock {
    pub id: NodeId,
    pub kind: BlockKind,
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationsBlock {
    pub id: NodeId,
    pub equations: Vec<Equation>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Equation {
    Ode(OdeEquation),
    Shape(ShapeDef),
}

/// `x' = rhs`; `order` counts the primes on the left-hand side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeEquation {
    pub id: NodeId,
    /// Variable name without primes.
    pub lhs: Ident,
    pub order: u32,
    pub rhs: Expr,
    pub span: Span,
}

impl OdeEquation {
    /// Left-hand side as written, e.g. `g_ex''`.
    pub fn lhs_text(&self) -> String {
        format!("{}{}", self.lhs.name, "'".repeat(self.order as usize))
    }
}

/// `shape g = expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub id: NodeId,
    pub name: Ident,
    pub rhs: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBlock {
    pub id: NodeId,
    pub ports: Vec<InputPort>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Spike,
    Current,
}

impl SignalKind {
    pub fn keyword(self) -> &'static str {
        match self {
            SignalKind::Spike => "spike",
            SignalKind::Current => "current",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputModifier {
    Inhibitory,
    Excitatory,
}

/// `spikes_ex pA <- excitatory spike`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPort {
    pub id: NodeId,
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub modifier: Option<InputModifier>,
    pub signal: SignalKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBlock {
    pub id: NodeId,
    pub signal: SignalKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBlock {
    pub id: NodeId,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub id: NodeId,
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub id: NodeId,
    pub name: Ident,
    pub params: Vec<Param>,
    /// `None` means `void`.
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}
