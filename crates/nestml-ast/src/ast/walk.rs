//! Tree walking utilities.
//!
//! Provides shared traversal logic so that the symbol-table builder, type
//! inference and every checker see the AST in the same order.
//!
//! # Design
//!
//! - **Minimal API** - `walk_unit` for whole files, `walk_expr` for expression
//!   trees, not a visitor trait hierarchy
//! - **Pre-order traversal** - visitor called before recursing into children,
//!   children in source order
//! - **Typed node handle** - [`NodeRef`] lets one closure see every node kind;
//!   [`NodeKind`] is the tag checkers subscribe to
//!
//! # Examples
//!
//! ```rust,ignore
//! use nestml_ast::walk::{walk_unit, NodeRef};
//!
//! // Collect every function name
//! let mut names = Vec::new();
//! walk_unit(&unit, &mut |node| {
//!     if let NodeRef::Function(f) = node {
//!         names.push(f.name.name.clone());
//!     }
//! });
//! ```

use super::entity::*;
use super::expr::{Expr, ExprKind};
use super::stmt::{Block, Declaration, Stmt, StmtKind};
use crate::foundation::{NodeId, Span};

/// Borrowed handle to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Unit(&'a CompilationUnit),
    Entity(&'a Entity),
    VarBlock(&'a VarBlock),
    Declaration(&'a Declaration),
    Equations(&'a EquationsBlock),
    Ode(&'a OdeEquation),
    Shape(&'a ShapeDef),
    Input(&'a InputBlock),
    InputPort(&'a InputPort),
    Output(&'a OutputBlock),
    Update(&'a UpdateBlock),
    Function(&'a FunctionDef),
    Param(&'a Param),
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

/// Node-kind tag, used for checker subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Unit,
    Entity,
    VarBlock,
    Declaration,
    Equations,
    Ode,
    Shape,
    Input,
    InputPort,
    Output,
    Update,
    Function,
    Param,
    Block,
    Stmt,
    Expr,
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Unit(_) => NodeKind::Unit,
            NodeRef::Entity(_) => NodeKind::Entity,
            NodeRef::VarBlock(_) => NodeKind::VarBlock,
            NodeRef::Declaration(_) => NodeKind::Declaration,
            NodeRef::Equations(_) => NodeKind::Equations,
            NodeRef::Ode(_) => NodeKind::Ode,
            NodeRef::Shape(_) => NodeKind::Shape,
            NodeRef::Input(_) => NodeKind::Input,
            NodeRef::InputPort(_) => NodeKind::InputPort,
            NodeRef::Output(_) => NodeKind::Output,
            NodeRef::Update(_) => NodeKind::Update,
            NodeRef::Function(_) => NodeKind::Function,
            NodeRef::Param(_) => NodeKind::Param,
            NodeRef::Block(_) => NodeKind::Block,
            NodeRef::Stmt(_) => NodeKind::Stmt,
            NodeRef::Expr(_) => NodeKind::Expr,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::Unit(n) => n.id,
            NodeRef::Entity(n) => n.id,
            NodeRef::VarBlock(n) => n.id,
            NodeRef::Declaration(n) => n.id,
            NodeRef::Equations(n) => n.id,
            NodeRef::Ode(n) => n.id,
            NodeRef::Shape(n) => n.id,
            NodeRef::Input(n) => n.id,
            NodeRef::InputPort(n) => n.id,
            NodeRef::Output(n) => n.id,
            NodeRef::Update(n) => n.id,
            NodeRef::Function(n) => n.id,
            NodeRef::Param(n) => n.id,
            NodeRef::Block(n) => n.id,
            NodeRef::Stmt(n) => n.id,
            NodeRef::Expr(n) => n.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            NodeRef::Unit(n) => n.span,
            NodeRef::Entity(n) => n.span,
            NodeRef::VarBlock(n) => n.span,
            NodeRef::Declaration(n) => n.span,
            NodeRef::Equations(n) => n.span,
            NodeRef::Ode(n) => n.span,
            NodeRef::Shape(n) => n.span,
            NodeRef::Input(n) => n.span,
            NodeRef::InputPort(n) => n.span,
            NodeRef::Output(n) => n.span,
            NodeRef::Update(n) => n.span,
            NodeRef::Function(n) => n.span,
            NodeRef::Param(n) => n.span,
            NodeRef::Block(n) => n.span,
            NodeRef::Stmt(n) => n.span,
            NodeRef::Expr(n) => n.span,
        }
    }
}

/// Walk a whole compilation unit in pre-order.
pub fn walk_unit<'a, V>(unit: &'a CompilationUnit, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Unit(unit));
    for entity in &unit.entities {
        walk_entity(entity, visitor);
    }
}

pub fn walk_entity<'a, V>(entity: &'a Entity, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Entity(entity));
    for element in &entity.body {
        match element {
            BodyElement::Block(block) => {
                visitor(NodeRef::VarBlock(block));
                for decl in &block.declarations {
                    walk_declaration(decl, visitor);
                }
            }
            BodyElement::Equations(eqs) => {
                visitor(NodeRef::Equations(eqs));
                for eq in &eqs.equations {
                    match eq {
                        Equation::Ode(ode) => {
                            visitor(NodeRef::Ode(ode));
                            walk_expr_nodes(&ode.rhs, visitor);
                        }
                        Equation::Shape(shape) => {
                            visitor(NodeRef::Shape(shape));
                            walk_expr_nodes(&shape.rhs, visitor);
                        }
                    }
                }
            }
            BodyElement::Input(input) => {
                visitor(NodeRef::Input(input));
                for port in &input.ports {
                    visitor(NodeRef::InputPort(port));
                }
            }
            BodyElement::Output(output) => visitor(NodeRef::Output(output)),
            BodyElement::Update(update) => {
                visitor(NodeRef::Update(update));
                walk_block(&update.body, visitor);
            }
            BodyElement::Function(function) => {
                visitor(NodeRef::Function(function));
                for param in &function.params {
                    visitor(NodeRef::Param(param));
                }
                walk_block(&function.body, visitor);
            }
        }
    }
}

fn walk_declaration<'a, V>(decl: &'a Declaration, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Declaration(decl));
    if let Some(init) = &decl.initializer {
        for expr in init.exprs() {
            walk_expr_nodes(expr, visitor);
        }
    }
    if let Some(guard) = &decl.guard {
        walk_expr_nodes(guard, visitor);
    }
}

pub fn walk_block<'a, V>(block: &'a Block, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Block(block));
    for stmt in &block.stmts {
        walk_stmt(stmt, visitor);
    }
}

fn walk_stmt<'a, V>(stmt: &'a Stmt, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Stmt(stmt));
    match &stmt.kind {
        StmtKind::Declaration(decl) => walk_declaration(decl, visitor),
        StmtKind::Assignment(assign) => walk_expr_nodes(&assign.value, visitor),
        StmtKind::Call(expr) => walk_expr_nodes(expr, visitor),
        StmtKind::Return(value) => {
            if let Some(expr) = value {
                walk_expr_nodes(expr, visitor);
            }
        }
        StmtKind::If(if_stmt) => {
            for (condition, body) in &if_stmt.branches {
                walk_expr_nodes(condition, visitor);
                walk_block(body, visitor);
            }
            if let Some(body) = &if_stmt.else_block {
                walk_block(body, visitor);
            }
        }
        StmtKind::For(for_stmt) => {
            walk_expr_nodes(&for_stmt.from, visitor);
            walk_expr_nodes(&for_stmt.to, visitor);
            if let Some(step) = &for_stmt.step {
                walk_expr_nodes(step, visitor);
            }
            walk_block(&for_stmt.body, visitor);
        }
        StmtKind::While { condition, body } => {
            walk_expr_nodes(condition, visitor);
            walk_block(body, visitor);
        }
    }
}

fn walk_expr_nodes<'a, V>(expr: &'a Expr, visitor: &mut V)
where
    V: FnMut(NodeRef<'a>),
{
    walk_expr(expr, &mut |e| visitor(NodeRef::Expr(e)));
}

/// Recursively walk an expression tree in pre-order.
///
/// # Traversal Order
///
/// 1. Visit current node
/// 2. Recursively visit children left-to-right
pub fn walk_expr<'a, V>(expr: &'a Expr, visitor: &mut V)
where
    V: FnMut(&'a Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, visitor);
            walk_expr(rhs, visitor);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            walk_expr(condition, visitor);
            walk_expr(then_branch, visitor);
            walk_expr(else_branch, visitor);
        }
        ExprKind::Paren(inner) => walk_expr(inner, visitor),

        // === Leaf nodes ===
        ExprKind::IntLiteral(_)
        | ExprKind::RealLiteral(_)
        | ExprKind::Quantity { .. }
        | ExprKind::BoolLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::Name(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{BinaryOp, Ident};
    use crate::foundation::NodeIdGen;

    fn leaf(ids: &mut NodeIdGen, name: &str) -> Expr {
        Expr::new(ids.fresh(), ExprKind::Name(name.to_string()), Span::zero(0))
    }

    #[test]
    fn test_walk_expr_pre_order() {
        let mut ids = NodeIdGen::new();
        let id = ids.fresh();
        let a = leaf(&mut ids, "a");
        let b = leaf(&mut ids, "b");
        let expr = Expr::new(
            id,
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(a),
                rhs: Box::new(b),
            },
            Span::zero(0),
        );

        let mut seen = Vec::new();
        walk_expr(&expr, &mut |e| seen.push(e.id.0));
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_walk_call_args_in_order() {
        let mut ids = NodeIdGen::new();
        let id = ids.fresh();
        let args = vec![leaf(&mut ids, "x"), leaf(&mut ids, "y")];
        let call = Expr::new(
            id,
            ExprKind::Call {
                callee: Ident::new("max", Span::zero(0)),
                args,
            },
            Span::zero(0),
        );

        let mut names = Vec::new();
        walk_expr(&call, &mut |e| {
            if let ExprKind::Name(n) = &e.kind {
                names.push(n.clone());
            }
        });
        assert_eq!(names, vec!["x", "y"]);
    }
}
