//! Function signatures and return statements.
//!
//! Parameter and return types must resolve; a function with a non-void
//! return type must return a value, a void function must not, and every
//! returned value must fit the declared return type.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use crate::symbols::{ReturnSpec, ScopeKind, SymbolType};
use crate::types::BaseType;
use nestml_ast::{Block, Expr, FunctionDef, NodeId, NodeKind, NodeRef, Span, Stmt, StmtKind};

pub struct FunctionSignature;

impl Coco for FunctionSignature {
    fn id(&self) -> &'static str {
        "FunctionSignatureCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Function, NodeKind::Stmt]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        match node {
            NodeRef::Function(function) => check_signature(function, ctx),
            NodeRef::Stmt(Stmt {
                id,
                kind: StmtKind::Return(value),
                span,
            }) => check_return(*id, value.as_ref(), *span, ctx),
            _ => Ok(()),
        }
    }
}

fn check_signature(
    function: &FunctionDef,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let table = ctx.table;
    let name = &function.name.name;

    for param in &function.params {
        let unknown = table
            .symbols_of(param.id)
            .first()
            .and_then(|id| table.symbol(*id).as_variable())
            .and_then(|v| match &v.ty {
                SymbolType::Unknown(unit) => Some(unit),
                _ => None,
            });
        if let Some(unit) = unknown {
            ctx.error(
                FindingCode::UnknownUnit,
                param.ty.span,
                format!(
                    "unknown unit '{}' in parameter '{}' of function '{}'",
                    unit, param.name.name, name
                ),
            )?;
        }
    }

    let Some(method) = table
        .symbols_of(function.id)
        .first()
        .and_then(|id| table.symbol(*id).as_method())
    else {
        return Ok(());
    };
    match (&method.returns, &function.return_type) {
        (ReturnSpec::Typed(SymbolType::Unknown(unit)), Some(ty)) => ctx.error(
            FindingCode::UnknownUnit,
            ty.span,
            format!("unknown unit '{}' in the return type of function '{}'", unit, name),
        ),
        (ReturnSpec::Typed(SymbolType::Known(t)), _)
            if t.base != BaseType::Void && !returns_value(&function.body) =>
        {
            ctx.error(
                FindingCode::MissingReturn,
                function.name.span,
                format!("function '{}' must return a value of type {}", name, t),
            )
        }
        _ => Ok(()),
    }
}

/// Whether any `return` in `block` (or a nested block) carries a value.
fn returns_value(block: &Block) -> bool {
    block.stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Return(value) => value.is_some(),
        StmtKind::If(if_stmt) => {
            if_stmt.branches.iter().any(|(_, body)| returns_value(body))
                || if_stmt.else_block.as_ref().is_some_and(returns_value)
        }
        StmtKind::For(for_stmt) => returns_value(&for_stmt.body),
        StmtKind::While { body, .. } => returns_value(body),
        StmtKind::Declaration(_) | StmtKind::Assignment(_) | StmtKind::Call(_) => false,
    })
}

fn check_return(
    stmt: NodeId,
    value: Option<&Expr>,
    span: Span,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let (table, types) = (ctx.table, ctx.types);
    let scope = ctx.scope_of(stmt)?;
    // Returns in the update block end the step; they have no signature.
    let Some(function_scope) = table.ancestor_of_kind(scope, ScopeKind::Function) else {
        return Ok(());
    };
    let Some(owner) = table.scope(function_scope).owner else {
        return Ok(());
    };
    let method = table.symbol(owner);
    let Some(ReturnSpec::Typed(SymbolType::Known(expected))) =
        method.as_method().map(|m| &m.returns)
    else {
        return Ok(());
    };

    match value {
        Some(value) if expected.base == BaseType::Void => ctx.error(
            FindingCode::UnexpectedReturnValue,
            value.span,
            format!("function '{}' is void but returns a value", method.name),
        ),
        Some(value) => match types.valid(value) {
            Some(actual) => ctx.check_assignable(
                expected,
                &actual,
                value.span,
                &format!("the return value of '{}'", method.name),
            ),
            None => Ok(()),
        },
        None if expected.base != BaseType::Void => ctx.error(
            FindingCode::MissingReturn,
            span,
            format!("function '{}' must return a value of type {}", method.name, expected),
        ),
        None => Ok(()),
    }
}
