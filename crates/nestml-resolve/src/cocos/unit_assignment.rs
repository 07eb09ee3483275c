//! Assignments, compound assignments and loop ranges.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use crate::symbols::{SymbolId, SymbolKind};
use nestml_ast::{AssignOp, Assignment, ForStmt, Ident, NodeId, NodeKind, NodeRef, StmtKind};

pub struct UnitAssignment;

impl Coco for UnitAssignment {
    fn id(&self) -> &'static str {
        "UnitAssignmentCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Stmt]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        let NodeRef::Stmt(stmt) = node else {
            return Ok(());
        };
        match &stmt.kind {
            StmtKind::Assignment(assignment) => check_assignment(stmt.id, assignment, ctx),
            StmtKind::For(for_stmt) => check_loop(stmt.id, for_stmt, ctx),
            _ => Ok(()),
        }
    }
}

/// Resolve an assignment target, reporting a miss.
fn resolve_target(
    holder: NodeId,
    target: &Ident,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<Option<SymbolId>, AnalysisError> {
    let scope = ctx.scope_of(holder)?;
    match ctx.table.resolve(scope, &target.name, SymbolKind::Variable) {
        Some(id) => Ok(Some(id)),
        None => {
            ctx.error(
                FindingCode::UnresolvedVariable,
                target.span,
                format!("cannot resolve the variable '{}'", target.name),
            )?;
            Ok(None)
        }
    }
}

fn check_assignment(
    holder: NodeId,
    assignment: &Assignment,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let Some(id) = resolve_target(holder, &assignment.target, ctx)? else {
        return Ok(());
    };
    let (Some(target), Some(value)) = (
        ctx.table.variable_type(id).copied(),
        ctx.types.valid(&assignment.value),
    ) else {
        return Ok(());
    };
    let name = &assignment.target.name;

    match assignment.op {
        AssignOp::Assign | AssignOp::AddAssign | AssignOp::SubAssign => ctx.check_assignable(
            &target,
            &value,
            assignment.value.span,
            &format!("the assignment to '{}'", name),
        ),
        AssignOp::MulAssign | AssignOp::DivAssign => {
            if !target.is_numeric() || !value.is_numeric() {
                ctx.error(
                    FindingCode::TypeMismatch,
                    assignment.value.span,
                    format!(
                        "cannot apply '{}' to {} and {}",
                        assignment.op.symbol(),
                        target,
                        value
                    ),
                )
            } else if !value.unit.is_dimensionless() {
                ctx.error(
                    FindingCode::IncompatibleDimensions,
                    assignment.value.span,
                    format!(
                        "'{}' on '{}' needs a dimensionless value, got {}",
                        assignment.op.symbol(),
                        name,
                        value
                    ),
                )
            } else {
                Ok(())
            }
        }
    }
}

fn check_loop(
    holder: NodeId,
    for_stmt: &ForStmt,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let Some(id) = resolve_target(holder, &for_stmt.var, ctx)? else {
        return Ok(());
    };
    let Some(target) = ctx.table.variable_type(id).copied() else {
        return Ok(());
    };
    let what = format!("the range of loop variable '{}'", for_stmt.var.name);
    let bounds = [Some(&for_stmt.from), Some(&for_stmt.to), for_stmt.step.as_ref()];
    for bound in bounds.into_iter().flatten() {
        if let Some(value) = ctx.types.valid(bound) {
            ctx.check_assignable(&target, &value, bound.span, &what)?;
        }
    }
    Ok(())
}
