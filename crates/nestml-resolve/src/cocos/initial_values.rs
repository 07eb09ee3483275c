//! Initial values of state variables.
//!
//! Every non-alias state variable needs an initial value whose unit matches
//! its declared type.

use super::{declared_names, Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use nestml_ast::{BlockKind, Declaration, NodeKind, NodeRef};

pub struct InitialValues;

impl Coco for InitialValues {
    fn id(&self) -> &'static str {
        "InitialValuesCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::VarBlock]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        let NodeRef::VarBlock(block) = node else {
            return Ok(());
        };
        if block.kind != BlockKind::State {
            return Ok(());
        }
        for decl in block.declarations.iter().filter(|d| !d.is_alias) {
            check_state_declaration(decl, ctx)?;
        }
        Ok(())
    }
}

fn check_state_declaration(
    decl: &Declaration,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let names = declared_names(decl);
    let Some(initializer) = &decl.initializer else {
        let (noun, verb) = if decl.names.len() > 1 {
            ("variables", "have")
        } else {
            ("variable", "has")
        };
        return ctx.error(
            FindingCode::MissingInitialValue,
            decl.span,
            format!("state {} '{}' {} no initial value", noun, names, verb),
        );
    };

    let Some(target) = ctx.declared_type(decl.id) else {
        return Ok(());
    };
    let types = ctx.types;
    let what = format!("the initial value of '{}'", names);
    for expr in initializer.exprs() {
        if let Some(value) = types.valid(expr) {
            ctx.check_assignable(&target, &value, expr.span, &what)?;
        }
    }
    Ok(())
}
