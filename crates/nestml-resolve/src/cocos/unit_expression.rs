//! Expression typing rules.
//!
//! Reports the issues type inference attached to each expression node, in
//! pre-order, plus non-boolean `if`/`while` conditions.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use nestml_ast::{Expr, NodeKind, NodeRef, StmtKind};

pub struct UnitExpression;

impl Coco for UnitExpression {
    fn id(&self) -> &'static str {
        "UnitExpressionCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Stmt, NodeKind::Expr]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        match node {
            NodeRef::Expr(expr) => {
                let types = ctx.types;
                for issue in types.issues(expr.id) {
                    ctx.issue(issue)?;
                }
                Ok(())
            }
            NodeRef::Stmt(stmt) => match &stmt.kind {
                StmtKind::If(if_stmt) => {
                    for (condition, _) in &if_stmt.branches {
                        check_condition("if", condition, ctx)?;
                    }
                    Ok(())
                }
                StmtKind::While { condition, .. } => check_condition("while", condition, ctx),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

fn check_condition(
    keyword: &str,
    condition: &Expr,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    match ctx.types.valid(condition) {
        Some(t) if !t.is_boolean() => ctx.error(
            FindingCode::TypeMismatch,
            condition.span,
            format!("the condition of '{}' must be boolean, got {}", keyword, t),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};
    use crate::findings::FindingKind;

    #[test]
    fn test_issues_in_pre_order() {
        let source = "\
neuron n:
  state:
    V_m mV = 0 mV
  end
  update:
    V_m = V_m + 1 V
    if V_m + 1 ms > 0 mV:
      V_m = undefined
    end
    while 1:
    end
  end
end
";
        let findings = run_checker(source, &UnitExpression);
        assert_eq!(
            codes(&findings),
            vec![
                FindingCode::ImplicitMagnitudeConversion,
                FindingCode::IncompatibleDimensions,
                FindingCode::UnresolvedVariable,
                FindingCode::TypeMismatch,
            ]
        );
        assert_eq!(findings.count(FindingKind::Warning), 1);
        assert!(findings.iter().all(|f| f.checker == "UnitExpressionCoCo"));
    }
}
