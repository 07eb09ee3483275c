//! Alias definitions.
//!
//! An alias is a name for an expression; it needs one, and the expression
//! has to fit the declared type.

use super::{declared_names, Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use nestml_ast::{NodeKind, NodeRef};

pub struct AliasHasDefiningExpression;

impl Coco for AliasHasDefiningExpression {
    fn id(&self) -> &'static str {
        "AliasHasDefiningExpressionCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Declaration]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        let NodeRef::Declaration(decl) = node else {
            return Ok(());
        };
        if !decl.is_alias {
            return Ok(());
        }
        let names = declared_names(decl);
        let Some(initializer) = &decl.initializer else {
            return ctx.error(
                FindingCode::AliasNoDefinition,
                decl.span,
                format!("alias '{}' has no defining expression", names),
            );
        };

        let Some(target) = ctx.declared_type(decl.id) else {
            return Ok(());
        };
        let types = ctx.types;
        let what = format!("the definition of alias '{}'", names);
        for expr in initializer.exprs() {
            if let Some(value) = types.valid(expr) {
                ctx.check_assignable(&target, &value, expr.span, &what)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};

    #[test]
    fn test_alias_needs_definition() {
        let source = "\
neuron n:
  state:
    V_m mV = 0 mV
    alias V_rel mV
  end
  internals:
    alias h ms = resolution()
  end
end
";
        let findings = run_checker(source, &AliasHasDefiningExpression);
        assert_eq!(codes(&findings), vec![FindingCode::AliasNoDefinition]);
        assert_eq!(
            findings.iter().next().unwrap().message,
            "alias 'V_rel' has no defining expression"
        );
    }

    #[test]
    fn test_alias_definition_type() {
        let source = "\
neuron n:
  parameters:
    tau ms = 1 ms
    alias rate 1/s = 1 / tau
    alias bad mV = tau
  end
end
";
        let findings = run_checker(source, &AliasHasDefiningExpression);
        assert_eq!(
            codes(&findings),
            vec![
                FindingCode::ImplicitMagnitudeConversion,
                FindingCode::IncompatibleDimensions,
            ]
        );
    }
}
