//! Declared types and initializers of declarations.
//!
//! Initial values of state variables and alias definitions are left to
//! their own checkers so each problem is reported once.

use super::{declared_names, Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use crate::symbols::{SymbolType, VariableBlock};
use crate::types::ExprType;
use nestml_ast::{Declaration, Initializer, NodeKind, NodeRef};

pub struct UnitDeclaration;

impl Coco for UnitDeclaration {
    fn id(&self) -> &'static str {
        "UnitDeclarationCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Declaration, NodeKind::InputPort]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        match node {
            NodeRef::Declaration(decl) => check_declaration(decl, ctx),
            NodeRef::InputPort(port) => {
                let table = ctx.table;
                let (Some(ty), Some(symbol)) = (&port.ty, table.symbols_of(port.id).first()) else {
                    return Ok(());
                };
                let declared = table.symbol(*symbol).as_variable().map(|v| &v.ty);
                if let Some(SymbolType::Unknown(unit)) = declared {
                    ctx.error(
                        FindingCode::UnknownUnit,
                        ty.span,
                        format!("unknown unit '{}' in input port '{}'", unit, port.name.name),
                    )?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn check_declaration(
    decl: &Declaration,
    ctx: &mut CocoContext<'_, '_>,
) -> Result<(), AnalysisError> {
    let (table, types) = (ctx.table, ctx.types);
    let Some(symbol) = table.symbols_of(decl.id).first().copied() else {
        return Ok(());
    };
    let Some(var) = table.symbol(symbol).as_variable() else {
        return Ok(());
    };
    let names = declared_names(decl);

    let target = match &var.ty {
        SymbolType::Known(t) => *t,
        SymbolType::Unknown(unit) => {
            return ctx.error(
                FindingCode::UnknownUnit,
                decl.ty.span,
                format!("unknown unit '{}' in the declaration of '{}'", unit, names),
            );
        }
        SymbolType::Pending | SymbolType::FromDefinition => return Ok(()),
    };
    let checks_initializer = var.block != VariableBlock::State && !decl.is_alias;

    match &decl.initializer {
        Some(Initializer::List(items)) => {
            let values: Vec<ExprType> = items.iter().filter_map(|e| types.valid(e)).collect();
            let first = values.iter().find(|v| v.is_numeric());
            let mixed = first.and_then(|first| {
                values
                    .iter()
                    .find(|v| v.is_numeric() && !v.unit.same_dimension(&first.unit))
                    .map(|other| (*first, *other))
            });
            if let Some((a, b)) = mixed {
                ctx.error(
                    FindingCode::MixedArrayDimensions,
                    decl.span,
                    format!("the initializer of '{}' mixes {} and {}", names, a, b),
                )?;
            } else if checks_initializer {
                for (item, value) in items.iter().filter_map(|e| types.valid(e).map(|v| (e, v))) {
                    ctx.check_assignable(
                        &target,
                        &value,
                        item.span,
                        &format!("the declaration of '{}'", names),
                    )?;
                }
            }
        }
        Some(Initializer::Single(expr)) if checks_initializer => {
            if let Some(value) = types.valid(expr) {
                ctx.check_assignable(
                    &target,
                    &value,
                    expr.span,
                    &format!("the declaration of '{}'", names),
                )?;
            }
        }
        Some(Initializer::Single(_)) | None => {}
    }

    if let Some(guard) = &decl.guard {
        if let Some(t) = types.valid(guard).filter(|t| !t.is_boolean()) {
            ctx.error(
                FindingCode::TypeMismatch,
                guard.span,
                format!("the guard of '{}' must be boolean, got {}", names, t),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};
    use crate::findings::FindingKind;

    fn check_params(params: &str) -> crate::findings::Findings {
        run_checker(
            &format!("neuron n:\n  parameters:\n{}\n  end\nend\n", params),
            &UnitDeclaration,
        )
    }

    #[test]
    fn test_unknown_units() {
        let findings = check_params("    a furlong = 1\n    b mV/fortnight = 1 mV");
        assert_eq!(
            codes(&findings),
            vec![FindingCode::UnknownUnit, FindingCode::UnknownUnit]
        );
        assert!(findings.iter().next().unwrap().message.contains("furlong"));
    }

    #[test]
    fn test_initializer_rules() {
        let findings = check_params(
            "    a mV = 1 V\n    b mV = 1 ms\n    c integer = 1.5\n    d boolean = 1\n    e mV = 3 mV",
        );
        assert_eq!(
            codes(&findings),
            vec![
                FindingCode::ImplicitMagnitudeConversion,
                FindingCode::IncompatibleDimensions,
                FindingCode::ImplicitTypeConversion,
                FindingCode::TypeMismatch,
            ]
        );
        assert_eq!(findings.count(FindingKind::Error), 2);
    }

    #[test]
    fn test_state_and_alias_are_skipped() {
        let findings = run_checker(
            "neuron n:\n  state:\n    a mV = 1 ms\n  end\n  parameters:\n    alias b mV = 1 ms\n  end\nend\n",
            &UnitDeclaration,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_arrays_and_guards() {
        let findings = check_params(
            "    w real = [1.0, 2.0]\n    m mV = [1 mV, 2 ms]\n    E_L mV = -70 mV [[ E_L < 0 mV ]]\n    x real = 1 [[ x + 1 ]]",
        );
        assert_eq!(
            codes(&findings),
            vec![FindingCode::MixedArrayDimensions, FindingCode::TypeMismatch]
        );
    }

    #[test]
    fn test_input_port_units() {
        let findings = run_checker(
            "neuron n:\n  input:\n    exc pA <- spike\n    stim blarg <- current\n  end\nend\n",
            &UnitDeclaration,
        );
        assert_eq!(codes(&findings), vec![FindingCode::UnknownUnit]);
    }
}
