//! Units of ODE right-hand sides.
//!
//! `x' = rhs` requires `rhs` to have the unit of `x` per millisecond. For
//! higher orders the equation is read against the highest declared
//! derivative variable: `g'' = rhs` with a state variable `g'` is checked as
//! `(g')' = rhs`, otherwise as `g` per millisecond squared.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use crate::predefined::millis;
use crate::symbols::{SymbolId, SymbolKind, SymbolType};
use crate::types::ExprType;
use nestml_ast::{NodeKind, NodeRef, OdeEquation};
use nestml_units::{display_name, Conversion};

pub struct UnitOde;

impl Coco for UnitOde {
    fn id(&self) -> &'static str {
        "UnitODECoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Ode]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        match node {
            NodeRef::Ode(ode) => check_ode(ode, ctx),
            _ => Ok(()),
        }
    }
}

/// The variable an ODE integrates and how many derivative orders remain.
fn ode_target(
    ode: &OdeEquation,
    ctx: &CocoContext<'_, '_>,
) -> Result<Option<(SymbolId, u32)>, AnalysisError> {
    let scope = ctx.scope_of(ode.id)?;
    if ode.order > 1 {
        let lower = format!("{}{}", ode.lhs.name, "'".repeat(ode.order as usize - 1));
        if let Some(id) = ctx.table.resolve(scope, &lower, SymbolKind::Variable) {
            return Ok(Some((id, 1)));
        }
    }
    Ok(ctx
        .table
        .resolve(scope, &ode.lhs.name, SymbolKind::Variable)
        .map(|id| (id, ode.order)))
}

fn target_type(id: SymbolId, ctx: &CocoContext<'_, '_>) -> Option<ExprType> {
    let var = ctx.table.symbol(id).as_variable()?;
    match &var.ty {
        SymbolType::Known(t) => Some(*t),
        SymbolType::FromDefinition => ctx
            .types
            .derived_type(id)
            .or_else(|| var.initial_value.and_then(|rhs| ctx.types.get(rhs)))
            .and_then(|r| r.valid().copied()),
        SymbolType::Pending | SymbolType::Unknown(_) => None,
    }
}

fn check_ode(ode: &OdeEquation, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
    let lhs = ode.lhs_text();
    let Some((id, order)) = ode_target(ode, ctx)? else {
        return ctx.error(
            FindingCode::UnresolvedVariable,
            ode.lhs.span,
            format!("cannot resolve the variable '{}'", ode.lhs.name),
        );
    };
    let Some(target) = target_type(id, ctx) else {
        return Ok(());
    };
    if !target.is_numeric() {
        return ctx.error(
            FindingCode::TypeMismatch,
            ode.lhs.span,
            format!("cannot differentiate '{}' of type {}", ode.lhs.name, target),
        );
    }

    let Some(expected) = i32::try_from(order)
        .ok()
        .and_then(|k| millis().pow(k))
        .and_then(|step| target.unit.delta().divide(&step))
    else {
        return Ok(());
    };
    let Some(rhs) = ctx.types.valid(&ode.rhs) else {
        return Ok(());
    };
    if !rhs.is_numeric() {
        return ctx.error(
            FindingCode::TypeMismatch,
            ode.rhs.span,
            format!("the right-hand side of {} must be numeric, got {}", lhs, rhs),
        );
    }

    match rhs.unit.conversion_to(&expected) {
        Conversion::Identical => Ok(()),
        Conversion::Rescale => ctx.warning(
            FindingCode::ImplicitMagnitudeConversion,
            ode.rhs.span,
            format!(
                "implicit conversion from {} to {} in the right-hand side of {}",
                rhs,
                display_name(&expected),
                lhs
            ),
        ),
        Conversion::Incompatible => ctx.error(
            FindingCode::OdeDimensionMismatch,
            ode.rhs.span,
            format!(
                "the right-hand side of {} is {}, expected {}",
                lhs,
                rhs,
                display_name(&expected)
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};
    use crate::findings::FindingKind;

    fn check_equations(equations: &str) -> crate::findings::Findings {
        run_checker(
            &format!(
                "\
neuron n:
  state:
    V_m mV = -70 mV
    g_ex nS = 0 nS
    g_ex' nS/ms = 0 nS/ms
    g_in nS = 0 nS
    open boolean = false
  end
  equations:
{}
  end
  parameters:
    tau ms = 10 ms
    C_m pF = 250 pF
    I_e pA = 0 pA
  end
end
",
                equations
            ),
            &UnitOde,
        )
    }

    #[test]
    fn test_consistent_odes() {
        let findings = check_equations(
            "    shape k = exp(-t / tau) * nS\n    V_m' = -V_m / tau + I_e / C_m\n    g_ex'' = -g_ex' / tau - g_ex / tau**2\n    g_in'' = -g_in / tau**2\n    k' = -k / tau",
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_dimension_mismatch() {
        let findings = check_equations("    V_m' = V_m");
        assert_eq!(codes(&findings), vec![FindingCode::OdeDimensionMismatch]);
        let finding = findings.iter().next().unwrap();
        assert_eq!(finding.kind, FindingKind::Error);
        assert_eq!(
            finding.message,
            "the right-hand side of V_m' is mV, expected mV/ms"
        );
    }

    #[test]
    fn test_scale_mismatch_warns() {
        let findings = check_equations("    V_m' = 1 V / tau");
        assert_eq!(codes(&findings), vec![FindingCode::ImplicitMagnitudeConversion]);
        assert_eq!(findings.count(FindingKind::Error), 0);
    }

    #[test]
    fn test_unresolved_and_non_numeric_targets() {
        let findings = check_equations("    u' = 1 / tau\n    open' = 1 / tau\n    V_m' = undefined");
        assert_eq!(
            codes(&findings),
            vec![FindingCode::UnresolvedVariable, FindingCode::TypeMismatch]
        );
    }
}
