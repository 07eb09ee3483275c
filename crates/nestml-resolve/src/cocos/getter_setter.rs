//! Reserved accessor names.
//!
//! Code generation emits `get_X`/`set_X` for every non-alias variable `X`
//! (predefined ones such as `t` included) and `get_instance` for components;
//! user definitions with those names would clash.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use crate::symbols::SymbolKind;
use nestml_ast::{EntityKind, NodeKind, NodeRef};

const GET_INSTANCE: &str = "get_instance";

pub struct GetterSetterFunctionNames;

impl Coco for GetterSetterFunctionNames {
    fn id(&self) -> &'static str {
        "GetterSetterFunctionNames"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Function, NodeKind::Declaration]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        match node {
            NodeRef::Function(function) => {
                let scope = ctx.scope_of(function.id)?;
                let name = &function.name;
                let in_component = ctx.table.entity_kind_of(scope) == Some(EntityKind::Component);

                if in_component && name.name == GET_INSTANCE && function.params.is_empty() {
                    return ctx.error(
                        FindingCode::GetInstanceDefined,
                        name.span,
                        format!(
                            "function '{}' is generated for components; rename it",
                            GET_INSTANCE
                        ),
                    );
                }

                let Some(suffix) = name
                    .name
                    .strip_prefix("get_")
                    .or_else(|| name.name.strip_prefix("set_"))
                    .filter(|s| !s.is_empty())
                else {
                    return Ok(());
                };

                match ctx.table.resolve(scope, suffix, SymbolKind::Variable) {
                    Some(id) => {
                        let generated = ctx
                            .table
                            .symbol(id)
                            .as_variable()
                            .is_some_and(|v| !v.is_alias);
                        if generated {
                            ctx.error(
                                FindingCode::GeneratedFunctionDefined,
                                name.span,
                                format!(
                                    "function '{}' is generated for variable '{}'; rename it",
                                    name.name, suffix
                                ),
                            )?;
                        }
                    }
                    None => ctx.trace(
                        name.span,
                        format!("cannot resolve the variable: {}", suffix),
                    )?,
                }
                Ok(())
            }
            NodeRef::Declaration(decl) => {
                let scope = ctx.scope_of(decl.id)?;
                if ctx.table.entity_kind_of(scope) != Some(EntityKind::Component) {
                    return Ok(());
                }
                for name in decl.names.iter().filter(|n| n.name == GET_INSTANCE) {
                    ctx.error(
                        FindingCode::GetInstanceDefined,
                        name.span,
                        format!("variable '{}' is reserved in components", GET_INSTANCE),
                    )?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};
    use crate::findings::FindingKind;

    #[test]
    fn test_get_instance_in_component() {
        let findings = run_checker(
            "component c:\n  function get_instance() void:\n  end\nend\n",
            &GetterSetterFunctionNames,
        );
        assert_eq!(codes(&findings), vec![FindingCode::GetInstanceDefined]);

        let findings = run_checker(
            "neuron n:\n  function get_instance() void:\n  end\nend\n",
            &GetterSetterFunctionNames,
        );
        assert_eq!(findings.count(FindingKind::Error), 0);
    }

    #[test]
    fn test_get_instance_variable() {
        let component = "component c:\n  parameters:\n    get_instance real = 1\n  end\nend\n";
        let findings = run_checker(component, &GetterSetterFunctionNames);
        assert_eq!(codes(&findings), vec![FindingCode::GetInstanceDefined]);

        let neuron = component.replace("component c", "neuron n");
        assert!(run_checker(&neuron, &GetterSetterFunctionNames).is_empty());
    }

    #[test]
    fn test_generated_accessors() {
        let source = "\
neuron n:
  state:
    V_m mV = 0 mV
    alias V_rel mV = V_m
  end
  function get_V_m() mV:
    return V_m
  end
  function set_V_rel(v mV):
  end
  function get_t() ms:
    return t
  end
  function get_missing() real:
    return 1
  end
end
";
        let findings = run_checker(source, &GetterSetterFunctionNames);
        assert_eq!(findings.count(FindingKind::Error), 2);
        assert_eq!(
            codes(&findings),
            vec![
                FindingCode::GeneratedFunctionDefined,
                FindingCode::GeneratedFunctionDefined
            ]
        );
        assert!(findings
            .errors()
            .any(|f| f.message.contains("'get_t'") && f.message.contains("variable 't'")));
        assert_eq!(findings.count(FindingKind::Trace), 1);
        assert!(findings
            .of_kind(FindingKind::Trace)
            .any(|f| f.message == "cannot resolve the variable: missing"));
    }
}
