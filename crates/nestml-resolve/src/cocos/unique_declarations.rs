//! Duplicate declarations.
//!
//! The builder keeps every declaration, including clashing ones, and
//! records each clash; this checker reports them at the later declaration.

use super::{Coco, CocoContext};
use crate::findings::{AnalysisError, FindingCode};
use nestml_ast::{NodeKind, NodeRef};

pub struct UniqueDeclarations;

impl Coco for UniqueDeclarations {
    fn id(&self) -> &'static str {
        "UniqueDeclarationsCoCo"
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[
            NodeKind::Entity,
            NodeKind::Declaration,
            NodeKind::Shape,
            NodeKind::InputPort,
            NodeKind::Function,
            NodeKind::Param,
        ]
    }

    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError> {
        let table = ctx.table;
        for &id in table.symbols_of(node.id()) {
            if table.is_duplicate(id).is_none() {
                continue;
            }
            let symbol = table.symbol(id);
            ctx.error(
                FindingCode::DuplicateDeclaration,
                symbol.span,
                format!(
                    "'{}' is already declared as a {} in this scope",
                    symbol.name,
                    symbol.kind().name()
                ),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocos::tests::{codes, run_checker};

    #[test]
    fn test_duplicates_across_blocks() {
        let source = "\
neuron n:
  state:
    V_m mV = 0 mV
  end
  parameters:
    V_m mV = 1 mV
    a, a real = 1
  end
  input:
    spikes <- spike
    spikes <- spike
  end
end
";
        let findings = run_checker(source, &UniqueDeclarations);
        assert_eq!(codes(&findings), vec![FindingCode::DuplicateDeclaration; 3]);
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "'V_m' is already declared as a variable in this scope",
                "'a' is already declared as a variable in this scope",
                "'spikes' is already declared as a variable in this scope",
            ]
        );
    }

    #[test]
    fn test_functions_params_and_neurons() {
        let source = "\
neuron n:
  function f(x real, x real) real:
    return x
  end
  function f(y real, z real) real:
    return y
  end
  function f() real:
    return 1
  end
end
neuron n:
end
";
        let findings = run_checker(source, &UniqueDeclarations);
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "'x' is already declared as a variable in this scope",
                "'f' is already declared as a function in this scope",
                "'n' is already declared as a neuron in this scope",
            ]
        );
    }

    #[test]
    fn test_locals_in_nested_blocks_are_distinct() {
        let source = "\
neuron n:
  update:
    v real = 1
    if true:
      v real = 2
    end
  end
end
";
        assert!(run_checker(source, &UniqueDeclarations).is_empty());
    }
}
