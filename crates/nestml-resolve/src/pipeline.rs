//! Analysis pipeline for one NESTML compilation unit.
//!
//! Runs the passes in order and returns everything they produced:
//!
//! 1. Symbol-table construction ([`build_symbol_table`])
//! 2. Type and unit inference ([`infer_types`])
//! 3. The standard checkers ([`CocoRunner::standard`])
//!
//! Each unit is analyzed from scratch; nothing is cached between calls.

use crate::builder::build_symbol_table;
use crate::cocos::CocoRunner;
use crate::config::AnalysisConfig;
use crate::findings::{AnalysisError, FindingKind, FindingSink, Findings};
use crate::inference::{infer_types, ExprTypes};
use crate::symbols::SymbolTable;
use nestml_ast::{CompilationUnit, SourceMap};
use tracing::{debug, instrument};

/// Result of analyzing one compilation unit.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Every finding, in checker order and AST pre-order within a checker.
    pub findings: Findings,
    pub symbols: SymbolTable,
    pub types: ExprTypes,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.findings.count(FindingKind::Error) > 0
    }
}

/// Analyze a parsed compilation unit.
///
/// # Parameters
/// - `unit`: Parsed compilation unit
/// - `sources`: Resolves spans to file positions in findings
/// - `config`: Fail-quick, trace recording and disabled checkers
///
/// # Returns
/// - `Ok(Analysis)` when the run completed (findings may contain errors)
/// - `Err(AnalysisError::FailQuick)` if fail-quick mode stopped the run
/// - `Err(AnalysisError::Internal)` on a broken internal invariant
#[instrument(skip_all, fields(entities = unit.entities.len()))]
pub fn analyze(
    unit: &CompilationUnit,
    sources: &SourceMap,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let mut sink = FindingSink::new(sources, config);

    let symbols = build_symbol_table(unit, &mut sink)?;
    let types = infer_types(unit, &symbols)?;
    CocoRunner::standard().run(unit, &symbols, &types, config, &mut sink)?;

    let findings = sink.into_findings();
    debug!(
        errors = findings.count(FindingKind::Error),
        warnings = findings.count(FindingKind::Warning),
        "analysis complete"
    );
    Ok(Analysis {
        findings,
        symbols,
        types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::FindingCode;
    use nestml_parser::parse_compilation_unit;

    fn run(source: &str, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
        let unit = parse_compilation_unit(source, 0).unwrap();
        analyze(&unit, &SourceMap::new(), config)
    }

    #[test]
    fn test_checker_order_in_output() {
        let source = "\
neuron n:
  state:
    V_m mV
  end
  parameters:
    a mV = 1 ms
    a real = 1
  end
end
";
        let analysis = run(source, &AnalysisConfig::collect_all()).unwrap();
        let checkers: Vec<&str> = analysis
            .findings
            .errors()
            .map(|f| f.checker.as_str())
            .collect();
        assert_eq!(
            checkers,
            vec![
                "UnitDeclarationCoCo",
                "UniqueDeclarationsCoCo",
                "InitialValuesCoCo"
            ]
        );
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_builder_warnings_come_first() {
        let source = "\
neuron n:
  state:
    V_m mV = 0 mV
  end
  update:
    V_m mV = 1 mV
  end
end
";
        let analysis = run(source, &AnalysisConfig::collect_all()).unwrap();
        let first = analysis.findings.iter().next().unwrap();
        assert_eq!(first.code, Some(FindingCode::ShadowedStateVariable));
        assert_eq!(first.checker, "SymbolTableBuilder");
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_fail_quick_is_default() {
        let source = "neuron n:\n  state:\n    V_m mV\n  end\nend\n";
        let err = run(source, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::FailQuick { .. }));
    }
}
