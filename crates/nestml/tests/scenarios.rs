//! End-to-end checks of whole models through the front-end.

use nestml::{
    analyze_file, analyze_source, format_findings, load_config, parse_declaration_line, Analysis,
    AnalysisConfig, AnalysisError, FindingCode, FindingKind, NestmlError,
};
use std::io::Write;

fn check(name: &str, source: &str) -> Analysis {
    analyze_source(name, source, &AnalysisConfig::collect_all())
        .unwrap_or_else(|err| panic!("{} did not analyze: {}", name, err))
}

fn assert_counts(name: &str, source: &str, errors: usize, warnings: usize) {
    let analysis = check(name, source);
    let report = format_findings(&analysis.findings);
    assert_eq!(
        analysis.findings.count(FindingKind::Error),
        errors,
        "errors in {}:\n{}",
        name,
        report
    );
    assert_eq!(
        analysis.findings.count(FindingKind::Warning),
        warnings,
        "warnings in {}:\n{}",
        name,
        report
    );
}

// =============================================================================
// Model fixtures
// =============================================================================

#[test]
fn test_valid_assignments() {
    assert_counts(
        "validAssignments.nestml",
        include_str!("fixtures/validAssignments.nestml"),
        0,
        0,
    );
}

#[test]
fn test_invalid_assignments() {
    assert_counts(
        "invalidAssignments.nestml",
        include_str!("fixtures/invalidAssignments.nestml"),
        7,
        14,
    );
}

#[test]
fn test_valid_expressions() {
    assert_counts(
        "validExpressions.nestml",
        include_str!("fixtures/validExpressions.nestml"),
        0,
        0,
    );
}

#[test]
fn test_invalid_expressions() {
    assert_counts(
        "invalidExpressions.nestml",
        include_str!("fixtures/invalidExpressions.nestml"),
        17,
        15,
    );
}

#[test]
fn test_valid_declarations() {
    assert_counts(
        "validDeclarations.nestml",
        include_str!("fixtures/validDeclarations.nestml"),
        0,
        0,
    );
}

#[test]
fn test_invalid_declarations() {
    let analysis = check(
        "invalidDeclarations.nestml",
        include_str!("fixtures/invalidDeclarations.nestml"),
    );
    assert_eq!(analysis.findings.count(FindingKind::Error), 0);
    let warnings: Vec<_> = analysis.findings.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, Some(FindingCode::ImplicitMagnitudeConversion));
    assert_eq!(warnings[0].checker, "UnitDeclarationCoCo");
    assert_eq!(warnings[0].position.line, 10);
}

#[test]
fn test_valid_units_in_odes() {
    assert_counts(
        "validUnitsInODEs.nestml",
        include_str!("fixtures/validUnitsInODEs.nestml"),
        0,
        0,
    );
}

#[test]
fn test_invalid_units_in_odes() {
    let analysis = check(
        "invalidUnitsInODEs.nestml",
        include_str!("fixtures/invalidUnitsInODEs.nestml"),
    );
    assert_eq!(analysis.findings.count(FindingKind::Error), 0);
    assert_eq!(analysis.findings.count(FindingKind::Warning), 3);
    let from_odes = analysis
        .findings
        .warnings()
        .filter(|f| f.checker == "UnitODECoCo")
        .count();
    assert_eq!(from_odes, 2);
}

#[test]
fn test_iaf_cond_alpha() {
    assert_counts(
        "iaf_cond_alpha.nestml",
        include_str!("fixtures/iaf_cond_alpha.nestml"),
        0,
        0,
    );
}

// =============================================================================
// Reserved names
// =============================================================================

#[test]
fn test_component_get_instance() {
    let source = "\
component buffer:
  function get_instance() void:
  end
end
";
    let analysis = check("buffer.nestml", source);
    let errors: Vec<_> = analysis.findings.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some(FindingCode::GetInstanceDefined));
    assert_eq!(errors[0].position.line, 2);
}

#[test]
fn test_generated_getter_in_neuron() {
    let source = "\
neuron n:
  state:
    V_m mV = -70 mV
  end
  function get_V_m() mV:
    return V_m
  end
end
";
    let analysis = check("n.nestml", source);
    let errors: Vec<_> = analysis.findings.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some(FindingCode::GeneratedFunctionDefined));
    assert_eq!(errors[0].checker, "GetterSetterFunctionNames");
}

#[test]
fn test_get_instance_variable_depends_on_entity() {
    let component = "\
component c:
  parameters:
    get_instance real = 1
  end
end
";
    let analysis = check("c.nestml", component);
    assert_eq!(
        analysis
            .findings
            .with_code(FindingCode::GetInstanceDefined)
            .count(),
        1
    );

    let neuron = component.replace("component c", "neuron c");
    assert!(check("c.nestml", &neuron).findings.is_empty());
}

// =============================================================================
// Edge cases
// =============================================================================

#[test]
fn test_empty_neuron() {
    let analysis = check("empty.nestml", "neuron empty:\nend\n");
    assert!(analysis.findings.is_empty());
    assert!(!analysis.has_errors());
}

#[test]
fn test_power_zero_is_dimensionless() {
    let source = "\
neuron n:
  parameters:
    V_m mV = -70 mV
    one real = V_m ** 0
  end
end
";
    assert!(check("n.nestml", source).findings.is_empty());
}

#[test]
fn test_symbol_dump_is_stable() {
    let source = include_str!("fixtures/iaf_cond_alpha.nestml");
    let first = check("iaf.nestml", source).symbols.dump();
    let second = check("iaf.nestml", source).symbols.dump();
    assert_eq!(first, second);
    assert!(first.contains("neuron iaf_cond_alpha [neuron]"));
}

#[test]
fn test_fail_quick_stops_at_first_error() {
    let source = include_str!("fixtures/invalidAssignments.nestml");
    let err = analyze_source("invalidAssignments.nestml", source, &AnalysisConfig::default())
        .unwrap_err();
    let NestmlError::Analysis(AnalysisError::FailQuick { first, findings }) = &err else {
        panic!("expected fail-quick, got {:?}", err);
    };
    assert_eq!(first.kind, FindingKind::Error);
    assert_eq!(findings.count(FindingKind::Error), 1);
    assert_eq!(findings.iter().last(), Some(first.as_ref()));
}

#[test]
fn test_declaration_line() {
    let line = "P00 real = -Tau*tau_in*(Tau*h*exp(h/Tau) + Tau*tau_in*exp(h/Tau) \
                - Tau*tau_in*exp(h/tau_in) - h*tau_in*exp(h/Tau))*exp(-h/tau_in - h/Tau)\
                /(C*(Tau**2 - 2*Tau*tau_in + tau_in**2)) # PXX";
    let decl = parse_declaration_line(line).unwrap();
    assert_eq!(decl.names.len(), 1);
    assert_eq!(decl.names[0].name, "P00");
    assert!(decl.initializer.is_some());
}

// =============================================================================
// Files and configuration
// =============================================================================

#[test]
fn test_analyze_file_reports_path() {
    let mut file = tempfile::Builder::new().suffix(".nestml").tempfile().unwrap();
    write!(file, "neuron n:\n  parameters:\n    a mV = 1 ms\n  end\nend\n").unwrap();

    let analysis = analyze_file(file.path(), &AnalysisConfig::collect_all()).unwrap();
    let error = analysis.findings.errors().next().unwrap();
    assert_eq!(error.position.file, file.path().display().to_string());
    assert_eq!(error.position.line, 3);
}

#[test]
fn test_analyze_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.nestml");
    let err = analyze_file(&path, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, NestmlError::Io { .. }));
    assert!(err.findings().is_none());
}

#[test]
fn test_load_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"fail_quick": false, "disabled_checkers": ["UnitExpressionCoCo"]}}"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert!(!config.fail_quick);
    assert!(config.record_traces);
    assert!(!config.is_enabled("UnitExpressionCoCo"));

    let source = include_str!("fixtures/invalidExpressions.nestml");
    let analysis = analyze_source("invalidExpressions.nestml", source, &config).unwrap();
    assert!(analysis
        .findings
        .iter()
        .all(|f| f.checker != "UnitExpressionCoCo"));
}

#[test]
fn test_load_config_rejects_bad_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"fail_quick\": \"sometimes\"}}").unwrap();
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, NestmlError::Config { .. }));
}
