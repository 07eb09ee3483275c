//! Whole-file parsing tests.

use nestml_ast::*;
use nestml_parser::{parse_compilation_unit, parse_declaration_line, ParseError, ParseErrorKind};

fn parse_ok(source: &str) -> CompilationUnit {
    parse_compilation_unit(source, 0).expect("Parse should succeed")
}

fn expect_error(source: &str) -> Vec<ParseError> {
    match parse_compilation_unit(source, 0) {
        Ok(_) => panic!("Expected parse error, but parsing succeeded"),
        Err(errors) => {
            assert!(!errors.is_empty(), "Expected at least one error");
            errors
        }
    }
}

const IAF: &str = r#"
neuron iaf_psc:
  state:
    V_m mV = E_L
    alias V_rel mV = V_m - E_L
  end

  equations:
    shape I_syn = exp(-t / tau_syn)
    V_m' = -(V_m - E_L) / tau_m + I_stim / C_m
  end

  parameters:
    C_m pF = 250 pF
    tau_m, tau_syn ms = 10 ms
    E_L mV = -70 mV [[ E_L < 0 mV ]]
    weights real = [1.0, 2.0]
  end

  input:
    spikes pA <- excitatory spike
    I_stim <- current
  end

  output: spike

  update:
    integrate_odes()
    if V_m > -55 mV:
      V_m = E_L
      emit_spike()
    elif V_m < -90 mV:
      V_m += 1 mV
    else:
      n integer = 0
    end
    for i in 0 ... 10 step 2:
      n = i
    end
  end

  function clamp(x mV) mV:
    return max(x, E_L)
  end
end
"#;

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_neuron_structure() {
    let unit = parse_ok(IAF);
    assert_eq!(unit.entities.len(), 1);
    let neuron = &unit.entities[0];
    assert_eq!(neuron.kind, EntityKind::Neuron);
    assert_eq!(neuron.name.name, "iaf_psc");
    assert_eq!(neuron.body.len(), 7);
    assert_eq!(neuron.var_blocks().count(), 2);
    assert_eq!(neuron.functions().count(), 1);
}

#[test]
fn test_declarations() {
    let unit = parse_ok(IAF);
    let params = unit.entities[0]
        .var_blocks()
        .find(|b| b.kind == BlockKind::Parameters)
        .unwrap();
    let names: Vec<&str> = params.declarations[1]
        .names
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["tau_m", "tau_syn"]);
    assert!(params.declarations[2].guard.is_some());
    assert!(matches!(
        params.declarations[3].initializer,
        Some(Initializer::List(ref items)) if items.len() == 2
    ));

    let state = unit.entities[0].var_blocks().next().unwrap();
    assert!(state.declarations[1].is_alias);
}

#[test]
fn test_equations() {
    let unit = parse_ok(IAF);
    let eqs = unit.entities[0]
        .body
        .iter()
        .find_map(|e| match e {
            BodyElement::Equations(eqs) => Some(eqs),
            _ => None,
        })
        .unwrap();
    assert!(matches!(&eqs.equations[0], Equation::Shape(s) if s.name.name == "I_syn"));
    match &eqs.equations[1] {
        Equation::Ode(ode) => {
            assert_eq!(ode.lhs.name, "V_m");
            assert_eq!(ode.order, 1);
            assert_eq!(ode.lhs_text(), "V_m'");
        }
        other => panic!("expected ODE, got {:?}", other),
    }
}

#[test]
fn test_input_ports() {
    let unit = parse_ok(IAF);
    let input = unit.entities[0]
        .body
        .iter()
        .find_map(|e| match e {
            BodyElement::Input(i) => Some(i),
            _ => None,
        })
        .unwrap();
    assert_eq!(input.ports.len(), 2);
    assert_eq!(input.ports[0].modifier, Some(InputModifier::Excitatory));
    assert!(input.ports[0].ty.is_some());
    assert_eq!(input.ports[1].signal, SignalKind::Current);
    assert!(input.ports[1].ty.is_none());
}

#[test]
fn test_update_statements() {
    let unit = parse_ok(IAF);
    let update = unit.entities[0]
        .body
        .iter()
        .find_map(|e| match e {
            BodyElement::Update(u) => Some(u),
            _ => None,
        })
        .unwrap();
    let kinds: Vec<&StmtKind> = update.body.stmts.iter().map(|s| &s.kind).collect();
    assert!(matches!(kinds[0], StmtKind::Call(_)));
    match kinds[1] {
        StmtKind::If(if_stmt) => {
            assert_eq!(if_stmt.branches.len(), 2);
            assert!(if_stmt.else_block.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
    assert!(matches!(kinds[2], StmtKind::For(f) if f.step.is_some()));
}

#[test]
fn test_function_signature() {
    let unit = parse_ok(IAF);
    let f = unit.entities[0].functions().next().unwrap();
    assert_eq!(f.name.name, "clamp");
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.return_type.as_ref().unwrap().to_string(), "mV");
    assert!(matches!(f.body.stmts[0].kind, StmtKind::Return(Some(_))));
}

#[test]
fn test_component_and_empty_body() {
    let unit = parse_ok("component c:\nend\nneuron n:\nend\n");
    assert_eq!(unit.entities.len(), 2);
    assert_eq!(unit.entities[0].kind, EntityKind::Component);
    assert!(unit.entities[1].body.is_empty());
}

#[test]
fn test_compound_unit_types() {
    let unit = parse_ok(
        "neuron n:\n  parameters:\n    a nS/ms = 1 nS/ms\n    b 1/s = 1/s\n    c m**-2 = 1 / m**2\n  end\nend\n",
    );
    let block = unit.entities[0].var_blocks().next().unwrap();
    let types: Vec<String> = block.declarations.iter().map(|d| d.ty.to_string()).collect();
    assert_eq!(types, vec!["nS/ms", "1/s", "m**-2"]);
}

#[test]
fn test_spans_have_lines() {
    let unit = parse_ok(IAF);
    let state = unit.entities[0].var_blocks().next().unwrap();
    assert_eq!(state.declarations[0].span.start_line, 4);
    assert_eq!(unit.entities[0].span.start_line, 2);
}

// =============================================================================
// Declaration-line helper
// =============================================================================

#[test]
fn test_declaration_line_from_solver_output() {
    let line = "P00 real = -Tau*tau_in*(Tau*h*exp(h/Tau) + Tau*tau_in*exp(h/Tau) - Tau*tau_in*exp\
                (h/tau_in) - h*tau_in*exp(h/Tau))*exp(-h/tau_in - h/Tau)/(C*(Tau**2 - 2*Tau*tau_in + \
                tau_in**2)) # PXX";
    let decl = parse_declaration_line(line).unwrap();
    assert_eq!(decl.names.len(), 1);
    assert_eq!(decl.names[0].name, "P00");
}

#[test]
fn test_declaration_line_rejects_trailing_tokens() {
    assert!(parse_declaration_line("x mV = 1 mV").is_ok());
    assert!(parse_declaration_line("x real = 1 )").is_err());
    assert!(parse_declaration_line("x real = 1\ny real = 2").is_err());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_end() {
    let errors = expect_error("neuron n:\n  state:\n    x mV = 1 mV\n  end\n");
    assert!(errors
        .iter()
        .any(|e| e.kind == ParseErrorKind::UnexpectedEof));
}

#[test]
fn test_equation_without_prime() {
    let errors = expect_error("neuron n:\n  equations:\n    V = 1\n  end\nend\n");
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidSyntax);
    assert!(errors[0].message.contains("derivative"));
}

#[test]
fn test_invalid_token() {
    let errors = expect_error("neuron n:\n  state:\n    x mV = $\n  end\nend\n");
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidToken);
    assert_eq!(errors[0].span.start_line, 3);
}

#[test]
fn test_recovery_reports_each_broken_entity() {
    let errors = expect_error("neuron a:\n  state\nend\nneuron b:\n  bogus\nend\nneuron c:\nend\n");
    assert_eq!(errors.len(), 2);
}
