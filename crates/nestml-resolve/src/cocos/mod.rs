//! Context conditions (CoCos).
//!
//! Semantic rules the grammar cannot express. Each checker implements
//! [`Coco`]: it names the node kinds it subscribes to and inspects each
//! such node with read access to the symbol table and the inferred types.
//! Checkers only append findings; none depends on another.
//!
//! # What This Pass Does
//!
//! 1. **Walks the AST once per checker** - in pre-order, dispatching only
//!    the subscribed node kinds
//! 2. **Runs checkers in declaration order** - the order of
//!    [`CocoRunner::standard`] is part of the output contract
//! 3. **Skips disabled checkers** - see
//!    [`AnalysisConfig::disabled_checkers`]
//!
//! # Pipeline Position
//!
//! ```text
//! Builder -> Type inference -> CoCos -> Findings
//!                              ^^^^^
//!                           YOU ARE HERE
//! ```

use crate::config::AnalysisConfig;
use crate::findings::{AnalysisError, FindingCode, FindingKind, FindingSink};
use crate::inference::{ExprTypes, TypeIssue};
use crate::symbols::{ScopeId, SymbolTable};
use crate::types::{assignability, Assignability, ExprType};
use nestml_ast::{walk_unit, CompilationUnit, Declaration, NodeId, NodeKind, NodeRef, Span};
use tracing::debug;

mod alias_definition;
mod function_signature;
mod getter_setter;
mod initial_values;
mod unique_declarations;
mod unit_assignment;
mod unit_declaration;
mod unit_expression;
mod unit_ode;

pub use alias_definition::AliasHasDefiningExpression;
pub use function_signature::FunctionSignature;
pub use getter_setter::GetterSetterFunctionNames;
pub use initial_values::InitialValues;
pub use unique_declarations::UniqueDeclarations;
pub use unit_assignment::UnitAssignment;
pub use unit_declaration::UnitDeclaration;
pub use unit_expression::UnitExpression;
pub use unit_ode::UnitOde;

/// A context-condition checker.
pub trait Coco {
    /// Stable checker id, printed in every finding.
    fn id(&self) -> &'static str;

    /// Node kinds [`Coco::check`] is called for.
    fn subscriptions(&self) -> &'static [NodeKind];

    /// Inspect one node.
    ///
    /// Returns `Err` only when the sink aborts (fail-quick) or an internal
    /// invariant is broken.
    fn check(&self, node: NodeRef<'_>, ctx: &mut CocoContext<'_, '_>) -> Result<(), AnalysisError>;
}

// =============================================================================
// Context
// =============================================================================

/// What a checker sees while inspecting a node.
pub struct CocoContext<'a, 'src> {
    pub table: &'a SymbolTable,
    pub types: &'a ExprTypes,
    sink: &'a mut FindingSink<'src>,
    checker: &'static str,
}

impl<'a, 'src> CocoContext<'a, 'src> {
    pub fn new(
        table: &'a SymbolTable,
        types: &'a ExprTypes,
        sink: &'a mut FindingSink<'src>,
        checker: &'static str,
    ) -> Self {
        Self {
            table,
            types,
            sink,
            checker,
        }
    }

    pub fn error(
        &mut self,
        code: FindingCode,
        span: Span,
        message: String,
    ) -> Result<(), AnalysisError> {
        self.sink
            .emit(FindingKind::Error, self.checker, code, span, message)
    }

    pub fn warning(
        &mut self,
        code: FindingCode,
        span: Span,
        message: String,
    ) -> Result<(), AnalysisError> {
        self.sink
            .emit(FindingKind::Warning, self.checker, code, span, message)
    }

    pub fn trace(&mut self, span: Span, message: String) -> Result<(), AnalysisError> {
        self.sink.trace(self.checker, span, message)
    }

    /// Report an issue recorded during type inference.
    pub fn issue(&mut self, issue: &TypeIssue) -> Result<(), AnalysisError> {
        self.sink.emit(
            issue.kind,
            self.checker,
            issue.code,
            issue.span,
            issue.message.clone(),
        )
    }

    /// Scope a node is evaluated in; a miss is a builder bug.
    pub fn scope_of(&self, node: NodeId) -> Result<ScopeId, AnalysisError> {
        self.table
            .enclosing_scope(node)
            .ok_or_else(|| AnalysisError::Internal(format!("node {} has no enclosing scope", node)))
    }

    /// Declared type of the (first) variable introduced by `node`.
    pub fn declared_type(&self, node: NodeId) -> Option<ExprType> {
        let symbol = *self.table.symbols_of(node).first()?;
        self.table.variable_type(symbol).copied()
    }

    /// Report storing `value` into a slot of type `target`.
    ///
    /// # Parameters
    /// - `what`: Names the slot in messages, e.g. `the initial value of 'V_m'`
    pub fn check_assignable(
        &mut self,
        target: &ExprType,
        value: &ExprType,
        span: Span,
        what: &str,
    ) -> Result<(), AnalysisError> {
        match assignability(target, value) {
            Assignability::Compatible => Ok(()),
            Assignability::Rescale => self.warning(
                FindingCode::ImplicitMagnitudeConversion,
                span,
                format!("implicit conversion from {} to {} in {}", value, target, what),
            ),
            Assignability::Narrowing => self.warning(
                FindingCode::ImplicitTypeConversion,
                span,
                format!("implicit conversion from {} to {} in {}", value, target, what),
            ),
            Assignability::IncompatibleDimensions => self.error(
                FindingCode::IncompatibleDimensions,
                span,
                format!("{} expects {}, got {}", what, target, value),
            ),
            Assignability::BaseMismatch => self.error(
                FindingCode::TypeMismatch,
                span,
                format!("{} expects {}, got {}", what, target, value),
            ),
        }
    }
}

/// Declared names of a declaration, for messages (`a, b`).
pub(crate) fn declared_names(decl: &Declaration) -> String {
    decl.names
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Runner
// =============================================================================

/// Ordered set of checkers applied to a compilation unit.
pub struct CocoRunner {
    checkers: Vec<Box<dyn Coco>>,
}

impl CocoRunner {
    /// The nine standard checkers, in output order.
    pub fn standard() -> Self {
        Self {
            checkers: vec![
                Box::new(GetterSetterFunctionNames),
                Box::new(UnitDeclaration),
                Box::new(UnitAssignment),
                Box::new(UnitExpression),
                Box::new(UnitOde),
                Box::new(UniqueDeclarations),
                Box::new(InitialValues),
                Box::new(AliasHasDefiningExpression),
                Box::new(FunctionSignature),
            ],
        }
    }

    pub fn checker_ids(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|c| c.id()).collect()
    }

    /// Run every enabled checker over `unit`.
    ///
    /// # Returns
    /// - `Ok(())` when all checkers completed
    /// - `Err(AnalysisError::FailQuick)` if fail-quick mode stopped the run
    pub fn run(
        &self,
        unit: &CompilationUnit,
        table: &SymbolTable,
        types: &ExprTypes,
        config: &AnalysisConfig,
        sink: &mut FindingSink<'_>,
    ) -> Result<(), AnalysisError> {
        for checker in &self.checkers {
            let id = checker.id();
            if !config.is_enabled(id) {
                debug!(checker = id, "checker disabled");
                continue;
            }

            let before = sink.len();
            let subscriptions = checker.subscriptions();
            let mut ctx = CocoContext::new(table, types, sink, id);
            let mut result = Ok(());
            walk_unit(unit, &mut |node| {
                if result.is_ok() && subscriptions.contains(&node.kind()) {
                    result = checker.check(node, &mut ctx);
                }
            });
            result?;

            debug!(checker = id, findings = sink.len() - before, "checker finished");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_symbol_table;
    use crate::findings::Findings;
    use crate::inference::infer_types;
    use nestml_ast::SourceMap;
    use nestml_parser::parse_compilation_unit;

    pub(crate) fn run_checker(source: &str, checker: &dyn Coco) -> Findings {
        let unit = parse_compilation_unit(source, 0).unwrap();
        let sources = SourceMap::new();
        let config = AnalysisConfig::collect_all();
        let mut sink = FindingSink::new(&sources, &config);
        let table = build_symbol_table(&unit, &mut sink).unwrap();
        let types = infer_types(&unit, &table).unwrap();
        let mut sink = FindingSink::new(&sources, &config);
        {
            let mut ctx = CocoContext::new(&table, &types, &mut sink, checker.id());
            walk_unit(&unit, &mut |node| {
                if checker.subscriptions().contains(&node.kind()) {
                    checker.check(node, &mut ctx).unwrap();
                }
            });
        }
        sink.into_findings()
    }

    pub(crate) fn codes(findings: &Findings) -> Vec<FindingCode> {
        findings.iter().filter_map(|f| f.code).collect()
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            CocoRunner::standard().checker_ids(),
            vec![
                "GetterSetterFunctionNames",
                "UnitDeclarationCoCo",
                "UnitAssignmentCoCo",
                "UnitExpressionCoCo",
                "UnitODECoCo",
                "UniqueDeclarationsCoCo",
                "InitialValuesCoCo",
                "AliasHasDefiningExpressionCoCo",
                "FunctionSignatureCoCo",
            ]
        );
    }

    #[test]
    fn test_disabled_checker_is_skipped() {
        let source = "neuron n:\n  state:\n    V_m mV\n  end\nend\n";
        let unit = parse_compilation_unit(source, 0).unwrap();
        let sources = SourceMap::new();
        let mut config = AnalysisConfig::collect_all();
        let mut sink = FindingSink::new(&sources, &config);
        let table = build_symbol_table(&unit, &mut sink).unwrap();
        let types = infer_types(&unit, &table).unwrap();

        CocoRunner::standard()
            .run(&unit, &table, &types, &config, &mut sink)
            .unwrap();
        assert_eq!(sink.findings().count(FindingKind::Error), 1);

        config.disabled_checkers.push("InitialValuesCoCo".to_string());
        let mut sink = FindingSink::new(&sources, &config);
        CocoRunner::standard()
            .run(&unit, &table, &types, &config, &mut sink)
            .unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_fail_quick_stops_run() {
        let source = "neuron n:\n  state:\n    a mV\n    b mV\n  end\nend\n";
        let unit = parse_compilation_unit(source, 0).unwrap();
        let sources = SourceMap::new();
        let config = AnalysisConfig::default();
        let mut sink = FindingSink::new(&sources, &config);
        let table = build_symbol_table(&unit, &mut sink).unwrap();
        let types = infer_types(&unit, &table).unwrap();

        let err = CocoRunner::standard()
            .run(&unit, &table, &types, &config, &mut sink)
            .unwrap_err();
        match err {
            AnalysisError::FailQuick { first, findings } => {
                assert_eq!(first.code, Some(FindingCode::MissingInitialValue));
                assert_eq!(findings.len(), 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
