//! Findings and the finding sink.
//!
//! Every user-facing problem the semantic core detects is a [`Finding`]:
//! a kind, the id of the checker that produced it, an optional stable
//! [`FindingCode`], a message and a resolved source position. Findings are
//! never returned as `Err`; they are appended to a [`FindingSink`] and handed
//! back to the caller as a [`Findings`] collection.
//!
//! # Design
//!
//! - `FindingKind`: ERROR, WARNING, INFO or TRACE
//! - `FindingCode`: closed set of stable message identifiers
//! - `FindingSink`: append-only collector with the fail-quick switch
//! - `AnalysisError`: operational failures (fail-quick abort, internal faults)
//!
//! # Output Format
//!
//! ```text
//! ERROR: UnitExpressionCoCo: INCOMPATIBLE_DIMENSIONS: cannot add mV and ms   at iaf.nestml:12:9
//! ```

use crate::config::AnalysisConfig;
use nestml_ast::{SourceMap, SourcePosition, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingKind {
    Trace,
    Info,
    Warning,
    Error,
}

impl FindingKind {
    pub fn name(self) -> &'static str {
        match self {
            FindingKind::Trace => "TRACE",
            FindingKind::Info => "INFO",
            FindingKind::Warning => "WARNING",
            FindingKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable message identifier of a finding.
///
/// The names are part of the external contract: tests and downstream tools
/// match on them.
///
/// # Invariant
///
/// The discriminant values must match the FINDING_CODE_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FindingCode {
    // Accessor reservation
    /// `get_X`/`set_X` defined for a declared variable `X`
    GeneratedFunctionDefined = 0,
    /// `get_instance` defined inside a component
    GetInstanceDefined = 1,

    // Names
    /// Identifier does not resolve to a variable or unit
    UnresolvedVariable = 2,

    // Units
    /// Operands or sides of an assignment have different SI dimensions
    IncompatibleDimensions = 3,
    /// Same dimension, different scale; an implicit rescale applies
    ImplicitMagnitudeConversion = 4,
    /// ODE right-hand side does not have dimension `lhs / time`
    OdeDimensionMismatch = 5,

    // Structure
    /// Two declarations of the same name and kind in one scope
    DuplicateDeclaration = 6,
    /// State variable without an initial value
    MissingInitialValue = 7,
    /// Alias without a defining expression
    AliasNoDefinition = 8,

    // Supplementary
    /// Unit name does not resolve
    UnknownUnit = 9,
    /// Called function does not resolve
    UnresolvedFunction = 10,
    /// No overload takes the given number of arguments
    WrongArgumentCount = 11,
    /// Several overloads take the given number of arguments, none uniquely fits
    AmbiguousFunctionCall = 12,
    /// Boolean/string used where a number is expected, or vice versa
    TypeMismatch = 13,
    /// `real` value stored in an `integer` variable
    ImplicitTypeConversion = 14,
    /// Two absolute affine quantities added or subtracted
    AffineQuantityAddition = 15,
    /// Exponent not usable for the base's dimension
    InvalidExponent = 16,
    /// Array initializer with elements of different dimensions
    MixedArrayDimensions = 17,
    /// Local variable shadows a state variable of its neuron
    ShadowedStateVariable = 18,
    /// Non-void function without a value-returning `return`
    MissingReturn = 19,
    /// `return <value>` in a void function
    UnexpectedReturnValue = 20,
    /// Source text does not parse
    SyntaxError = 21,
}

/// Stable names, index matches discriminant.
const FINDING_CODE_NAMES: &[&str] = &[
    "GENERATED_FUNCTION_DEFINED",    // 0: GeneratedFunctionDefined
    "GET_INSTANCE_DEFINED",          // 1: GetInstanceDefined
    "UNRESOLVED_VARIABLE",           // 2: UnresolvedVariable
    "INCOMPATIBLE_DIMENSIONS",       // 3: IncompatibleDimensions
    "IMPLICIT_MAGNITUDE_CONVERSION", // 4: ImplicitMagnitudeConversion
    "ODE_DIMENSION_MISMATCH",        // 5: OdeDimensionMismatch
    "DUPLICATE_DECLARATION",         // 6: DuplicateDeclaration
    "MISSING_INITIAL_VALUE",         // 7: MissingInitialValue
    "ALIAS_NO_DEFINITION",           // 8: AliasNoDefinition
    "UNKNOWN_UNIT",                  // 9: UnknownUnit
    "UNRESOLVED_FUNCTION",           // 10: UnresolvedFunction
    "WRONG_ARGUMENT_COUNT",          // 11: WrongArgumentCount
    "AMBIGUOUS_FUNCTION_CALL",       // 12: AmbiguousFunctionCall
    "TYPE_MISMATCH",                 // 13: TypeMismatch
    "IMPLICIT_TYPE_CONVERSION",      // 14: ImplicitTypeConversion
    "AFFINE_QUANTITY_ADDITION",      // 15: AffineQuantityAddition
    "INVALID_EXPONENT",              // 16: InvalidExponent
    "MIXED_ARRAY_DIMENSIONS",        // 17: MixedArrayDimensions
    "SHADOWED_STATE_VARIABLE",       // 18: ShadowedStateVariable
    "MISSING_RETURN",                // 19: MissingReturn
    "UNEXPECTED_RETURN_VALUE",       // 20: UnexpectedReturnValue
    "SYNTAX_ERROR",                  // 21: SyntaxError
];

impl FindingCode {
    /// Stable identifier, e.g. `"GET_INSTANCE_DEFINED"`.
    ///
    /// # Parameters
    ///
    /// (none - uses `self`)
    ///
    /// # Returns
    ///
    /// String slice with the code name.
    pub fn name(self) -> &'static str {
        FINDING_CODE_NAMES[self as usize]
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Finding
// =============================================================================

/// One diagnostic produced by a checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Id of the producing checker, e.g. `"UnitODECoCo"`.
    pub checker: String,
    pub code: Option<FindingCode>,
    pub message: String,
    pub position: SourcePosition,
}

impl Finding {
    /// Creates a finding with a stable code.
    ///
    /// # Parameters
    ///
    /// * `kind` - Severity
    /// * `checker` - Id of the producing checker
    /// * `code` - Stable message identifier
    /// * `message` - Human-readable text
    /// * `position` - Resolved source position
    ///
    /// # Returns
    ///
    /// A new finding.
    pub fn new(
        kind: FindingKind,
        checker: &str,
        code: FindingCode,
        message: String,
        position: SourcePosition,
    ) -> Self {
        Self {
            kind,
            checker: checker.to_string(),
            code: Some(code),
            message,
            position,
        }
    }

    /// Creates a finding without a code (traces and informational output).
    pub fn uncoded(
        kind: FindingKind,
        checker: &str,
        message: String,
        position: SourcePosition,
    ) -> Self {
        Self {
            kind,
            checker: checker.to_string(),
            code: None,
            message,
            position,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FindingKind::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: ", self.kind, self.checker)?;
        if let Some(code) = self.code {
            write!(f, "{}: ", code)?;
        }
        write!(f, "{}   at {}", self.message, self.position)
    }
}

// =============================================================================
// Findings
// =============================================================================

/// Ordered, append-only collection of findings.
///
/// No deduplication: the same issue reported by two checkers appears twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.items.push(finding);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Findings of one kind, in emission order.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.items.iter().filter(move |f| f.kind == kind)
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.of_kind(FindingKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.of_kind(FindingKind::Warning)
    }

    pub fn with_code(&self, code: FindingCode) -> impl Iterator<Item = &Finding> {
        self.items.iter().filter(move |f| f.code == Some(code))
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Finding> for Findings {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Operational failure of an analysis run.
///
/// User mistakes in the model are findings, not `AnalysisError`s.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Fail-quick mode is on and an ERROR was reported.
    #[error("analysis stopped at first error: {first}")]
    FailQuick {
        first: Box<Finding>,
        /// Everything reported up to and including `first`.
        findings: Findings,
    },

    /// A bug in the semantic core (e.g. an AST node with no scope).
    #[error("internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Sink
// =============================================================================

/// Collects findings during one analysis run.
#[derive(Debug)]
pub struct FindingSink<'a> {
    sources: &'a SourceMap,
    fail_quick: bool,
    record_traces: bool,
    findings: Findings,
}

impl<'a> FindingSink<'a> {
    pub fn new(sources: &'a SourceMap, config: &AnalysisConfig) -> Self {
        Self {
            sources,
            fail_quick: config.fail_quick,
            record_traces: config.record_traces,
            findings: Findings::new(),
        }
    }

    /// Append a finding.
    ///
    /// # Returns
    ///
    /// - `Ok(())` normally
    /// - `Err(AnalysisError::FailQuick)` if the finding is an ERROR and
    ///   fail-quick mode is on; the collected findings move into the error
    pub fn report(&mut self, finding: Finding) -> Result<(), AnalysisError> {
        if finding.kind == FindingKind::Trace && !self.record_traces {
            return Ok(());
        }
        let abort = self.fail_quick && finding.is_error();
        if abort {
            self.findings.push(finding.clone());
            return Err(AnalysisError::FailQuick {
                first: Box::new(finding),
                findings: std::mem::take(&mut self.findings),
            });
        }
        self.findings.push(finding);
        Ok(())
    }

    /// Resolve `span` and report a coded finding.
    pub fn emit(
        &mut self,
        kind: FindingKind,
        checker: &str,
        code: FindingCode,
        span: Span,
        message: String,
    ) -> Result<(), AnalysisError> {
        let position = self.sources.position(&span);
        self.report(Finding::new(kind, checker, code, message, position))
    }

    /// Resolve `span` and report a TRACE finding.
    pub fn trace(
        &mut self,
        checker: &str,
        span: Span,
        message: String,
    ) -> Result<(), AnalysisError> {
        let position = self.sources.position(&span);
        self.report(Finding::uncoded(FindingKind::Trace, checker, message, position))
    }

    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn into_findings(self) -> Findings {
        self.findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn position() -> SourcePosition {
        SourcePosition::new("test.nestml", 3, 5)
    }

    #[test]
    fn test_code_names_match_discriminants() {
        assert_eq!(FindingCode::GeneratedFunctionDefined.name(), "GENERATED_FUNCTION_DEFINED");
        assert_eq!(FindingCode::AliasNoDefinition.name(), "ALIAS_NO_DEFINITION");
        assert_eq!(FindingCode::UnknownUnit.name(), "UNKNOWN_UNIT");
        assert_eq!(FindingCode::SyntaxError.name(), "SYNTAX_ERROR");
        assert_eq!(FINDING_CODE_NAMES.len(), FindingCode::SyntaxError as usize + 1);
    }

    #[test]
    fn test_display_format() {
        let finding = Finding::new(
            FindingKind::Error,
            "UnitODECoCo",
            FindingCode::OdeDimensionMismatch,
            "bad ode".to_string(),
            position(),
        );
        assert_eq!(
            finding.to_string(),
            "ERROR: UnitODECoCo: ODE_DIMENSION_MISMATCH: bad ode   at test.nestml:3:5"
        );

        let trace = Finding::uncoded(FindingKind::Trace, "X", "t".to_string(), position());
        assert_eq!(trace.to_string(), "TRACE: X: t   at test.nestml:3:5");
    }

    #[test]
    fn test_fail_quick_stops_at_first_error() {
        let sources = SourceMap::new();
        let mut sink = FindingSink::new(&sources, &AnalysisConfig::default());
        let warning = Finding::uncoded(FindingKind::Warning, "X", "w".to_string(), position());
        sink.report(warning).unwrap();

        let error = Finding::new(
            FindingKind::Error,
            "X",
            FindingCode::TypeMismatch,
            "e".to_string(),
            position(),
        );
        match sink.report(error) {
            Err(AnalysisError::FailQuick { first, findings }) => {
                assert_eq!(first.code, Some(FindingCode::TypeMismatch));
                assert_eq!(findings.len(), 2);
            }
            other => panic!("expected fail-quick abort, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_all_keeps_going() {
        let mut sources = SourceMap::new();
        let file = sources.add_file(PathBuf::from("a.nestml"), "x\ny\n".to_string());
        let mut sink = FindingSink::new(&sources, &AnalysisConfig::collect_all());
        for _ in 0..3 {
            sink.emit(
                FindingKind::Error,
                "X",
                FindingCode::DuplicateDeclaration,
                Span::new(file, 2, 3, 2),
                "dup".to_string(),
            )
            .unwrap();
        }
        let findings = sink.into_findings();
        assert_eq!(findings.count(FindingKind::Error), 3);
        assert_eq!(findings.iter().next().unwrap().position.line, 2);
    }

    #[test]
    fn test_traces_can_be_dropped() {
        let sources = SourceMap::new();
        let config = AnalysisConfig {
            record_traces: false,
            ..AnalysisConfig::collect_all()
        };
        let mut sink = FindingSink::new(&sources, &config);
        sink.trace("X", Span::default(), "t".to_string()).unwrap();
        assert!(sink.is_empty());
    }
}
