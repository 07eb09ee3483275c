//! NESTML front-end
//!
//! Single entry point for checking NESTML models. Wraps parsing and the
//! semantic core into one call per source text or file.
//!
//! # Pipeline
//!
//! ```text
//! source -> parse_compilation_unit -> analyze -> Analysis { findings, symbols, types }
//!                 |
//!                 +-> SYNTAX_ERROR findings (NestmlError::Syntax)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use nestml::{analyze_file, format_findings, AnalysisConfig};
//!
//! let analysis = analyze_file("models/iaf.nestml".as_ref(), &AnalysisConfig::collect_all())?;
//! println!("{}", format_findings(&analysis.findings));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;

pub use error::NestmlError;
pub use nestml_ast as ast;
pub use nestml_parser::{parse_compilation_unit, parse_declaration_line, ParseError};
pub use nestml_resolve::{
    analyze, Analysis, AnalysisConfig, AnalysisError, Finding, FindingCode, FindingKind, Findings,
    SymbolTable,
};
pub use nestml_units as units;

use nestml_ast::SourceMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use tracing_subscriber::{fmt, EnvFilter};

/// Checker id of syntax findings.
pub const PARSER_ID: &str = "Parser";

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `debug` for the front-end and `info` for everything else.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,nestml=debug,nestml_resolve=info,nestml_parser=info")
    });

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Parse and analyze one source text.
///
/// # Parameters
/// - `name`: File name used in finding positions
/// - `source`: NESTML source text
/// - `config`: Analysis configuration
///
/// # Returns
/// - `Ok(Analysis)` when the source parsed and the run completed
/// - `Err(NestmlError::Syntax)` with one finding per parse error
/// - `Err(NestmlError::Analysis)` if fail-quick mode stopped the run
pub fn analyze_source(
    name: &str,
    source: &str,
    config: &AnalysisConfig,
) -> Result<Analysis, NestmlError> {
    analyze_text(PathBuf::from(name), source.to_string(), config)
}

/// Read, parse and analyze one `.nestml` file.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<Analysis, NestmlError> {
    let source = std::fs::read_to_string(path).map_err(|source| NestmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    analyze_text(path.to_path_buf(), source, config)
}

#[instrument(skip(source, config), fields(path = %path.display()))]
fn analyze_text(
    path: PathBuf,
    source: String,
    config: &AnalysisConfig,
) -> Result<Analysis, NestmlError> {
    let mut sources = SourceMap::new();
    let file_id = sources.add_file(path, source);
    let file = sources.file_by_id(file_id).ok_or_else(|| {
        AnalysisError::Internal(format!("source file {} was not registered", file_id))
    })?;

    let unit = match parse_compilation_unit(&file.source, file_id) {
        Ok(unit) => unit,
        Err(errors) => {
            debug!(errors = errors.len(), "parse failed");
            return Err(NestmlError::Syntax {
                path: file.path.display().to_string(),
                findings: syntax_findings(&errors, &sources),
            });
        }
    };
    Ok(analyze(&unit, &sources, config)?)
}

/// Convert parse errors into `SYNTAX_ERROR` findings.
fn syntax_findings(errors: &[ParseError], sources: &SourceMap) -> Findings {
    let mut findings = Findings::new();
    for err in errors {
        findings.push(Finding::new(
            FindingKind::Error,
            PARSER_ID,
            FindingCode::SyntaxError,
            err.message.clone(),
            sources.position(&err.span),
        ));
    }
    findings
}

/// Load an [`AnalysisConfig`] from a JSON file.
///
/// Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, NestmlError> {
    let text = std::fs::read_to_string(path).map_err(|source| NestmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AnalysisConfig::from_json_str(&text).map_err(|source| NestmlError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Render findings one per line, in reporting order.
pub fn format_findings(findings: &Findings) -> String {
    findings
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_errors_become_findings() {
        let config = AnalysisConfig::collect_all();
        let err = analyze_source("broken.nestml", "neuron n:\n  state:\n", &config).unwrap_err();
        let NestmlError::Syntax { path, findings } = &err else {
            panic!("expected a syntax error, got {:?}", err);
        };
        assert_eq!(path, "broken.nestml");
        assert!(!findings.is_empty());
        let first = findings.iter().next().unwrap();
        assert_eq!(first.checker, PARSER_ID);
        assert_eq!(first.code, Some(FindingCode::SyntaxError));
        assert_eq!(first.position.file, "broken.nestml");
        assert_eq!(err.findings().map(Findings::len), Some(findings.len()));
    }

    #[test]
    fn test_fail_quick_keeps_findings() {
        let source = "neuron n:\n  parameters:\n    a mV = 1 ms\n    b mV = 1 s\n  end\nend\n";
        let err = analyze_source("n.nestml", source, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, NestmlError::Analysis(AnalysisError::FailQuick { .. })));
        assert_eq!(err.findings().map(Findings::len), Some(1));
    }

    #[test]
    fn test_format_findings_lines() {
        let source = "neuron n:\n  parameters:\n    a mV = 1 ms\n  end\nend\n";
        let analysis = analyze_source("n.nestml", source, &AnalysisConfig::collect_all()).unwrap();
        assert_eq!(
            format_findings(&analysis.findings),
            "ERROR: UnitDeclarationCoCo: INCOMPATIBLE_DIMENSIONS: \
             the declaration of 'a' expects mV, got ms   at n.nestml:3:12"
        );
    }

    #[test]
    fn test_format_findings_empty() {
        assert_eq!(format_findings(&Findings::new()), "");
    }
}
