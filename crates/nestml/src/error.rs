//! Errors of the front-end entry points.
//!
//! Semantic problems in a model are findings, not errors. `NestmlError`
//! covers the cases where no [`Analysis`](crate::Analysis) could be produced:
//! the source did not parse, fail-quick mode stopped the run, or a file
//! could not be read.

use nestml_resolve::{AnalysisError, Findings};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NestmlError {
    /// The source has syntax errors; each one is a `SYNTAX_ERROR` finding.
    #[error("{path}: {} syntax error(s)", .findings.len())]
    Syntax { path: String, findings: Findings },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid analysis configuration {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl NestmlError {
    /// Findings collected before the run stopped, if any.
    pub fn findings(&self) -> Option<&Findings> {
        match self {
            NestmlError::Syntax { findings, .. } => Some(findings),
            NestmlError::Analysis(AnalysisError::FailQuick { findings, .. }) => Some(findings),
            NestmlError::Analysis(AnalysisError::Internal(_))
            | NestmlError::Io { .. }
            | NestmlError::Config { .. } => None,
        }
    }
}
