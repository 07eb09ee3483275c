//! Analysis configuration.

use serde::{Deserialize, Serialize};

/// Switches for one analysis run.
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "fail_quick": false, "disabled_checkers": ["UnitODECoCo"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Abort with [`AnalysisError::FailQuick`](crate::AnalysisError::FailQuick)
    /// on the first ERROR.
    pub fail_quick: bool,
    /// Keep TRACE findings in the sink.
    pub record_traces: bool,
    /// Checker ids the runner skips.
    pub disabled_checkers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fail_quick: true,
            record_traces: true,
            disabled_checkers: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Configuration that reports every finding instead of stopping at the
    /// first error.
    pub fn collect_all() -> Self {
        Self {
            fail_quick: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_enabled(&self, checker: &str) -> bool {
        !self.disabled_checkers.iter().any(|id| id == checker)
    }
}
