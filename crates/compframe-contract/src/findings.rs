//! Validation findings
//!
//! Findings are data, not exceptions: the validator reports them, the
//! auto-fixer repairs the mechanically correctable subset, and the pipeline
//! decides whether to proceed. Criticals gate validity; warnings never do.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Breaks the numeric contract; triggers auto-fix
    Critical,
    /// Suspicious but tolerated
    Warning,
}

/// Target field values that would mechanically correct a finding
pub type FixPayload = BTreeMap<String, f64>;

/// One validation finding with its field path and optional repair values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Dotted field path (e.g. `smb_ae.ote`, `company_level.total_base_salary`)
    pub field: String,
    /// Human-readable description
    pub message: String,
    pub severity: Severity,
    /// Present only for mechanically correctable findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixPayload>,
}

impl Finding {
    /// Create a critical finding
    #[must_use]
    pub fn critical(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Critical,
            fix: None,
        }
    }

    /// Create a warning finding
    #[must_use]
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
            fix: None,
        }
    }

    /// Attach a repair payload
    #[must_use]
    pub fn with_fix<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, f64)>,
    {
        self.fix = Some(
            values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        self
    }
}

/// Result of validating a numeric contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractValidation {
    /// True iff there are zero critical findings
    pub valid: bool,
    /// Critical findings
    pub errors: Vec<Finding>,
    /// Warning findings (never affect validity)
    pub warnings: Vec<Finding>,
}

impl ContractValidation {
    /// Build from collected findings, deriving validity
    #[must_use]
    pub fn from_findings(errors: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        let valid = !errors.iter().any(|f| f.severity == Severity::Critical);
        Self {
            valid,
            errors,
            warnings,
        }
    }

    /// Messages of all critical findings, for log lines
    #[must_use]
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|f| f.message.as_str()).collect()
    }
}
