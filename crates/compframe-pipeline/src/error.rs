//! Pipeline error taxonomy
//!
//! Only terminal conditions surface as errors: phase 1 or 2 failing after
//! its single retry, a phase output missing its required keys, or a contract
//! that does not deserialize. Everything else (phase 3, individual groups,
//! persistent validation findings) degrades instead of aborting.

use compframe_genai::GenerationError;

/// A terminal pipeline failure
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An analysis phase failed its initial call and its one retry
    #[error("{phase} failed after retry: {source}")]
    PhaseFailed {
        phase: &'static str,
        #[source]
        source: GenerationError,
    },

    /// A phase produced output without its required top-level keys
    #[error("{phase} output missing required keys: {}", .missing.join(", "))]
    MissingKeys {
        phase: &'static str,
        missing: Vec<String>,
    },

    /// Phase 2's numerical contract did not deserialize
    #[error("numerical contract has invalid shape: {0}")]
    ContractShape(#[from] serde_json::Error),
}
