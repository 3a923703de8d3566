//! CompFrame Pipeline - orchestration of the generation pipeline
//!
//! Turns an intake questionnaire into a merged compensation-plan document:
//! - Token budgeting scaled to workload size
//! - Three sequential analysis phases, each retryable with a model fallback
//! - Contract reconciliation (validate, auto-fix, backfill)
//! - Concurrent formatting-group fan-out with per-group retry
//! - Group reconciliation against the contract and the final merge
//!
//! Progress and persistence flow through the [`StatusSink`] and
//! [`PlanStore`] ports; the core logic never touches I/O directly.

#![warn(unreachable_pub)]

pub mod budget;
pub mod error;
pub mod groups;
pub mod merge;
pub mod phase;
pub mod pipeline;
pub mod ports;

// Re-exports for convenience
pub use budget::{BudgetTier, TokenBudgets};
pub use error::PipelineError;
pub use groups::{execute_groups, GroupResults};
pub use merge::{merge_document, PIPELINE_VERSION};
pub use phase::{ensure_required_keys, AnalysisPhase, PhaseOutcome, PhaseRunner};
pub use pipeline::{PipelineConfig, PlanPipeline, FALLBACK_MODEL};
pub use ports::{
    emit_status, InMemoryPlanStore, LoggingStatusSink, NoopPlanStore, NoopStatusSink, PlanStore,
    PortError, RecordingStatusSink, SavedPlan, Stage, StatusSink,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
