//! CompFrame Prompts - the prompt-construction collaborator
//!
//! Pure text producers consumed by the pipeline:
//! - Request context rendering with workload metadata derivation
//! - Analysis-phase prompt builders (strategy, contract, rationale)
//! - Formatting-group prompt builders
//!
//! Everything here is a pure function of its inputs; nothing is cached
//! between calls.

#![warn(unreachable_pub)]

pub mod context;
pub mod groups;
pub mod phases;

// Re-exports for convenience
pub use context::{build_request_context, estimate_plan_count, RequestContext, WorkloadMetadata};
pub use groups::build_group_prompts;
pub use phases::{
    build_phase1_prompts, build_phase2_prompts, build_phase3_prompts, PromptPair,
    COMPACT_MODE_THRESHOLD,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
