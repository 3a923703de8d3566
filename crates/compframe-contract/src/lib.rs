//! CompFrame Contract - the numeric data contract and its reconciliation
//!
//! The numeric contract is the sole source of truth for every figure in a
//! generated compensation plan. This crate owns:
//! - The contract data model (roles, tiers, ramps, company aggregates)
//! - Validation of cross-field arithmetic invariants
//! - Deterministic auto-repair of critical errors
//! - Backfill of fields omitted by compact generation mode
//! - Field-level validation and force-alignment of formatting-group output
//!
//! # Example
//!
//! ```rust,ignore
//! use compframe_contract::{auto_fix_contract, backfill_contract, validate_contract};
//!
//! let validation = validate_contract(&contract);
//! if !validation.valid {
//!     contract = auto_fix_contract(&contract);
//! }
//! backfill_contract(&mut contract);
//! ```

#![warn(unreachable_pub)]

pub mod align;
pub mod autofix;
pub mod backfill;
pub mod findings;
pub mod types;
pub mod validate;

// Re-exports for convenience
pub use align::{force_align_roles_group, validate_group_output, GroupFinding, GroupValidation};
pub use autofix::auto_fix_contract;
pub use backfill::{
    backfill_contract, format_compact_currency, format_multiplier, synthesize_ramp,
    weighted_effective_multiplier,
};
pub use findings::{ContractValidation, Finding, FixPayload, Severity};
pub use types::{
    AcceleratorTier, CompanyLevel, ContractRole, GroupId, Measure, NumericalContract, RampMonth,
    SDR_OTE_FLOOR,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
