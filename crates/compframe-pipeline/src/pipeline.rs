//! Pipeline orchestrator
//!
//! One fixed topology: three sequential analysis phases, the contract
//! reconciliation stage, the concurrent group stage, and the merge. A
//! failed phase 1 or 2 aborts the run; everything downstream degrades.
//!
//! The run's terminal state is always persisted: the merged document on
//! success, an error record on failure, before the error re-raises to the
//! caller.

use crate::budget::TokenBudgets;
use crate::error::PipelineError;
use crate::groups::{execute_groups, GroupResults};
use crate::merge::merge_document;
use crate::phase::{ensure_required_keys, AnalysisPhase, PhaseRunner};
use crate::ports::{emit_status, PlanStore, Stage, StatusSink};
use compframe_contract::{
    auto_fix_contract, backfill_contract, force_align_roles_group, validate_contract,
    validate_group_output, GroupId, NumericalContract,
};
use compframe_genai::{GenerationService, DEFAULT_MODEL};
use compframe_prompts::{
    build_phase1_prompts, build_phase2_prompts, build_phase3_prompts, build_request_context,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Retry model used when the primary reports backpressure
pub const FALLBACK_MODEL: &str = "claude-haiku-4-5-20251001";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub primary_model: String,
    pub fallback_model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_MODEL.to_string(),
            fallback_model: FALLBACK_MODEL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Override the primary generation model
    #[must_use]
    pub fn with_primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = model.into();
        self
    }

    /// Override the backpressure fallback model
    #[must_use]
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }
}

/// The compensation-plan generation pipeline
pub struct PlanPipeline {
    service: Arc<dyn GenerationService>,
    status: Arc<dyn StatusSink>,
    store: Arc<dyn PlanStore>,
    config: PipelineConfig,
}

impl PlanPipeline {
    /// Create a pipeline with default configuration
    #[must_use]
    pub fn new(
        service: Arc<dyn GenerationService>,
        status: Arc<dyn StatusSink>,
        store: Arc<dyn PlanStore>,
    ) -> Self {
        Self {
            service,
            status,
            store,
            config: PipelineConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full pipeline for one intake.
    ///
    /// On failure the error status and store record are written before the
    /// error propagates, so persisted state never sits in a non-terminal
    /// limbo when the process is healthy enough to run this catch.
    pub async fn run(&self, plan_id: &str, intake: &Value) -> Result<Value, PipelineError> {
        match self.execute(plan_id, intake).await {
            Ok(document) => Ok(document),
            Err(error) => {
                let detail = error.to_string();
                tracing::error!(plan_id, %error, "pipeline run failed");
                emit_status(&*self.status, plan_id, Stage::Error, &detail).await;
                if let Err(store_error) = self.store.save_error(plan_id, &detail).await {
                    tracing::warn!(plan_id, %store_error, "failed to persist error state");
                }
                Err(error)
            }
        }
    }

    async fn execute(&self, plan_id: &str, intake: &Value) -> Result<Value, PipelineError> {
        let started = Instant::now();
        let request = build_request_context(intake);
        let budgets = TokenBudgets::for_plan_count(request.metadata.plan_count);
        tracing::info!(
            plan_id,
            plan_count = request.metadata.plan_count,
            tier = budgets.tier.label(),
            "starting pipeline"
        );

        let runner = PhaseRunner {
            service: &*self.service,
            status: &*self.status,
            plan_id,
            primary_model: &self.config.primary_model,
            fallback_model: &self.config.fallback_model,
        };

        // Phases 1 and 2 are load-bearing: failure or a missing key aborts
        let prompts = build_phase1_prompts(&request.context, &request.metadata);
        let phase1 = runner
            .run(AnalysisPhase::Strategy, &prompts, budgets.phase(AnalysisPhase::Strategy))
            .await?;
        ensure_required_keys(AnalysisPhase::Strategy, &phase1.output)?;

        let prompts = build_phase2_prompts(&request.context, &phase1.output, &request.metadata);
        let phase2 = runner
            .run(AnalysisPhase::Contract, &prompts, budgets.phase(AnalysisPhase::Contract))
            .await?;
        ensure_required_keys(AnalysisPhase::Contract, &phase2.output)?;

        emit_status(
            &*self.status,
            plan_id,
            Stage::Validation,
            "Validating numerical contract...",
        )
        .await;
        let contract_value = phase2
            .output
            .get("numerical_contract")
            .cloned()
            .unwrap_or(Value::Null);
        let contract = reconcile_contract(contract_value)?;

        // Phase 3 degrades to empty analysis on failure
        let prompts = build_phase3_prompts(
            &request.context,
            &phase1.output,
            &phase2.output,
            &request.metadata,
        );
        let phase3_output = match runner
            .run(AnalysisPhase::Rationale, &prompts, budgets.phase(AnalysisPhase::Rationale))
            .await
        {
            Ok(outcome) => outcome.output,
            Err(error) => {
                tracing::warn!(plan_id, %error, "phase 3 failed; proceeding with empty analysis");
                json!({})
            }
        };

        let analysis_output = assemble_analysis(&contract, &phase1.output, &phase3_output);

        emit_status(
            &*self.status,
            plan_id,
            Stage::Generating,
            "Generating document sections...",
        )
        .await;
        let mut results = execute_groups(
            &*self.service,
            &*self.status,
            plan_id,
            &self.config.primary_model,
            &budgets,
            &request.context,
            &analysis_output,
        )
        .await;

        reconcile_groups(&mut results, &contract);

        emit_status(
            &*self.status,
            plan_id,
            Stage::Finalizing,
            "Assembling final document...",
        )
        .await;
        let document = merge_document(&phase1.output, &contract, &results);

        let display_name = document
            .get("plan_name")
            .and_then(Value::as_str)
            .unwrap_or("Compensation Plan")
            .to_string();
        let detail = format!("Generated in {}s", started.elapsed().as_secs());
        if let Err(store_error) = self
            .store
            .save_complete(plan_id, &document, &display_name, &detail)
            .await
        {
            tracing::warn!(plan_id, %store_error, "failed to persist completed plan");
        }
        emit_status(&*self.status, plan_id, Stage::Complete, &detail).await;

        Ok(document)
    }
}

/// Validate, auto-fix and backfill the contract.
///
/// Criticals that survive auto-fix are logged, not fatal: generation is
/// approximate and a best-effort contract beats no document.
fn reconcile_contract(contract_value: Value) -> Result<NumericalContract, PipelineError> {
    let mut contract: NumericalContract = serde_json::from_value(contract_value)?;

    let validation = validate_contract(&contract);
    if !validation.valid {
        tracing::warn!(
            errors = validation.errors.len(),
            warnings = validation.warnings.len(),
            "contract failed validation; auto-fixing"
        );
        contract = auto_fix_contract(&contract);

        let recheck = validate_contract(&contract);
        if !recheck.valid {
            tracing::warn!(
                errors = ?recheck.error_messages(),
                "criticals persist after auto-fix; proceeding best-effort"
            );
        }
    }
    for warning in &validation.warnings {
        tracing::debug!(field = %warning.field, "{}", warning.message);
    }

    backfill_contract(&mut contract);
    Ok(contract)
}

/// Bundle the contract and narrative analyses for the group prompts.
///
/// Phase 3 sub-sections default to empty when absent.
fn assemble_analysis(
    contract: &NumericalContract,
    phase1_output: &Value,
    phase3_output: &Value,
) -> Value {
    let section = |name: &str, default: Value| -> Value {
        phase3_output.get(name).cloned().unwrap_or(default)
    };
    json!({
        "numerical_contract": contract,
        "strategic_analysis": phase1_output
            .get("strategic_analysis")
            .cloned()
            .unwrap_or(json!({})),
        "role_analysis": section("role_analysis", json!({})),
        "operational_analysis": section("operational_analysis", json!({})),
        "scenarios": section("scenarios", json!([])),
        "global_warnings": section("global_warnings", json!([])),
        "assumptions": section("assumptions", json!([])),
    })
}

/// Check each surviving group against the contract.
///
/// The roles group is force-aligned on disagreement; any other group whose
/// output is structurally broken is dropped and recorded as failed.
fn reconcile_groups(results: &mut GroupResults, contract: &NumericalContract) {
    let mut dropped = Vec::new();

    for (group, output) in &mut results.outputs {
        let check = validate_group_output(*group, output, contract);
        if check.valid {
            continue;
        }
        if *group == GroupId::A {
            tracing::warn!(
                errors = check.errors.len(),
                "roles group disagrees with contract; force-aligning"
            );
            *output = force_align_roles_group(output, contract);
        } else {
            tracing::warn!(group = %group, "group output failed validation; dropping");
            dropped.push(*group);
        }
    }

    for group in dropped {
        results.outputs.remove(&group);
        results.failed.push(group);
    }
    results.failed.sort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders() {
        let config = PipelineConfig::default()
            .with_primary_model("model-x")
            .with_fallback_model("model-y");
        assert_eq!(config.primary_model, "model-x");
        assert_eq!(config.fallback_model, "model-y");

        let defaults = PipelineConfig::default();
        assert_eq!(defaults.primary_model, DEFAULT_MODEL);
        assert_eq!(defaults.fallback_model, FALLBACK_MODEL);
    }

    #[test]
    fn analysis_bundle_defaults_missing_sections() {
        let contract = NumericalContract::default();
        let bundle = assemble_analysis(&contract, &json!({}), &json!({}));

        assert_eq!(bundle["strategic_analysis"], json!({}));
        assert_eq!(bundle["role_analysis"], json!({}));
        assert_eq!(bundle["scenarios"], json!([]));
        assert_eq!(bundle["assumptions"], json!([]));
    }

    #[test]
    fn broken_non_primary_group_dropped() {
        let mut results = GroupResults::default();
        results.outputs.insert(GroupId::B, Value::Null);
        results
            .outputs
            .insert(GroupId::C, json!({"governance": {}}));

        reconcile_groups(&mut results, &NumericalContract::default());

        assert!(!results.outputs.contains_key(&GroupId::B));
        assert!(results.outputs.contains_key(&GroupId::C));
        assert_eq!(results.failed, vec![GroupId::B]);
    }
}
