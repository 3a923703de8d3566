//! Formatting-group execution
//!
//! Fans out the five formatting groups concurrently, joins on all of them,
//! then retries the failures sequentially, once each. A group that fails its
//! retry is simply missing from the result set; the merger degrades around
//! it. Sequential retries bound concurrent load on the backend.

use crate::budget::TokenBudgets;
use crate::ports::{emit_status, Stage, StatusSink};
use compframe_contract::GroupId;
use compframe_genai::{
    generate_json, GenerationError, GenerationRequest, GenerationService, ParseRetry,
};
use compframe_prompts::build_group_prompts;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of the group stage: every group that eventually succeeded, plus
/// the ids that never did
#[derive(Debug, Clone, Default)]
pub struct GroupResults {
    pub outputs: BTreeMap<GroupId, Value>,
    pub failed: Vec<GroupId>,
}

async fn run_group(
    service: &dyn GenerationService,
    model: &str,
    budgets: &TokenBudgets,
    context: &str,
    analysis_output: &Value,
    group: GroupId,
) -> Result<Value, GenerationError> {
    let prompts = build_group_prompts(group, context, analysis_output);
    let request = GenerationRequest::new(prompts.system, prompts.user, budgets.group(group), model);
    // Groups get the JSON wrapper's parse retry; phase-style model fallback
    // does not apply here
    generate_json(service, &request, ParseRetry::Once).await
}

/// Execute all five formatting groups against the analysis output.
///
/// Fan-out/fan-in: every group runs concurrently and a failure never
/// cancels a sibling. Failures are retried one at a time after the join,
/// with a status update per retry.
pub async fn execute_groups(
    service: &dyn GenerationService,
    status: &dyn StatusSink,
    plan_id: &str,
    model: &str,
    budgets: &TokenBudgets,
    context: &str,
    analysis_output: &Value,
) -> GroupResults {
    let wave = futures::future::join_all(GroupId::ALL.map(|group| async move {
        let outcome = run_group(service, model, budgets, context, analysis_output, group).await;
        (group, outcome)
    }))
    .await;

    let mut results = GroupResults::default();
    let mut retry_queue = Vec::new();
    for (group, outcome) in wave {
        match outcome {
            Ok(output) => {
                results.outputs.insert(group, output);
            }
            Err(error) => {
                tracing::warn!(group = %group, %error, "group failed; will retry");
                retry_queue.push(group);
            }
        }
    }

    for group in retry_queue {
        emit_status(
            status,
            plan_id,
            Stage::Generating,
            &format!("Retrying section {group} ({})...", group.name()),
        )
        .await;

        match run_group(service, model, budgets, context, analysis_output, group).await {
            Ok(output) => {
                results.outputs.insert(group, output);
            }
            Err(error) => {
                tracing::error!(group = %group, %error, "group failed after retry; omitting");
                results.failed.push(group);
            }
        }
    }

    tracing::info!(
        completed = results.outputs.len(),
        failed = results.failed.len(),
        "group stage finished"
    );
    results
}
