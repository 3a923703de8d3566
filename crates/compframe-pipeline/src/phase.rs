//! Analysis-phase execution
//!
//! Runs one named phase: a single generation call, one retry on failure,
//! and a fallback model when the failure kind indicates backend pressure.
//! A phase that fails its retry is terminal and names itself in the error.

use crate::error::PipelineError;
use crate::ports::{emit_status, Stage, StatusSink};
use compframe_genai::{generate_json, GenerationRequest, GenerationService, ParseRetry};
use compframe_prompts::PromptPair;
use serde_json::Value;
use std::time::Instant;

/// The three sequential analysis phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Qualitative design decisions, no numbers
    Strategy,
    /// The numeric contract, every value locked
    Contract,
    /// Rationale and operational narrative
    Rationale,
}

impl AnalysisPhase {
    /// Display name, used in status text and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisPhase::Strategy => "Phase 1: Strategic Foundation",
            AnalysisPhase::Contract => "Phase 2: Numerical Contract",
            AnalysisPhase::Rationale => "Phase 3: Rationale & Operations",
        }
    }

    /// Top-level keys the phase output must carry.
    ///
    /// Phase 3 has none: its absence is tolerated with empty substitutes.
    #[must_use]
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            AnalysisPhase::Strategy => &["strategic_analysis", "role_architecture"],
            AnalysisPhase::Contract => &["numerical_contract"],
            AnalysisPhase::Rationale => &[],
        }
    }
}

/// Result of one successful phase run
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub output: Value,
    pub model_used: String,
    pub elapsed_ms: u64,
}

/// Executes analysis phases against the generation service.
///
/// Stateless across calls; each invocation is independent.
pub struct PhaseRunner<'a> {
    pub service: &'a dyn GenerationService,
    pub status: &'a dyn StatusSink,
    pub plan_id: &'a str,
    pub primary_model: &'a str,
    pub fallback_model: &'a str,
}

impl PhaseRunner<'_> {
    /// Run one phase: one call, one retry.
    ///
    /// A backpressure failure (overload, rate limit) retries on the fallback
    /// model; any other failure retries on the primary. Phases own their
    /// retry, so the JSON wrapper is told not to add one of its own.
    pub async fn run(
        &self,
        phase: AnalysisPhase,
        prompts: &PromptPair,
        max_tokens: u32,
    ) -> Result<PhaseOutcome, PipelineError> {
        emit_status(
            self.status,
            self.plan_id,
            Stage::Analysis,
            &format!("Running {}...", phase.name()),
        )
        .await;

        let start = Instant::now();
        let request = GenerationRequest::new(
            prompts.system.clone(),
            prompts.user.clone(),
            max_tokens,
            self.primary_model,
        );

        let first_error = match generate_json(self.service, &request, ParseRetry::Never).await {
            Ok(output) => {
                return Ok(self.outcome(phase, output, self.primary_model, start));
            }
            Err(error) => error,
        };

        let retry_model = if first_error.kind.is_backpressure() {
            self.fallback_model
        } else {
            self.primary_model
        };
        tracing::warn!(
            phase = phase.name(),
            error = %first_error,
            retry_model,
            "phase failed; retrying"
        );
        emit_status(
            self.status,
            self.plan_id,
            Stage::Analysis,
            &format!("Retrying {}...", phase.name()),
        )
        .await;

        let retry = GenerationRequest {
            model: retry_model.to_string(),
            ..request
        };
        match generate_json(self.service, &retry, ParseRetry::Never).await {
            Ok(output) => Ok(self.outcome(phase, output, retry_model, start)),
            Err(source) => Err(PipelineError::PhaseFailed {
                phase: phase.name(),
                source,
            }),
        }
    }

    fn outcome(
        &self,
        phase: AnalysisPhase,
        output: Value,
        model: &str,
        start: Instant,
    ) -> PhaseOutcome {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(phase = phase.name(), model, elapsed_ms, "phase complete");
        PhaseOutcome {
            output,
            model_used: model.to_string(),
            elapsed_ms,
        }
    }
}

/// Check a phase output for its required top-level keys.
///
/// A missing key is always fatal for the phase that produced it.
pub fn ensure_required_keys(phase: AnalysisPhase, output: &Value) -> Result<(), PipelineError> {
    let missing: Vec<String> = phase
        .required_keys()
        .iter()
        .filter(|key| output.get(**key).is_none())
        .map(|key| (*key).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingKeys {
            phase: phase.name(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RecordingStatusSink;
    use compframe_genai::{ErrorKind, GenerationError, MockGenerationService};
    use serde_json::json;

    const PRIMARY: &str = "model-primary";
    const FALLBACK: &str = "model-fallback";

    fn runner<'a>(
        service: &'a MockGenerationService,
        status: &'a RecordingStatusSink,
    ) -> PhaseRunner<'a> {
        PhaseRunner {
            service,
            status,
            plan_id: "plan-1",
            primary_model: PRIMARY,
            fallback_model: FALLBACK,
        }
    }

    fn prompts() -> PromptPair {
        PromptPair {
            system: "phase system".to_string(),
            user: "phase user".to_string(),
        }
    }

    #[tokio::test]
    async fn success_uses_primary_model() {
        let mock = MockGenerationService::new().with_default_text(r#"{"ok": 1}"#);
        let status = RecordingStatusSink::new();

        let outcome = runner(&mock, &status)
            .run(AnalysisPhase::Strategy, &prompts(), 4096)
            .await
            .unwrap();

        assert_eq!(outcome.output, json!({"ok": 1}));
        assert_eq!(outcome.model_used, PRIMARY);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(status.events().len(), 1);
        assert!(status.events()[0].1.contains("Running Phase 1"));
    }

    #[tokio::test]
    async fn overload_retries_on_fallback_model() {
        let mock = MockGenerationService::new()
            .enqueue_error("phase user", GenerationError::from_status(529, "overloaded"))
            .enqueue_text("phase user", r#"{"recovered": true}"#);
        let status = RecordingStatusSink::new();

        let outcome = runner(&mock, &status)
            .run(AnalysisPhase::Contract, &prompts(), 4096)
            .await
            .unwrap();

        assert_eq!(outcome.model_used, FALLBACK);
        let requests = mock.recorded_requests();
        assert_eq!(requests[0].model, PRIMARY);
        assert_eq!(requests[1].model, FALLBACK);
        assert!(status.events()[1].1.contains("Retrying Phase 2"));
    }

    #[tokio::test]
    async fn parse_failure_retries_on_primary_model() {
        let mock = MockGenerationService::new()
            .enqueue_text("phase user", "not json")
            .enqueue_text("phase user", r#"{"second": 2}"#);
        let status = RecordingStatusSink::new();

        let outcome = runner(&mock, &status)
            .run(AnalysisPhase::Strategy, &prompts(), 4096)
            .await
            .unwrap();

        assert_eq!(outcome.model_used, PRIMARY);
        assert_eq!(mock.recorded_requests()[1].model, PRIMARY);
    }

    #[tokio::test]
    async fn double_failure_is_terminal_and_names_phase() {
        let mock = MockGenerationService::new()
            .enqueue_error("phase user", GenerationError::from_status(500, "a"))
            .enqueue_error("phase user", GenerationError::from_status(500, "b"));
        let status = RecordingStatusSink::new();

        let err = runner(&mock, &status)
            .run(AnalysisPhase::Contract, &prompts(), 4096)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Phase 2: Numerical Contract"));
        // Exactly one retry
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn retry_keeps_prompts_and_budget() {
        let mock = MockGenerationService::new()
            .enqueue_error("phase user", GenerationError::new(ErrorKind::Network, "reset"))
            .enqueue_text("phase user", "{}");
        let status = RecordingStatusSink::new();

        runner(&mock, &status)
            .run(AnalysisPhase::Strategy, &prompts(), 12_288)
            .await
            .unwrap();

        let requests = mock.recorded_requests();
        assert_eq!(requests[0].user_prompt, requests[1].user_prompt);
        assert_eq!(requests[1].max_tokens, 12_288);
    }

    #[test]
    fn required_keys_checked() {
        let complete = json!({"strategic_analysis": {}, "role_architecture": {}});
        assert!(ensure_required_keys(AnalysisPhase::Strategy, &complete).is_ok());

        let partial = json!({"strategic_analysis": {}});
        let err = ensure_required_keys(AnalysisPhase::Strategy, &partial).unwrap_err();
        assert!(err.to_string().contains("role_architecture"));

        // Phase 3 tolerates anything
        assert!(ensure_required_keys(AnalysisPhase::Rationale, &json!({})).is_ok());
    }
}
