//! Status and persistence ports
//!
//! The pipeline reports progress and stores its result through these two
//! ports. Status updates are best-effort: [`emit_status`] swallows and logs
//! sink failures so progress reporting can never fail a run. Test and no-op
//! implementations live here alongside the traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Error type for port implementations
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline lifecycle stage, as reported to the status sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analysis,
    Validation,
    Generating,
    Finalizing,
    Complete,
    Error,
}

impl Stage {
    /// Wire name of the stage
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analysis => "analysis",
            Stage::Validation => "validation",
            Stage::Generating => "generating",
            Stage::Finalizing => "finalizing",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress-reporting port
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Record the current stage and a human-readable detail line
    async fn update_status(&self, plan_id: &str, stage: Stage, detail: &str)
        -> Result<(), PortError>;
}

/// Emit a status update, swallowing and logging any sink failure.
///
/// Status is a progress signal, not a correctness mechanism; a failing sink
/// must never fail the caller.
pub async fn emit_status(sink: &dyn StatusSink, plan_id: &str, stage: Stage, detail: &str) {
    if let Err(error) = sink.update_status(plan_id, stage, detail).await {
        tracing::warn!(plan_id, stage = %stage, %error, "status update failed");
    }
}

/// Sink that drops every update
pub struct NoopStatusSink;

#[async_trait]
impl StatusSink for NoopStatusSink {
    async fn update_status(&self, _: &str, _: Stage, _: &str) -> Result<(), PortError> {
        Ok(())
    }
}

/// Sink that logs updates through tracing; used by the binary
pub struct LoggingStatusSink;

#[async_trait]
impl StatusSink for LoggingStatusSink {
    async fn update_status(
        &self,
        plan_id: &str,
        stage: Stage,
        detail: &str,
    ) -> Result<(), PortError> {
        tracing::info!(plan_id, stage = %stage, "{detail}");
        Ok(())
    }
}

/// Sink that records every update for assertions
#[derive(Default)]
pub struct RecordingStatusSink {
    events: Mutex<Vec<(Stage, String)>>,
}

impl RecordingStatusSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates received, in order
    #[must_use]
    pub fn events(&self) -> Vec<(Stage, String)> {
        self.events.lock().unwrap().clone()
    }

    /// Stages received, in order
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(stage, _)| *stage)
            .collect()
    }
}

#[async_trait]
impl StatusSink for RecordingStatusSink {
    async fn update_status(
        &self,
        _plan_id: &str,
        stage: Stage,
        detail: &str,
    ) -> Result<(), PortError> {
        self.events.lock().unwrap().push((stage, detail.to_string()));
        Ok(())
    }
}

/// Persistence port for the finished run
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Store the merged document for a completed run
    async fn save_complete(
        &self,
        plan_id: &str,
        document: &Value,
        display_name: &str,
        detail: &str,
    ) -> Result<(), PortError>;

    /// Store a terminal error for a failed run
    async fn save_error(&self, plan_id: &str, detail: &str) -> Result<(), PortError>;
}

/// Store that drops everything
pub struct NoopPlanStore;

#[async_trait]
impl PlanStore for NoopPlanStore {
    async fn save_complete(&self, _: &str, _: &Value, _: &str, _: &str) -> Result<(), PortError> {
        Ok(())
    }

    async fn save_error(&self, _: &str, _: &str) -> Result<(), PortError> {
        Ok(())
    }
}

/// Terminal record held by the in-memory store
#[derive(Debug, Clone)]
pub enum SavedPlan {
    Complete {
        document: Value,
        display_name: String,
        detail: String,
        saved_at: DateTime<Utc>,
    },
    Error {
        detail: String,
        saved_at: DateTime<Utc>,
    },
}

/// Keyed in-memory store; later saves overwrite earlier ones, matching the
/// overwrite-by-key semantics of the hosted store
#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<BTreeMap<String, SavedPlan>>,
}

impl InMemoryPlanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the stored record for a plan id
    #[must_use]
    pub fn plan(&self, plan_id: &str) -> Option<SavedPlan> {
        self.plans.lock().unwrap().get(plan_id).cloned()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn save_complete(
        &self,
        plan_id: &str,
        document: &Value,
        display_name: &str,
        detail: &str,
    ) -> Result<(), PortError> {
        self.plans.lock().unwrap().insert(
            plan_id.to_string(),
            SavedPlan::Complete {
                document: document.clone(),
                display_name: display_name.to_string(),
                detail: detail.to_string(),
                saved_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn save_error(&self, plan_id: &str, detail: &str) -> Result<(), PortError> {
        self.plans.lock().unwrap().insert(
            plan_id.to_string(),
            SavedPlan::Error {
                detail: detail.to_string(),
                saved_at: Utc::now(),
            },
        );
        Ok(())
    }
}
