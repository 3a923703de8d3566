//! Generation service trait and the JSON call wrapper
//!
//! The pipeline talks to the backend exclusively through
//! [`GenerationService`]; everything above this boundary works with
//! structured error kinds and parsed JSON values.

use crate::error::{ErrorKind, GenerationError};
use crate::extract::{parse_structured, repair_truncated};
use async_trait::async_trait;
use serde_json::Value;

/// Appended to the user prompt when a parse-retry is issued
const STRICT_JSON_REMINDER: &str = "\n\nCRITICAL: Your previous response was not valid JSON. \
    Respond with ONLY a valid JSON object. No markdown, no explanation, no code fences. \
    Just the raw JSON.";

/// One generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Maximum output size in tokens
    pub max_tokens: u32,
    pub model: String,
}

impl GenerationRequest {
    /// Create a request
    #[must_use]
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        max_tokens: u32,
        model: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens,
            model: model.into(),
        }
    }
}

/// Opaque text-generation backend
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate the full response text for a prompt pair.
    ///
    /// Implementations accumulate any streaming into one string and classify
    /// failures into [`ErrorKind`]s; no raw transport errors escape.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Whether `generate_json` may re-issue the call once on parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRetry {
    /// Fail immediately on parse failure (caller owns retry)
    Never,
    /// Retry once with a strict JSON-only instruction appended
    Once,
}

/// Call the service and extract a JSON value from the response.
///
/// Runs the full extraction ladder on the response text; truncation repair
/// is logged since it usually means the output budget was too small. With
/// [`ParseRetry::Once`], a final parse failure triggers one more call with
/// a stricter instruction before giving up.
pub async fn generate_json(
    service: &dyn GenerationService,
    request: &GenerationRequest,
    parse_retry: ParseRetry,
) -> Result<Value, GenerationError> {
    let text = service.generate(request).await?;

    if let Some(value) = parse_structured(&text) {
        return Ok(value);
    }
    if let Some(value) = repair_truncated(&text) {
        tracing::warn!(model = %request.model, "repaired truncated JSON output");
        return Ok(value);
    }

    if parse_retry == ParseRetry::Never {
        return Err(GenerationError::new(
            ErrorKind::Parse,
            "failed to parse JSON from response (no retry)",
        ));
    }

    let strict = GenerationRequest {
        user_prompt: format!("{}{STRICT_JSON_REMINDER}", request.user_prompt),
        ..request.clone()
    };
    let retry_text = service.generate(&strict).await?;

    parse_structured(&retry_text)
        .or_else(|| repair_truncated(&retry_text))
        .ok_or_else(|| {
            GenerationError::new(
                ErrorKind::Parse,
                "failed to parse JSON from response after retry",
            )
        })
}
