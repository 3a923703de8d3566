//! Anthropic messages-API client
//!
//! Streams the response and accumulates `content_block_delta` text into one
//! string. No request timeout is configured: analysis calls may legitimately
//! run for minutes, and the pipeline bounds work through retry counts
//! instead.

use crate::error::{ErrorKind, GenerationError};
use crate::service::{GenerationRequest, GenerationService};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Default generation model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ClientConfig {
    /// Create a config with the default API endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a config from `ANTHROPIC_API_KEY` (and optional
    /// `ANTHROPIC_BASE_URL`)
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            GenerationError::new(ErrorKind::InvalidResponse, "ANTHROPIC_API_KEY not set")
        })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    text: Option<String>,
}

/// Streaming HTTP client for the generation backend
pub struct AnthropicClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GenerationError::new(ErrorKind::Network, format!("client build: {e}")))?;
        Ok(Self { config, client })
    }

    /// Classify a non-success response at the adapter boundary.
    ///
    /// Status is primary; the body substring check catches proxies that
    /// report overload under a generic status. Substring matching stays
    /// here, never in pipeline logic.
    fn classify_failure(status: u16, body: &str) -> GenerationError {
        if status != 529 && body.contains("overloaded") {
            return GenerationError::new(
                ErrorKind::Overloaded,
                format!("API error ({status}): {body}"),
            );
        }
        GenerationError::from_status(status, body)
    }
}

#[async_trait]
impl GenerationService for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/messages", self.config.base_url);
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            stream: true,
            system: &request.system_prompt,
            messages: vec![Message {
                role: "user",
                content: &request.user_prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::new(ErrorKind::Network, format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        // Accumulate streamed text from SSE frames, tolerating partial lines
        let mut stream = response.bytes_stream();
        let mut sse_buffer = String::new();
        let mut full_text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                GenerationError::new(ErrorKind::Network, format!("stream interrupted: {e}"))
            })?;
            sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = sse_buffer.find('\n') {
                let line = sse_buffer[..newline].trim_end_matches('\r').to_string();
                sse_buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    continue;
                }
                if let Ok(event) = serde_json::from_str::<StreamEvent>(data) {
                    if event.kind == "content_block_delta" {
                        if let Some(text) = event.delta.and_then(|d| d.text) {
                            full_text.push_str(&text);
                        }
                    }
                }
            }
        }

        if full_text.is_empty() {
            return Err(GenerationError::new(
                ErrorKind::InvalidResponse,
                "response stream produced no content",
            ));
        }

        tracing::debug!(
            model = %request.model,
            chars = full_text.len(),
            "generation stream complete"
        );
        Ok(full_text)
    }
}
