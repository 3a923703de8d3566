//! Scripted generation service for tests
//!
//! Stubs are keyed by a substring matched against the request's system or
//! user prompt; repeated stubs for the same key form a FIFO sequence, so a
//! test can script failure-then-success per unit of work. Every request is
//! recorded for later assertions.

use crate::error::{ErrorKind, GenerationError};
use crate::service::{GenerationRequest, GenerationService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Outcome = Result<String, GenerationError>;

/// Scripted [`GenerationService`] implementation
#[derive(Default)]
pub struct MockGenerationService {
    stubs: Mutex<Vec<(String, VecDeque<Outcome>)>>,
    default_text: Option<String>,
    recorded: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationService {
    /// Create an empty mock; unmatched requests fail with an API error
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with this text whenever no stub matches
    #[must_use]
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    /// Queue a successful response for requests whose prompts contain `key`
    #[must_use]
    pub fn enqueue_text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(key.into(), Ok(text.into()));
        self
    }

    /// Queue a failure for requests whose prompts contain `key`
    #[must_use]
    pub fn enqueue_error(self, key: impl Into<String>, error: GenerationError) -> Self {
        self.push(key.into(), Err(error));
        self
    }

    fn push(&self, key: String, outcome: Outcome) {
        let mut stubs = self.stubs.lock().unwrap();
        if let Some((_, queue)) = stubs.iter_mut().find(|(k, _)| *k == key) {
            queue.push_back(outcome);
        } else {
            stubs.push((key, VecDeque::from([outcome])));
        }
    }

    /// Number of generate calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    /// All requests received, in order
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.recorded.lock().unwrap().push(request.clone());

        let mut stubs = self.stubs.lock().unwrap();
        for (key, queue) in stubs.iter_mut() {
            if request.system_prompt.contains(key.as_str())
                || request.user_prompt.contains(key.as_str())
            {
                if let Some(outcome) = queue.pop_front() {
                    return outcome;
                }
            }
        }

        match &self.default_text {
            Some(text) => Ok(text.clone()),
            None => Err(GenerationError::new(
                ErrorKind::Api,
                format!("no stub for request (model {})", request.model),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stubs_match_by_substring_in_fifo_order() {
        let mock = MockGenerationService::new()
            .enqueue_text("alpha", "first")
            .enqueue_text("alpha", "second");

        let request = GenerationRequest::new("system alpha", "user", 128, "m");
        assert_eq!(mock.generate(&request).await.unwrap(), "first");
        assert_eq!(mock.generate(&request).await.unwrap(), "second");
        // Queue drained: falls through to the unmatched error
        assert!(mock.generate(&request).await.is_err());
    }

    #[tokio::test]
    async fn default_text_covers_unmatched() {
        let mock = MockGenerationService::new().with_default_text("{}");
        let request = GenerationRequest::new("s", "u", 128, "m");
        assert_eq!(mock.generate(&request).await.unwrap(), "{}");
    }
}
