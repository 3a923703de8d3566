//! CompFrame GenAI - the generation-service collaborator boundary
//!
//! Everything the pipeline needs from the text-generation backend:
//! - The [`GenerationService`] trait with structured [`ErrorKind`]s
//! - The JSON call wrapper with its extraction fallback ladder
//! - The streaming Anthropic client
//! - A scripted mock for tests
//!
//! Raw transport and parse failures never escape this crate unclassified;
//! retry and fallback-model policy upstream keys on [`ErrorKind`] alone.

#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod extract;
pub mod service;
pub mod testing;

// Re-exports for convenience
pub use client::{AnthropicClient, ClientConfig, DEFAULT_MODEL};
pub use error::{ErrorKind, GenerationError};
pub use extract::{parse_structured, repair_truncated};
pub use service::{generate_json, GenerationRequest, GenerationService, ParseRetry};
pub use testing::MockGenerationService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
