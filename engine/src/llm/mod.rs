//! LLM Provider Abstraction Layer
//!
//! The assignment orchestrator only needs plain text completion, so the
//! `LLMProvider` trait is a single `complete` call taking a prompt and
//! sampling options. `AnthropicProvider` is the production implementation;
//! tests substitute scripted providers.

use async_trait::async_trait;
use sdk::errors::ConductorError;
use serde::{Deserialize, Serialize};

pub mod anthropic;

pub use anthropic::AnthropicProvider;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LLMError {
    /// Transient failures worth one more attempt with the same payload
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LLMError::ProviderUnavailable(_)
                | LLMError::RateLimitExceeded
                | LLMError::NetworkError(_)
                | LLMError::Timeout
        )
    }
}

impl From<LLMError> for ConductorError {
    fn from(err: LLMError) -> Self {
        ConductorError::AssignmentService(err.to_string())
    }
}

/// Sampling options sent with a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// A single-turn completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,

    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, options: CompletionOptions) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            options,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = if system.trim().is_empty() {
            None
        } else {
            Some(system)
        };
        self
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "anthropic")
    fn name(&self) -> &str;

    /// Send the request and return the reply text
    ///
    /// # Returns
    /// * `Ok(String)` - The concatenated text of the reply
    /// * `Err(LLMError)` - If the request fails
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CompletionOptions {
        CompletionOptions {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1000,
            temperature: 0.6,
        }
    }

    #[test]
    fn test_transport_classification() {
        assert!(LLMError::Timeout.is_transport());
        assert!(LLMError::RateLimitExceeded.is_transport());
        assert!(LLMError::NetworkError("reset".into()).is_transport());
        assert!(LLMError::ProviderUnavailable("503".into()).is_transport());
        assert!(!LLMError::AuthenticationFailed("bad key".into()).is_transport());
        assert!(!LLMError::InvalidRequest("400".into()).is_transport());
        assert!(!LLMError::ParseError("no content".into()).is_transport());
    }

    #[test]
    fn test_llm_error_becomes_assignment_service_error() {
        let err: ConductorError = LLMError::Timeout.into();
        assert!(matches!(err, ConductorError::AssignmentService(ref m) if m == "Timeout"));
    }

    #[test]
    fn test_blank_system_prompt_dropped() {
        let request = CompletionRequest::new("Assign", options()).with_system("   ");
        assert!(request.system.is_none());

        let request = CompletionRequest::new("Assign", options()).with_system("Be exact");
        assert_eq!(request.system.as_deref(), Some("Be exact"));
    }

    #[test]
    fn test_request_serialization_skips_missing_system() {
        let json = serde_json::to_string(&CompletionRequest::new("Assign", options())).unwrap();
        assert!(!json.contains("system"));
    }
}
