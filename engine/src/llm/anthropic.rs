use super::{CompletionRequest, LLMError, LLMProvider};
use crate::config::AnthropicConfig;
use crate::secrets::{SecretManager, SecretString};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    config: AnthropicConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig, api_key: SecretString) -> Self {
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider whose HTTP client enforces a request timeout
    pub fn with_timeout(
        config: AnthropicConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));

        let mut payload = json!({
            "model": request.options.model,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
        });
        if let Some(system) = &request.system {
            payload["system"] = json!(system);
        }

        tracing::debug!(
            "Sending {} prompt chars to {} ({})",
            request.prompt.len(),
            self.name(),
            request.options.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.unsecure())
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(SecretManager::scrub(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = SecretManager::scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                code if status.is_server_error() => {
                    LLMError::ProviderUnavailable(format!("HTTP {}: {}", code, text))
                }
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content_arr = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LLMError::ParseError("No content array in response".to_string()))?;

        let mut full_content = String::new();
        for item in content_arr {
            if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                full_content.push_str(text);
            }
        }

        Ok(full_content)
    }
}
