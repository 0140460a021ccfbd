pub mod string;

pub use string::SecretString;

use regex::Regex;
use sdk::errors::ConductorError;
use std::sync::OnceLock;

/// SecretManager resolves the LLM credential from the process environment.
///
/// The variable name comes from `llm.api_key_env`. A `.env` file in the
/// working directory is loaded first, without overriding variables that are
/// already set.
///
/// The SecretManager also provides secret scrubbing functionality to remove
/// sensitive data from log output and error messages.
pub struct SecretManager {
    env_var: String,
}

/// Regex patterns for detecting common secret formats.
/// These are compiled once and reused for performance.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - Anthropic and OpenAI style keys: sk-[a-zA-Z0-9-_]{20,}
/// - `x-api-key` header echoes
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            // Covers sk-ant-api03-..., sk-proj-... and plain sk-...
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid API key pattern"),
            Regex::new(r#"(?i)x-api-key["']?\s*[:=]\s*["']?[^\s"',}]{8,}"#)
                .expect("Invalid header pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
        ]
    })
}

impl SecretManager {
    /// Creates a SecretManager reading the given environment variable
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Name of the environment variable holding the credential
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Retrieves the credential.
    ///
    /// # Errors
    /// Returns `ConductorError::Config` if the variable is unset or blank.
    pub fn get_secret(&self) -> Result<SecretString, ConductorError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }

        match std::env::var(&self.env_var) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!("Read credential from ${}", self.env_var);
                Ok(SecretString::new(value.trim()))
            }
            Ok(_) => Err(ConductorError::Config(format!(
                "{} is set but empty",
                self.env_var
            ))),
            Err(_) => Err(ConductorError::Config(format!(
                "{} is not set. Export it or add it to a .env file",
                self.env_var
            ))),
        }
    }

    /// Checks whether the credential is available without failing.
    pub fn has_secret(&self) -> bool {
        self.get_secret().is_ok()
    }

    /// Scrubs secrets from text by replacing them with [REDACTED].
    ///
    /// This should be used on upstream error bodies and raw LLM replies
    /// before they are logged or returned to API clients.
    ///
    /// # Examples
    /// ```
    /// use conductor_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("My API key is sk-ant-REDACTED");
    /// assert_eq!(scrubbed, "My API key is [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let patterns = get_secret_patterns();
        let mut result = text.to_string();

        for pattern in patterns {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }

        result
    }
}
