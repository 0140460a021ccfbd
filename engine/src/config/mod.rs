//! Configuration management
//!
//! This module handles loading, validation, and management of the Conductor
//! configuration. Configuration is stored in TOML format at
//! ~/.conductor/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **server**: HTTP bind address
//! - **organization**: Organization name and the base prompt given to the LLM
//! - **llm**: Credential source, timeout, and Anthropic provider settings
//!
//! The API key itself never lives in the file. `llm.api_key_env` names the
//! environment variable holding it (default `CLAUDE_API_KEY`), and a `.env`
//! file in the working directory is honoured.
//!
//! # Examples
//!
//! ```no_run
//! use conductor_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Organization: {}", config.organization.name);
//! println!("Model: {}", config.llm.anthropic.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::ConductorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Organization settings
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Organization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Display name of the organization
    #[serde(default = "default_organization_name")]
    pub name: String,

    /// Context prepended to every assignment prompt
    #[serde(default = "default_base_prompt")]
    pub base_prompt: String,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Timeout for a single LLM call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum tokens in a completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// System prompt sent with every request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    // Note: API key read from the environment, not from config
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_organization_name() -> String {
    "Default Organization".to_string()
}

fn default_base_prompt() -> String {
    "You are assisting a team by assigning tasks to workers based on their skills and experience.\n\
     Consider the following:\n\
     1. Match worker skills with task requirements\n\
     2. Consider worker workload and availability\n\
     3. Consider task priority and deadline\n\
     4. Balance workload appropriately among team members\n\
     5. Consider worker experience with similar tasks"
        .to_string()
}

fn default_api_key_env() -> String {
    "CLAUDE_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.6
}

fn default_system_prompt() -> String {
    "You follow tasks exactly as you are told and answer in the requested format.".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: default_organization_name(),
            base_prompt: default_base_prompt(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.conductor/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, ConductorError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, ConductorError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConductorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConductorError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| ConductorError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, ConductorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConductorError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| ConductorError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ConductorError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path (~/.conductor/config.toml)
    pub fn default_config_path() -> Result<PathBuf, ConductorError> {
        let home = dirs::home_dir().ok_or_else(|| {
            ConductorError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".conductor").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConductorError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(ConductorError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.server.port == 0 {
            return Err(ConductorError::Config(
                "server.port must be non-zero".to_string(),
            ));
        }

        if self.organization.name.trim().is_empty() {
            return Err(ConductorError::Config(
                "organization.name must not be empty".to_string(),
            ));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(ConductorError::Config(
                "llm.api_key_env must name an environment variable".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConductorError::Config(
                "llm.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let anthropic = &self.llm.anthropic;
        if anthropic.max_tokens == 0 {
            return Err(ConductorError::Config(
                "llm.anthropic.max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&anthropic.temperature) {
            return Err(ConductorError::Config(
                "llm.anthropic.temperature must be between 0.0 and 1.0".to_string(),
            ));
        }
        if anthropic.model.trim().is_empty() {
            return Err(ConductorError::Config(
                "llm.anthropic.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.api_key_env, "CLAUDE_API_KEY");
        assert_eq!(config.llm.anthropic.max_tokens, 1000);
        assert!(config.organization.base_prompt.contains("Balance workload"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
[organization]
name = "DevTeam"

[llm.anthropic]
model = "claude-3-haiku-20240307"
"#,
        )
        .unwrap();

        assert_eq!(config.organization.name, "DevTeam");
        assert_eq!(config.llm.anthropic.model, "claude-3-haiku-20240307");
        assert_eq!(config.llm.anthropic.base_url, "https://api.anthropic.com/v1");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = Config::from_toml_str("[core]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let err = Config::from_toml_str("[llm.anthropic]\ntemperature = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_zero_port_rejected() {
        assert!(Config::from_toml_str("[server]\nport = 0\n").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized = Config::from_toml_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.llm.anthropic.model, deserialized.llm.anthropic.model);
    }
}
