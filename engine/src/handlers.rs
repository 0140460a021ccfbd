//! Command handlers for CLI operations
//!
//! - serve: run the HTTP API until Ctrl-C
//! - check: verify the LLM credential, optionally with a live ping
//! - state: print the organization state report

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{self, types::OrganizationView, AppState};
use crate::conductor::{Conductor, ConductorSettings};
use crate::config::Config;
use crate::llm::{AnthropicProvider, CompletionOptions, CompletionRequest, LLMProvider};
use crate::organization::{demo, Organization, OrganizationHandle};
use crate::secrets::{SecretManager, SecretString};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Start the API server
pub async fn handle_serve(
    config: &Config,
    host: Option<String>,
    port: Option<u16>,
    load_test_data: bool,
) -> Result<()> {
    let api_key = read_api_key(config)?;
    let provider = build_provider(config, api_key)?;

    let organization = build_organization(config, load_test_data)?;
    tracing::info!(
        "Organization '{}' loaded ({} workers, {} tasks)",
        organization.name(),
        organization.worker_count(),
        organization.tasks().count()
    );

    let mut settings = ConductorSettings::from_config(config);
    if load_test_data {
        settings = settings.with_base_prompt(demo::BASE_PROMPT);
    }

    let conductor = Arc::new(Conductor::new(
        OrganizationHandle::new(organization),
        Arc::new(provider),
        settings,
    ));

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))?;

    println!(
        "Conductor v{} ({} - {}) serving on http://{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        addr
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl-C");
    };

    api::serve(AppState::new(conductor), addr, shutdown)
        .await
        .context("API server failed")?;

    println!("Conductor stopped.");
    Ok(())
}

/// Verify the credential and optionally reach the provider
pub async fn handle_check(config: &Config, ping: bool, format: OutputFormat) -> Result<()> {
    let env_var = config.llm.api_key_env.clone();
    let api_key = read_api_key(config)?;
    let masked = api_key.masked();

    let reply = if ping {
        let provider = build_provider(config, api_key)?;
        let anthropic = &config.llm.anthropic;
        let request = CompletionRequest::new(
            "Reply with the single word: pong",
            CompletionOptions {
                model: anthropic.model.clone(),
                max_tokens: 16,
                temperature: 0.0,
            },
        );
        let reply = provider
            .complete(&request)
            .await
            .with_context(|| format!("Ping to {} failed", provider.name()))?;
        Some(reply.trim().to_string())
    } else {
        None
    };

    match format {
        OutputFormat::Text => {
            println!("{}: {}", env_var, masked);
            if let Some(reply) = &reply {
                println!("Model {} replied: {}", config.llm.anthropic.model, reply);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "env_var": env_var,
                "api_key": masked,
                "model": config.llm.anthropic.model,
                "ping": reply,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the organization state
pub async fn handle_state(config: &Config, load_test_data: bool, format: OutputFormat) -> Result<()> {
    let organization = build_organization(config, load_test_data)?;
    let now = Utc::now();

    match format {
        OutputFormat::Text => println!("{}", organization.state_report(now)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&OrganizationView::new(&organization, now))?
        ),
    }

    Ok(())
}

/// Empty organization named from config, or the seeded demo organization
pub fn build_organization(config: &Config, load_test_data: bool) -> Result<Organization> {
    if !load_test_data {
        return Ok(Organization::new(config.organization.name.clone()));
    }

    let mut organization = Organization::new(demo::ORGANIZATION_NAME);
    demo::seed(&mut organization, Utc::now()).context("Failed to seed demo organization")?;
    Ok(organization)
}

fn read_api_key(config: &Config) -> Result<SecretString> {
    SecretManager::new(config.llm.api_key_env.clone())
        .get_secret()
        .with_context(|| {
            format!(
                "Set {} in the environment or a .env file",
                config.llm.api_key_env
            )
        })
}

fn build_provider(config: &Config, api_key: SecretString) -> Result<AnthropicProvider> {
    AnthropicProvider::with_timeout(
        config.llm.anthropic.clone(),
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )
    .context("Failed to build Anthropic client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_organization_empty_uses_config_name() {
        let mut config = Config::default();
        config.organization.name = "Platform".to_string();

        let org = build_organization(&config, false).unwrap();
        assert_eq!(org.name(), "Platform");
        assert_eq!(org.worker_count(), 0);
        assert_eq!(org.tasks().count(), 0);
    }

    #[test]
    fn test_build_organization_with_demo_data() {
        let org = build_organization(&Config::default(), true).unwrap();
        assert_eq!(org.name(), demo::ORGANIZATION_NAME);
        assert_eq!(org.worker_count(), 5);
        assert_eq!(org.tasks().count(), 7);
    }

    #[tokio::test]
    async fn test_check_fails_without_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "CONDUCTOR_HANDLERS_TEST_UNSET_KEY".to_string();

        let err = handle_check(&config, false, OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("CONDUCTOR_HANDLERS_TEST_UNSET_KEY"));
    }
}
