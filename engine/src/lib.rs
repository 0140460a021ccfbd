//! Conductor Engine Library
//!
//! Organization registry, LLM-driven assignment and the HTTP API. Used by
//! the `conductor` binary and the integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Worker and task registry
pub mod organization;

/// Conductor orchestration module
pub mod conductor;

/// HTTP API
pub mod api;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
