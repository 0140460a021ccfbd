//! Error types and handling
//!
//! This module provides the error taxonomy shared by the registry, the
//! assignment orchestrator and the HTTP layer. All errors implement the
//! `ConductorErrorExt` trait which provides user-friendly hints and indicates
//! whether errors are recoverable.
//!
//! # Error Categories
//!
//! - **Validation**: bad input shape or values, correctable by the caller
//! - **Not found**: a referenced worker or task id does not exist
//! - **State conflicts**: completing an archived, blocked or unassigned task,
//!   assigning a blocked one
//! - **Assignment service**: the LLM call failed or its reply was unusable
//! - **Configuration**: invalid config file or missing API credential
//!
//! # Security
//!
//! Messages built from upstream LLM responses are scrubbed by the engine
//! before they reach these variants, so no API keys end up in error bodies.

use crate::task::TaskId;
use std::fmt;
use thiserror::Error;

/// Trait for Conductor error extensions
pub trait ConductorErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is a static string and never echoes caller input.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or corrected by the caller.
    /// Non-recoverable errors need an operator to fix the deployment.
    fn is_recoverable(&self) -> bool;
}

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Worker,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Worker => write!(f, "Worker"),
            EntityKind::Task => write!(f, "Task"),
        }
    }
}

/// Main error type
///
/// # Examples
///
/// ```
/// use conductor_sdk::errors::{ConductorError, ConductorErrorExt, EntityKind};
///
/// let error = ConductorError::not_found(EntityKind::Task, 7);
/// assert_eq!(error.to_string(), "Task not found: 7");
/// assert!(error.is_recoverable());
///
/// let fatal = ConductorError::Config("CLAUDE_API_KEY is not set".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum ConductorError {
    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    // State errors
    #[error("Task {0} is already completed")]
    AlreadyCompleted(TaskId),

    #[error("Task {0} is blocked by unfinished dependencies")]
    TaskBlocked(TaskId),

    #[error("Task {0} has no assigned worker")]
    NotAssigned(TaskId),

    // LLM errors
    #[error("Assignment service error: {0}")]
    AssignmentService(String),

    #[error("Could not parse assignment reply: {0}")]
    Parse(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConductorError {
    /// Build a `NotFound` error for any displayable id (numeric id or name)
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Build a `Validation` error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from the external assignment service
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::AssignmentService(_) | Self::Parse(_))
    }
}

impl ConductorErrorExt for ConductorError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Validation(_) => "Check the request fields and try again",
            Self::NotFound {
                kind: EntityKind::Worker,
                ..
            } => "No worker with that id or name exists",
            Self::NotFound {
                kind: EntityKind::Task,
                ..
            } => "No task with that id exists",
            Self::AlreadyCompleted(_) => "This task has already been completed and archived",
            Self::TaskBlocked(_) => "Complete the task's dependencies first",
            Self::NotAssigned(_) => "Assign the task to a worker before completing it",
            Self::AssignmentService(_) => {
                "The assignment service is unavailable. Check your API key and network"
            }
            Self::Parse(_) => "The assignment service returned an unusable reply. Try again",
            Self::Config(_) => "Check your config.toml file and environment variables",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, ConductorError>;
