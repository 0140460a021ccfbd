//! Conductor SDK
//!
//! Shared entity types and the error taxonomy for Conductor components.
//! This crate is used by the engine and by anything talking to its API.

/// Error types and handling
pub mod errors;

/// Task entity and urgency scoring
pub mod task;

/// Worker entity
pub mod worker;

// Re-export commonly used types
pub use errors::{ConductorError, ConductorErrorExt, EntityKind};
pub use task::{NewTask, Task, TaskId, TaskNote, TaskStatus};
pub use worker::{CompletionRecord, NewWorker, PerformanceMetrics, Worker, WorkerId};
