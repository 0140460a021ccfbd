//! Conductor
//!
//! Orchestrates LLM-driven task assignment. One call to [`Conductor::assign`]:
//!
//! 1. classifies the requested tasks under the registry lock
//! 2. builds a prompt from the current state
//! 3. releases the lock and asks the model, retrying transport failures once
//! 4. parses the reply leniently
//! 5. re-locks and applies each proposed pair on its own, re-checking it
//!
//! A bad pair never undoes a good one. It is reported in
//! [`AssignmentOutcome::warnings`] and the task stays assignable.

pub mod parser;
pub mod prompt;

pub use parser::{parse_assignments, ParseError, ParsedAssignments, ProposedAssignment};

use crate::config::Config;
use crate::llm::{CompletionOptions, CompletionRequest, LLMError, LLMProvider};
use crate::organization::OrganizationHandle;
use crate::secrets::SecretManager;
use chrono::Utc;
use sdk::errors::Result;
use sdk::task::{NewTask, Task, TaskId, TaskStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Knobs for the assignment call
#[derive(Debug, Clone)]
pub struct ConductorSettings {
    /// Organization context prepended to every prompt
    pub base_prompt: String,
    pub system_prompt: String,
    pub options: CompletionOptions,

    /// Upper bound for one LLM attempt
    pub timeout: Duration,
}

impl ConductorSettings {
    pub fn from_config(config: &Config) -> Self {
        let anthropic = &config.llm.anthropic;
        Self {
            base_prompt: config.organization.base_prompt.clone(),
            system_prompt: anthropic.system_prompt.clone(),
            options: CompletionOptions {
                model: anthropic.model.clone(),
                max_tokens: anthropic.max_tokens,
                temperature: anthropic.temperature,
            },
            timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    pub fn with_base_prompt(mut self, base_prompt: impl Into<String>) -> Self {
        self.base_prompt = base_prompt.into();
        self
    }
}

/// What an assignment run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentOutcome {
    /// Applied pairs: task id to worker name
    pub assignments: BTreeMap<TaskId, String>,

    /// Candidates that received no valid proposal
    pub unresolved: Vec<TaskId>,

    /// Requested tasks skipped because a dependency is unfinished
    pub skipped_blocked: Vec<TaskId>,

    pub warnings: Vec<String>,
}

impl AssignmentOutcome {
    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

pub struct Conductor {
    organization: OrganizationHandle,
    llm: Arc<dyn LLMProvider>,
    settings: ConductorSettings,
}

impl Conductor {
    pub fn new(
        organization: OrganizationHandle,
        llm: Arc<dyn LLMProvider>,
        settings: ConductorSettings,
    ) -> Self {
        tracing::info!(
            "Conductor ready (provider: {}, base prompt: {} chars)",
            llm.name(),
            settings.base_prompt.len()
        );
        Self {
            organization,
            llm,
            settings,
        }
    }

    pub fn organization(&self) -> &OrganizationHandle {
        &self.organization
    }

    pub fn settings(&self) -> &ConductorSettings {
        &self.settings
    }

    /// Assign the given tasks through the model
    pub async fn assign(&self, task_ids: &[TaskId]) -> Result<AssignmentOutcome> {
        let mut outcome = AssignmentOutcome::default();

        let (candidates, prompt) = {
            let org = self.organization.lock().await;
            let mut seen = BTreeSet::new();
            let mut candidates = Vec::new();

            for &id in task_ids {
                if !seen.insert(id) {
                    continue;
                }
                match org.task(id) {
                    Err(_) => outcome.warn(format!("Task {} does not exist", id)),
                    Ok(task) if task.status == TaskStatus::Completed => {
                        outcome.warn(format!("Task {} is already completed", id))
                    }
                    Ok(task)
                        if task.status == TaskStatus::Blocked || !org.dependencies_met(task) =>
                    {
                        tracing::info!("Skipping blocked task {}", id);
                        outcome.skipped_blocked.push(id);
                    }
                    Ok(task) if task.is_assigned() => outcome.warn(format!(
                        "Task {} is already assigned to {}",
                        id,
                        task.assigned_worker.as_deref().unwrap_or_default()
                    )),
                    Ok(_) => candidates.push(id),
                }
            }

            if candidates.is_empty() {
                tracing::info!("No assignable tasks among {:?}", task_ids);
                return Ok(outcome);
            }

            let prompt = prompt::build_assignment_prompt(
                &org,
                &self.settings.base_prompt,
                &candidates,
                Utc::now(),
            );
            (candidates, prompt)
        };

        tracing::debug!(
            "Assignment prompt for {} tasks: {} chars",
            candidates.len(),
            prompt.len()
        );
        let request = CompletionRequest::new(prompt, self.settings.options.clone())
            .with_system(self.settings.system_prompt.clone());
        let reply = self.request_with_retry(&request).await?;

        let parsed = match parse_assignments(&reply) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    "Unusable assignment reply ({}): {}",
                    e,
                    SecretManager::scrub(&reply)
                );
                return Err(e.into());
            }
        };
        for warning in parsed.warnings {
            outcome.warn(warning);
        }

        let requested: BTreeSet<TaskId> = candidates.iter().copied().collect();
        let mut org = self.organization.lock().await;
        let now = Utc::now();

        for pair in parsed.assignments {
            let ProposedAssignment {
                task_id,
                worker_name,
            } = pair;

            if !requested.contains(&task_id) {
                if org.task(task_id).is_err() {
                    outcome.warn(format!(
                        "Ignoring proposal for task {} which does not exist",
                        task_id
                    ));
                } else {
                    outcome.warn(format!(
                        "Ignoring proposal for task {} which was not requested",
                        task_id
                    ));
                }
                continue;
            }
            if let Some(existing) = outcome.assignments.get(&task_id) {
                outcome.warn(format!(
                    "Task {} was proposed more than once; keeping {}",
                    task_id, existing
                ));
                continue;
            }

            match org.apply_assignment(task_id, &worker_name, now) {
                Ok(task) => {
                    let assigned = task.assigned_worker.clone().unwrap_or(worker_name);
                    outcome.assignments.insert(task_id, assigned);
                }
                Err(e) => outcome.warn(format!(
                    "Skipped task {} -> '{}': {}",
                    task_id, worker_name, e
                )),
            }
        }

        outcome.unresolved = candidates
            .into_iter()
            .filter(|id| !outcome.assignments.contains_key(id))
            .collect();

        tracing::info!(
            "Assignment run: {} assigned, {} unresolved, {} blocked, {} warnings",
            outcome.assignments.len(),
            outcome.unresolved.len(),
            outcome.skipped_blocked.len(),
            outcome.warnings.len()
        );
        Ok(outcome)
    }

    /// Assign every pending, unassigned task
    pub async fn assign_all(&self) -> Result<AssignmentOutcome> {
        let ids: Vec<TaskId> = {
            let org = self.organization.lock().await;
            org.unassigned_tasks(Utc::now())
                .into_iter()
                .map(|task| task.id)
                .collect()
        };
        self.assign(&ids).await
    }

    /// Register a task, then assign it on its own
    pub async fn create_and_assign(&self, new: NewTask) -> Result<(Task, AssignmentOutcome)> {
        let id = {
            let mut org = self.organization.lock().await;
            org.add_task(new, Utc::now())?.id
        };

        let outcome = self.assign(&[id]).await?;
        let task = self.organization.lock().await.task(id)?.clone();
        Ok((task, outcome))
    }

    async fn request_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, LLMError> {
        match self.attempt(request).await {
            Err(e) if e.is_transport() => {
                tracing::warn!("Assignment request failed ({}), retrying once", e);
                self.attempt(request).await
            }
            other => other,
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> std::result::Result<String, LLMError> {
        match tokio::time::timeout(self.settings.timeout, self.llm.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout),
        }
    }
}
