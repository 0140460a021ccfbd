//! Request/Response Types for the HTTP API
//!
//! Entity views flatten the stored record and add the derived fields
//! (`urgency_score` for tasks, `workload` for workers).

use crate::conductor::AssignmentOutcome;
use crate::organization::Organization;
use chrono::{DateTime, Utc};
use sdk::task::{Task, TaskId};
use sdk::worker::Worker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Task plus its urgency at response time
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub urgency_score: f64,
}

impl TaskView {
    pub fn new(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            urgency_score: task.urgency_score(now),
            task: task.clone(),
        }
    }
}

/// Worker plus its current workload in hours
#[derive(Debug, Clone, Serialize)]
pub struct WorkerView {
    #[serde(flatten)]
    pub worker: Worker,
    pub workload: f64,
}

impl WorkerView {
    pub fn new(worker: &Worker, org: &Organization) -> Self {
        Self {
            workload: org.workload(worker.id),
            worker: worker.clone(),
        }
    }
}

/// GET /organization
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationView {
    pub name: String,
    pub workers: Vec<WorkerView>,
    pub tasks: Vec<TaskView>,
    pub completed_tasks: Vec<TaskView>,
}

impl OrganizationView {
    pub fn new(org: &Organization, now: DateTime<Utc>) -> Self {
        Self {
            name: org.name().to_string(),
            workers: org.workers().map(|w| WorkerView::new(w, org)).collect(),
            tasks: org.tasks().map(|t| TaskView::new(t, now)).collect(),
            completed_tasks: org
                .completed_tasks()
                .iter()
                .map(|t| TaskView::new(t, now))
                .collect(),
        }
    }
}

/// GET /organization-state
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationStateResponse {
    pub organization_state: String,
}

/// PUT /workers/:id/skills
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSkillsRequest {
    pub skills: BTreeSet<String>,
}

/// POST /tasks/:id/assign. Without a worker the task goes to the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub worker_name: Option<String>,
}

/// POST /tasks/:id/complete
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Result of assigning a single task, manually or through the model
#[derive(Debug, Clone, Serialize)]
pub struct AssignResponse {
    pub task: TaskView,
    pub worker: Option<WorkerView>,

    /// Present when the model made the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AssignmentOutcome>,
}

/// POST /tasks/assign
#[derive(Debug, Clone, Serialize)]
pub struct AssignAllResponse {
    pub outcome: AssignmentOutcome,
    pub tasks: Vec<TaskView>,
}

/// POST /tasks/:id/complete
#[derive(Debug, Clone, Serialize)]
pub struct CompleteResponse {
    pub task: TaskView,
    pub worker: Option<WorkerView>,
    pub unblocked: Vec<TaskId>,
}
