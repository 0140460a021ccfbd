//! Task entity
//!
//! A task is a unit of work with a priority, an optional deadline, required
//! skills and dependency constraints. Tasks are created by the organization
//! registry, which owns their lifecycle:
//!
//! ```text
//! pending ──(dependency incomplete)──> blocked ──(dependencies done)──> pending
//! pending ──(assignment)──> in_progress ──(completion)──> completed
//! ```
//!
//! Completed tasks are archived, never deleted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lowest accepted priority
pub const MIN_PRIORITY: u8 = 1;

/// Highest accepted priority
pub const MAX_PRIORITY: u8 = 10;

/// Unique task identifier, assigned by the registry starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped note attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNote {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Request payload for creating a task
///
/// Exactly one of `deadline` and `deadline_days` may be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,

    /// Priority 1-10, higher is more urgent
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Absolute deadline
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Deadline expressed as days from now
    #[serde(default)]
    pub deadline_days: Option<i64>,

    #[serde(default)]
    pub required_skills: BTreeSet<String>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub estimated_hours: Option<f64>,

    /// Ids of tasks that must be completed first
    #[serde(default)]
    pub dependency_ids: BTreeSet<TaskId>,
}

fn default_priority() -> u8 {
    5
}

impl NewTask {
    /// Create a request with the given title, description and priority
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: u8) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            ..Default::default()
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.dependency_ids = ids.into_iter().collect();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_deadline_days(mut self, days: i64) -> Self {
        self.deadline_days = Some(days);
        self
    }

    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub deadline: Option<DateTime<Utc>>,
    pub required_skills: BTreeSet<String>,
    pub estimated_hours: Option<f64>,
    pub tags: BTreeSet<String>,
    pub dependency_ids: BTreeSet<TaskId>,
    pub status: TaskStatus,

    /// Name of the worker the task is assigned to
    pub assigned_worker: Option<String>,
    pub assignment_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
    pub notes: Vec<TaskNote>,
}

impl Task {
    /// Build a pending, unassigned task. The registry validates the fields
    /// and decides whether it starts out blocked.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            priority,
            deadline: None,
            required_skills: BTreeSet::new(),
            estimated_hours: None,
            tags: BTreeSet::new(),
            dependency_ids: BTreeSet::new(),
            status: TaskStatus::Pending,
            assigned_worker: None,
            assignment_time: None,
            completed_time: None,
            notes: Vec::new(),
        }
    }

    /// Urgency at `now`; higher is more urgent
    pub fn urgency_score(&self, now: DateTime<Utc>) -> f64 {
        urgency_score(self.priority, self.deadline, now)
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_worker.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }

    /// Hours of work this task contributes to its worker's load
    pub fn load_hours(&self) -> f64 {
        self.estimated_hours.unwrap_or(1.0)
    }

    pub fn add_note(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.notes.push(TaskNote {
            content: content.into(),
            timestamp: now,
        });
    }

    /// Hours between assignment and completion, when both are known
    pub fn completion_hours(&self) -> Option<f64> {
        let assigned = self.assignment_time?;
        let completed = self.completed_time?;
        Some((completed - assigned).num_milliseconds() as f64 / 3_600_000.0)
    }
}

/// Urgency score: the priority plus a boost that grows as the deadline nears.
///
/// | time left      | boost |
/// |----------------|-------|
/// | overdue        | +10   |
/// | under 24 hours | +5    |
/// | under 72 hours | +3    |
/// | under a week   | +1    |
pub fn urgency_score(priority: u8, deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let mut score = f64::from(priority);

    if let Some(deadline) = deadline {
        let time_left = deadline - now;
        score += if time_left <= Duration::zero() {
            10.0
        } else if time_left < Duration::hours(24) {
            5.0
        } else if time_left < Duration::hours(72) {
            3.0
        } else if time_left < Duration::hours(168) {
            1.0
        } else {
            0.0
        };
    }

    score
}
