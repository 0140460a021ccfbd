//! Worker entity
//!
//! A worker is a human or AI actor identified by id and unique name. It only
//! references tasks by id; the registry keeps both sides consistent.

use crate::task::{Task, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique worker identifier, assigned by the registry starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request payload for creating a worker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorker {
    pub name: String,

    #[serde(default)]
    pub is_human: bool,

    #[serde(default)]
    pub skills: BTreeSet<String>,

    #[serde(default)]
    pub experience_description: String,
}

impl NewWorker {
    pub fn new<I, S>(name: impl Into<String>, is_human: bool, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            is_human,
            skills: skills.into_iter().map(Into::into).collect(),
            experience_description: String::new(),
        }
    }

    pub fn with_experience(mut self, experience: impl Into<String>) -> Self {
        self.experience_description = experience.into();
        self
    }
}

/// One completed task in a worker's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub task_id: TaskId,
    pub feedback: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Running completion statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub tasks_completed: u32,
    pub avg_completion_hours: f64,
}

impl PerformanceMetrics {
    /// Fold one more completion time into the running average
    pub fn record(&mut self, hours: f64) {
        let total = self.avg_completion_hours * f64::from(self.tasks_completed);
        self.tasks_completed += 1;
        self.avg_completion_hours = (total + hours) / f64::from(self.tasks_completed);
    }
}

/// Worker record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub is_human: bool,
    pub skills: BTreeSet<String>,

    /// Active tasks, in assignment order
    pub assigned_tasks: Vec<TaskId>,
    pub completed_tasks: Vec<CompletionRecord>,
    pub experience_description: String,
    pub performance_metrics: PerformanceMetrics,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        name: impl Into<String>,
        is_human: bool,
        skills: BTreeSet<String>,
        experience_description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            is_human,
            skills,
            assigned_tasks: Vec::new(),
            completed_tasks: Vec::new(),
            experience_description: experience_description.into(),
            performance_metrics: PerformanceMetrics::default(),
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_human {
            "Human"
        } else {
            "AI"
        }
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    /// Append a task to the active list (idempotent)
    pub fn take_task(&mut self, task_id: TaskId) {
        if !self.assigned_tasks.contains(&task_id) {
            self.assigned_tasks.push(task_id);
        }
    }

    /// Drop a task from the active list without recording a completion
    pub fn release_task(&mut self, task_id: TaskId) -> bool {
        let before = self.assigned_tasks.len();
        self.assigned_tasks.retain(|id| *id != task_id);
        before != self.assigned_tasks.len()
    }

    /// Move a completed task into history, updating metrics and experience.
    ///
    /// `task` must already carry its `completed_time`.
    pub fn record_completion(&mut self, task: &Task, feedback: Option<String>, now: DateTime<Utc>) {
        self.release_task(task.id);
        self.completed_tasks.push(CompletionRecord {
            task_id: task.id,
            feedback,
            completed_at: now,
        });

        let hours = task.completion_hours();
        if let Some(hours) = hours {
            self.performance_metrics.record(hours);
        }

        let entry = experience_entry(task, hours);
        if self.experience_description.is_empty() {
            self.experience_description = entry;
        } else {
            self.experience_description.push_str("\n\n");
            self.experience_description.push_str(&entry);
        }
    }

    /// Profile block fed into the assignment prompt
    pub fn experience_summary(&self, workload: f64, active_titles: &[&str]) -> String {
        let skills = if self.skills.is_empty() {
            "None".to_string()
        } else {
            self.skills.iter().cloned().collect::<Vec<_>>().join(", ")
        };

        let mut summary = format!("Worker: {} ({})\n", self.name, self.kind());
        summary.push_str(&format!("Skills: {}\n", skills));
        summary.push_str(&format!("Tasks completed: {}\n", self.completed_tasks.len()));
        summary.push_str(&format!(
            "Current workload: {:.1} hours (based on {} active tasks)\n",
            workload,
            self.assigned_tasks.len()
        ));

        if self.performance_metrics.tasks_completed > 0 {
            summary.push_str(&format!(
                "Average completion time: {:.1} hours\n",
                self.performance_metrics.avg_completion_hours
            ));
        }

        if !active_titles.is_empty() {
            summary.push_str(&format!("Currently working on: {}\n", active_titles.join(", ")));
        }

        if !self.experience_description.is_empty() {
            summary.push_str(&format!("\nExperience:\n{}\n", self.experience_description));
        }

        summary
    }
}

/// Narrative paragraph describing one completed task
fn experience_entry(task: &Task, hours: Option<f64>) -> String {
    let mut entry = format!("Completed '{}' ", task.title);

    if !task.required_skills.is_empty() {
        let skills: Vec<&str> = task.required_skills.iter().map(String::as_str).collect();
        entry.push_str(&format!("using skills in {} ", skills.join(", ")));
    }

    match (hours, task.estimated_hours) {
        (Some(actual), Some(estimate)) if actual < estimate => entry.push_str(&format!(
            "faster than expected ({:.1} vs {:.1} hours). ",
            actual, estimate
        )),
        (Some(actual), Some(estimate)) if actual > estimate => entry.push_str(&format!(
            "taking longer than expected ({:.1} vs {:.1} hours). ",
            actual, estimate
        )),
        (Some(actual), Some(_)) => {
            entry.push_str(&format!("in the expected time ({:.1} hours). ", actual))
        }
        (Some(actual), None) => entry.push_str(&format!("in {:.1} hours. ", actual)),
        (None, _) => {
            entry.truncate(entry.trim_end().len());
            entry.push_str(". ");
        }
    }

    entry.push_str(&format!("Task involved: {}", task.description));
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn worker() -> Worker {
        Worker::new(
            WorkerId(1),
            "Alice",
            true,
            ["python".to_string()].into_iter().collect(),
            "",
        )
    }

    fn finished_task(hours_taken: i64, estimate: Option<f64>) -> Task {
        let now = Utc::now();
        let mut task = Task::new(TaskId(1), "Schema", "Design the schema", 9);
        task.required_skills.insert("database".to_string());
        task.estimated_hours = estimate;
        task.assignment_time = Some(now - Duration::hours(hours_taken));
        task.completed_time = Some(now);
        task
    }

    #[test]
    fn test_untimed_entry_has_no_space_before_period() {
        let mut task = Task::new(TaskId(2), "Docs", "Write the guide", 5);
        assert_eq!(
            experience_entry(&task, None),
            "Completed 'Docs'. Task involved: Write the guide"
        );

        task.required_skills.insert("writing".to_string());
        assert_eq!(
            experience_entry(&task, None),
            "Completed 'Docs' using skills in writing. Task involved: Write the guide"
        );
    }

    #[test]
    fn test_take_task_is_idempotent() {
        let mut w = worker();
        w.take_task(TaskId(1));
        w.take_task(TaskId(1));
        w.take_task(TaskId(2));
        assert_eq!(w.assigned_tasks, vec![TaskId(1), TaskId(2)]);
        assert!(w.release_task(TaskId(1)));
        assert!(!w.release_task(TaskId(1)));
    }

    #[test]
    fn test_record_completion_updates_history() {
        let mut w = worker();
        w.take_task(TaskId(1));
        let task = finished_task(2, Some(6.0));

        w.record_completion(&task, Some("great".to_string()), Utc::now());

        assert!(w.assigned_tasks.is_empty());
        assert_eq!(w.completed_tasks.len(), 1);
        assert_eq!(w.completed_tasks[0].feedback.as_deref(), Some("great"));
        assert_eq!(w.performance_metrics.tasks_completed, 1);
        assert!((w.performance_metrics.avg_completion_hours - 2.0).abs() < 1e-6);
        assert!(w
            .experience_description
            .starts_with("Completed 'Schema' using skills in database faster than expected"));
        assert!(w.experience_description.ends_with("Task involved: Design the schema"));
    }

    #[test]
    fn test_experience_paragraphs_are_separated() {
        let mut w = worker();
        w.experience_description = "Ten years of Python.".to_string();
        w.record_completion(&finished_task(8, Some(6.0)), None, Utc::now());

        let paragraphs: Vec<&str> = w.experience_description.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].contains("taking longer than expected"));
    }

    #[test]
    fn test_metrics_running_average() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record(2.0);
        metrics.record(4.0);
        assert_eq!(metrics.tasks_completed, 2);
        assert!((metrics.avg_completion_hours - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_experience_summary() {
        let w = worker();
        let summary = w.experience_summary(6.0, &["Schema"]);
        assert!(summary.contains("Worker: Alice (Human)"));
        assert!(summary.contains("Skills: python"));
        assert!(summary.contains("Current workload: 6.0 hours"));
        assert!(summary.contains("Currently working on: Schema"));
        assert!(!summary.contains("Experience:"));
    }
}
