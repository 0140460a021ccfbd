//! Organization registry
//!
//! The registry owns every worker and task and is the only place their
//! relationships change. Each public mutation leaves the registry consistent:
//!
//! - a task's `assigned_worker` always names a registered worker
//! - a worker's `assigned_tasks` lists exactly the active tasks assigned to it
//! - the skill index mirrors the workers' skill sets
//! - completed tasks are archived once and never return to the active map
//!
//! Shared access goes through [`OrganizationHandle`], a cloneable
//! `Arc<tokio::sync::Mutex<_>>` that the HTTP layer and the assignment
//! orchestrator both hold.

pub mod demo;
mod report;

use chrono::{DateTime, Duration, Utc};
use sdk::errors::{ConductorError, EntityKind, Result};
use sdk::task::{NewTask, Task, TaskId, TaskStatus, MAX_PRIORITY, MIN_PRIORITY};
use sdk::worker::{NewWorker, Worker, WorkerId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle to the shared registry
#[derive(Clone)]
pub struct OrganizationHandle {
    inner: Arc<Mutex<Organization>>,
}

impl OrganizationHandle {
    pub fn new(organization: Organization) -> Self {
        Self {
            inner: Arc::new(Mutex::new(organization)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Organization> {
        self.inner.lock().await
    }
}

/// Result of completing a task
#[derive(Debug, Clone)]
pub struct Completion {
    /// The archived task
    pub task: Task,

    /// The worker that held the task, after its history was updated
    pub worker: Option<Worker>,

    /// Dependants that moved from blocked to pending
    pub unblocked: Vec<TaskId>,
}

/// In-memory registry of workers and tasks
#[derive(Debug, Clone)]
pub struct Organization {
    name: String,
    workers: BTreeMap<WorkerId, Worker>,
    worker_names: BTreeMap<String, WorkerId>,
    tasks: BTreeMap<TaskId, Task>,
    completed_tasks: Vec<Task>,
    archive_index: BTreeMap<TaskId, usize>,
    skill_index: BTreeMap<String, BTreeSet<WorkerId>>,
    next_worker_id: u64,
    next_task_id: u64,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workers: BTreeMap::new(),
            worker_names: BTreeMap::new(),
            tasks: BTreeMap::new(),
            completed_tasks: Vec::new(),
            archive_index: BTreeMap::new(),
            skill_index: BTreeMap::new(),
            next_worker_id: 1,
            next_task_id: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clear all workers and tasks and restart id allocation
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.name));
        tracing::info!("Organization '{}' reset", self.name);
    }

    // ------------------------------------------------------------------
    // Workers
    // ------------------------------------------------------------------

    /// Register a worker.
    ///
    /// Names are unique ignoring case, so name lookups stay unambiguous.
    pub fn add_worker(&mut self, new: NewWorker) -> Result<&Worker> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ConductorError::validation("Worker name must not be empty"));
        }
        if self.resolve_worker_id(name).is_some() {
            return Err(ConductorError::validation(format!(
                "A worker named '{}' already exists",
                name
            )));
        }

        let id = WorkerId(self.next_worker_id);
        self.next_worker_id += 1;

        let skills = normalize_skills(new.skills);
        for skill in &skills {
            self.skill_index.entry(skill.clone()).or_default().insert(id);
        }

        let worker = Worker::new(
            id,
            name,
            new.is_human,
            skills,
            new.experience_description.trim(),
        );
        tracing::info!(
            "Added worker {} '{}' ({}) with skills: {}",
            id,
            worker.name,
            worker.kind(),
            join(&worker.skills)
        );

        self.worker_names.insert(worker.name.clone(), id);
        Ok(&*self.workers.entry(id).or_insert(worker))
    }

    pub fn worker(&self, id: WorkerId) -> Result<&Worker> {
        self.workers
            .get(&id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, id))
    }

    /// Look a worker up by name: exact match first, then case-insensitive
    pub fn worker_by_name(&self, name: &str) -> Result<&Worker> {
        self.resolve_worker_id(name)
            .and_then(|id| self.workers.get(&id))
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, name.trim()))
    }

    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Replace a worker's skills, keeping the skill index in step
    pub fn update_worker_skills(
        &mut self,
        id: WorkerId,
        skills: BTreeSet<String>,
    ) -> Result<&Worker> {
        let worker = self
            .workers
            .get_mut(&id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, id))?;

        let skills = normalize_skills(skills);
        for old in worker.skills.difference(&skills) {
            if let Some(holders) = self.skill_index.get_mut(old) {
                holders.remove(&id);
                if holders.is_empty() {
                    self.skill_index.remove(old);
                }
            }
        }
        for added in skills.difference(&worker.skills) {
            self.skill_index.entry(added.clone()).or_default().insert(id);
        }

        worker.skills = skills;
        tracing::info!("Updated skills of '{}': {}", worker.name, join(&worker.skills));
        Ok(&*worker)
    }

    /// Workers holding a skill, read from the skill index
    pub fn workers_with_skill(&self, skill: &str) -> Vec<&Worker> {
        self.skill_index
            .get(skill.trim())
            .into_iter()
            .flatten()
            .filter_map(|id| self.workers.get(id))
            .collect()
    }

    /// Hours of active work on a worker's plate
    pub fn workload(&self, id: WorkerId) -> f64 {
        self.workers
            .get(&id)
            .map(|worker| {
                worker
                    .assigned_tasks
                    .iter()
                    .filter_map(|task_id| self.tasks.get(task_id))
                    .map(Task::load_hours)
                    .sum::<f64>()
            })
            .unwrap_or(0.0)
    }

    /// Titles of a worker's active tasks, in assignment order
    pub fn active_titles(&self, worker: &Worker) -> Vec<&str> {
        worker
            .assigned_tasks
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|task| task.title.as_str())
            .collect()
    }

    fn resolve_worker_id(&self, name: &str) -> Option<WorkerId> {
        let name = name.trim();
        if let Some(id) = self.worker_names.get(name) {
            return Some(*id);
        }
        let lowered = name.to_lowercase();
        self.worker_names
            .iter()
            .find(|(candidate, _)| candidate.to_lowercase() == lowered)
            .map(|(_, id)| *id)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Register a task. It starts out blocked when a dependency is unfinished.
    pub fn add_task(&mut self, new: NewTask, now: DateTime<Utc>) -> Result<&Task> {
        let title = new.title.trim();
        let description = new.description.trim();
        if title.is_empty() {
            return Err(ConductorError::validation("Task title must not be empty"));
        }
        if description.is_empty() {
            return Err(ConductorError::validation(
                "Task description must not be empty",
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&new.priority) {
            return Err(ConductorError::validation(format!(
                "Priority must be between {} and {}, got {}",
                MIN_PRIORITY, MAX_PRIORITY, new.priority
            )));
        }
        if let Some(hours) = new.estimated_hours {
            if !(hours.is_finite() && hours > 0.0) {
                return Err(ConductorError::validation(
                    "estimated_hours must be a positive number",
                ));
            }
        }

        let deadline = match (new.deadline, new.deadline_days) {
            (Some(_), Some(_)) => {
                return Err(ConductorError::validation(
                    "Give either deadline or deadline_days, not both",
                ))
            }
            (Some(deadline), None) => Some(deadline),
            (None, Some(days)) if days < 0 => {
                return Err(ConductorError::validation(
                    "deadline_days must not be negative",
                ))
            }
            (None, Some(days)) => Some(
                Duration::try_days(days)
                    .and_then(|offset| now.checked_add_signed(offset))
                    .ok_or_else(|| ConductorError::validation("deadline_days is out of range"))?,
            ),
            (None, None) => None,
        };

        for dep in &new.dependency_ids {
            if !self.tasks.contains_key(dep) && !self.archive_index.contains_key(dep) {
                return Err(ConductorError::validation(format!(
                    "Dependency task {} does not exist",
                    dep
                )));
            }
        }

        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;

        let mut task = Task::new(id, title, description, new.priority);
        task.deadline = deadline;
        task.required_skills = normalize_skills(new.required_skills);
        task.tags = normalize_skills(new.tags);
        task.estimated_hours = new.estimated_hours;
        task.dependency_ids = new.dependency_ids;
        if !self.dependencies_met(&task) {
            task.status = TaskStatus::Blocked;
        }

        tracing::info!(
            "Added task {} '{}' (priority {}, {})",
            id,
            task.title,
            task.priority,
            task.status
        );
        Ok(&*self.tasks.entry(id).or_insert(task))
    }

    /// Look up an active or archived task
    pub fn task(&self, id: TaskId) -> Result<&Task> {
        self.tasks
            .get(&id)
            .or_else(|| self.archived(id))
            .ok_or_else(|| ConductorError::not_found(EntityKind::Task, id))
    }

    /// Active tasks in id order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Archive of completed tasks, in completion order
    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed_tasks
    }

    pub fn is_archived(&self, id: TaskId) -> bool {
        self.archive_index.contains_key(&id)
    }

    /// Whether every dependency of the task is archived
    pub fn dependencies_met(&self, task: &Task) -> bool {
        task.dependency_ids
            .iter()
            .all(|dep| self.archive_index.contains_key(dep))
    }

    /// Pending, unassigned tasks by descending urgency, ties by ascending id
    pub fn unassigned_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|task| {
                task.status == TaskStatus::Pending
                    && !task.is_assigned()
                    && self.dependencies_met(task)
            })
            .collect();

        tasks.sort_by(|a, b| {
            b.urgency_score(now)
                .total_cmp(&a.urgency_score(now))
                .then(a.id.cmp(&b.id))
        });
        tasks
    }

    /// Complete an assigned task, archive it and update its worker's history.
    ///
    /// Blocked and unassigned tasks are refused. Dependants whose last
    /// unfinished dependency was this task become pending.
    pub fn complete_task(
        &mut self,
        id: TaskId,
        feedback: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Completion> {
        if self.is_archived(id) {
            return Err(ConductorError::AlreadyCompleted(id));
        }
        let active = self
            .tasks
            .get(&id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Task, id))?;
        if active.status == TaskStatus::Blocked || !self.dependencies_met(active) {
            return Err(ConductorError::TaskBlocked(id));
        }
        if !active.is_assigned() {
            return Err(ConductorError::NotAssigned(id));
        }

        let Some(mut task) = self.tasks.remove(&id) else {
            return Err(ConductorError::not_found(EntityKind::Task, id));
        };

        let feedback = feedback
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        task.status = TaskStatus::Completed;
        task.completed_time = Some(now);
        if let Some(text) = &feedback {
            task.add_note(format!("Completion feedback: {}", text), now);
        }

        let worker = match task
            .assigned_worker
            .as_deref()
            .and_then(|name| self.worker_names.get(name).copied())
            .and_then(|worker_id| self.workers.get_mut(&worker_id))
        {
            Some(worker) => {
                worker.record_completion(&task, feedback, now);
                Some(worker.clone())
            }
            None => None,
        };

        self.archive_index.insert(id, self.completed_tasks.len());
        self.completed_tasks.push(task.clone());

        let mut unblocked = Vec::new();
        let ready: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Blocked && t.dependency_ids.contains(&id))
            .filter(|t| self.dependencies_met(t))
            .map(|t| t.id)
            .collect();
        for dependant in ready {
            if let Some(t) = self.tasks.get_mut(&dependant) {
                t.status = TaskStatus::Pending;
                unblocked.push(dependant);
            }
        }

        tracing::info!(
            "Completed task {} '{}'{}",
            id,
            task.title,
            task.assigned_worker
                .as_deref()
                .map(|name| format!(" by {}", name))
                .unwrap_or_default()
        );
        if !unblocked.is_empty() {
            tracing::info!("Unblocked tasks: {:?}", unblocked);
        }

        Ok(Completion {
            task,
            worker,
            unblocked,
        })
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    /// Assign an unassigned, unblocked task. Used for every proposal the
    /// orchestrator applies, so it re-checks everything.
    pub fn apply_assignment(
        &mut self,
        task_id: TaskId,
        worker_name: &str,
        now: DateTime<Utc>,
    ) -> Result<&Task> {
        let task = self.assignable_task(task_id)?;
        if let Some(current) = &task.assigned_worker {
            return Err(ConductorError::validation(format!(
                "Task {} is already assigned to {}",
                task_id, current
            )));
        }

        let worker_id = self
            .resolve_worker_id(worker_name)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, worker_name.trim()))?;
        self.attach(task_id, worker_id, now)
    }

    /// Assign a task to a named worker, moving it off its current worker if needed
    pub fn assign_manually(
        &mut self,
        task_id: TaskId,
        worker_name: &str,
        now: DateTime<Utc>,
    ) -> Result<&Task> {
        let current = self.assignable_task(task_id)?.assigned_worker.clone();
        let worker_id = self
            .resolve_worker_id(worker_name)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, worker_name.trim()))?;

        if let Some(current) = current {
            let current_id = self.worker_names.get(&current).copied();
            if current_id == Some(worker_id) {
                return self.task(task_id);
            }
            if let Some(previous) = current_id.and_then(|id| self.workers.get_mut(&id)) {
                previous.release_task(task_id);
                tracing::info!("Detached task {} from {}", task_id, previous.name);
            }
        }

        self.attach(task_id, worker_id, now)
    }

    /// Active task that may take a worker: not archived, not blocked
    fn assignable_task(&self, task_id: TaskId) -> Result<&Task> {
        if self.is_archived(task_id) {
            return Err(ConductorError::AlreadyCompleted(task_id));
        }
        let task = self
            .tasks
            .get(&task_id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Task, task_id))?;
        if task.status == TaskStatus::Blocked || !self.dependencies_met(task) {
            return Err(ConductorError::TaskBlocked(task_id));
        }
        Ok(task)
    }

    fn attach(&mut self, task_id: TaskId, worker_id: WorkerId, now: DateTime<Utc>) -> Result<&Task> {
        let worker = self
            .workers
            .get_mut(&worker_id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Worker, worker_id))?;
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| ConductorError::not_found(EntityKind::Task, task_id))?;

        worker.take_task(task_id);
        task.assigned_worker = Some(worker.name.clone());
        task.assignment_time = Some(now);
        task.status = TaskStatus::InProgress;

        tracing::info!("Assigned task {} '{}' to {}", task_id, task.title, worker.name);
        Ok(&*task)
    }

    fn archived(&self, id: TaskId) -> Option<&Task> {
        self.archive_index
            .get(&id)
            .and_then(|index| self.completed_tasks.get(*index))
    }
}

/// Trim entries and drop blanks
fn normalize_skills(skills: BTreeSet<String>) -> BTreeSet<String> {
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect()
}

fn join(items: &BTreeSet<String>) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org_with_alice() -> Organization {
        let mut org = Organization::new("Test Org");
        org.add_worker(NewWorker::new("Alice", true, ["python", "database"]))
            .unwrap();
        org
    }

    #[test]
    fn test_add_worker_assigns_sequential_ids() {
        let mut org = org_with_alice();
        let bob = org.add_worker(NewWorker::new("Bob", false, ["docs"])).unwrap();
        assert_eq!(bob.id, WorkerId(2));
        assert_eq!(org.worker(WorkerId(1)).unwrap().name, "Alice");
    }

    #[test]
    fn test_duplicate_worker_name_rejected() {
        let mut org = org_with_alice();
        let err = org
            .add_worker(NewWorker::new("alice", true, Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, ConductorError::Validation(_)));
        assert_eq!(org.worker_count(), 1);
    }

    #[test]
    fn test_blank_worker_name_rejected() {
        let mut org = Organization::new("Test Org");
        assert!(org
            .add_worker(NewWorker::new("   ", true, Vec::<String>::new()))
            .is_err());
    }

    #[test]
    fn test_worker_by_name_falls_back_to_case_insensitive() {
        let org = org_with_alice();
        assert_eq!(org.worker_by_name("Alice").unwrap().id, WorkerId(1));
        assert_eq!(org.worker_by_name("ALICE").unwrap().id, WorkerId(1));
        assert!(matches!(
            org.worker_by_name("Carol"),
            Err(ConductorError::NotFound { .. })
        ));
    }

    #[test]
    fn test_skill_index_follows_updates() {
        let mut org = org_with_alice();
        assert_eq!(org.workers_with_skill("python").len(), 1);

        let skills = ["rust".to_string(), " database ".to_string()].into_iter().collect();
        org.update_worker_skills(WorkerId(1), skills).unwrap();

        assert!(org.workers_with_skill("python").is_empty());
        assert_eq!(org.workers_with_skill("rust")[0].name, "Alice");
        assert_eq!(org.workers_with_skill("database").len(), 1);
    }

    #[test]
    fn test_add_task_validation() {
        let mut org = Organization::new("Test Org");
        let now = Utc::now();

        assert!(org.add_task(NewTask::new("", "desc", 5), now).is_err());
        assert!(org.add_task(NewTask::new("title", " ", 5), now).is_err());
        assert!(org.add_task(NewTask::new("title", "desc", 0), now).is_err());
        assert!(org.add_task(NewTask::new("title", "desc", 11), now).is_err());
        assert!(org
            .add_task(NewTask::new("title", "desc", 5).with_estimated_hours(0.0), now)
            .is_err());
        assert!(org
            .add_task(
                NewTask::new("title", "desc", 5)
                    .with_deadline(now)
                    .with_deadline_days(2),
                now
            )
            .is_err());
        assert!(org
            .add_task(
                NewTask::new("title", "desc", 5).with_dependencies([TaskId(42)]),
                now
            )
            .is_err());
        assert_eq!(org.tasks().count(), 0);
    }

    #[test]
    fn test_deadline_days_converted() {
        let mut org = Organization::new("Test Org");
        let now = Utc::now();
        let task = org
            .add_task(NewTask::new("title", "desc", 5).with_deadline_days(3), now)
            .unwrap();
        assert_eq!(task.deadline, Some(now + Duration::days(3)));
    }

    #[test]
    fn test_task_with_open_dependency_starts_blocked() {
        let mut org = Organization::new("Test Org");
        let now = Utc::now();
        let first = org.add_task(NewTask::new("T1", "first", 5), now).unwrap().id;
        let second = org
            .add_task(NewTask::new("T2", "second", 5).with_dependencies([first]), now)
            .unwrap();
        assert_eq!(second.status, TaskStatus::Blocked);
    }

    #[test]
    fn test_unassigned_tasks_order_and_filter() {
        let mut org = Organization::new("Test Org");
        let now = Utc::now();
        let low = org.add_task(NewTask::new("Low", "low", 3), now).unwrap().id;
        let urgent = org
            .add_task(
                NewTask::new("Urgent", "urgent", 3).with_deadline(now - Duration::hours(1)),
                now,
            )
            .unwrap()
            .id;
        let tie = org.add_task(NewTask::new("Tie", "tie", 3), now).unwrap().id;
        org.add_task(NewTask::new("Blocked", "blocked", 10).with_dependencies([low]), now)
            .unwrap();

        let ids: Vec<TaskId> = org.unassigned_tasks(now).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![urgent, low, tie]);
    }

    #[test]
    fn test_complete_task_archives_once() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let id = org
            .add_task(NewTask::new("Schema", "Design it", 9).with_estimated_hours(6.0), now)
            .unwrap()
            .id;
        org.apply_assignment(id, "Alice", now - Duration::hours(2)).unwrap();

        let done = org.complete_task(id, Some(" solid work ".into()), now).unwrap();
        assert_eq!(done.task.status, TaskStatus::Completed);
        assert_eq!(done.task.assigned_worker.as_deref(), Some("Alice"));
        assert_eq!(done.task.notes[0].content, "Completion feedback: solid work");

        let alice = done.worker.unwrap();
        assert!(alice.assigned_tasks.is_empty());
        assert_eq!(alice.completed_tasks[0].feedback.as_deref(), Some("solid work"));
        assert_eq!(alice.performance_metrics.tasks_completed, 1);

        assert!(matches!(
            org.complete_task(id, None, now),
            Err(ConductorError::AlreadyCompleted(t)) if t == id
        ));
        assert_eq!(org.completed_tasks().len(), 1);
        assert_eq!(org.task(id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_complete_unassigned_task_rejected() {
        let mut org = Organization::new("Test Org");
        let now = Utc::now();
        let id = org.add_task(NewTask::new("Docs", "Write docs", 4), now).unwrap().id;

        assert!(matches!(
            org.complete_task(id, None, now),
            Err(ConductorError::NotAssigned(t)) if t == id
        ));
        assert_eq!(org.task(id).unwrap().status, TaskStatus::Pending);
        assert!(org.completed_tasks().is_empty());
    }

    #[test]
    fn test_complete_blocked_task_rejected() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let a = org.add_task(NewTask::new("A", "a", 5), now).unwrap().id;
        let b = org
            .add_task(NewTask::new("B", "b", 5).with_dependencies([a]), now)
            .unwrap()
            .id;

        assert!(matches!(
            org.complete_task(b, None, now),
            Err(ConductorError::TaskBlocked(t)) if t == b
        ));
        assert!(!org.is_archived(b));
        assert_eq!(org.task(b).unwrap().status, TaskStatus::Blocked);
        assert_eq!(org.task(a).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_complete_missing_task_is_not_found() {
        let mut org = Organization::new("Test Org");
        assert!(matches!(
            org.complete_task(TaskId(9), None, Utc::now()),
            Err(ConductorError::NotFound { .. })
        ));
    }

    #[test]
    fn test_completion_unblocks_dependants() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let a = org.add_task(NewTask::new("A", "a", 5), now).unwrap().id;
        let b = org.add_task(NewTask::new("B", "b", 5), now).unwrap().id;
        let c = org
            .add_task(NewTask::new("C", "c", 5).with_dependencies([a, b]), now)
            .unwrap()
            .id;

        org.apply_assignment(a, "Alice", now).unwrap();
        org.apply_assignment(b, "Alice", now).unwrap();

        let first = org.complete_task(a, None, now).unwrap();
        assert!(first.unblocked.is_empty());
        assert_eq!(org.task(c).unwrap().status, TaskStatus::Blocked);

        let second = org.complete_task(b, None, now).unwrap();
        assert_eq!(second.unblocked, vec![c]);
        assert_eq!(org.unassigned_tasks(now)[0].id, c);
    }

    #[test]
    fn test_apply_assignment_rechecks() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let a = org.add_task(NewTask::new("A", "a", 5), now).unwrap().id;
        let b = org
            .add_task(NewTask::new("B", "b", 5).with_dependencies([a]), now)
            .unwrap()
            .id;

        let task = org.apply_assignment(a, "alice", now).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assigned_worker.as_deref(), Some("Alice"));

        assert!(matches!(
            org.apply_assignment(a, "Alice", now),
            Err(ConductorError::Validation(_))
        ));
        assert!(matches!(
            org.apply_assignment(b, "Alice", now),
            Err(ConductorError::TaskBlocked(_))
        ));
        assert!(matches!(
            org.apply_assignment(TaskId(99), "Alice", now),
            Err(ConductorError::NotFound { .. })
        ));
        assert_eq!(org.worker(WorkerId(1)).unwrap().assigned_tasks, vec![a]);
    }

    #[test]
    fn test_assign_manually_reassigns() {
        let mut org = org_with_alice();
        org.add_worker(NewWorker::new("Bob", false, ["docs"])).unwrap();
        let now = Utc::now();
        let id = org
            .add_task(NewTask::new("Docs", "docs", 5).with_estimated_hours(3.0), now)
            .unwrap()
            .id;

        org.assign_manually(id, "Alice", now).unwrap();
        assert_eq!(org.workload(WorkerId(1)), 3.0);

        // Same worker again is a no-op
        org.assign_manually(id, "Alice", now).unwrap();
        assert_eq!(org.worker(WorkerId(1)).unwrap().assigned_tasks, vec![id]);

        let task = org.assign_manually(id, "Bob", now).unwrap();
        assert_eq!(task.assigned_worker.as_deref(), Some("Bob"));
        assert!(org.worker(WorkerId(1)).unwrap().assigned_tasks.is_empty());
        assert_eq!(org.worker(WorkerId(2)).unwrap().assigned_tasks, vec![id]);
        assert_eq!(org.workload(WorkerId(1)), 0.0);
    }

    #[test]
    fn test_assign_manually_rejects_completed_and_unknown_worker() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let id = org.add_task(NewTask::new("A", "a", 5), now).unwrap().id;

        assert!(matches!(
            org.assign_manually(id, "Nobody", now),
            Err(ConductorError::NotFound { kind: EntityKind::Worker, .. })
        ));

        org.assign_manually(id, "Alice", now).unwrap();
        org.complete_task(id, None, now).unwrap();
        assert!(matches!(
            org.assign_manually(id, "Alice", now),
            Err(ConductorError::AlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_workload_defaults_to_one_hour_per_task() {
        let mut org = org_with_alice();
        let now = Utc::now();
        let a = org.add_task(NewTask::new("A", "a", 5), now).unwrap().id;
        let b = org
            .add_task(NewTask::new("B", "b", 5).with_estimated_hours(2.5), now)
            .unwrap()
            .id;
        org.apply_assignment(a, "Alice", now).unwrap();
        org.apply_assignment(b, "Alice", now).unwrap();

        assert_eq!(org.workload(WorkerId(1)), 3.5);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut org = org_with_alice();
        org.add_task(NewTask::new("A", "a", 5), Utc::now()).unwrap();
        org.reset();

        assert_eq!(org.name(), "Test Org");
        assert_eq!(org.worker_count(), 0);
        assert_eq!(org.tasks().count(), 0);
        assert!(org.workers_with_skill("python").is_empty());
        let worker = org
            .add_worker(NewWorker::new("Zed", true, Vec::<String>::new()))
            .unwrap();
        assert_eq!(worker.id, WorkerId(1));
    }

    #[tokio::test]
    async fn test_handle_shares_state() {
        let handle = OrganizationHandle::new(Organization::new("Shared"));
        let clone = handle.clone();
        clone
            .lock()
            .await
            .add_worker(NewWorker::new("Alice", true, ["python"]))
            .unwrap();
        assert_eq!(handle.lock().await.worker_count(), 1);
    }
}
