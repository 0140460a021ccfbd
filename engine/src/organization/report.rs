use super::Organization;
use chrono::{DateTime, Utc};
use sdk::task::{Task, TaskStatus};
use std::fmt::Write;

const EXPERIENCE_SNIPPET_CHARS: usize = 100;
const RECENT_COMPLETIONS: usize = 5;

impl Organization {
    /// Plain-text overview of workers and tasks
    pub fn state_report(&self, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "Organization: {}", self.name);

        let _ = writeln!(out, "\nWorkers:");
        if self.workers.is_empty() {
            let _ = writeln!(out, "  None");
        }
        for worker in self.workers.values() {
            let _ = writeln!(
                out,
                "  {} ({} active, {} completed): {}",
                worker.name,
                worker.assigned_tasks.len(),
                worker.completed_tasks.len(),
                self.active_titles(worker).join(", ")
            );
            let _ = writeln!(
                out,
                "    Current workload: {:.2} hours",
                self.workload(worker.id)
            );

            if worker.performance_metrics.tasks_completed > 0 {
                let _ = writeln!(
                    out,
                    "    Avg. completion time: {:.2} hours",
                    worker.performance_metrics.avg_completion_hours
                );
            }

            if let Some(first) = worker
                .experience_description
                .split("\n\n")
                .next()
                .filter(|p| !p.is_empty())
            {
                let mut snippet: String = first.chars().take(EXPERIENCE_SNIPPET_CHARS).collect();
                if first.chars().count() > EXPERIENCE_SNIPPET_CHARS {
                    snippet.push_str("...");
                }
                let _ = writeln!(out, "    Recent experience: {}", snippet);
            }
        }

        let _ = writeln!(out, "\nTasks by status:");
        for (label, status) in [
            ("Pending", TaskStatus::Pending),
            ("In Progress", TaskStatus::InProgress),
            ("Blocked", TaskStatus::Blocked),
        ] {
            let titles: Vec<&str> = self
                .tasks
                .values()
                .filter(|task| task.status == status)
                .map(|task| task.title.as_str())
                .collect();
            let _ = writeln!(out, "  {} ({}): {}", label, titles.len(), or_none(&titles));
        }

        let skip = self.completed_tasks.len().saturating_sub(RECENT_COMPLETIONS);
        let recent: Vec<&str> = self.completed_tasks[skip..]
            .iter()
            .map(|task| task.title.as_str())
            .collect();
        let _ = writeln!(
            out,
            "  Completed ({}): {}{}",
            self.completed_tasks.len(),
            or_none(&recent),
            if self.completed_tasks.len() > RECENT_COMPLETIONS {
                " ..."
            } else {
                ""
            }
        );

        let overdue: Vec<&Task> = self.tasks.values().filter(|t| t.is_overdue(now)).collect();
        if !overdue.is_empty() {
            let titles: Vec<&str> = overdue.iter().map(|t| t.title.as_str()).collect();
            let _ = writeln!(
                out,
                "\nWARNING: {} overdue tasks: {}",
                overdue.len(),
                titles.join(", ")
            );
        }

        out
    }
}

fn or_none(titles: &[&str]) -> String {
    if titles.is_empty() {
        "None".to_string()
    } else {
        titles.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sdk::task::NewTask;
    use sdk::worker::NewWorker;

    #[test]
    fn test_empty_report() {
        let report = Organization::new("Empty").state_report(Utc::now());
        assert!(report.starts_with("Organization: Empty"));
        assert!(report.contains("  Pending (0): None"));
        assert!(report.contains("  Completed (0): None"));
        assert!(!report.contains("WARNING"));
    }

    #[test]
    fn test_report_lists_workers_and_overdue_tasks() {
        let now = Utc::now();
        let mut org = Organization::new("DevTeam");
        org.add_worker(NewWorker::new("Alice", true, ["python"])).unwrap();
        let late = org
            .add_task(
                NewTask::new("Late report", "Overdue", 5).with_deadline(now - Duration::days(1)),
                now,
            )
            .unwrap()
            .id;
        org.add_task(NewTask::new("Backlog", "Later", 2), now).unwrap();
        org.apply_assignment(late, "Alice", now).unwrap();

        let report = org.state_report(now);
        assert!(report.contains("  Alice (1 active, 0 completed): Late report"));
        assert!(report.contains("Current workload: 1.00 hours"));
        assert!(report.contains("  In Progress (1): Late report"));
        assert!(report.contains("  Pending (1): Backlog"));
        assert!(report.contains("WARNING: 1 overdue tasks: Late report"));
    }

    #[test]
    fn test_report_shows_experience_snippet_after_completion() {
        let now = Utc::now();
        let mut org = Organization::new("DevTeam");
        org.add_worker(NewWorker::new("Alice", true, ["python"])).unwrap();
        let id = org
            .add_task(NewTask::new("Schema", "x".repeat(200), 5), now)
            .unwrap()
            .id;
        org.apply_assignment(id, "Alice", now - Duration::hours(1)).unwrap();
        org.complete_task(id, None, now).unwrap();

        let report = org.state_report(now);
        assert!(report.contains("Avg. completion time: 1.00 hours"));
        assert!(report.contains("Recent experience: Completed 'Schema'"));
        assert!(report.contains("..."));
        assert!(report.contains("  Completed (1): Schema"));
    }
}
