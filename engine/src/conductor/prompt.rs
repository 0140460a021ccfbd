//! Assignment prompt
//!
//! Serializes the relevant part of the organization into text for the model.
//! Tasks are labelled by their real ids so replies map straight back.

use crate::organization::Organization;
use chrono::{DateTime, Utc};
use sdk::task::{Task, TaskId};
use std::fmt::Write;

/// Fixed instruction appended to every assignment prompt
pub const ASSIGNMENT_INSTRUCTIONS: &str = "Assign each task listed under TASKS TO ASSIGN to exactly one worker.
Consider:
1. Worker skills against the task's required skills
2. Task priority, deadline and urgency score
3. Each worker's current workload, so work stays balanced
4. Whether the task suits a human or an AI worker
5. Dependencies between tasks
6. Each worker's past experience with similar tasks

Respond with ONLY a JSON array and no other text. Each element must look like:
{\"task_id\": <task id as shown above>, \"worker_name\": \"<exact worker name>\"}

Use only the task ids and worker names listed above. Leave a task out if no worker is suitable.";

/// Build the full prompt for the given candidate tasks
pub fn build_assignment_prompt(
    org: &Organization,
    base_prompt: &str,
    candidates: &[TaskId],
    now: DateTime<Utc>,
) -> String {
    let mut prompt = String::new();
    // Writing to a String cannot fail
    let base = base_prompt.trim();
    if !base.is_empty() {
        let _ = writeln!(prompt, "{}\n", base);
    }

    let _ = writeln!(prompt, "CURRENT ORGANIZATION STATE:");
    let _ = writeln!(prompt, "Organization: {}", org.name());
    let _ = writeln!(prompt, "Total Workers: {}\n", org.worker_count());

    let _ = writeln!(prompt, "WORKER PROFILES:\n");
    for worker in org.workers() {
        let titles = org.active_titles(worker);
        let _ = writeln!(
            prompt,
            "{}",
            worker.experience_summary(org.workload(worker.id), &titles)
        );
    }

    let tasks: Vec<&Task> = candidates
        .iter()
        .filter_map(|id| org.task(*id).ok())
        .collect();
    let _ = writeln!(prompt, "TASKS TO ASSIGN ({}):\n", tasks.len());
    for task in tasks {
        write_task(&mut prompt, org, task, now);
    }

    prompt.push_str(ASSIGNMENT_INSTRUCTIONS);
    prompt.push('\n');
    prompt
}

fn write_task(prompt: &mut String, org: &Organization, task: &Task, now: DateTime<Utc>) {
    let _ = writeln!(prompt, "Task {}: {}", task.id, task.title);
    let _ = writeln!(prompt, "Description: {}", task.description);
    let _ = writeln!(prompt, "Priority: {}", task.priority);
    let _ = writeln!(
        prompt,
        "Deadline: {}",
        task.deadline
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "None".to_string())
    );
    let _ = writeln!(prompt, "Urgency score: {:.1}", task.urgency_score(now));
    let _ = writeln!(
        prompt,
        "Estimated hours: {}",
        task.estimated_hours
            .map(|h| format!("{:.1}", h))
            .unwrap_or_else(|| "Unknown".to_string())
    );

    if task.required_skills.is_empty() {
        let _ = writeln!(prompt, "Required skills: Any");
    } else {
        let skills: Vec<String> = task
            .required_skills
            .iter()
            .map(|skill| {
                let holders: Vec<&str> = org
                    .workers_with_skill(skill)
                    .into_iter()
                    .map(|w| w.name.as_str())
                    .collect();
                if holders.is_empty() {
                    format!("{} (no worker has it)", skill)
                } else {
                    format!("{} (held by {})", skill, holders.join(", "))
                }
            })
            .collect();
        let _ = writeln!(prompt, "Required skills: {}", skills.join("; "));
    }

    let _ = writeln!(
        prompt,
        "Tags: {}",
        if task.tags.is_empty() {
            "None".to_string()
        } else {
            task.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    );

    if task.dependency_ids.is_empty() {
        let _ = writeln!(prompt, "Dependencies: None\n");
    } else {
        let deps: Vec<String> = task
            .dependency_ids
            .iter()
            .map(|dep| match org.task(*dep) {
                Ok(d) => format!("Task {} '{}' ({})", dep, d.title, d.status),
                Err(_) => format!("Task {}", dep),
            })
            .collect();
        let _ = writeln!(prompt, "Dependencies: {}\n", deps.join(", "));
    }
}
