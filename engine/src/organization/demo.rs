//! Demo organization
//!
//! A small software team building a CRM, used by `--load-test-data` to give
//! a fresh server something to assign.

use super::Organization;
use chrono::{DateTime, Utc};
use sdk::errors::Result;
use sdk::task::NewTask;
use sdk::worker::NewWorker;

/// Organization name used for the demo data
pub const ORGANIZATION_NAME: &str = "DevTeam";

/// Team context handed to the assignment prompt when the demo data is loaded
pub const BASE_PROMPT: &str = "You are assisting a software development team working on a web application.
The application is a customer relationship management (CRM) system with:
- User authentication
- Customer data management
- Sales pipeline tracking
- Reporting and analytics

Team Goals:
1. Complete core features for an MVP within 2 weeks
2. Maintain high code quality and test coverage
3. Create clear documentation for APIs and user interfaces
4. Follow best security practices for data protection

Task assignments should consider skill matching, deadlines, dependencies between tasks,
and the right balance between human and AI contributions.";

/// Add five workers and seven tasks, all unassigned
pub fn seed(org: &mut Organization, now: DateTime<Utc>) -> Result<()> {
    for worker in [
        NewWorker::new(
            "Alex",
            true,
            ["frontend_development", "javascript", "react", "UI_design"],
        ),
        NewWorker::new(
            "Emma",
            true,
            ["backend_development", "python", "django", "database"],
        ),
        NewWorker::new(
            "Michael",
            true,
            ["devops", "kubernetes", "docker", "infrastructure"],
        ),
        NewWorker::new(
            "Sophia",
            true,
            ["product_management", "UX_design", "user_research"],
        ),
        NewWorker::new(
            "AI Assistant",
            false,
            ["documentation", "research", "testing", "code_review"],
        ),
    ] {
        org.add_worker(worker)?;
    }

    let db_schema = org
        .add_task(
            NewTask::new(
                "Database Schema Design",
                "Design the database schema for user accounts, customers, and sales data",
                9,
            )
            .with_deadline_days(2)
            .with_skills(["database", "backend_development"])
            .with_estimated_hours(6.0)
            .with_tags(["database", "architecture"]),
            now,
        )?
        .id;

    org.add_task(
        NewTask::new(
            "User Authentication System",
            "Implement secure login, registration, and password reset",
            8,
        )
        .with_deadline_days(3)
        .with_skills(["backend_development", "security", "python"])
        .with_estimated_hours(8.0)
        .with_tags(["security", "users"])
        .with_dependencies([db_schema]),
        now,
    )?;

    org.add_task(
        NewTask::new(
            "Customer API Endpoints",
            "Create REST API endpoints for customer data CRUD operations",
            7,
        )
        .with_deadline_days(4)
        .with_skills(["backend_development", "python", "API_design"])
        .with_estimated_hours(10.0)
        .with_tags(["API", "customers"])
        .with_dependencies([db_schema]),
        now,
    )?;

    let ui_design = org
        .add_task(
            NewTask::new(
                "UI Design for Dashboard",
                "Create wireframes and design mockups for the main dashboard",
                7,
            )
            .with_deadline_days(3)
            .with_skills(["UI_design", "UX_design"])
            .with_estimated_hours(8.0)
            .with_tags(["design", "UI"]),
            now,
        )?
        .id;

    org.add_task(
        NewTask::new(
            "Implement Dashboard UI",
            "Implement the React components for the main dashboard",
            7,
        )
        .with_deadline_days(5)
        .with_skills(["frontend_development", "react", "javascript"])
        .with_estimated_hours(12.0)
        .with_tags(["frontend", "UI"])
        .with_dependencies([ui_design]),
        now,
    )?;

    org.add_task(
        NewTask::new(
            "Setup CI/CD Pipeline",
            "Configure CI/CD pipeline for automated testing and deployment",
            6,
        )
        .with_deadline_days(6)
        .with_skills(["devops", "kubernetes", "docker"])
        .with_estimated_hours(10.0)
        .with_tags(["infrastructure", "automation"]),
        now,
    )?;

    org.add_task(
        NewTask::new(
            "API Documentation",
            "Generate comprehensive API documentation for the backend endpoints",
            5,
        )
        .with_deadline_days(7)
        .with_skills(["documentation", "API_design"])
        .with_estimated_hours(6.0)
        .with_tags(["documentation", "API"]),
        now,
    )?;

    tracing::info!(
        "Loaded demo data: {} workers, {} tasks",
        org.worker_count(),
        org.tasks().count()
    );
    Ok(())
}
