//! Core domain types for planboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Project identifier (store-assigned, immutable).
pub type ProjectId = i64;

/// Task identifier (store-assigned, immutable, unique within a project).
pub type TaskId = i64;

/// User identifier. Users are managed by an external service; task assignees
/// are opaque references that pass through the core untouched.
pub type UserId = i64;

/// Derived task status.
///
/// Never authoritative on its own: recalculation overwrites whatever is stored,
/// so a task's status is always consistent with its `done` flag and the
/// completion state of its predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "BLOCKED" => Some(TaskStatus::Blocked),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A task in a project.
///
/// `status`, `start_date` and `due_date` are derived fields: they are `None`
/// until the owning project has run its first recalculation, and afterwards
/// they are owned by the scheduling engine, never by API writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    /// Duration in work days. Always > 0; fractional values round up to whole
    /// calendar days during date propagation.
    pub duration: f64,
    /// Ids of same-project tasks this task depends on, ascending, deduplicated.
    pub predecessor_ids: Vec<TaskId>,
    /// Assigned users (pass-through, not interpreted by the engine).
    pub assignee_ids: Vec<UserId>,
    /// Manual completion flag set by a user.
    pub done: bool,
    pub status: Option<TaskStatus>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Whether this task has ever been scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some() && self.due_date.is_some()
    }
}

/// A project owning an ordered collection of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    /// Baseline date for tasks with no predecessors. If unset, recalculation
    /// uses the current date as the baseline.
    pub start_date: Option<NaiveDate>,
    /// Derived: maximum due date over all tasks after recalculation.
    pub end_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payload for creating or updating a project.
///
/// `end_date` is intentionally absent: it is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Payload for creating or updating a task.
///
/// `status`, `start_date` and `due_date` are intentionally absent: clients
/// cannot write derived fields (unknown JSON fields are ignored on the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub duration: f64,
    #[serde(default)]
    pub predecessor_ids: Vec<TaskId>,
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
    #[serde(default)]
    pub done: bool,
}
