//! Structured error types shared by the scheduling engine and the API layer.

use crate::types::{ProjectId, TaskId};
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling across the HTTP boundary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidFieldValue,
    UnknownPredecessor,

    // Not found errors
    ProjectNotFound,
    TaskNotFound,

    // Conflict errors
    DependencyCycle,
    DependentTasksExist,
    ConcurrentModification,

    // Internal errors
    PersistenceError,
}

/// Errors produced by task/project operations and schedule recalculation.
///
/// Recalculation never partially applies: any variant raised during graph
/// validation aborts before a single date or status is computed or persisted.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A task references a predecessor id absent from its project's task set.
    /// Dangling references are a data inconsistency and are never dropped
    /// silently.
    #[error("task {task_id} references unknown predecessor {predecessor_id}")]
    UnknownPredecessor {
        task_id: TaskId,
        predecessor_id: TaskId,
    },

    /// The predecessor relation contains a cycle. `task_id` is one task on the
    /// cycle, for diagnostics.
    #[error("dependency cycle detected through task {task_id}")]
    CyclicDependency { task_id: TaskId },

    /// Date propagation ran past the supported calendar range. Write-time
    /// validation caps durations, so this only fires on corrupted stored data.
    #[error("computed dates for task {task_id} exceed the supported calendar range")]
    DateOverflow { task_id: TaskId },

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Deleting the task would orphan predecessor references on its
    /// dependents. Raised under the default `reject` deletion policy.
    #[error("task {task_id} has dependent tasks: {}", fmt_ids(dependent_ids))]
    DependentTasksExist {
        task_id: TaskId,
        dependent_ids: Vec<TaskId>,
    },

    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Another writer holds the project lock. Raised by the non-blocking
    /// recalculation entry point; the blocking one waits instead.
    #[error("concurrent recalculation in progress for project {0}")]
    ConcurrentModification(ProjectId),

    /// Store read/write failure, propagated unchanged.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

fn fmt_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ScheduleError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// The wire-level code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ScheduleError::UnknownPredecessor { .. } => ErrorCode::UnknownPredecessor,
            ScheduleError::CyclicDependency { .. } => ErrorCode::DependencyCycle,
            ScheduleError::DateOverflow { .. } => ErrorCode::InvalidFieldValue,
            ScheduleError::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            ScheduleError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            ScheduleError::DependentTasksExist { .. } => ErrorCode::DependentTasksExist,
            ScheduleError::InvalidField { .. } => ErrorCode::InvalidFieldValue,
            ScheduleError::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            ScheduleError::Persistence(_) => ErrorCode::PersistenceError,
        }
    }
}

// Store plumbing uses anyhow; domain errors raised inside it are recovered by
// downcast, anything else is a persistence failure.
impl From<anyhow::Error> for ScheduleError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ScheduleError>() {
            Ok(domain) => domain,
            Err(err) => ScheduleError::Persistence(err),
        }
    }
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
