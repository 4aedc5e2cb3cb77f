//! The entity-store seam consumed by the scheduling engine.

use crate::db::Database;
use crate::error::ScheduleResult;
use crate::types::{Project, ProjectId, Task};
use std::sync::{Arc, Mutex};

/// Storage collaborator for schedule recalculation.
///
/// The engine only ever reads a project's task set and writes the whole set
/// back; `save_tasks` must apply the full set atomically so a failed
/// recalculation is never partially observable. Implementations are expected
/// to refresh the project's derived end date in the same write.
pub trait ProjectStore {
    /// Load the project record (baseline date and existence check).
    fn load_project(&self, project_id: ProjectId) -> ScheduleResult<Project>;

    /// Load all tasks of the project with predecessor references resolved.
    fn load_project_tasks(&self, project_id: ProjectId) -> ScheduleResult<Vec<Task>>;

    /// Persist recalculated derived fields for the full task set, atomically.
    /// Returns the task set as it was persisted, store bookkeeping included.
    fn save_tasks(&self, project_id: ProjectId, tasks: &[Task]) -> ScheduleResult<Vec<Task>>;

    /// Exclusive lock handle covering every writer of the project's task set.
    /// The orchestrator holds it from load through write-back; the store's own
    /// mutations must take the same lock so edits cannot interleave with an
    /// in-flight recalculation.
    fn project_lock(&self, project_id: ProjectId) -> Arc<Mutex<()>>;
}

impl ProjectStore for Database {
    fn load_project(&self, project_id: ProjectId) -> ScheduleResult<Project> {
        Ok(self.require_project_record(project_id)?)
    }

    fn load_project_tasks(&self, project_id: ProjectId) -> ScheduleResult<Vec<Task>> {
        Ok(self.list_project_tasks(project_id)?)
    }

    fn save_tasks(&self, project_id: ProjectId, tasks: &[Task]) -> ScheduleResult<Vec<Task>> {
        Ok(self.save_recalculated(project_id, tasks)?)
    }

    fn project_lock(&self, project_id: ProjectId) -> Arc<Mutex<()>> {
        Database::project_lock(self, project_id)
    }
}
