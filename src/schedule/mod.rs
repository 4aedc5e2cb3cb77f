//! Schedule recalculation engine.
//!
//! Pipeline: build the dependency graph, validate it is a DAG, propagate
//! dates in topological order, derive statuses, write everything back as one
//! atomic unit. Any validation failure aborts before a single date or status
//! is computed or persisted.

pub mod dates;
pub mod graph;
pub mod status;
pub mod topo;

pub use dates::CompletedDatePolicy;
pub use graph::TaskGraph;
pub use topo::topological_order;

use crate::error::{ScheduleError, ScheduleResult};
use crate::store::ProjectStore;
use crate::types::{ProjectId, Task};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

/// Recalculation Orchestrator.
///
/// The single entry point the API layer invokes. Serializes on the store's
/// per-project lock, held from task load through write-back; the store's own
/// mutations take the same lock, so an edit can never interleave with an
/// in-flight recalculation. Guards release on every exit path, including
/// errors.
pub struct Scheduler {
    policy: CompletedDatePolicy,
}

impl Scheduler {
    pub fn new(policy: CompletedDatePolicy) -> Self {
        Self { policy }
    }

    /// Recalculate a project's schedule against the current date, waiting for
    /// the project lock if another writer holds it.
    pub fn recalculate_project_schedule<S: ProjectStore>(
        &self,
        store: &S,
        project_id: ProjectId,
    ) -> ScheduleResult<Vec<Task>> {
        self.recalculate_at(store, project_id, Utc::now().date_naive())
    }

    /// Non-blocking variant: fails with
    /// [`ScheduleError::ConcurrentModification`] when another recalculation
    /// already holds the project lock, instead of queueing behind it.
    pub fn try_recalculate_project_schedule<S: ProjectStore>(
        &self,
        store: &S,
        project_id: ProjectId,
    ) -> ScheduleResult<Vec<Task>> {
        self.try_recalculate_at(store, project_id, Utc::now().date_naive())
    }

    /// Recalculate with an explicit reference date.
    ///
    /// With no intervening task changes this is idempotent: a second run
    /// yields byte-identical derived fields.
    pub fn recalculate_at<S: ProjectStore>(
        &self,
        store: &S,
        project_id: ProjectId,
        today: NaiveDate,
    ) -> ScheduleResult<Vec<Task>> {
        let lock = store.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.run(store, project_id, today)
    }

    /// Non-blocking counterpart of [`Scheduler::recalculate_at`].
    pub fn try_recalculate_at<S: ProjectStore>(
        &self,
        store: &S,
        project_id: ProjectId,
        today: NaiveDate,
    ) -> ScheduleResult<Vec<Task>> {
        let lock = store.project_lock(project_id);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Err(ScheduleError::ConcurrentModification(project_id)),
        };
        self.run(store, project_id, today)
    }

    fn run<S: ProjectStore>(
        &self,
        store: &S,
        project_id: ProjectId,
        today: NaiveDate,
    ) -> ScheduleResult<Vec<Task>> {
        let project = store.load_project(project_id)?;
        let mut tasks = store.load_project_tasks(project_id)?;
        debug!(project_id, task_count = tasks.len(), "recalculating schedule");

        // Validation first: both errors abort before any mutation exists.
        let graph = TaskGraph::build(&tasks)?;
        let order = topological_order(&graph)?;

        let baseline = project.start_date.unwrap_or(today);
        dates::propagate(&mut tasks, &graph, &order, baseline, self.policy)?;
        status::derive_all(&mut tasks, &graph, &order, today);

        let tasks = store.save_tasks(project_id, &tasks)?;
        info!(
            project_id,
            task_count = tasks.len(),
            %baseline,
            "schedule recalculated"
        );
        Ok(tasks)
    }
}
