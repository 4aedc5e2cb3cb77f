//! Task CRUD within a project, predecessor/assignee junction management, and
//! the atomic write-back used by schedule recalculation.

use super::{Database, date_to_sql, now_ms, parse_date};
use crate::error::ScheduleError;
use crate::types::{Project, ProjectId, Task, TaskId, TaskInput, TaskStatus, UserId};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// What to do when deleting a task that other tasks depend on.
///
/// `Reject` (the default) fails the deletion naming the dependents; `Cascade`
/// strips the edge from every dependent in the same transaction. Either way a
/// dangling predecessor reference can never be left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionPolicy {
    #[default]
    Reject,
    Cascade,
}

/// Upper bound on a single task's duration, in days (roughly a century).
/// Keeps chained date arithmetic well inside the supported calendar range.
pub const MAX_DURATION_DAYS: f64 = 36_500.0;

fn validate_task_input(input: &TaskInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(anyhow!(ScheduleError::invalid_field(
            "name",
            "task name must not be empty"
        )));
    }
    if !(input.duration > 0.0 && input.duration.is_finite()) {
        return Err(anyhow!(ScheduleError::invalid_field(
            "duration",
            format!("duration must be a positive number, got {}", input.duration)
        )));
    }
    if input.duration > MAX_DURATION_DAYS {
        return Err(anyhow!(ScheduleError::invalid_field(
            "duration",
            format!("duration must be at most {MAX_DURATION_DAYS} days")
        )));
    }
    Ok(())
}

/// Normalize a reference list: ascending, deduplicated.
fn normalize_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// =============================================================================
// Junction table helpers
// =============================================================================

/// Sync a task's predecessors to the junction table. Replaces all existing rows.
fn sync_predecessors(conn: &Connection, task_id: TaskId, predecessor_ids: &[TaskId]) -> Result<()> {
    conn.execute(
        "DELETE FROM task_predecessors WHERE task_id = ?1",
        params![task_id],
    )?;
    for pred_id in predecessor_ids {
        conn.execute(
            "INSERT INTO task_predecessors (task_id, predecessor_id) VALUES (?1, ?2)",
            params![task_id, pred_id],
        )?;
    }
    Ok(())
}

/// Sync a task's assignees to the junction table. Replaces all existing rows.
fn sync_assignees(conn: &Connection, task_id: TaskId, assignee_ids: &[UserId]) -> Result<()> {
    conn.execute(
        "DELETE FROM task_assignees WHERE task_id = ?1",
        params![task_id],
    )?;
    for user_id in assignee_ids {
        conn.execute(
            "INSERT INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
            params![task_id, user_id],
        )?;
    }
    Ok(())
}

fn get_predecessor_ids(conn: &Connection, task_id: TaskId) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        "SELECT predecessor_id FROM task_predecessors WHERE task_id = ?1 ORDER BY predecessor_id",
    )?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

fn get_assignee_ids(conn: &Connection, task_id: TaskId) -> Result<Vec<UserId>> {
    let mut stmt =
        conn.prepare("SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id")?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Tasks whose predecessor set contains `task_id`, ascending.
fn get_dependent_ids(conn: &Connection, task_id: TaskId) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        "SELECT task_id FROM task_predecessors WHERE predecessor_id = ?1 ORDER BY task_id",
    )?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: Option<String> = row.get("status")?;
    let start_date: Option<String> = row.get("start_date")?;
    let due_date: Option<String> = row.get("due_date")?;
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        duration: row.get("duration")?,
        predecessor_ids: Vec::new(),
        assignee_ids: Vec::new(),
        done: row.get("done")?,
        status: status.as_deref().and_then(TaskStatus::from_str),
        start_date: parse_date(start_date),
        due_date: parse_date(due_date),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_task(conn: &Connection, project_id: ProjectId, task_id: TaskId) -> Result<Task> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1 AND project_id = ?2",
            params![task_id, project_id],
            parse_task_row,
        )
        .optional()?;
    let mut task = task.ok_or_else(|| anyhow!(ScheduleError::TaskNotFound(task_id)))?;
    task.predecessor_ids = get_predecessor_ids(conn, task.id)?;
    task.assignee_ids = get_assignee_ids(conn, task.id)?;
    Ok(task)
}

fn require_project(conn: &Connection, project_id: ProjectId) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM projects WHERE id = ?1",
            params![project_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(anyhow!(ScheduleError::ProjectNotFound(project_id)));
    }
    Ok(())
}

/// Check that every predecessor id exists in the project and none is the task
/// itself.
fn check_predecessors(
    conn: &Connection,
    project_id: ProjectId,
    task_id: TaskId,
    predecessor_ids: &[TaskId],
) -> Result<()> {
    for &pred_id in predecessor_ids {
        if pred_id == task_id {
            return Err(anyhow!(ScheduleError::CyclicDependency { task_id }));
        }
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM tasks WHERE id = ?1 AND project_id = ?2",
                params![pred_id, project_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(anyhow!(ScheduleError::UnknownPredecessor {
                task_id,
                predecessor_id: pred_id,
            }));
        }
    }
    Ok(())
}

/// Fast pre-check used at task update time: would pointing `task_id` at
/// `predecessor_ids` close a cycle? Walks dependents of `task_id` breadth-first;
/// reaching a requested predecessor means the edge would loop back.
/// Recalculation's DFS remains the authoritative validator.
fn would_create_cycle(
    conn: &Connection,
    task_id: TaskId,
    predecessor_ids: &[TaskId],
) -> Result<Option<TaskId>> {
    let targets: HashSet<TaskId> = predecessor_ids.iter().copied().collect();
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    queue.push_back(task_id);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        for dependent in get_dependent_ids(conn, current)? {
            if targets.contains(&dependent) {
                return Ok(Some(dependent));
            }
            if !visited.contains(&dependent) {
                queue.push_back(dependent);
            }
        }
    }

    Ok(None)
}

impl Database {
    /// Create a task. Derived fields start unset regardless of what the caller
    /// sends; they exist only after the project's first recalculation.
    pub fn create_task(&self, project_id: ProjectId, input: &TaskInput) -> Result<Task> {
        validate_task_input(input)?;
        let predecessor_ids = normalize_ids(&input.predecessor_ids);
        let assignee_ids = normalize_ids(&input.assignee_ids);
        let now = now_ms();

        let lock = self.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            require_project(&tx, project_id)?;

            tx.execute(
                "INSERT INTO tasks (project_id, name, duration, done, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![project_id, input.name, input.duration, input.done, now],
            )?;
            let task_id = tx.last_insert_rowid();

            // A brand-new task cannot be anyone's predecessor yet, so existence
            // and self-reference checks are sufficient here.
            check_predecessors(&tx, project_id, task_id, &predecessor_ids)?;
            sync_predecessors(&tx, task_id, &predecessor_ids)?;
            sync_assignees(&tx, task_id, &assignee_ids)?;

            let task = load_task(&tx, project_id, task_id)?;
            tx.commit()?;
            Ok(task)
        })
    }

    pub fn get_task(&self, project_id: ProjectId, task_id: TaskId) -> Result<Task> {
        self.with_conn(|conn| load_task(conn, project_id, task_id))
    }

    /// All tasks of a project, ascending by id, with junctions loaded.
    pub fn list_project_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            require_project(conn, project_id)?;
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE project_id = ?1 ORDER BY id")?;
            let mut tasks = stmt
                .query_map(params![project_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for task in &mut tasks {
                task.predecessor_ids = get_predecessor_ids(conn, task.id)?;
                task.assignee_ids = get_assignee_ids(conn, task.id)?;
            }
            Ok(tasks)
        })
    }

    /// Update a task's editable fields. Derived fields are left untouched; an
    /// edge change that would close a cycle is rejected before anything is
    /// written.
    pub fn update_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        input: &TaskInput,
    ) -> Result<Task> {
        validate_task_input(input)?;
        let predecessor_ids = normalize_ids(&input.predecessor_ids);
        let assignee_ids = normalize_ids(&input.assignee_ids);
        let now = now_ms();

        let lock = self.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            require_project(&tx, project_id)?;

            let changed = tx.execute(
                "UPDATE tasks SET name = ?1, duration = ?2, done = ?3, updated_at = ?4
                 WHERE id = ?5 AND project_id = ?6",
                params![input.name, input.duration, input.done, now, task_id, project_id],
            )?;
            if changed == 0 {
                return Err(anyhow!(ScheduleError::TaskNotFound(task_id)));
            }

            check_predecessors(&tx, project_id, task_id, &predecessor_ids)?;
            if let Some(on_cycle) = would_create_cycle(&tx, task_id, &predecessor_ids)? {
                return Err(anyhow!(ScheduleError::CyclicDependency { task_id: on_cycle }));
            }
            sync_predecessors(&tx, task_id, &predecessor_ids)?;
            sync_assignees(&tx, task_id, &assignee_ids)?;

            let task = load_task(&tx, project_id, task_id)?;
            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a task, applying the configured dependents policy.
    pub fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        policy: DeletionPolicy,
    ) -> Result<()> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            require_project(&tx, project_id)?;

            let dependent_ids = get_dependent_ids(&tx, task_id)?;
            match policy {
                DeletionPolicy::Reject if !dependent_ids.is_empty() => {
                    return Err(anyhow!(ScheduleError::DependentTasksExist {
                        task_id,
                        dependent_ids,
                    }));
                }
                _ => {
                    tx.execute(
                        "DELETE FROM task_predecessors WHERE predecessor_id = ?1",
                        params![task_id],
                    )?;
                }
            }

            let deleted = tx.execute(
                "DELETE FROM tasks WHERE id = ?1 AND project_id = ?2",
                params![task_id, project_id],
            )?;
            if deleted == 0 {
                return Err(anyhow!(ScheduleError::TaskNotFound(task_id)));
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Persist recalculated derived fields for a full task set and refresh the
    /// owning project's derived end date, all in one transaction. Only derived
    /// columns are written; editable fields are never touched here. Returns the
    /// task set as persisted, with the refreshed `updated_at`.
    ///
    /// Does not take the project lock itself: the scheduler already holds it
    /// across its load/compute/save sequence.
    pub fn save_recalculated(&self, project_id: ProjectId, tasks: &[Task]) -> Result<Vec<Task>> {
        let now = now_ms();
        let project_end = tasks.iter().filter_map(|t| t.due_date).max();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            require_project(&tx, project_id)?;

            let mut persisted = tasks.to_vec();
            for task in &mut persisted {
                let changed = tx.execute(
                    "UPDATE tasks SET status = ?1, start_date = ?2, due_date = ?3, updated_at = ?4
                     WHERE id = ?5 AND project_id = ?6",
                    params![
                        task.status.map(|s| s.as_str()),
                        date_to_sql(task.start_date),
                        date_to_sql(task.due_date),
                        now,
                        task.id,
                        project_id
                    ],
                )?;
                if changed == 0 {
                    return Err(anyhow!(ScheduleError::TaskNotFound(task.id)));
                }
                task.updated_at = now;
            }

            tx.execute(
                "UPDATE projects SET end_date = ?1, updated_at = ?2 WHERE id = ?3",
                params![date_to_sql(project_end), now, project_id],
            )?;

            tx.commit()?;
            Ok(persisted)
        })
    }

    /// Load a project or fail with a domain error (used by the scheduler).
    pub fn require_project_record(&self, project_id: ProjectId) -> Result<Project> {
        self.get_project(project_id)?
            .ok_or_else(|| anyhow!(ScheduleError::ProjectNotFound(project_id)))
    }
}
