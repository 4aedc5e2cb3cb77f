//! Project CRUD operations.

use super::{Database, date_to_sql, now_ms, parse_date};
use crate::error::ScheduleError;
use crate::types::{Project, ProjectId, ProjectInput};
use anyhow::{Result, anyhow};
use rusqlite::{OptionalExtension, Row, params};

pub fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    let start_date: Option<String> = row.get("start_date")?;
    let end_date: Option<String> = row.get("end_date")?;
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        start_date: parse_date(start_date),
        end_date: parse_date(end_date),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn validate_project_input(input: &ProjectInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(anyhow!(ScheduleError::invalid_field(
            "name",
            "project name must not be empty"
        )));
    }
    Ok(())
}

impl Database {
    /// Create a project. `end_date` starts unset; it is derived by recalculation.
    pub fn create_project(&self, input: &ProjectInput) -> Result<Project> {
        validate_project_input(input)?;
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, description, start_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    input.name,
                    input.description,
                    date_to_sql(input.start_date),
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Project {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                start_date: input.start_date,
                end_date: None,
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn get_project(&self, project_id: ProjectId) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let project = conn
                .query_row(
                    "SELECT * FROM projects WHERE id = ?1",
                    params![project_id],
                    parse_project_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM projects ORDER BY id")?;
            let projects = stmt
                .query_map([], parse_project_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(projects)
        })
    }

    /// Update a project's editable fields. The derived `end_date` is untouched;
    /// it only changes through recalculation. Takes the project lock so a
    /// baseline change cannot interleave with an in-flight recalculation.
    pub fn update_project(&self, project_id: ProjectId, input: &ProjectInput) -> Result<Project> {
        validate_project_input(input)?;
        let now = now_ms();

        let lock = self.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET name = ?1, description = ?2, start_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    input.name,
                    input.description,
                    date_to_sql(input.start_date),
                    now,
                    project_id
                ],
            )?;
            if changed == 0 {
                return Err(anyhow!(ScheduleError::ProjectNotFound(project_id)));
            }
            let project = conn.query_row(
                "SELECT * FROM projects WHERE id = ?1",
                params![project_id],
                parse_project_row,
            )?;
            Ok(project)
        })
    }

    /// Delete a project and, via foreign keys, all of its tasks and edges.
    pub fn delete_project(&self, project_id: ProjectId) -> Result<()> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().unwrap();
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            if deleted == 0 {
                return Err(anyhow!(ScheduleError::ProjectNotFound(project_id)));
            }
            Ok(())
        })
    }
}
