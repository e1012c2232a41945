//! Task records, the parent tree and important-task listings.

use super::{Database, like_pattern};
use crate::error::{AssignError, Result};
use crate::types::{
    ImportantTask, NewTask, STATUS_COMPLETED, STATUS_NEW, Task, TaskId, nonzero,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const TASK_COLUMNS: &str =
    "id, name, parent_task_id, employee_id, status, date_begin, date_end";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_task_id: nonzero(row.get("parent_task_id")?),
        employee_id: nonzero(row.get("employee_id")?),
        status: row.get("status")?,
        date_begin: row.get("date_begin")?,
        date_end: row.get("date_end")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: TaskId) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn require_task_internal(conn: &Connection, task_id: TaskId) -> Result<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| AssignError::task_not_found(task_id))
}

impl Database {
    /// Create an unassigned task. The parent, when given, must exist.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AssignError::invalid("name must not be empty"));
        }
        let parent_task_id = nonzero(input.parent_task_id);
        let status = input.status.unwrap_or_else(|| STATUS_NEW.to_string());

        self.with_conn(|conn| {
            if let Some(parent) = parent_task_id {
                require_task_internal(conn, parent)?;
            }

            conn.execute(
                "INSERT INTO tasks (name, parent_task_id, employee_id, status, date_begin, date_end)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
                params![name, parent_task_id, status, input.date_begin, input.date_end],
            )?;

            Ok(Task {
                id: conn.last_insert_rowid(),
                name,
                parent_task_id,
                employee_id: None,
                status,
                date_begin: input.date_begin,
                date_end: input.date_end,
            })
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task, failing with `NotFound` if absent.
    pub fn require_task(&self, task_id: TaskId) -> Result<Task> {
        self.with_conn(|conn| require_task_internal(conn, task_id))
    }

    /// Direct children of a task.
    pub fn get_children(&self, parent_id: TaskId) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE parent_task_id = ?1 ORDER BY id"
            ))?;
            let tasks = stmt
                .query_map(params![parent_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Unassigned open tasks that at least one assigned open child depends on.
    ///
    /// Fails with `TooManyRows` when the result reaches `limit`.
    pub fn important_tasks(&self, search: &str, limit: usize) -> Result<Vec<ImportantTask>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.name, t.date_end
                 FROM tasks t
                 WHERE COALESCE(t.employee_id, 0) = 0
                   AND t.status != ?2
                   AND t.name LIKE ?1 ESCAPE '\\'
                   AND EXISTS (
                       SELECT 1 FROM tasks c
                       WHERE c.parent_task_id = t.id
                         AND COALESCE(c.employee_id, 0) != 0
                         AND c.status != ?2
                   )
                 ORDER BY t.id
                 LIMIT ?3",
            )?;

            let tasks = stmt
                .query_map(
                    params![like_pattern(search), STATUS_COMPLETED, limit as i64],
                    |row| {
                        Ok(ImportantTask {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            date_end: row.get(2)?,
                        })
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            if tasks.len() >= limit {
                return Err(AssignError::TooManyRows { limit });
            }
            Ok(tasks)
        })
    }

    /// Mark a task completed and release it from its assignee's counter.
    ///
    /// Completing an already completed task changes nothing.
    pub fn complete_task(&self, task_id: TaskId) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let task = require_task_internal(&tx, task_id)?;
            if task.is_completed() {
                return Ok(task);
            }

            tx.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![STATUS_COMPLETED, task_id],
            )?;

            if let Some(employee_id) = task.employee_id {
                tx.execute(
                    "UPDATE employees SET active_task_count = MAX(active_task_count - 1, 0)
                     WHERE id = ?1",
                    params![employee_id],
                )?;
            }

            tx.commit()?;
            info!(task_id, employee_id = ?task.employee_id, "Task completed");

            Ok(Task {
                status: STATUS_COMPLETED.to_string(),
                ..task
            })
        })
    }
}
