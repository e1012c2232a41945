//! Workload reads and assignment writes backing the assignment core.

use super::Database;
use super::employees::{employee_load_internal, least_loaded_internal};
use super::tasks::require_task_internal;
use crate::assign::store::WorkloadStore;
use crate::error::{AssignError, Result};
use crate::types::{
    Assignment, EmployeeId, EmployeeLoad, STATUS_COMPLETED, TaskId, WorkloadDrift,
};
use rusqlite::params;
use tracing::{info, warn};

impl WorkloadStore for Database {
    fn least_loaded_employee(&self) -> Result<EmployeeLoad> {
        self.with_conn(least_loaded_internal)
    }

    fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>> {
        self.with_conn(|conn| Ok(require_task_internal(conn, task_id)?.parent_task_id))
    }

    fn assigned_employee_of(&self, task_id: TaskId) -> Result<Option<EmployeeId>> {
        self.with_conn(|conn| Ok(require_task_internal(conn, task_id)?.employee_id))
    }

    fn workload_of(&self, employee_id: EmployeeId) -> Result<EmployeeLoad> {
        self.with_conn(|conn| employee_load_internal(conn, employee_id))
    }

    /// Both writes share one transaction; any early return rolls back.
    fn apply_assignment(&self, task_id: TaskId, employee_id: EmployeeId) -> Result<Assignment> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE tasks SET employee_id = ?1 WHERE id = ?2",
                params![employee_id, task_id],
            )?;
            if updated == 0 {
                return Err(AssignError::task_not_found(task_id));
            }

            let updated = tx.execute(
                "UPDATE employees SET active_task_count = active_task_count + 1 WHERE id = ?1",
                params![employee_id],
            )?;
            if updated == 0 {
                return Err(AssignError::employee_not_found(employee_id));
            }

            let active_task_count: i64 = tx.query_row(
                "SELECT active_task_count FROM employees WHERE id = ?1",
                params![employee_id],
                |row| row.get(0),
            )?;

            tx.commit()?;

            Ok(Assignment {
                task_id,
                employee_id,
                active_task_count,
            })
        })
    }
}

impl Database {
    /// Recompute every counter from the tasks table.
    ///
    /// Returns the employees whose stored count disagreed.
    pub fn reconcile_workloads(&self) -> Result<Vec<WorkloadDrift>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let drift = {
                let mut stmt = tx.prepare(
                    "SELECT e.id, e.active_task_count,
                            (SELECT COUNT(*) FROM tasks t
                              WHERE t.employee_id = e.id AND t.status != ?1) AS actual
                     FROM employees e
                     ORDER BY e.id",
                )?;
                stmt.query_map(params![STATUS_COMPLETED], |row| {
                    Ok(WorkloadDrift {
                        employee_id: row.get(0)?,
                        stored: row.get(1)?,
                        actual: row.get(2)?,
                    })
                })?
                .filter(|d| d.as_ref().map_or(true, |d| d.stored != d.actual))
                .collect::<rusqlite::Result<Vec<_>>>()?
            };

            for d in &drift {
                warn!(
                    employee_id = d.employee_id,
                    stored = d.stored,
                    actual = d.actual,
                    "Workload counter drifted"
                );
                tx.execute(
                    "UPDATE employees SET active_task_count = ?1 WHERE id = ?2",
                    params![d.actual, d.employee_id],
                )?;
            }

            tx.commit()?;
            info!(corrected = drift.len(), "Workload counters reconciled");
            Ok(drift)
        })
    }
}
