//! Employee records and workload listings.

use super::{Database, like_pattern};
use crate::error::{AssignError, Result};
use crate::types::{
    Employee, EmployeeId, EmployeeLoad, EmployeeWorkload, NewEmployee, STATUS_COMPLETED, TaskRef,
};
use rusqlite::{Connection, OptionalExtension, Row, params};

const EMPLOYEE_COLUMNS: &str =
    "id, full_name, position, telegram, active_task_count, date_begin, date_end";

fn parse_employee_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        position: row.get("position")?,
        telegram: row.get("telegram")?,
        active_task_count: row.get("active_task_count")?,
        date_begin: row.get("date_begin")?,
        date_end: row.get("date_end")?,
    })
}

fn parse_load_row(row: &Row) -> rusqlite::Result<EmployeeLoad> {
    Ok(EmployeeLoad {
        id: row.get(0)?,
        full_name: row.get(1)?,
        active_task_count: row.get(2)?,
    })
}

/// Least loaded employee; lowest id breaks ties.
pub(crate) fn least_loaded_internal(conn: &Connection) -> Result<EmployeeLoad> {
    conn.query_row(
        "SELECT id, full_name, active_task_count FROM employees
         ORDER BY active_task_count ASC, id ASC LIMIT 1",
        [],
        parse_load_row,
    )
    .optional()?
    .ok_or(AssignError::NoEmployees)
}

pub(crate) fn employee_load_internal(conn: &Connection, employee_id: EmployeeId) -> Result<EmployeeLoad> {
    conn.query_row(
        "SELECT id, full_name, active_task_count FROM employees WHERE id = ?1",
        params![employee_id],
        parse_load_row,
    )
    .optional()?
    .ok_or_else(|| AssignError::employee_not_found(employee_id))
}

impl Database {
    /// Register an employee with an empty workload.
    pub fn create_employee(&self, input: NewEmployee) -> Result<Employee> {
        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(AssignError::invalid("full_name must not be empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO employees (full_name, position, telegram, active_task_count, date_begin)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![full_name, input.position, input.telegram, input.date_begin],
            )?;

            Ok(Employee {
                id: conn.last_insert_rowid(),
                full_name,
                position: input.position,
                telegram: input.telegram,
                active_task_count: 0,
                date_begin: input.date_begin,
                date_end: None,
            })
        })
    }

    /// Get an employee by ID.
    pub fn get_employee(&self, employee_id: EmployeeId) -> Result<Option<Employee>> {
        self.with_conn(|conn| {
            let employee = conn
                .query_row(
                    &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
                    params![employee_id],
                    parse_employee_row,
                )
                .optional()?;
            Ok(employee)
        })
    }

    /// Get an employee, failing with `NotFound` if absent.
    pub fn require_employee(&self, employee_id: EmployeeId) -> Result<Employee> {
        self.get_employee(employee_id)?
            .ok_or_else(|| AssignError::employee_not_found(employee_id))
    }

    /// All employees ordered by id.
    pub fn list_employees(&self) -> Result<Vec<Employee>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id"))?;
            let employees = stmt
                .query_map([], parse_employee_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(employees)
        })
    }

    /// Employees whose name contains `name`, each with their open tasks whose
    /// name contains `task`, lightest workload first.
    ///
    /// Fails with `TooManyRows` when the joined rows reach `limit`.
    pub fn employees_with_tasks(
        &self,
        name: &str,
        task: &str,
        limit: usize,
    ) -> Result<Vec<EmployeeWorkload>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.full_name, e.active_task_count, t.id, t.name
                 FROM employees e
                 LEFT JOIN tasks t
                   ON t.employee_id = e.id
                  AND t.status != ?3
                  AND t.name LIKE ?2 ESCAPE '\\'
                 WHERE e.full_name LIKE ?1 ESCAPE '\\'
                 ORDER BY e.id, t.id
                 LIMIT ?4",
            )?;

            let rows = stmt
                .query_map(
                    params![like_pattern(name), like_pattern(task), STATUS_COMPLETED, limit as i64],
                    |row| {
                        let task_id: Option<i64> = row.get(3)?;
                        let task_name: Option<String> = row.get(4)?;
                        Ok((
                            row.get::<_, EmployeeId>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            task_id.zip(task_name),
                        ))
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            if rows.len() >= limit {
                return Err(AssignError::TooManyRows { limit });
            }

            let mut result: Vec<EmployeeWorkload> = Vec::new();
            for (id, full_name, active_task_count, task) in rows {
                if result.last().map(|w| w.id) != Some(id) {
                    result.push(EmployeeWorkload {
                        id,
                        full_name,
                        active_task_count,
                        tasks: Vec::new(),
                    });
                }
                if let (Some((task_id, task_name)), Some(entry)) = (task, result.last_mut()) {
                    entry.tasks.push(TaskRef {
                        id: task_id,
                        name: task_name,
                    });
                }
            }

            // Stable sort keeps id order among equal counts.
            result.sort_by_key(|w| w.tasks.len());
            Ok(result)
        })
    }
}
