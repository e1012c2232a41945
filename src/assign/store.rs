//! Data-access interface consumed by the assignment core.

use crate::error::{AssignError, Result};
use crate::types::{Assignment, EmployeeId, EmployeeLoad, TaskId};
use std::collections::HashSet;

/// Reads workload snapshots and persists assignments.
///
/// Every read is an independent round-trip; implementations give no isolation
/// across calls. Only [`WorkloadStore::apply_assignment`] mutates.
pub trait WorkloadStore {
    /// Employee with the smallest active task count, lowest id on ties.
    /// Fails with `NoEmployees` when there is nobody to pick.
    fn least_loaded_employee(&self) -> Result<EmployeeLoad>;

    /// Parent of the task, `None` for a top-level task.
    /// Fails with `NotFound` if the task does not exist.
    fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>>;

    /// Current assignee of the task, `None` if unassigned.
    /// Fails with `NotFound` if the task does not exist.
    fn assigned_employee_of(&self, task_id: TaskId) -> Result<Option<EmployeeId>>;

    /// Name and load of the employee. Fails with `NotFound` if absent.
    fn workload_of(&self, employee_id: EmployeeId) -> Result<EmployeeLoad>;

    /// Set the task's assignee and add one to that employee's counter,
    /// atomically.
    fn apply_assignment(&self, task_id: TaskId, employee_id: EmployeeId) -> Result<Assignment>;

    /// Walk `parent_of` to the top of the task's chain.
    ///
    /// The parent graph is not guaranteed acyclic; on a cycle the walk stops
    /// at the first task seen twice. A parent that no longer exists ends the
    /// walk at the last task that does.
    fn root_of(&self, task_id: TaskId) -> Result<TaskId> {
        let mut seen = HashSet::from([task_id]);
        let mut current = task_id;
        let mut parent = self.parent_of(current)?;
        while let Some(next) = parent {
            if !seen.insert(next) {
                return Ok(next);
            }
            parent = match self.parent_of(next) {
                Ok(p) => p,
                Err(AssignError::NotFound { .. }) => return Ok(current),
                Err(e) => return Err(e),
            };
            current = next;
        }
        Ok(current)
    }
}
