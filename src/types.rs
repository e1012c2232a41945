//! Core types for employees, tasks and assignment decisions.

use serde::{Deserialize, Serialize};

/// Employee identifier (SQLite integer key).
pub type EmployeeId = i64;

/// Task identifier (SQLite integer key).
pub type TaskId = i64;

/// Status values written by this crate. Other strings may exist in legacy rows.
pub const STATUS_NEW: &str = "new";
pub const STATUS_COMPLETED: &str = "completed";

/// Map the legacy "zero means none" encoding onto `Option`.
pub fn nonzero(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

/// An employee and their running count of active tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub position: Option<String>,
    pub telegram: Option<String>,
    /// Maintained incrementally by assignment and completion; may drift if rows
    /// are edited behind the store's back (see `reconcile_workloads`).
    pub active_task_count: i64,
    pub date_begin: Option<i64>,
    pub date_end: Option<i64>,
}

/// Input for registering an employee. The task counter always starts at 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEmployee {
    pub full_name: String,
    pub position: Option<String>,
    pub telegram: Option<String>,
    pub date_begin: Option<i64>,
}

/// A task in the parent/child tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub parent_task_id: Option<TaskId>,
    pub employee_id: Option<EmployeeId>,
    pub status: String,
    pub date_begin: Option<i64>,
    /// Deadline, in milliseconds since the epoch.
    pub date_end: Option<i64>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Input for creating a task. Assignment happens only through the assigner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub parent_task_id: Option<TaskId>,
    pub status: Option<String>,
    pub date_begin: Option<i64>,
    pub date_end: Option<i64>,
}

/// Name and current load of one employee, as read for a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployeeLoad {
    pub id: EmployeeId,
    pub full_name: String,
    pub active_task_count: i64,
}

/// Why the policy picked an employee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Justification {
    /// The task has no parent; least-loaded employee wins.
    NoParent,
    /// The parent exists but nobody is assigned to it.
    ParentUnassigned,
    /// The parent's assignee is more than the allowed gap above the minimum.
    ParentAssigneeOverloaded,
    /// The task stays with its parent's assignee.
    AssignedToParentAssignee,
}

impl Justification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Justification::NoParent => "NO_PARENT",
            Justification::ParentUnassigned => "PARENT_UNASSIGNED",
            Justification::ParentAssigneeOverloaded => "PARENT_ASSIGNEE_OVERLOADED",
            Justification::AssignedToParentAssignee => "ASSIGNED_TO_PARENT_ASSIGNEE",
        }
    }

    /// Human-readable explanation, used as the `details` of API responses.
    pub fn describe(&self) -> &'static str {
        match self {
            Justification::NoParent => "task has no parent task",
            Justification::ParentUnassigned => "parent task is not assigned",
            Justification::ParentAssigneeOverloaded => {
                "parent task assignee carries too many tasks over the least loaded employee"
            }
            Justification::AssignedToParentAssignee => "assignee of the parent task",
        }
    }
}

impl std::fmt::Display for Justification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who should receive a task, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub justification: Justification,
}

/// Result of persisting an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub task_id: TaskId,
    pub employee_id: EmployeeId,
    /// Counter value after the increment.
    pub active_task_count: i64,
}

/// A committed assignment together with the decision that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignOutcome {
    pub decision: Decision,
    pub assignment: Assignment,
}

/// Minimal task reference used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRef {
    pub id: TaskId,
    pub name: String,
}

/// Unassigned task that other in-flight work depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportantTask {
    pub id: TaskId,
    pub name: String,
    pub date_end: Option<i64>,
}

/// Important task paired with the employee recommended for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportantCandidate {
    pub task: ImportantTask,
    pub decision: Decision,
}

/// Employee with the open tasks currently on their plate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployeeWorkload {
    pub id: EmployeeId,
    pub full_name: String,
    pub active_task_count: i64,
    pub tasks: Vec<TaskRef>,
}

/// Counter that disagreed with the tasks table during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadDrift {
    pub employee_id: EmployeeId,
    pub stored: i64,
    pub actual: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_treats_zero_as_absent() {
        assert_eq!(nonzero(None), None);
        assert_eq!(nonzero(Some(0)), None);
        assert_eq!(nonzero(Some(7)), Some(7));
    }

    #[test]
    fn justification_serializes_as_reason_code() {
        let json = serde_json::to_string(&Justification::ParentAssigneeOverloaded).unwrap();
        assert_eq!(json, "\"PARENT_ASSIGNEE_OVERLOADED\"");
        for j in [
            Justification::NoParent,
            Justification::ParentUnassigned,
            Justification::ParentAssigneeOverloaded,
            Justification::AssignedToParentAssignee,
        ] {
            assert_eq!(serde_json::to_string(&j).unwrap(), format!("\"{}\"", j.as_str()));
        }
    }
}
