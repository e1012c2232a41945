//! Parent-assignee affinity rule for urgent tasks.

use super::store::WorkloadStore;
use crate::error::Result;
use crate::types::{Decision, EmployeeLoad, Justification, TaskId};
use tracing::debug;

/// Default ceiling on how far above the minimum load a parent's assignee may be.
pub const DEFAULT_MAX_LOAD_GAP: i64 = 2;

/// Decides which employee receives an urgent task.
///
/// Keeps a subtask with its parent's assignee unless that employee carries
/// more than `max_load_gap` tasks over the least loaded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPolicy {
    pub max_load_gap: i64,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            max_load_gap: DEFAULT_MAX_LOAD_GAP,
        }
    }
}

impl AssignmentPolicy {
    pub fn new(max_load_gap: i64) -> Self {
        Self { max_load_gap }
    }

    /// Run the decision tree against a store snapshot. First matching branch wins.
    ///
    /// Reads only; the snapshot is not consistent if writers change counters
    /// between the individual reads.
    pub fn decide<S>(&self, store: &S, task_id: TaskId) -> Result<Decision>
    where
        S: WorkloadStore + ?Sized,
    {
        let least = store.least_loaded_employee()?;
        debug!(
            task_id,
            employee_id = least.id,
            load = least.active_task_count,
            "Least loaded employee"
        );

        let Some(parent_id) = store.parent_of(task_id)? else {
            return Ok(pick(least, Justification::NoParent));
        };

        let Some(parent_assignee) = store.assigned_employee_of(parent_id)? else {
            return Ok(pick(least, Justification::ParentUnassigned));
        };

        let candidate = store.workload_of(parent_assignee)?;
        let gap = candidate.active_task_count - least.active_task_count;
        debug!(task_id, parent_id, parent_assignee, gap, "Parent assignee load gap");

        if gap > self.max_load_gap {
            return Ok(pick(least, Justification::ParentAssigneeOverloaded));
        }

        Ok(pick(candidate, Justification::AssignedToParentAssignee))
    }
}

fn pick(employee: EmployeeLoad, justification: Justification) -> Decision {
    Decision {
        employee_id: employee.id,
        employee_name: employee.full_name,
        justification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssignError, ErrorCode};
    use crate::types::{Assignment, EmployeeId};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Snapshot-only store; records which reads the policy made.
    #[derive(Default)]
    struct FakeStore {
        employees: Vec<EmployeeLoad>,
        parents: HashMap<TaskId, Option<TaskId>>,
        assignees: HashMap<TaskId, Option<EmployeeId>>,
        reads: RefCell<Vec<&'static str>>,
    }

    impl FakeStore {
        fn employee(mut self, id: EmployeeId, name: &str, load: i64) -> Self {
            self.employees.push(EmployeeLoad {
                id,
                full_name: name.to_string(),
                active_task_count: load,
            });
            self
        }

        fn task(mut self, id: TaskId, parent: Option<TaskId>, assignee: Option<EmployeeId>) -> Self {
            self.parents.insert(id, parent);
            self.assignees.insert(id, assignee);
            self
        }
    }

    impl WorkloadStore for FakeStore {
        fn least_loaded_employee(&self) -> Result<EmployeeLoad> {
            self.reads.borrow_mut().push("least_loaded");
            self.employees
                .iter()
                .min_by_key(|e| (e.active_task_count, e.id))
                .cloned()
                .ok_or(AssignError::NoEmployees)
        }

        fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>> {
            self.reads.borrow_mut().push("parent_of");
            self.parents
                .get(&task_id)
                .copied()
                .ok_or(AssignError::task_not_found(task_id))
        }

        fn assigned_employee_of(&self, task_id: TaskId) -> Result<Option<EmployeeId>> {
            self.reads.borrow_mut().push("assigned_employee_of");
            self.assignees
                .get(&task_id)
                .copied()
                .ok_or(AssignError::task_not_found(task_id))
        }

        fn workload_of(&self, employee_id: EmployeeId) -> Result<EmployeeLoad> {
            self.reads.borrow_mut().push("workload_of");
            self.employees
                .iter()
                .find(|e| e.id == employee_id)
                .cloned()
                .ok_or(AssignError::employee_not_found(employee_id))
        }

        fn apply_assignment(&self, _: TaskId, _: EmployeeId) -> Result<Assignment> {
            unreachable!("policy must not write")
        }
    }

    fn decide(store: &FakeStore, task_id: TaskId) -> Result<Decision> {
        AssignmentPolicy::default().decide(store, task_id)
    }

    #[test]
    fn no_parent_picks_least_loaded() {
        let store = FakeStore::default()
            .employee(1, "A", 0)
            .employee(2, "B", 5)
            .task(10, None, None);

        let d = decide(&store, 10).unwrap();
        assert_eq!(d.employee_id, 1);
        assert_eq!(d.employee_name, "A");
        assert_eq!(d.justification, Justification::NoParent);
        assert_eq!(*store.reads.borrow(), vec!["least_loaded", "parent_of"]);
    }

    #[test]
    fn unassigned_parent_picks_least_loaded() {
        let store = FakeStore::default()
            .employee(1, "A", 0)
            .employee(2, "B", 5)
            .task(10, None, None)
            .task(11, Some(10), None);

        let d = decide(&store, 11).unwrap();
        assert_eq!(d.employee_id, 1);
        assert_eq!(d.justification, Justification::ParentUnassigned);
    }

    #[test]
    fn gap_of_three_routes_to_least_loaded() {
        let store = FakeStore::default()
            .employee(1, "A", 1)
            .employee(2, "B", 4)
            .task(10, None, Some(2))
            .task(11, Some(10), None);

        let d = decide(&store, 11).unwrap();
        assert_eq!(d.employee_id, 1);
        assert_eq!(d.justification, Justification::ParentAssigneeOverloaded);
    }

    #[test]
    fn gap_of_two_stays_with_parent_assignee() {
        let store = FakeStore::default()
            .employee(1, "A", 1)
            .employee(2, "B", 3)
            .task(10, None, Some(2))
            .task(11, Some(10), None);

        let d = decide(&store, 11).unwrap();
        assert_eq!(d.employee_id, 2);
        assert_eq!(d.employee_name, "B");
        assert_eq!(d.justification, Justification::AssignedToParentAssignee);
    }

    #[test]
    fn parent_assignee_that_is_least_loaded_keeps_task() {
        let store = FakeStore::default()
            .employee(1, "A", 0)
            .employee(2, "B", 0)
            .task(10, None, Some(2))
            .task(11, Some(10), None);

        let d = decide(&store, 11).unwrap();
        assert_eq!(d.employee_id, 2);
        assert_eq!(d.justification, Justification::AssignedToParentAssignee);
    }

    #[test]
    fn custom_gap_is_honoured() {
        let store = FakeStore::default()
            .employee(1, "A", 0)
            .employee(2, "B", 1)
            .task(10, None, Some(2))
            .task(11, Some(10), None);

        let strict = AssignmentPolicy::new(0).decide(&store, 11).unwrap();
        assert_eq!(strict.justification, Justification::ParentAssigneeOverloaded);

        let loose = AssignmentPolicy::new(1).decide(&store, 11).unwrap();
        assert_eq!(loose.justification, Justification::AssignedToParentAssignee);
    }

    #[test]
    fn empty_store_fails_before_task_lookup() {
        let store = FakeStore::default();
        let err = decide(&store, 99).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoEmployees);
        assert_eq!(*store.reads.borrow(), vec!["least_loaded"]);
    }

    #[test]
    fn missing_task_is_not_found() {
        let store = FakeStore::default().employee(1, "A", 0);
        let err = decide(&store, 99).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TaskNotFound);
    }

    #[test]
    fn dangling_parent_assignee_is_not_found() {
        let store = FakeStore::default()
            .employee(1, "A", 0)
            .task(10, None, Some(77))
            .task(11, Some(10), None);

        let err = decide(&store, 11).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmployeeNotFound);
    }

    #[test]
    fn root_of_follows_chain_and_stops_on_cycle() {
        let chain = FakeStore::default()
            .task(1, None, None)
            .task(2, Some(1), None)
            .task(3, Some(2), None);
        assert_eq!(chain.root_of(3).unwrap(), 1);
        assert_eq!(chain.root_of(1).unwrap(), 1);

        let cycle = FakeStore::default()
            .task(1, Some(3), None)
            .task(2, Some(1), None)
            .task(3, Some(2), None);
        assert_eq!(cycle.root_of(3).unwrap(), 3);

        let dangling = FakeStore::default().task(2, Some(40), None);
        assert_eq!(dangling.root_of(2).unwrap(), 2);
    }
}
