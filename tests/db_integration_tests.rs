//! Integration tests for the database layer.
//!
//! These tests verify storage operations using an in-memory SQLite database.

use task_assign::assign::store::WorkloadStore;
use task_assign::db::Database;
use task_assign::error::ErrorCode;
use task_assign::types::{EmployeeId, NewEmployee, NewTask, STATUS_COMPLETED, TaskId};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn add_employee(db: &Database, name: &str) -> EmployeeId {
    db.create_employee(NewEmployee {
        full_name: name.to_string(),
        ..Default::default()
    })
    .unwrap()
    .id
}

fn add_task(db: &Database, name: &str, parent: Option<TaskId>) -> TaskId {
    db.create_task(NewTask {
        name: name.to_string(),
        parent_task_id: parent,
        ..Default::default()
    })
    .unwrap()
    .id
}

mod employee_tests {
    use super::*;

    #[test]
    fn create_employee_starts_with_empty_workload() {
        let db = setup_db();

        let employee = db
            .create_employee(NewEmployee {
                full_name: "  Ivan Petrov ".to_string(),
                position: Some("engineer".to_string()),
                telegram: Some("@ivan".to_string()),
                date_begin: Some(1_700_000_000_000),
            })
            .expect("Failed to create employee");

        assert!(employee.id > 0);
        assert_eq!(employee.full_name, "Ivan Petrov");
        assert_eq!(employee.active_task_count, 0);
        assert_eq!(db.get_employee(employee.id).unwrap(), Some(employee));
    }

    #[test]
    fn create_employee_rejects_blank_name() {
        let db = setup_db();
        let err = db.create_employee(NewEmployee::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFieldValue);
    }

    #[test]
    fn require_employee_fails_for_unknown_id() {
        let db = setup_db();
        assert!(db.get_employee(9).unwrap().is_none());
        assert_eq!(db.require_employee(9).unwrap_err().code(), ErrorCode::EmployeeNotFound);
    }

    #[test]
    fn list_employees_orders_by_id() {
        let db = setup_db();
        let a = add_employee(&db, "A");
        let b = add_employee(&db, "B");

        let ids: Vec<_> = db.list_employees().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn least_loaded_on_empty_store_is_no_employees() {
        let db = setup_db();
        assert_eq!(
            db.least_loaded_employee().unwrap_err().code(),
            ErrorCode::NoEmployees
        );
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_is_unassigned_and_new() {
        let db = setup_db();
        let parent = add_task(&db, "release", None);

        let task = db
            .create_task(NewTask {
                name: "write notes".to_string(),
                parent_task_id: Some(parent),
                date_end: Some(1_800_000_000_000),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(task.parent_task_id, Some(parent));
        assert_eq!(task.employee_id, None);
        assert_eq!(task.status, "new");
        assert_eq!(db.require_task(task.id).unwrap(), task);
        assert_eq!(db.get_children(parent).unwrap(), vec![task]);
    }

    #[test]
    fn create_task_with_zero_parent_is_top_level() {
        let db = setup_db();
        let task = db
            .create_task(NewTask {
                name: "top".to_string(),
                parent_task_id: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(task.parent_task_id, None);
    }

    #[test]
    fn create_task_rejects_unknown_parent() {
        let db = setup_db();
        let err = db
            .create_task(NewTask {
                name: "orphan".to_string(),
                parent_task_id: Some(41),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TaskNotFound);
    }

    #[test]
    fn parent_and_assignee_lookups_require_existing_task() {
        let db = setup_db();
        assert_eq!(db.parent_of(3).unwrap_err().code(), ErrorCode::TaskNotFound);
        assert_eq!(
            db.assigned_employee_of(3).unwrap_err().code(),
            ErrorCode::TaskNotFound
        );
    }
}

mod completion_tests {
    use super::*;

    #[test]
    fn complete_releases_assignee_once() {
        let db = setup_db();
        let e = add_employee(&db, "A");
        let t = add_task(&db, "t", None);
        db.apply_assignment(t, e).unwrap();
        assert_eq!(db.require_employee(e).unwrap().active_task_count, 1);

        let done = db.complete_task(t).unwrap();
        assert_eq!(done.status, STATUS_COMPLETED);
        assert_eq!(done.employee_id, Some(e));
        assert_eq!(db.require_employee(e).unwrap().active_task_count, 0);

        db.complete_task(t).unwrap();
        assert_eq!(db.require_employee(e).unwrap().active_task_count, 0);
    }

    #[test]
    fn complete_unassigned_task_touches_no_counter() {
        let db = setup_db();
        let e = add_employee(&db, "A");
        let t = add_task(&db, "t", None);

        db.complete_task(t).unwrap();
        assert_eq!(db.require_employee(e).unwrap().active_task_count, 0);
    }

    #[test]
    fn complete_never_drives_counter_negative() {
        let db = setup_db();
        let e = add_employee(&db, "A");
        let t = add_task(&db, "t", None);
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks SET employee_id = ?1 WHERE id = ?2",
                rusqlite::params![e, t],
            )?;
            Ok(())
        })
        .unwrap();

        db.complete_task(t).unwrap();
        assert_eq!(db.require_employee(e).unwrap().active_task_count, 0);
    }

    #[test]
    fn complete_unknown_task_is_not_found() {
        let db = setup_db();
        assert_eq!(db.complete_task(8).unwrap_err().code(), ErrorCode::TaskNotFound);
    }
}

mod listing_tests {
    use super::*;

    #[test]
    fn important_tasks_need_assigned_open_child() {
        let db = setup_db();
        let e = add_employee(&db, "A");

        let blocking = add_task(&db, "migrate schema", None);
        let child = add_task(&db, "backfill", Some(blocking));
        db.apply_assignment(child, e).unwrap();

        // Child unassigned: not important.
        let idle = add_task(&db, "idle parent", None);
        add_task(&db, "idle child", Some(idle));

        // Parent already assigned: not important.
        let owned = add_task(&db, "owned parent", None);
        let owned_child = add_task(&db, "owned child", Some(owned));
        db.apply_assignment(owned, e).unwrap();
        db.apply_assignment(owned_child, e).unwrap();

        // Only child completed: not important.
        let finished = add_task(&db, "finished parent", None);
        let finished_child = add_task(&db, "finished child", Some(finished));
        db.apply_assignment(finished_child, e).unwrap();
        db.complete_task(finished_child).unwrap();

        let important = db.important_tasks("", 1000).unwrap();
        let ids: Vec<_> = important.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![blocking]);
        assert_eq!(important[0].name, "migrate schema");
    }

    #[test]
    fn important_tasks_filter_by_name_literally() {
        let db = setup_db();
        let e = add_employee(&db, "A");
        for name in ["deploy 100%", "deploy 1000"] {
            let parent = add_task(&db, name, None);
            let child = add_task(&db, "sub", Some(parent));
            db.apply_assignment(child, e).unwrap();
        }

        let hits = db.important_tasks("100%", 1000).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "deploy 100%");
        assert_eq!(db.important_tasks("deploy", 1000).unwrap().len(), 2);
    }

    #[test]
    fn important_tasks_reaching_limit_ask_to_refine() {
        let db = setup_db();
        let e = add_employee(&db, "A");
        for i in 0..3 {
            let parent = add_task(&db, &format!("p{i}"), None);
            let child = add_task(&db, &format!("c{i}"), Some(parent));
            db.apply_assignment(child, e).unwrap();
        }

        let err = db.important_tasks("", 3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooManyRows);
        assert_eq!(db.important_tasks("", 4).unwrap().len(), 3);
    }

    #[test]
    fn employees_with_tasks_sorted_by_open_work() {
        let db = setup_db();
        let busy = add_employee(&db, "Busy Bee");
        let idle = add_employee(&db, "Idle Ian");
        let some = add_employee(&db, "Some Sam");

        for i in 0..3 {
            let t = add_task(&db, &format!("busy {i}"), None);
            db.apply_assignment(t, busy).unwrap();
        }
        let t = add_task(&db, "sam work", None);
        db.apply_assignment(t, some).unwrap();
        let done = add_task(&db, "sam done", None);
        db.apply_assignment(done, some).unwrap();
        db.complete_task(done).unwrap();

        let workload = db.employees_with_tasks("", "", 1000).unwrap();
        let order: Vec<_> = workload.iter().map(|w| (w.id, w.tasks.len())).collect();
        assert_eq!(order, vec![(idle, 0), (some, 1), (busy, 3)]);
        assert_eq!(workload[1].tasks[0].name, "sam work");
    }

    #[test]
    fn employees_with_tasks_filters_names() {
        let db = setup_db();
        let busy = add_employee(&db, "Busy Bee");
        add_employee(&db, "Idle Ian");
        for name in ["review", "deploy"] {
            let t = add_task(&db, name, None);
            db.apply_assignment(t, busy).unwrap();
        }

        let workload = db.employees_with_tasks("Bee", "dep", 1000).unwrap();
        assert_eq!(workload.len(), 1);
        assert_eq!(workload[0].tasks.len(), 1);
        assert_eq!(workload[0].tasks[0].name, "deploy");
        assert_eq!(workload[0].active_task_count, 2);

        let err = db.employees_with_tasks("", "", 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooManyRows);
    }
}

mod reconcile_tests {
    use super::*;

    #[test]
    fn reconcile_corrects_drifted_counters() {
        let db = setup_db();
        let a = add_employee(&db, "A");
        let b = add_employee(&db, "B");
        let t1 = add_task(&db, "t1", None);
        let t2 = add_task(&db, "t2", None);
        db.apply_assignment(t1, a).unwrap();
        db.apply_assignment(t2, a).unwrap();
        db.apply_assignment(t1, a).unwrap(); // double count

        db.with_conn(|conn| {
            conn.execute(
                "UPDATE employees SET active_task_count = 4 WHERE id = ?1",
                rusqlite::params![b],
            )?;
            Ok(())
        })
        .unwrap();

        let drift = db.reconcile_workloads().unwrap();
        assert_eq!(drift.len(), 2);
        assert_eq!((drift[0].employee_id, drift[0].stored, drift[0].actual), (a, 3, 2));
        assert_eq!((drift[1].employee_id, drift[1].stored, drift[1].actual), (b, 4, 0));
        assert_eq!(db.require_employee(a).unwrap().active_task_count, 2);
        assert_eq!(db.require_employee(b).unwrap().active_task_count, 0);

        assert!(db.reconcile_workloads().unwrap().is_empty());
    }
}
