//! Task assignment core.
//!
//! - [`store::WorkloadStore`] reads workload snapshots and persists assignments.
//! - [`policy::AssignmentPolicy`] picks an employee for an urgent task.
//! - [`Assigner`] exposes the two contracts callers need: `recommend` (preview,
//!   read-only) and `assign` (decide and commit).

pub mod locks;
pub mod policy;
pub mod store;

use crate::config::AssignmentConfig;
use crate::db::Database;
use crate::error::Result;
use crate::types::{AssignOutcome, Assignment, Decision, EmployeeId, ImportantCandidate, TaskId};
use locks::ChainLocks;
use policy::AssignmentPolicy;
use store::WorkloadStore;
use tracing::{debug, info};

/// Runs the assignment policy against a store.
pub struct Assigner<S> {
    store: S,
    policy: AssignmentPolicy,
    /// Present when decide+apply should be serialized per task chain.
    chains: Option<ChainLocks>,
}

impl<S: WorkloadStore> Assigner<S> {
    pub fn new(store: S, config: &AssignmentConfig) -> Self {
        Self {
            store,
            policy: AssignmentPolicy::new(config.max_load_gap),
            chains: config.serialize_chains.then(ChainLocks::new),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    /// Decide who should take the task without writing anything.
    pub fn recommend(&self, task_id: TaskId) -> Result<Decision> {
        let decision = self.policy.decide(&self.store, task_id)?;
        debug!(
            task_id,
            employee_id = decision.employee_id,
            reason = %decision.justification,
            "Recommended assignee"
        );
        Ok(decision)
    }

    /// Persist a decision: set the assignee and bump their counter in one
    /// transaction. Re-applying sets the same assignee but counts again.
    pub fn apply(&self, task_id: TaskId, decision: &Decision) -> Result<Assignment> {
        let assignment = self.store.apply_assignment(task_id, decision.employee_id)?;
        info!(
            task_id,
            employee_id = assignment.employee_id,
            active_task_count = assignment.active_task_count,
            reason = %decision.justification,
            "Task assigned"
        );
        Ok(assignment)
    }

    /// Commit a manual assignment, bypassing the policy.
    pub fn assign_to(&self, task_id: TaskId, employee_id: EmployeeId) -> Result<Assignment> {
        let assignment = self.store.apply_assignment(task_id, employee_id)?;
        info!(
            task_id,
            employee_id,
            active_task_count = assignment.active_task_count,
            "Task assigned manually"
        );
        Ok(assignment)
    }

    /// Decide and commit.
    pub fn assign(&self, task_id: TaskId) -> Result<AssignOutcome> {
        let run = || -> Result<AssignOutcome> {
            let decision = self.recommend(task_id)?;
            let assignment = self.apply(task_id, &decision)?;
            Ok(AssignOutcome {
                decision,
                assignment,
            })
        };

        match &self.chains {
            Some(chains) => {
                let root = self.store.root_of(task_id)?;
                chains.with_chain(root, run)
            }
            None => run(),
        }
    }
}

impl Assigner<Database> {
    /// Important tasks matching `search`, each with the employee recommended for it.
    pub fn important_candidates(&self, search: &str, limit: usize) -> Result<Vec<ImportantCandidate>> {
        self.store
            .important_tasks(search, limit)?
            .into_iter()
            .map(|task| {
                let decision = self.recommend(task.id)?;
                Ok(ImportantCandidate { task, decision })
            })
            .collect()
    }
}
