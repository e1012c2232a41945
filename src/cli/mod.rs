//! CLI command definitions for task-assign
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::types::{EmployeeId, TaskId};
use clap::{Args, Parser, Subcommand};

/// Workload-aware task assignment server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve(ServeArgs),

    /// Show who should take a task, without assigning it
    Recommend {
        /// Task to place
        task_id: TaskId,
    },

    /// Pick an employee for a task and commit the assignment
    Assign {
        /// Task to place
        task_id: TaskId,

        /// Assign to this employee instead of asking the policy
        #[arg(long)]
        employee: Option<EmployeeId>,
    },

    /// Mark a task completed and release it from its assignee
    Complete {
        task_id: TaskId,
    },

    /// List unassigned tasks that assigned subtasks depend on
    Important {
        /// Only tasks whose name contains this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Include the recommended employee for each task
        #[arg(long)]
        candidates: bool,
    },

    /// List employees with their open tasks, lightest first
    Workload {
        /// Only employees whose name contains this text
        #[arg(long, default_value = "")]
        name: String,

        /// Only tasks whose name contains this text
        #[arg(long, default_value = "")]
        task: String,
    },

    /// Recompute workload counters from the tasks table
    Reconcile,

    /// Register an employee
    AddEmployee(AddEmployeeArgs),

    /// Create a task
    AddTask(AddTaskArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct AddEmployeeArgs {
    /// Full name
    pub full_name: String,

    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub telegram: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddTaskArgs {
    /// Task name
    pub name: String,

    /// Parent task id
    #[arg(long)]
    pub parent: Option<TaskId>,

    /// Deadline as RFC 3339 (e.g. 2026-11-01T18:00:00Z)
    #[arg(long)]
    pub deadline: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["task-assign"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn assign_accepts_explicit_employee() {
        let cli = Cli::try_parse_from(["task-assign", "assign", "7", "--employee", "3"]).unwrap();
        match cli.command {
            Some(Command::Assign { task_id, employee }) => {
                assert_eq!(task_id, 7);
                assert_eq!(employee, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["task-assign", "recommend", "4", "-d", "x.db", "-v"]).unwrap();
        assert_eq!(cli.database.as_deref(), Some("x.db"));
        assert!(cli.verbose);
    }
}
