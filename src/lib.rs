//! Task assignment library.
//!
//! Picks which employee should receive an urgent task from current workload
//! and parent-task affinity, and commits the choice to a SQLite store.

pub mod api;
pub mod assign;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
