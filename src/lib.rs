//! # taskplan
//!
//! Dependency- and resource-aware task sequencing for robots and other
//! actuated systems. A task list is validated into a graph, searched for a
//! complete ordering, and executed one task at a time with bounded retries
//! and replanning of the remainder when a task keeps failing.
//!
//! ## Architecture Overview
//!
//! - **[`task`]**: task records, graph validation, resource arbitration and plan search
//! - **[`executor`]**: the retry/replan loop, actuators and the resource ledger
//! - **[`integration`]**: unified configuration and the [`TaskPlanner`] facade
//! - **[`cli`]**: argument parsing, task file loading and config discovery
//! - **[`env`]**: path constants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskplan::executor::DryRunActuator;
//! use taskplan::task::RawTask;
//! use taskplan::TaskPlanner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let planner = TaskPlanner::default();
//!     let tasks = vec![
//!         RawTask::new(1, "Walk to table").with_duration(4.0).with_resources(["legs"]),
//!         RawTask::new(2, "Pick up cup").with_duration(2.0).with_depends([1]),
//!     ];
//!
//!     let record = planner.run(tasks, &DryRunActuator::new()).await?;
//!     println!("{}", record.summary());
//!     Ok(())
//! }
//! ```

/// Task model and planning.
///
/// Validates raw task records into a [`task::TaskGraph`] and searches it for a
/// [`task::Plan`] that respects dependencies and exclusive resources.
pub mod task;

/// Plan execution with retries, replanning and pluggable actuators.
pub mod executor;

/// High-level configuration and orchestration.
pub mod integration;

/// Environment constants and path utilities.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use executor::{Actuator, ExecutionError, ExecutionRecord, ExecutorConfig, TaskExecutor};
pub use integration::{PlannerConfig, TaskPlanner};
pub use task::{Plan, PlanningError, RawTask, Task, TaskGraph, TaskScheduler};
