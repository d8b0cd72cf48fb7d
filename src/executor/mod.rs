//! # Plan Execution
//!
//! Replays a [`Plan`] against an [`Actuator`], one task at a time, with bounded
//! retries per task and replanning of the remainder when a task keeps failing.
//!
//! ## Core Components
//!
//! - **[`TaskExecutor`]**: the retry/replan loop
//! - **[`Actuator`]**: the seam to whatever physically performs a task
//! - **[`ResourceLedger`]**: resources committed by executed tasks
//! - **[`ExecutionRecord`]**: everything that happened during one run
//!
//! ## Execution Flow
//!
//! ```text
//!   Plan ──► head task ──► Actuator
//!              ▲              │
//!              │      ┌───────┴────────┐
//!              │   success         failure
//!              │      │                │
//!              │  commit ledger   retries < max? ──yes──► retry head
//!              │  pop head             │ no
//!              │      │                ▼
//!              └──────┴──────── replan remainder
//!                               (seeded with ledger)
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use taskplan::executor::{DryRunActuator, execute_plan};
//! use taskplan::task::{RawTask, SchedulerConfig, plan_tasks};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let plan = plan_tasks(
//!         vec![
//!             RawTask::new(1, "Stand up").with_duration(2.0),
//!             RawTask::new(2, "Wave").with_duration(1.0).with_resources(["arm"]),
//!         ],
//!         &SchedulerConfig::default(),
//!     )?;
//!
//!     let record = execute_plan(plan, &DryRunActuator::new(), 3).await?;
//!     assert_eq!(record.executed_tasks, vec![1, 2]);
//!     assert_eq!(record.ledger.committed("arm"), Some(1.0));
//!     Ok(())
//! }
//! ```

pub mod actuator;
pub mod config;
pub mod host;
pub mod ledger;

pub use actuator::{ActuationFailure, Actuator, DryRunActuator, FailureScript, ScriptedActuator};
pub use config::{ActuatorConfig, ExecutorConfig, ReplanPolicy};
pub use host::CommandActuator;
pub use ledger::ResourceLedger;

use crate::task::{Plan, PlanningError, SchedulerConfig, Task, TaskGraph, TaskId, TaskScheduler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of one actuator call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed { reason: String },
}

/// One entry of the attempt log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub task_id: TaskId,
    /// 1-based attempt number since the task last became the head
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

/// Everything observed during one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Ids of successfully executed tasks, in completion order
    pub executed_tasks: Vec<TaskId>,
    pub success: Vec<Task>,
    /// One entry per failed attempt
    pub failed: Vec<Task>,
    pub ledger: ResourceLedger,
    pub replans: u32,
    /// Task order chosen by each replan
    #[serde(default)]
    pub replanned_orders: Vec<Vec<TaskId>>,
    pub attempts: Vec<AttemptRecord>,
}

impl ExecutionRecord {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            executed_tasks: Vec::new(),
            success: Vec::new(),
            failed: Vec::new(),
            ledger: ResourceLedger::new(),
            replans: 0,
            replanned_orders: Vec::new(),
            attempts: Vec::new(),
        }
    }

    fn record_success(&mut self, task: Task, attempt: u32) {
        self.ledger.commit(&task);
        self.executed_tasks.push(task.id);
        self.attempts.push(AttemptRecord {
            task_id: task.id,
            attempt,
            outcome: AttemptOutcome::Succeeded,
            at: Utc::now(),
        });
        self.success.push(task);
    }

    fn record_failure(&mut self, task: Task, attempt: u32, failure: &ActuationFailure) {
        self.attempts.push(AttemptRecord {
            task_id: task.id,
            attempt,
            outcome: AttemptOutcome::Failed {
                reason: failure.to_string(),
            },
            at: Utc::now(),
        });
        self.failed.push(task);
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of failed attempts for one task
    pub fn failures_of(&self, task_id: TaskId) -> usize {
        self.failed.iter().filter(|task| task.id == task_id).count()
    }

    /// Sum of durations of executed tasks
    pub fn executed_duration(&self) -> f64 {
        self.success.iter().map(|task| task.duration).sum()
    }

    /// Wall-clock time of the run, once finished
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} executed, {} failed attempts, {} replans",
            self.executed_tasks.len(),
            self.failed.len(),
            self.replans
        )
    }
}

impl Default for ExecutionRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons a run stops before the plan is exhausted
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("max_retries must be at least 1")]
    InvalidRetryBudget,

    #[error("Replanning failed: {source}")]
    Replan {
        source: PlanningError,
        record: Box<ExecutionRecord>,
    },

    #[error("Replan limit of {limit} exceeded")]
    ReplanLimitExceeded {
        limit: u32,
        record: Box<ExecutionRecord>,
    },
}

impl ExecutionError {
    /// Partial record of the run, if it got that far
    pub fn record(&self) -> Option<&ExecutionRecord> {
        match self {
            ExecutionError::InvalidRetryBudget => None,
            ExecutionError::Replan { record, .. }
            | ExecutionError::ReplanLimitExceeded { record, .. } => Some(record.as_ref()),
        }
    }
}

/// Drives plans through an actuator with retries and replanning
pub struct TaskExecutor {
    config: ExecutorConfig,
    scheduler: TaskScheduler,
}

impl TaskExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            scheduler: TaskScheduler::default(),
        }
    }

    /// Scheduler settings used when replanning
    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = TaskScheduler::new(config);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the plan strictly in order until nothing remains
    pub async fn run(
        &self,
        plan: Plan,
        actuator: &dyn Actuator,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let max_retries = self.config.max_retries;
        if max_retries == 0 {
            return Err(ExecutionError::InvalidRetryBudget);
        }
        let replan_limit = self.config.replan_limit.limit(max_retries);

        let mut record = ExecutionRecord::new();
        let mut remaining: VecDeque<Task> = plan.tasks.into();
        let mut retries = 0u32;

        info!(
            "Starting run {} with {} tasks on the {} actuator",
            record.run_id,
            remaining.len(),
            actuator.actuator_type()
        );

        while let Some(task) = remaining.front().cloned() {
            let attempt = retries + 1;
            debug!("Attempt {} of {}", attempt, task);

            match self.attempt(&task, actuator).await {
                Ok(()) => {
                    info!("Task {} succeeded on attempt {}", task.id, attempt);
                    record.record_success(task, attempt);
                    remaining.pop_front();
                    retries = 0;
                }
                Err(failure) => {
                    warn!(
                        "Task {} failed (attempt {}/{}): {}",
                        task.id, attempt, max_retries, failure
                    );
                    record.record_failure(task, attempt, &failure);
                    retries += 1;

                    if retries < max_retries {
                        continue;
                    }

                    if let Some(limit) = replan_limit
                        && record.replans >= limit
                    {
                        error!("Run {} exceeded its replan limit of {}", record.run_id, limit);
                        record.finish();
                        return Err(ExecutionError::ReplanLimitExceeded {
                            limit,
                            record: Box::new(record),
                        });
                    }

                    match self.replan(&remaining, &record) {
                        Ok(plan) => {
                            record.replans += 1;
                            record.replanned_orders.push(plan.task_ids());
                            info!(
                                "Replan {}: {} tasks remaining, new order {:?}",
                                record.replans,
                                plan.len(),
                                plan.task_ids()
                            );
                            remaining = plan.tasks.into();
                            retries = 0;
                        }
                        Err(source) => {
                            error!("Replanning failed for run {}: {}", record.run_id, source);
                            record.finish();
                            return Err(ExecutionError::Replan {
                                source,
                                record: Box::new(record),
                            });
                        }
                    }
                }
            }
        }

        record.finish();
        info!("Run {} complete: {}", record.run_id, record.summary());
        Ok(record)
    }

    async fn attempt(&self, task: &Task, actuator: &dyn Actuator) -> Result<(), ActuationFailure> {
        match self.config.actuation_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, actuator.actuate(task))
                .await
                .unwrap_or(Err(ActuationFailure::Timeout(timeout))),
            None => actuator.actuate(task).await,
        }
    }

    /// Search a fresh order for everything not yet executed.
    ///
    /// Dependencies on executed tasks are already satisfied and are dropped
    /// so the rebuilt graph only references tasks it contains. The search
    /// starts from the ledger's claims rather than an empty map, so a
    /// remaining task can never take a resource an executed task already used,
    /// even when the incoming plan was assembled by hand and never validated.
    fn replan(
        &self,
        remaining: &VecDeque<Task>,
        record: &ExecutionRecord,
    ) -> Result<Plan, PlanningError> {
        let executed: BTreeSet<TaskId> = record.executed_tasks.iter().copied().collect();

        let working: Vec<Task> = remaining
            .iter()
            .filter(|task| !executed.contains(&task.id))
            .cloned()
            .map(|mut task| {
                task.depends.retain(|dep| !executed.contains(dep));
                task
            })
            .collect();

        let graph = TaskGraph::from_tasks(working)?;
        let plan = self
            .scheduler
            .find_plan_with_claims(&graph, record.ledger.as_claims())?;
        Ok(plan)
    }
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

/// Execute a plan with default replanning settings and the given retry budget
pub async fn execute_plan(
    plan: Plan,
    actuator: &dyn Actuator,
    max_retries: u32,
) -> Result<ExecutionRecord, ExecutionError> {
    TaskExecutor::new(ExecutorConfig::new(max_retries))
        .run(plan, actuator)
        .await
}
