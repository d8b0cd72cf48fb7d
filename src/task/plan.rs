//! Complete, constraint-satisfying task orderings.
//!
//! A [`Plan`] is what the scheduler hands to the executor: every task of a
//! [`TaskGraph`](crate::task::TaskGraph) in an order where each task follows
//! all of its prerequisites and no resource is claimed twice.
//!
//! ## Example Usage
//!
//! ```rust
//! use taskplan::task::{RawTask, SchedulerConfig, plan_tasks};
//!
//! let plan = plan_tasks(
//!     vec![
//!         RawTask::new(1, "Walk to podium").with_duration(5.0),
//!         RawTask::new(2, "Wave").with_duration(1.0).with_depends([1]),
//!     ],
//!     &SchedulerConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(plan.task_ids(), vec![1, 2]);
//! assert_eq!(plan.summary(), "2 tasks, 6.00s total");
//! ```

use crate::task::arbiter::{ClaimMap, ResourceArbiter};
use crate::task::types::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered schedule of tasks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Plan {
    pub tasks: Vec<Task>,
}

/// A way in which an ordering breaks the plan invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanViolation {
    #[error("Task {0} appears more than once")]
    DuplicateTask(TaskId),

    #[error("Task {task} is scheduled before its dependency {dependency}")]
    DependencyOrder { task: TaskId, dependency: TaskId },

    #[error("Task {task} claims resource '{resource}' already claimed earlier in the plan")]
    ResourceReused { task: TaskId, resource: String },
}

impl Plan {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Task ids in execution order
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// First task to execute
    pub fn head(&self) -> Option<&Task> {
        self.tasks.first()
    }

    /// Sum of all task durations (independent of order)
    pub fn total_duration(&self) -> f64 {
        self.tasks.iter().map(|task| task.duration).sum()
    }

    /// Position of a task in the plan
    pub fn position(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == task_id)
    }

    /// Get a summary string describing the plan
    pub fn summary(&self) -> String {
        match self.len() {
            0 => "Empty plan".to_string(),
            1 => format!("1 task, {:.2}s total", self.total_duration()),
            n => format!("{} tasks, {:.2}s total", n, self.total_duration()),
        }
    }

    /// Re-check dependency order and resource exclusivity.
    ///
    /// Dependencies must appear earlier in this plan and no resource may be
    /// claimed by more than one task, zero-duration tasks included.
    pub fn validate(&self) -> Result<(), PlanViolation> {
        let mut seen: BTreeSet<TaskId> = BTreeSet::new();
        let mut claims = ClaimMap::new();

        for task in &self.tasks {
            if seen.contains(&task.id) {
                return Err(PlanViolation::DuplicateTask(task.id));
            }
            if let Some(&dependency) = task.depends.iter().find(|&&dep| !seen.contains(&dep)) {
                return Err(PlanViolation::DependencyOrder {
                    task: task.id,
                    dependency,
                });
            }
            if let Some(resource) = ResourceArbiter::conflicts(task, &claims).first() {
                return Err(PlanViolation::ResourceReused {
                    task: task.id,
                    resource: resource.to_string(),
                });
            }

            claims = ResourceArbiter::claim(task, &claims);
            seen.insert(task.id);
        }

        Ok(())
    }
}

impl From<Vec<Task>> for Plan {
    fn from(tasks: Vec<Task>) -> Self {
        Self::new(tasks)
    }
}
