use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Identifier assigned to a task by the task source
pub type TaskId = i64;

/// Atomic unit of work with a cost, prerequisites and exclusive resource needs
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Seconds. Only ever summed as a cost, never treated as wall-clock overlap.
    pub duration: f64,
    pub depends: BTreeSet<TaskId>,
    pub resources: BTreeSet<String>,
}

/// Task record exactly as emitted by the task source.
///
/// `duration`, `depends` and `resources` are optional; the duration may
/// arrive either as a JSON number or as a numeric string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RawTask {
    pub id: TaskId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<RawDuration>,
    #[serde(default)]
    pub depends: Option<Vec<TaskId>>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

/// Loosely-typed duration value
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RawDuration {
    Seconds(f64),
    Text(String),
}

/// Errors raised while validating and indexing a task list
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate task id {0}")]
    DuplicateId(TaskId),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Task {task} has invalid duration '{value}'")]
    InvalidDuration { task: TaskId, value: String },

    #[error("Cyclic dependency among tasks {cycle:?}")]
    CyclicDependency { cycle: Vec<TaskId> },

    #[error("Task {0} not found")]
    NotFound(TaskId),
}

/// The search could not produce a complete ordering
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingFailure {
    #[error(
        "No valid ordering exists: search exhausted after {expansions} expansions, \
         best partial schedule covered {scheduled} of {total} tasks"
    )]
    Exhausted {
        scheduled: usize,
        total: usize,
        expansions: usize,
    },

    #[error("Search abandoned after reaching the expansion limit of {limit}")]
    ExpansionLimit { limit: usize },
}

/// Failure of a complete planning request (validation plus search)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanningError {
    #[error("Invalid task list: {0}")]
    Graph(#[from] GraphError),

    #[error("Scheduling failed: {0}")]
    Scheduling(#[from] SchedulingFailure),
}

impl Task {
    /// Whether this task claims any named resource
    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

impl RawTask {
    /// Create a record with only the required fields
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            duration: None,
            depends: None,
            resources: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(RawDuration::Seconds(seconds));
        self
    }

    pub fn with_depends(mut self, depends: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends = Some(depends.into_iter().collect());
        self
    }

    pub fn with_resources<S: Into<String>>(mut self, resources: impl IntoIterator<Item = S>) -> Self {
        self.resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }

    /// Apply defaults and coerce the duration into a validated task
    pub fn into_task(self) -> Result<Task, GraphError> {
        let duration = match self.duration {
            None => {
                warn!("Task {} lacks duration, set to 0", self.id);
                0.0
            }
            Some(RawDuration::Seconds(seconds)) => seconds,
            Some(RawDuration::Text(text)) => {
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| GraphError::InvalidDuration {
                        task: self.id,
                        value: text.clone(),
                    })?
            }
        };

        if !duration.is_finite() || duration < 0.0 {
            return Err(GraphError::InvalidDuration {
                task: self.id,
                value: duration.to_string(),
            });
        }

        Ok(Task {
            id: self.id,
            name: self.name,
            duration,
            depends: self.depends.unwrap_or_default().into_iter().collect(),
            resources: self.resources.unwrap_or_default().into_iter().collect(),
        })
    }
}

impl From<Task> for RawTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            duration: Some(RawDuration::Seconds(task.duration)),
            depends: Some(task.depends.into_iter().collect()),
            resources: Some(task.resources.into_iter().collect()),
        }
    }
}
