//! The actuator seam: whatever physically carries out one task.

use crate::task::{Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Typed failure reported by an actuator for a single attempt
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuationFailure {
    /// The actuator ran the task and reported that it did not succeed
    #[error("Actuation rejected: {0}")]
    Rejected(String),

    /// The actuator could not be reached or started
    #[error("Actuator unavailable: {0}")]
    Unavailable(String),

    /// The attempt did not finish in time
    #[error("Actuation timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Carries out a single task and reports success or a typed failure
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn actuate(&self, task: &Task) -> Result<(), ActuationFailure>;

    /// Short label used in logs
    fn actuator_type(&self) -> &'static str;
}

/// Logs each task and reports success without doing anything
#[derive(Debug, Clone, Default)]
pub struct DryRunActuator;

impl DryRunActuator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Actuator for DryRunActuator {
    async fn actuate(&self, task: &Task) -> Result<(), ActuationFailure> {
        info!(
            "[dry run] {} ({:.2}s, resources: {:?})",
            task, task.duration, task.resources
        );
        Ok(())
    }

    fn actuator_type(&self) -> &'static str {
        "dry-run"
    }
}

/// How often a scripted task fails before it starts succeeding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScript {
    Times(u32),
    Always,
}

/// Scripted actuator for tests and simulations.
///
/// Tasks succeed unless a failure script was registered for their id.
/// Every call is recorded in order.
#[derive(Debug, Default)]
pub struct ScriptedActuator {
    scripts: Mutex<HashMap<TaskId, FailureScript>>,
    calls: Mutex<Vec<TaskId>>,
    delay: Option<Duration>,
}

impl ScriptedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` attempts of a task, then succeed
    pub fn fail_times(self, task_id: TaskId, times: u32) -> Self {
        self.script(task_id, FailureScript::Times(times))
    }

    /// Fail every attempt of a task
    pub fn fail_always(self, task_id: TaskId) -> Self {
        self.script(task_id, FailureScript::Always)
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn script(self, task_id: TaskId, script: FailureScript) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(task_id, script);
        }
        self
    }

    /// Task ids in the order they were actuated
    pub fn calls(&self) -> Vec<TaskId> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of attempts made for one task
    pub fn attempts(&self, task_id: TaskId) -> usize {
        self.calls().iter().filter(|&&id| id == task_id).count()
    }
}

#[async_trait]
impl Actuator for ScriptedActuator {
    async fn actuate(&self, task: &Task) -> Result<(), ActuationFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(task.id);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut scripts = self
            .scripts
            .lock()
            .map_err(|_| ActuationFailure::Other("script state poisoned".to_string()))?;

        match scripts.get_mut(&task.id) {
            Some(FailureScript::Always) => Err(ActuationFailure::Rejected(format!(
                "{task} is scripted to always fail"
            ))),
            Some(FailureScript::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Err(ActuationFailure::Rejected(format!(
                    "{task} is scripted to fail ({remaining} failures left)"
                )))
            }
            _ => Ok(()),
        }
    }

    fn actuator_type(&self) -> &'static str {
        "scripted"
    }
}
