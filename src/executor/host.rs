//! Host process actuation.
//!
//! Runs a configured program directly on the host using `tokio::process::Command`,
//! once per attempt, with the task name appended as the last argument.

use super::actuator::{ActuationFailure, Actuator};
use crate::task::Task;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Actuates tasks by running a host program
#[derive(Debug, Clone)]
pub struct CommandActuator {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandActuator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
}

#[async_trait]
impl Actuator for CommandActuator {
    async fn actuate(&self, task: &Task) -> Result<(), ActuationFailure> {
        debug!(
            "Actuating {} on host: {} {:?} {}",
            task, self.program, self.args, task.name
        );

        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(&task.name);
        command.env("TASKPLAN_TASK_ID", task.id.to_string());
        command.env("TASKPLAN_TASK_DURATION", task.duration.to_string());

        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        // Dropping the future on an executor timeout must not leave the child behind
        command.kill_on_drop(true);

        let output = command.output().await.map_err(|e| {
            ActuationFailure::Unavailable(format!("failed to start '{}': {}", self.program, e))
        })?;

        debug!(
            "Task {} finished on host in {:?} with status {}",
            task.id,
            start.elapsed(),
            output.status
        );

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code().unwrap_or(-1);
        warn!("Task {} exited with code {}: {}", task.id, code, stderr.trim());

        Err(ActuationFailure::Rejected(format!(
            "'{}' exited with code {}",
            self.program, code
        )))
    }

    fn actuator_type(&self) -> &'static str {
        "command"
    }
}
