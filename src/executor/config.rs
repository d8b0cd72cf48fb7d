//! Executor and actuator configuration types.

use super::actuator::{Actuator, DryRunActuator};
use super::host::CommandActuator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retry and replanning settings for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Consecutive failures of one task before the remainder is replanned
    pub max_retries: u32,

    /// How many replans a single run may perform
    pub replan_limit: ReplanPolicy,

    /// Upper bound for one actuator call, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actuation_timeout_secs: Option<f64>,
}

/// Bound on the number of replans in one run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplanPolicy {
    /// Same number of replans as `max_retries` (default)
    MatchRetries,

    /// Explicit cap
    Capped(u32),

    /// Replan as often as failures demand
    Unbounded,
}

impl ReplanPolicy {
    /// Concrete cap for a given retry budget, `None` when unbounded
    pub fn limit(&self, max_retries: u32) -> Option<u32> {
        match self {
            ReplanPolicy::MatchRetries => Some(max_retries),
            ReplanPolicy::Capped(limit) => Some(*limit),
            ReplanPolicy::Unbounded => None,
        }
    }
}

impl ExecutorConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_replan_limit(mut self, policy: ReplanPolicy) -> Self {
        self.replan_limit = policy;
        self
    }

    pub fn with_actuation_timeout(mut self, timeout: Duration) -> Self {
        self.actuation_timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Timeout as a `Duration`; non-positive, non-finite or out-of-range
    /// values disable it
    pub fn actuation_timeout(&self) -> Option<Duration> {
        self.actuation_timeout_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Which actuator a run drives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorConfig {
    /// Log tasks without doing anything (default)
    DryRun,

    /// Run a host program once per attempt, with the task name appended
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        working_dir: Option<PathBuf>,
    },
}

impl ActuatorConfig {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, ActuatorConfig::DryRun)
    }

    /// Instantiate the configured actuator
    pub fn build(&self) -> Box<dyn Actuator> {
        match self {
            ActuatorConfig::DryRun => Box::new(DryRunActuator::new()),
            ActuatorConfig::Command {
                program,
                args,
                working_dir,
            } => {
                let mut actuator = CommandActuator::new(program.clone()).with_args(args.clone());
                if let Some(dir) = working_dir {
                    actuator = actuator.with_working_dir(dir.clone());
                }
                Box::new(actuator)
            }
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            replan_limit: ReplanPolicy::default(),
            actuation_timeout_secs: None,
        }
    }
}

impl Default for ReplanPolicy {
    fn default() -> Self {
        Self::MatchRetries
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self::DryRun
    }
}
