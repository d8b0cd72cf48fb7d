//! # Planner Integration
//!
//! Ties validation, search, and execution together behind one configuration.
//!
//! ## Core Components
//!
//! - **[`PlannerConfig`]**: unified TOML configuration for scheduler, executor and actuator
//! - **[`TaskPlanner`]**: plans raw task lists and runs them through an actuator
//!
//! ## Configuration File
//!
//! ```toml
//! [scheduler]
//! max_expansions = 100000
//!
//! [executor]
//! max_retries = 3
//! replan_limit = "match_retries"
//! actuation_timeout_secs = 30.0
//!
//! [actuator]
//! kind = "command"
//! program = "robotctl"
//! args = ["perform"]
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use taskplan::{PlannerConfig, TaskPlanner};
//! use taskplan::cli::TaskLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PlannerConfig::from_toml_file("taskplan.toml")?;
//!     let planner = TaskPlanner::new(config);
//!
//!     let tasks = TaskLoader::load_file("tasks.json")?;
//!     let actuator = planner.build_actuator(false);
//!     let record = planner.run(tasks, actuator.as_ref()).await?;
//!
//!     println!("{}", record.summary());
//!     Ok(())
//! }
//! ```

use crate::executor::{
    Actuator, ActuatorConfig, DryRunActuator, ExecutionError, ExecutionRecord, ExecutorConfig,
    TaskExecutor,
};
use crate::task::{Plan, PlanningError, RawTask, SchedulerConfig, TaskGraph, TaskScheduler};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for every stage of a planning run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub scheduler: SchedulerConfig,
    pub executor: ExecutorConfig,
    pub actuator: ActuatorConfig,
}

impl PlannerConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Convert configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Plans task lists and executes them according to a [`PlannerConfig`]
pub struct TaskPlanner {
    config: PlannerConfig,
}

impl TaskPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Validate the raw tasks and search for a complete plan
    pub fn plan(&self, raw: Vec<RawTask>) -> Result<Plan, PlanningError> {
        let graph = TaskGraph::build(raw)?;
        info!(
            "Validated {} tasks ({:.2}s total)",
            graph.len(),
            graph.total_duration()
        );

        let plan = TaskScheduler::new(self.config.scheduler.clone()).find_plan(&graph)?;
        Ok(plan)
    }

    /// Execute an existing plan with the configured retry and replan settings
    pub async fn execute(
        &self,
        plan: Plan,
        actuator: &dyn Actuator,
    ) -> Result<ExecutionRecord, ExecutionError> {
        TaskExecutor::new(self.config.executor.clone())
            .with_scheduler_config(self.config.scheduler.clone())
            .run(plan, actuator)
            .await
    }

    /// Plan then execute in one step
    pub async fn run(&self, raw: Vec<RawTask>, actuator: &dyn Actuator) -> Result<ExecutionRecord> {
        let plan = self.plan(raw).context("Initial planning failed")?;
        info!("Executing plan: {}", plan.summary());

        let record = self
            .execute(plan, actuator)
            .await
            .context("Plan execution failed")?;
        Ok(record)
    }

    /// The configured actuator, or a dry run when requested
    pub fn build_actuator(&self, dry_run: bool) -> Box<dyn Actuator> {
        if dry_run {
            Box::new(DryRunActuator::new())
        } else {
            self.config.actuator.build()
        }
    }
}

impl Default for TaskPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
