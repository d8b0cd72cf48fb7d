//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `plan`: Validate a task file and print the ordered plan
//! - `run`: Plan a task file and execute it through the configured actuator
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Plan(PlanConfig),
    Run(RunConfig),
    ShowConfig,
}

#[derive(Debug)]
pub struct PlanConfig {
    pub task_file: PathBuf,
    pub config_override: Option<PathBuf>,
    pub dump_plan: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct RunConfig {
    pub task_file: PathBuf,
    pub config_override: Option<PathBuf>,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
    pub max_retries: Option<u32>,
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "taskplan")]
#[command(author = "Taskplan Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Orders tasks by dependencies and exclusive resources, then executes them with retries and replanning"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a task file and print the ordered plan
    Plan {
        /// Task file (JSON envelope or array)
        file: PathBuf,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Write the plan as JSON to a file
        #[arg(long = "dump-plan", value_name = "FILE")]
        dump_plan: Option<PathBuf>,
        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Plan a task file and execute it
    Run {
        /// Task file (JSON envelope or array)
        file: PathBuf,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Log tasks instead of actuating them
        #[arg(short = 'n', long = "dry-run")]
        dry_run: bool,
        /// Write the execution record as JSON to a file
        #[arg(long = "report", value_name = "FILE")]
        report: Option<PathBuf>,
        /// Override the configured retry budget
        #[arg(long = "max-retries", value_name = "N")]
        max_retries: Option<u32>,
        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Plan {
                file,
                config,
                dump_plan,
                verbose,
            }) => Ok(ExecutionMode::Plan(PlanConfig {
                task_file: file.clone(),
                config_override: config.clone(),
                dump_plan: dump_plan.clone(),
                verbose: *verbose,
            })),
            Some(Commands::Run {
                file,
                config,
                dry_run,
                report,
                max_retries,
                verbose,
            }) => {
                if *max_retries == Some(0) {
                    return Err("--max-retries must be at least 1".to_string());
                }

                Ok(ExecutionMode::Run(RunConfig {
                    task_file: file.clone(),
                    config_override: config.clone(),
                    dry_run: *dry_run,
                    report: report.clone(),
                    max_retries: *max_retries,
                    verbose: *verbose,
                }))
            }
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            None => Err(
                "No command specified. Use 'taskplan --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_command() {
        let args = Args::try_parse_from([
            "taskplan",
            "plan",
            "tasks.json",
            "--dump-plan",
            "plan.json",
        ])
        .unwrap();

        if let ExecutionMode::Plan(config) = args.mode().unwrap() {
            assert_eq!(config.task_file, PathBuf::from("tasks.json"));
            assert_eq!(config.dump_plan, Some(PathBuf::from("plan.json")));
            assert!(config.config_override.is_none());
            assert!(!config.verbose);
        } else {
            panic!("Expected Plan mode");
        }
    }

    #[test]
    fn test_run_command() {
        let args = Args::try_parse_from([
            "taskplan",
            "run",
            "tasks.json",
            "-c",
            "robot.toml",
            "--dry-run",
            "--report",
            "report.json",
            "--max-retries",
            "5",
        ])
        .unwrap();

        if let ExecutionMode::Run(config) = args.mode().unwrap() {
            assert_eq!(config.task_file, PathBuf::from("tasks.json"));
            assert_eq!(config.config_override, Some(PathBuf::from("robot.toml")));
            assert!(config.dry_run);
            assert_eq!(config.report, Some(PathBuf::from("report.json")));
            assert_eq!(config.max_retries, Some(5));
        } else {
            panic!("Expected Run mode");
        }
    }

    #[test]
    fn test_run_rejects_zero_retries() {
        let args = Args {
            command: Some(Commands::Run {
                file: PathBuf::from("tasks.json"),
                config: None,
                dry_run: false,
                report: None,
                max_retries: Some(0),
                verbose: false,
            }),
        };
        assert!(args.mode().is_err());
    }

    #[test]
    fn test_show_config_command() {
        let args = Args::try_parse_from(["taskplan", "show-config"]).unwrap();
        assert!(matches!(args.mode().unwrap(), ExecutionMode::ShowConfig));
    }

    #[test]
    fn test_no_command_error() {
        let args = Args { command: None };
        let result = args.mode();
        assert!(result.is_err());
    }
}
