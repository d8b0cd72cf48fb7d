use anyhow::{Context, Result};
use std::path::Path;
use taskplan::cli::{Args, ConfigDiscovery, ExecutionMode, PlanConfig, RunConfig, TaskLoader};
use taskplan::executor::{ExecutionError, ExecutionRecord};
use taskplan::task::Plan;
use taskplan::{PlannerConfig, TaskPlanner};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let verbose = match &mode {
        ExecutionMode::Plan(config) => config.verbose,
        ExecutionMode::Run(config) => config.verbose,
        ExecutionMode::ShowConfig => false,
    };
    init_logging(verbose);

    match mode {
        ExecutionMode::Plan(config) => run_plan_mode(config),
        ExecutionMode::Run(config) => run_execute_mode(config).await,
        ExecutionMode::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "taskplan=debug" } else { "taskplan=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_planner(config_override: Option<&Path>) -> Result<TaskPlanner> {
    let config: PlannerConfig = ConfigDiscovery::load(config_override)?;
    Ok(TaskPlanner::new(config))
}

fn run_plan_mode(config: PlanConfig) -> Result<()> {
    let planner = load_planner(config.config_override.as_deref())?;

    info!("Loading tasks from {:?}", config.task_file);
    let tasks = TaskLoader::load_file(&config.task_file)
        .with_context(|| format!("Failed to load tasks from {:?}", config.task_file))?;

    let plan = match planner.plan(tasks) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Planning failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    print_plan(&plan);

    if let Some(path) = &config.dump_plan {
        write_json(path, &plan)?;
        println!("Plan written to {:?}", path);
    }

    Ok(())
}

async fn run_execute_mode(config: RunConfig) -> Result<()> {
    let mut planner_config = ConfigDiscovery::load(config.config_override.as_deref())?;
    if let Some(max_retries) = config.max_retries {
        planner_config.executor.max_retries = max_retries;
    }
    let planner = TaskPlanner::new(planner_config);

    info!("Loading tasks from {:?}", config.task_file);
    let tasks = TaskLoader::load_file(&config.task_file)
        .with_context(|| format!("Failed to load tasks from {:?}", config.task_file))?;

    let plan = match planner.plan(tasks) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Planning failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    print_plan(&plan);

    if config.dry_run {
        println!("🔍 Dry run mode - tasks are logged, not actuated");
    }
    let actuator = planner.build_actuator(config.dry_run);

    match planner.execute(plan, actuator.as_ref()).await {
        Ok(record) => {
            print_record(&record);
            write_report(config.report.as_deref(), &record)?;
            Ok(())
        }
        Err(e) => {
            error!("Execution failed: {}", e);
            eprintln!("❌ {}", e);
            if let Some(record) = e.record() {
                print_record(record);
                write_report(config.report.as_deref(), record)?;
            }
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &ExecutionError) -> i32 {
    match error {
        ExecutionError::InvalidRetryBudget => 2,
        ExecutionError::Replan { .. } | ExecutionError::ReplanLimitExceeded { .. } => 1,
    }
}

fn print_plan(plan: &Plan) {
    println!("📋 Plan: {}", plan.summary());
    for (i, task) in plan.tasks.iter().enumerate() {
        let resources = if task.has_resources() {
            format!(
                " [{}]",
                task.resources.iter().cloned().collect::<Vec<_>>().join(", ")
            )
        } else {
            String::new()
        };
        println!(
            "  {:>3}. {} ({:.2}s){}",
            i + 1,
            task,
            task.duration,
            resources
        );
    }
}

fn print_record(record: &ExecutionRecord) {
    println!("📊 Run {}: {}", record.run_id, record.summary());
    if let Some(elapsed) = record.elapsed() {
        println!("  finished in {}ms", elapsed.num_milliseconds());
    }
    for (resource, committed) in record.ledger.iter() {
        println!("  {}: {:.2}s committed", resource, committed);
    }
}

fn write_report(path: Option<&Path>, record: &ExecutionRecord) -> Result<()> {
    if let Some(path) = path {
        write_json(path, record)?;
        println!("Report written to {:?}", path);
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
