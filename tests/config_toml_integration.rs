use taskplan::executor::{ActuatorConfig, DryRunActuator, ReplanPolicy};
use taskplan::task::RawTask;
use taskplan::{PlannerConfig, TaskPlanner};
use tempfile::NamedTempFile;
use test_tag::tag;

#[test]
fn test_config_serialization_roundtrip() {
    let original_config = PlannerConfig::default();

    let toml_str = original_config
        .to_toml_string()
        .expect("Should be able to serialize config to TOML");

    assert!(toml_str.contains("[scheduler]"), "Should contain scheduler section");
    assert!(toml_str.contains("max_retries"), "Should contain max_retries field");

    let deserialized_config =
        PlannerConfig::from_toml_str(&toml_str).expect("Should be able to deserialize TOML string");

    assert_eq!(original_config, deserialized_config);
}

#[test]
fn test_config_file_operations() {
    let original_config = PlannerConfig::default();

    let temp_file = NamedTempFile::new().expect("Should be able to create temporary file");
    let temp_path = temp_file.path();

    original_config
        .to_toml_file(temp_path)
        .expect("Should be able to save config to file");

    let loaded_config =
        PlannerConfig::from_toml_file(temp_path).expect("Should be able to load config from file");

    assert_eq!(original_config, loaded_config);
}

#[test]
fn test_full_config_file() {
    let config = PlannerConfig::from_toml_str(
        r#"
[scheduler]
max_expansions = 5000

[executor]
max_retries = 4
replan_limit = { capped = 10 }
actuation_timeout_secs = 12.5

[actuator]
kind = "command"
program = "robotctl"
args = ["perform", "--safe"]
working_dir = "/opt/robot"
"#,
    )
    .expect("Should parse a complete configuration");

    assert_eq!(config.scheduler.max_expansions, 5000);
    assert_eq!(config.executor.max_retries, 4);
    assert_eq!(config.executor.replan_limit, ReplanPolicy::Capped(10));
    assert_eq!(
        config.executor.actuation_timeout(),
        Some(std::time::Duration::from_millis(12_500))
    );
    assert!(matches!(
        config.actuator,
        ActuatorConfig::Command { ref program, ref args, .. }
            if program == "robotctl" && args.len() == 2
    ));
}

#[test]
fn test_unknown_actuator_kind_rejected() {
    let result = PlannerConfig::from_toml_str("[actuator]\nkind = \"teleport\"\n");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_huge_timeout_runs_without_limit() {
    let config = PlannerConfig::from_toml_str("[executor]\nactuation_timeout_secs = 1e20\n")
        .expect("Should parse an oversized timeout");
    assert_eq!(config.executor.actuation_timeout(), None);

    let record = TaskPlanner::new(config)
        .run(vec![RawTask::new(1, "Nod").with_duration(1.0)], &DryRunActuator::new())
        .await
        .unwrap();
    assert_eq!(record.executed_tasks, vec![1]);
}

#[cfg(unix)]
#[tokio::test]
#[tag(host)]
async fn test_configured_command_actuator_runs_tasks() {
    let config = PlannerConfig::from_toml_str(
        r#"
[executor]
max_retries = 1

[actuator]
kind = "command"
program = "sh"
args = ["-c", "test -n \"$TASKPLAN_TASK_ID\""]
"#,
    )
    .unwrap();
    let planner = TaskPlanner::new(config);
    let actuator = planner.build_actuator(false);

    let record = planner
        .run(
            vec![
                RawTask::new(1, "Open gripper").with_duration(0.5).with_resources(["gripper"]),
                RawTask::new(2, "Move arm").with_duration(2.0).with_depends([1]),
            ],
            actuator.as_ref(),
        )
        .await
        .unwrap();

    assert_eq!(record.executed_tasks, vec![1, 2]);
    assert!(record.failed.is_empty());
}
