//! Integration tests for the retry and replanning loop

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskplan::executor::{
    ActuationFailure, Actuator, ExecutionError, ExecutorConfig, ReplanPolicy, ScriptedActuator,
    TaskExecutor, execute_plan,
};
use taskplan::task::{Plan, RawTask, SchedulerConfig, Task, plan_tasks};

fn plan(raw: Vec<RawTask>) -> Plan {
    plan_tasks(raw, &SchedulerConfig::default()).expect("test plan should be valid")
}

fn greeting_routine() -> Plan {
    plan(vec![
        RawTask::new(1, "Walk to guest").with_duration(4.0).with_resources(["legs"]),
        RawTask::new(2, "Raise arm").with_duration(1.5).with_resources(["arm"]),
        RawTask::new(3, "Say hello").with_duration(2.0).with_resources(["speaker"]),
    ])
}

/// Fails every other call, starting with the first
struct AlternatingActuator {
    calls: AtomicUsize,
}

#[async_trait]
impl Actuator for AlternatingActuator {
    async fn actuate(&self, task: &Task) -> Result<(), ActuationFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            Err(ActuationFailure::Unavailable(format!("{task} hit a transient fault")))
        } else {
            Ok(())
        }
    }

    fn actuator_type(&self) -> &'static str {
        "alternating"
    }
}

#[tokio::test]
async fn test_replan_after_exhausted_retries() {
    let max_retries = 3;
    let actuator = ScriptedActuator::new().fail_times(2, max_retries);

    let record = execute_plan(greeting_routine(), &actuator, max_retries)
        .await
        .unwrap();

    // Task 1 stays executed across the replan; the new plan covers 2 and 3.
    assert_eq!(record.replans, 1);
    assert_eq!(record.replanned_orders, vec![vec![2, 3]]);
    assert_eq!(record.executed_tasks, vec![1, 2, 3]);
    assert_eq!(actuator.calls(), vec![1, 2, 2, 2, 2, 3]);

    let succeeded: Vec<_> = record.success.iter().map(|t| t.id).collect();
    assert_eq!(succeeded, vec![1, 2, 3]);
    assert_eq!(record.failures_of(2), 3);
}

#[tokio::test]
async fn test_replan_keeps_dependencies_between_remaining_tasks() {
    let routine = plan(vec![
        RawTask::new(1, "Stand up").with_duration(1.0),
        RawTask::new(2, "Face guest").with_duration(1.0).with_depends([1]),
        RawTask::new(3, "Bow").with_duration(2.0).with_depends([2]),
        RawTask::new(4, "Blink").with_duration(0.5).with_resources(["leds"]),
    ]);
    let actuator = ScriptedActuator::new().fail_times(2, 1);

    let record = execute_plan(routine, &actuator, 1).await.unwrap();

    assert_eq!(record.replans, 1);
    assert_eq!(record.replanned_orders, vec![vec![2, 3, 4]]);
    assert_eq!(record.executed_tasks, vec![1, 2, 3, 4]);
    assert_eq!(actuator.calls(), vec![1, 2, 2, 3, 4]);
}

#[tokio::test]
async fn test_ledger_only_grows() {
    let actuator = AlternatingActuator {
        calls: AtomicUsize::new(0),
    };

    let record = execute_plan(greeting_routine(), &actuator, 2).await.unwrap();

    assert_eq!(record.executed_tasks, vec![1, 2, 3]);
    assert_eq!(record.failed.len(), 3);
    assert_eq!(record.replans, 0);

    assert_eq!(record.ledger.committed("legs"), Some(4.0));
    assert_eq!(record.ledger.committed("arm"), Some(1.5));
    assert_eq!(record.ledger.committed("speaker"), Some(2.0));

    let committed: f64 = record.ledger.iter().map(|(_, duration)| duration).sum();
    assert_eq!(committed, record.executed_duration());
}

#[tokio::test]
async fn test_default_cap_matches_retry_budget() {
    let actuator = ScriptedActuator::new().fail_always(3);

    let error = execute_plan(greeting_routine(), &actuator, 2)
        .await
        .unwrap_err();

    match error {
        ExecutionError::ReplanLimitExceeded { limit, record } => {
            assert_eq!(limit, 2);
            assert_eq!(record.replans, 2);
            assert_eq!(record.replanned_orders, vec![vec![3], vec![3]]);
            assert_eq!(record.executed_tasks, vec![1, 2]);
            assert_eq!(record.failures_of(3), 6);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unbounded_policy_keeps_replanning() {
    // Without a cap a task that never succeeds would replan forever; this
    // script lets task 2 succeed on its eighth call so the run ends.
    let actuator = ScriptedActuator::new().fail_times(2, 7);
    let executor =
        TaskExecutor::new(ExecutorConfig::new(2).with_replan_limit(ReplanPolicy::Unbounded));

    let record = executor.run(greeting_routine(), &actuator).await.unwrap();

    assert_eq!(record.replans, 3);
    assert_eq!(record.replanned_orders, vec![vec![2, 3]; 3]);
    assert_eq!(record.executed_tasks, vec![1, 2, 3]);
    assert_eq!(actuator.attempts(2), 8);
}

#[tokio::test]
async fn test_attempt_log_matches_actuator_calls() {
    let actuator = ScriptedActuator::new().fail_times(1, 1).fail_times(3, 2);

    let record = execute_plan(greeting_routine(), &actuator, 3).await.unwrap();

    let logged: Vec<_> = record.attempts.iter().map(|a| a.task_id).collect();
    assert_eq!(logged, actuator.calls());
    assert!(
        record
            .attempts
            .windows(2)
            .all(|pair| pair[0].at <= pair[1].at)
    );
}
