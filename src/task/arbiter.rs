//! Per-branch resource mutual exclusion for the plan search.
//!
//! A claim map records, for one candidate partial schedule, which resources
//! have been taken and by a task of what duration. Claims are never released
//! inside a branch: once a resource is claimed, whatever the claiming task's
//! duration, no later task on the same branch may claim it. Resources
//! therefore behave as single-use per schedule rather than as time-windowed
//! locks.

use crate::task::types::Task;
use std::collections::BTreeMap;

/// Resource name → duration of the task that claimed it
pub type ClaimMap = BTreeMap<String, f64>;

/// Stateless arbiter over claim maps carried by search nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceArbiter;

impl ResourceArbiter {
    /// True iff none of the task's resources is already claimed
    pub fn can_claim(task: &Task, claims: &ClaimMap) -> bool {
        Self::conflicts(task, claims).is_empty()
    }

    /// Resources of `task` already present in `claims`
    pub fn conflicts<'a>(task: &'a Task, claims: &ClaimMap) -> Vec<&'a str> {
        task.resources
            .iter()
            .filter(|resource| claims.contains_key(resource.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// New claim map with every resource of `task` set to its duration
    pub fn claim(task: &Task, claims: &ClaimMap) -> ClaimMap {
        let mut next = claims.clone();
        for resource in &task.resources {
            next.insert(resource.clone(), task.duration);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::RawTask;

    fn task(id: i64, duration: f64, resources: &[&str]) -> Task {
        RawTask::new(id, format!("task {id}"))
            .with_duration(duration)
            .with_resources(resources.iter().copied())
            .into_task()
            .unwrap()
    }

    #[test]
    fn test_unclaimed_resources_are_free() {
        let claims = ClaimMap::new();
        assert!(ResourceArbiter::can_claim(&task(1, 2.0, &["arm"]), &claims));
        assert!(ResourceArbiter::can_claim(&task(2, 2.0, &[]), &claims));
    }

    #[test]
    fn test_claim_blocks_later_claims() {
        let first = task(1, 2.0, &["arm", "speaker"]);
        let claims = ResourceArbiter::claim(&first, &ClaimMap::new());

        assert_eq!(claims.get("arm"), Some(&2.0));
        assert_eq!(claims.get("speaker"), Some(&2.0));

        let second = task(2, 1.0, &["speaker", "leds"]);
        assert!(!ResourceArbiter::can_claim(&second, &claims));
        assert_eq!(ResourceArbiter::conflicts(&second, &claims), vec!["speaker"]);

        let third = task(3, 1.0, &["leds"]);
        assert!(ResourceArbiter::can_claim(&third, &claims));
    }

    #[test]
    fn test_claim_does_not_mutate_input() {
        let claims = ClaimMap::new();
        let next = ResourceArbiter::claim(&task(1, 2.0, &["arm"]), &claims);
        assert!(claims.is_empty());
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_zero_duration_claim_still_blocks() {
        let instant = task(1, 0.0, &["leds"]);
        let claims = ResourceArbiter::claim(&instant, &ClaimMap::new());

        assert_eq!(claims.get("leds"), Some(&0.0));
        let later = task(2, 1.0, &["leds"]);
        assert!(!ResourceArbiter::can_claim(&later, &claims));
        assert_eq!(ResourceArbiter::conflicts(&later, &claims), vec!["leds"]);
    }
}
