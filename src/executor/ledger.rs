//! Cumulative record of resources committed by successfully executed tasks.

use crate::task::{ClaimMap, Task};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Resource name → total duration committed during a run.
///
/// The executor only ever adds to the ledger. [`ResourceLedger::release`]
/// exists for callers that manage resource lifetimes themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLedger {
    committed: BTreeMap<String, f64>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the task's duration to each resource it claims
    pub fn commit(&mut self, task: &Task) {
        for resource in &task.resources {
            *self.committed.entry(resource.clone()).or_insert(0.0) += task.duration;
            debug!(
                "Committed {:.2}s of '{}' for task {}",
                task.duration, resource, task.id
            );
        }
    }

    /// Drop a resource from the ledger, returning what had been committed
    pub fn release(&mut self, resource: &str) -> Option<f64> {
        self.committed.remove(resource)
    }

    pub fn committed(&self, resource: &str) -> Option<f64> {
        self.committed.get(resource).copied()
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.committed.contains_key(resource)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.committed
            .iter()
            .map(|(resource, &duration)| (resource.as_str(), duration))
    }

    /// Committed resources as seed claims for a new search
    pub fn as_claims(&self) -> ClaimMap {
        self.committed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::RawTask;

    fn task(id: i64, duration: f64, resources: &[&str]) -> Task {
        RawTask::new(id, format!("Task {id}"))
            .with_duration(duration)
            .with_resources(resources.iter().copied())
            .into_task()
            .unwrap()
    }

    #[test]
    fn test_commit_accumulates() {
        let mut ledger = ResourceLedger::new();
        assert!(ledger.is_empty());

        ledger.commit(&task(1, 2.0, &["arm", "speaker"]));
        ledger.commit(&task(2, 1.5, &["arm"]));
        ledger.commit(&task(3, 4.0, &[]));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.committed("arm"), Some(3.5));
        assert_eq!(ledger.committed("speaker"), Some(2.0));
        assert_eq!(ledger.committed("legs"), None);
    }

    #[test]
    fn test_release_is_explicit() {
        let mut ledger = ResourceLedger::new();
        ledger.commit(&task(1, 2.0, &["arm"]));

        assert_eq!(ledger.release("arm"), Some(2.0));
        assert!(!ledger.contains("arm"));
        assert_eq!(ledger.release("arm"), None);
    }

    #[test]
    fn test_as_claims_mirrors_commitments() {
        let mut ledger = ResourceLedger::new();
        ledger.commit(&task(1, 3.0, &["leds"]));

        let claims = ledger.as_claims();
        assert_eq!(claims.get("leds"), Some(&3.0));
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec![("leds", 3.0)]);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut ledger = ResourceLedger::new();
        ledger.commit(&task(1, 2.0, &["arm"]));

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json, serde_json::json!({"arm": 2.0}));
    }
}
