use crate::task::arbiter::{ClaimMap, ResourceArbiter};
use crate::task::graph::TaskGraph;
use crate::task::plan::Plan;
use crate::task::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashSet};
use tracing::{debug, info, warn};

/// Resolution at which `f` values are compared. Summing the same durations in
/// different orders must not reorder nodes of equal cost.
const COST_RESOLUTION: f64 = 1_000_000.0;

/// Best-first search over partial schedules
pub struct TaskScheduler {
    config: SchedulerConfig,
}

/// Scheduler configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Nodes the search may expand before giving up
    pub max_expansions: usize,
}

/// One candidate partial schedule
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub path: Vec<TaskId>,
    /// Sum of durations of tasks in `path`
    pub g: f64,
    /// Sum of durations of tasks not in `path`
    pub h: f64,
    pub claims: ClaimMap,
}

/// Frontier entry ordered by ascending cost, then lowest task-id sequence.
///
/// Every node carries the same `f` (the graph's total duration), so in
/// practice the path comparison decides the order: the search walks depth
/// first, preferring the lowest ready id and backtracking on resource
/// conflicts.
#[derive(Debug)]
struct Frontier {
    cost: i64,
    node: SearchNode,
}

impl SearchNode {
    /// Empty schedule with every task still ahead of it
    pub fn root(graph: &TaskGraph, claims: ClaimMap) -> Self {
        Self {
            path: Vec::new(),
            g: 0.0,
            h: graph.tasks().map(|task| task.duration).sum(),
            claims,
        }
    }

    pub fn f(&self) -> f64 {
        self.g + self.h
    }

    pub fn is_complete(&self, graph: &TaskGraph) -> bool {
        self.path.len() == graph.len()
    }

    /// Extend the schedule by every task that is ready and can claim its resources
    pub fn successors(&self, graph: &TaskGraph) -> Vec<SearchNode> {
        let scheduled: BTreeSet<TaskId> = self.path.iter().copied().collect();

        graph
            .tasks()
            .filter(|task| !scheduled.contains(&task.id))
            .filter(|task| task.depends.iter().all(|dep| scheduled.contains(dep)))
            .filter(|task| ResourceArbiter::can_claim(task, &self.claims))
            .map(|task| {
                let mut path = self.path.clone();
                path.push(task.id);

                let h = graph
                    .tasks()
                    .filter(|other| other.id != task.id && !scheduled.contains(&other.id))
                    .map(|other| other.duration)
                    .sum();

                SearchNode {
                    path,
                    g: self.g + task.duration,
                    h,
                    claims: ResourceArbiter::claim(task, &self.claims),
                }
            })
            .collect()
    }

    /// Order-independent identity of the scheduled set
    fn scheduled_key(&self) -> Vec<TaskId> {
        let mut key = self.path.clone();
        key.sort_unstable();
        key
    }
}

impl Frontier {
    fn new(node: SearchNode) -> Self {
        Self {
            cost: (node.f() * COST_RESOLUTION).round() as i64,
            node,
        }
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.node.path.cmp(&other.node.path))
    }
}

impl TaskScheduler {
    /// Create a new task scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Order every task of the graph, or fail if no valid ordering exists
    pub fn find_plan(&self, graph: &TaskGraph) -> Result<Plan, SchedulingFailure> {
        self.find_plan_with_claims(graph, ClaimMap::new())
    }

    /// Search starting from resources that are already claimed
    pub fn find_plan_with_claims(
        &self,
        graph: &TaskGraph,
        seed: ClaimMap,
    ) -> Result<Plan, SchedulingFailure> {
        let mut frontier = BinaryHeap::new();
        let mut expanded: HashSet<Vec<TaskId>> = HashSet::new();
        let mut expansions = 0usize;
        let mut deepest = 0usize;

        frontier.push(Reverse(Frontier::new(SearchNode::root(graph, seed))));

        while let Some(Reverse(Frontier { node, .. })) = frontier.pop() {
            if node.is_complete(graph) {
                let plan = self.materialize(graph, &node)?;
                info!(
                    "Found plan for {} tasks after {} expansions (f = {:.2})",
                    plan.len(),
                    expansions,
                    node.f()
                );
                return Ok(plan);
            }

            if !expanded.insert(node.scheduled_key()) {
                continue;
            }

            expansions += 1;
            if expansions > self.config.max_expansions {
                warn!(
                    "Plan search hit the expansion limit of {}",
                    self.config.max_expansions
                );
                return Err(SchedulingFailure::ExpansionLimit {
                    limit: self.config.max_expansions,
                });
            }

            deepest = deepest.max(node.path.len());

            let successors = node.successors(graph);
            debug!(
                "Expanding partial schedule {:?}: {} successors",
                node.path,
                successors.len()
            );

            for successor in successors {
                frontier.push(Reverse(Frontier::new(successor)));
            }
        }

        warn!(
            "Plan search exhausted after {} expansions; best partial schedule covered {} of {} tasks",
            expansions,
            deepest,
            graph.len()
        );
        Err(SchedulingFailure::Exhausted {
            scheduled: deepest,
            total: graph.len(),
            expansions,
        })
    }

    fn materialize(&self, graph: &TaskGraph, node: &SearchNode) -> Result<Plan, SchedulingFailure> {
        // Every id in a path came out of the graph, so lookups cannot miss.
        let tasks = node
            .path
            .iter()
            .filter_map(|&id| graph.get_task(id).ok().cloned())
            .collect::<Vec<_>>();

        if tasks.len() != graph.len() {
            return Err(SchedulingFailure::Exhausted {
                scheduled: tasks.len(),
                total: graph.len(),
                expansions: 0,
            });
        }

        Ok(Plan::new(tasks))
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 100_000,
        }
    }
}

/// Validate a raw task list and search it for a plan in one step
pub fn plan_tasks(raw: Vec<RawTask>, config: &SchedulerConfig) -> Result<Plan, PlanningError> {
    let graph = TaskGraph::build(raw)?;
    let plan = TaskScheduler::new(config.clone()).find_plan(&graph)?;
    Ok(plan)
}
