use crate::task::types::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Validated, immutable index over one planning request's tasks
#[derive(Clone, Debug)]
pub struct TaskGraph {
    /// All tasks indexed by ID, iterated in ascending id order
    tasks: BTreeMap<TaskId, Task>,
    total_duration: f64,
}

impl TaskGraph {
    /// Validate a raw task list and index it.
    ///
    /// Rejects duplicate ids, dependencies on ids outside the list, invalid
    /// durations and dependency cycles.
    pub fn build(raw: Vec<RawTask>) -> Result<Self, GraphError> {
        let tasks = raw
            .into_iter()
            .map(RawTask::into_task)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tasks(tasks)
    }

    /// Index tasks that are already in their validated form
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, GraphError> {
        let graph = Self::index(tasks)?;
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Same as [`TaskGraph::build`] minus the cycle check.
    ///
    /// A cyclic graph built this way makes the scheduler exhaust its search
    /// instead of reporting the cycle.
    pub fn build_without_cycle_check(raw: Vec<RawTask>) -> Result<Self, GraphError> {
        let tasks = raw
            .into_iter()
            .map(RawTask::into_task)
            .collect::<Result<Vec<_>, _>>()?;
        Self::index(tasks)
    }

    fn index(tasks: Vec<Task>) -> Result<Self, GraphError> {
        let mut indexed = BTreeMap::new();

        for task in tasks {
            if !task.duration.is_finite() || task.duration < 0.0 {
                return Err(GraphError::InvalidDuration {
                    task: task.id,
                    value: task.duration.to_string(),
                });
            }
            if let Some(existing) = indexed.insert(task.id, task) {
                return Err(GraphError::DuplicateId(existing.id));
            }
        }

        for task in indexed.values() {
            let unknown = task
                .depends
                .iter()
                .find(|&&dep| !indexed.contains_key(&dep));
            if let Some(&dependency) = unknown {
                return Err(GraphError::UnknownDependency {
                    task: task.id,
                    dependency,
                });
            }
        }

        let total_duration = indexed.values().map(|task| task.duration).sum();

        debug!(
            "Indexed {} tasks with total duration {:.2}s",
            indexed.len(),
            total_duration
        );

        Ok(Self {
            tasks: indexed,
            total_duration,
        })
    }

    /// Kahn's algorithm; whatever cannot be peeled off sits on or behind a cycle
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut in_degree: BTreeMap<TaskId, usize> = self
            .tasks
            .values()
            .map(|task| (task.id, task.depends.len()))
            .collect();

        let mut dependents: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
        for task in self.tasks.values() {
            for &dep in &task.depends {
                dependents.entry(dep).or_default().push(task.id);
            }
        }

        let mut ready: VecDeque<TaskId> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut resolved = 0;

        while let Some(id) = ready.pop_front() {
            resolved += 1;
            for dependent in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*dependent);
                    }
                }
            }
        }

        if resolved == self.tasks.len() {
            return Ok(());
        }

        let cycle = in_degree
            .into_iter()
            .filter(|&(_, degree)| degree > 0)
            .map(|(id, _)| id)
            .collect();
        Err(GraphError::CyclicDependency { cycle })
    }

    /// Get a task by ID
    pub fn get_task(&self, task_id: TaskId) -> Result<&Task, GraphError> {
        self.tasks
            .get(&task_id)
            .ok_or(GraphError::NotFound(task_id))
    }

    /// Direct prerequisites of a task (not transitively closed)
    pub fn dependencies(&self, task_id: TaskId) -> Result<&BTreeSet<TaskId>, GraphError> {
        self.get_task(task_id).map(|task| &task.depends)
    }

    /// Resource names a task claims when scheduled
    pub fn resources(&self, task_id: TaskId) -> Result<&BTreeSet<String>, GraphError> {
        self.get_task(task_id).map(|task| &task.resources)
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.contains_key(&task_id)
    }

    /// All task IDs in ascending order
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// All tasks in ascending id order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sum of every task's duration
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}
