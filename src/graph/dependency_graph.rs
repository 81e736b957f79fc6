use crate::errors::ScheduleError;
use crate::task::TaskId;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Task dependencies as one directed edge set, predecessor -> follower.
///
/// The follower and predecessor views are the outgoing and incoming
/// neighbours of the same edges; nothing is stored twice.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<TaskId, ()>,
    id_to_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.id_to_index.contains_key(&task)
    }

    pub fn task_count(&self) -> usize {
        self.id_to_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Registers a task node. Adding an existing task is a no-op.
    pub fn add_task(&mut self, task: TaskId) {
        if !self.id_to_index.contains_key(&task) {
            let ix = self.graph.add_node(task);
            self.id_to_index.insert(task, ix);
        }
    }

    /// Removes a task together with every edge touching it.
    pub fn remove_task(&mut self, task: TaskId) -> bool {
        match self.id_to_index.remove(&task) {
            Some(ix) => {
                self.graph.remove_node(ix);
                true
            }
            None => false,
        }
    }

    /// Direct predecessors, ascending.
    pub fn predecessors_of(&self, task: TaskId) -> Vec<TaskId> {
        let Some(&ix) = self.id_to_index.get(&task) else {
            return Vec::new();
        };
        let mut preds: Vec<TaskId> = self
            .graph
            .neighbors_directed(ix, Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        preds.sort_unstable();
        preds
    }

    /// Direct followers. Lazy; call again to restart.
    pub fn followers_of(&self, task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.id_to_index
            .get(&task)
            .into_iter()
            .flat_map(move |&ix| self.graph.neighbors_directed(ix, Direction::Outgoing))
            .map(move |n| self.graph[n])
    }

    /// Every task that depends on `task` directly or transitively, ascending.
    pub fn transitive_followers(&self, task: TaskId) -> Vec<TaskId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<TaskId> = self.followers_of(task).collect();
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend(self.followers_of(next));
            }
        }
        let mut out: Vec<TaskId> = seen.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Sanitizes and checks a proposed predecessor set without touching the graph.
    ///
    /// The task itself is dropped from the set; duplicates collapse. Fails on
    /// unknown predecessors and on any cycle the write would introduce.
    pub fn validate_predecessors(
        &self,
        task: TaskId,
        proposed: &[TaskId],
    ) -> Result<Vec<TaskId>, ScheduleError> {
        let mut preds: Vec<TaskId> = proposed.iter().copied().filter(|&p| p != task).collect();
        preds.sort_unstable();
        preds.dedup();

        if let Some(&missing) = preds.iter().find(|p| !self.contains(**p)) {
            return Err(ScheduleError::UnknownTask(missing));
        }

        if let Some(predecessor) = self.find_cycle(task, &preds) {
            return Err(ScheduleError::CycleDetected { task, predecessor });
        }
        Ok(preds)
    }

    /// Replaces the incoming edge set of `task`. All or nothing.
    pub fn set_predecessors(
        &mut self,
        task: TaskId,
        proposed: &[TaskId],
    ) -> Result<Vec<TaskId>, ScheduleError> {
        let preds = self.validate_predecessors(task, proposed)?;
        self.add_task(task);
        let ix = self.id_to_index[&task];

        let stale: Vec<_> = self
            .graph
            .edges_directed(ix, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }
        for pred in &preds {
            let pred_ix = self.id_to_index[pred];
            self.graph.add_edge(pred_ix, ix, ());
        }
        Ok(preds)
    }

    /// Predecessors always come before their followers.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, ScheduleError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            ScheduleError::Graph(format!(
                "cycle detected at task {}",
                self.graph[cycle.node_id()]
            ))
        })?;
        Ok(order.into_iter().map(|ix| self.graph[ix]).collect())
    }

    /// Depth-first walk from `task` along predecessor edges, with `proposed`
    /// standing in for the task's current predecessors. Returns the direct
    /// predecessor through which `task`, or any node still on the stack, is
    /// reached again.
    fn find_cycle(&self, task: TaskId, proposed: &[TaskId]) -> Option<TaskId> {
        let preds_of = |id: TaskId| -> Vec<TaskId> {
            if id == task {
                proposed.to_vec()
            } else {
                self.predecessors_of(id)
            }
        };

        let mut marks: HashMap<TaskId, Mark> = HashMap::new();
        marks.insert(task, Mark::Visiting);
        let mut stack: Vec<(TaskId, Vec<TaskId>, usize)> = vec![(task, preds_of(task), 0)];

        loop {
            let next = match stack.last_mut() {
                None => break,
                Some((_, preds, cursor)) if *cursor < preds.len() => {
                    let next = preds[*cursor];
                    *cursor += 1;
                    Some(next)
                }
                Some(_) => None,
            };

            match next {
                Some(next) => match marks.get(&next).copied() {
                    Some(Mark::Visiting) => {
                        let via = stack.get(1).map(|frame| frame.0).unwrap_or(next);
                        return Some(via);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::Visiting);
                        stack.push((next, preds_of(next), 0));
                    }
                },
                None => {
                    if let Some((done, _, _)) = stack.pop() {
                        marks.insert(done, Mark::Done);
                    }
                }
            }
        }
        None
    }
}
