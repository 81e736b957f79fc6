use crate::calendar::WorkCalendar;
use crate::errors::ScheduleResult;
use crate::graph::DependencyGraph;
use crate::task::{Task, TaskId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Computed dates of a task. `None` means unscheduled, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDates {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl EffectiveDates {
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some()
    }
}

/// Pull-based date derivation.
///
/// The memo lives as long as the resolver, which callers create per read
/// call; it is never carried across mutations.
pub struct DateResolver<'a> {
    tasks: &'a HashMap<TaskId, Task>,
    graph: &'a DependencyGraph,
    calendar: &'a WorkCalendar,
    memo: HashMap<TaskId, EffectiveDates>,
}

impl<'a> DateResolver<'a> {
    pub fn new(
        tasks: &'a HashMap<TaskId, Task>,
        graph: &'a DependencyGraph,
        calendar: &'a WorkCalendar,
    ) -> Self {
        Self {
            tasks,
            graph,
            calendar,
            memo: HashMap::new(),
        }
    }

    pub fn effective_start(&mut self, task: TaskId) -> Option<NaiveDate> {
        self.resolve(task).start
    }

    pub fn effective_end(&mut self, task: TaskId) -> Option<NaiveDate> {
        self.resolve(task).end
    }

    /// Resolves `task` and whatever part of its predecessor closure is not
    /// memoized yet. Uses an explicit stack so long chains cannot overflow.
    pub fn resolve(&mut self, task: TaskId) -> EffectiveDates {
        if let Some(dates) = self.memo.get(&task) {
            return *dates;
        }

        let mut stack: Vec<(TaskId, bool)> = vec![(task, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.memo.contains_key(&id) {
                continue;
            }
            if expanded {
                let dates = self.compute(id);
                self.memo.insert(id, dates);
            } else {
                stack.push((id, true));
                for pred in self.graph.predecessors_of(id) {
                    if !self.memo.contains_key(&pred) {
                        stack.push((pred, false));
                    }
                }
            }
        }
        self.memo.get(&task).copied().unwrap_or_default()
    }

    /// Resolves every task in topological order and hands back the memo.
    pub fn resolve_all(mut self) -> ScheduleResult<HashMap<TaskId, EffectiveDates>> {
        for id in self.graph.topological_order()? {
            if !self.memo.contains_key(&id) {
                let dates = self.compute(id);
                self.memo.insert(id, dates);
            }
        }
        Ok(self.memo)
    }

    /// Assumes every predecessor of `id` is already memoized.
    fn compute(&self, id: TaskId) -> EffectiveDates {
        let Some(task) = self.tasks.get(&id) else {
            return EffectiveDates::default();
        };

        let latest_pred_end = self
            .graph
            .predecessors_of(id)
            .iter()
            .filter_map(|pred| self.memo.get(pred).and_then(|dates| dates.end))
            .max();

        let start = match latest_pred_end {
            Some(end) => self.calendar.next_business_day(end),
            None => task.start_date,
        };
        // a span that runs off the calendar leaves the task unscheduled
        let Some((start, end)) = start.and_then(|start| {
            let end = self.calendar.add_business_days(start, task.duration_days)?;
            Some((start, end))
        }) else {
            return EffectiveDates::default();
        };
        EffectiveDates {
            start: Some(start),
            end: Some(end),
        }
    }
}
