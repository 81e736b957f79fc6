use super::{PersistenceError, PersistenceResult};
use crate::config::ScheduleConfig;
use crate::schedule::Schedule;
use crate::task::{Campaign, Sprint, Task, TaskId, TaskInput};
use crate::task_validation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// A task plus its predecessor ids, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub predecessors: Vec<TaskId>,
}

/// Whole-hierarchy snapshot. Effective dates are never stored; they are
/// recomputed after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub config: ScheduleConfig,
    pub campaigns: Vec<Campaign>,
    pub sprints: Vec<Sprint>,
    pub tasks: Vec<TaskSnapshot>,
}

impl ScheduleSnapshot {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let campaigns: Vec<Campaign> = schedule.campaigns().cloned().collect();
        let sprints = campaigns
            .iter()
            .flat_map(|c| schedule.sprints_of(c.id))
            .cloned()
            .collect();
        let tasks = schedule
            .tasks()
            .map(|task| TaskSnapshot {
                task: task.clone(),
                predecessors: schedule.predecessors_of(task.id),
            })
            .collect();
        Self {
            config: schedule.config().clone(),
            campaigns,
            sprints,
            tasks,
        }
    }

    /// Rebuilds a schedule through the validated entry points.
    ///
    /// Tasks are created first and wired second, so predecessor order on disk
    /// does not matter, while a stored cycle is still rejected.
    pub fn into_schedule(self) -> PersistenceResult<Schedule> {
        let tasks: Vec<Task> = self.tasks.iter().map(|t| t.task.clone()).collect();
        task_validation::validate_task_collection(&tasks)?;
        check_unique("sprint", self.sprints.iter().map(|s| s.id))?;

        let mut schedule = Schedule::with_config(self.config)?;
        for campaign in self.campaigns {
            schedule.insert_campaign(campaign)?;
        }
        for sprint in self.sprints {
            schedule.insert_sprint(sprint)?;
        }
        for record in &self.tasks {
            schedule.upsert_task(input_from_task(&record.task))?;
        }
        for record in &self.tasks {
            if !record.predecessors.is_empty() {
                schedule.set_predecessors(record.task.id, &record.predecessors)?;
            }
        }
        debug!(tasks = schedule.task_count(), "loaded snapshot");
        Ok(schedule)
    }
}

fn input_from_task(task: &Task) -> TaskInput {
    TaskInput {
        id: Some(task.id),
        sprint_id: task.sprint_id,
        name: task.name.clone(),
        duration_days: task.duration_days,
        start_date: task.start_date,
        predecessor_ids: Vec::new(),
        completed: task.completed,
        comments: task.comments.clone(),
        resource: Some(task.resource.clone()),
        group_ids: task.group_ids.clone(),
        assignee_ids: task.assignee_ids.clone(),
    }
}

fn check_unique(kind: &str, ids: impl Iterator<Item = i32>) -> PersistenceResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate {kind} id {id}"
            )));
        }
    }
    Ok(())
}

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = ScheduleSnapshot::from_schedule(schedule);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let snapshot: ScheduleSnapshot = serde_json::from_reader(BufReader::new(file))?;
    snapshot.into_schedule()
}
