use crate::task::{CampaignId, SprintId, TaskId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("task {task} cannot depend on {predecessor}: the dependency would create a cycle")]
    CycleDetected { task: TaskId, predecessor: TaskId },

    #[error("task {task} has invalid duration {duration} (must be between 1 and 10000 business days)")]
    InvalidDuration { task: TaskId, duration: i64 },

    #[error("task {0} not found")]
    UnknownTask(TaskId),

    #[error("sprint {0} not found")]
    UnknownSprint(SprintId),

    #[error("campaign {0} not found")]
    UnknownCampaign(CampaignId),

    #[error("{kind} {id} already exists")]
    DuplicateId { kind: &'static str, id: i32 },

    #[error("no {kind} ids left to allocate")]
    IdsExhausted { kind: &'static str },

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("dependency graph error: {0}")]
    Graph(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("calendar requires at least one working day")]
    NoWorkingDays,

    #[error("default resource lane must not be empty")]
    EmptyResource,

    #[error("could not read config: {0}")]
    Read(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
