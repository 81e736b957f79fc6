use crate::errors::ScheduleError;
use crate::task::{Task, TaskId, TaskInput};
use std::collections::HashSet;

pub const MIN_DURATION_DAYS: i64 = 1;
/// Roughly forty years of working days.
pub const MAX_DURATION_DAYS: i64 = 10_000;

pub fn validate_duration(task: TaskId, duration_days: i64) -> Result<(), ScheduleError> {
    if !(MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&duration_days) {
        return Err(ScheduleError::InvalidDuration {
            task,
            duration: duration_days,
        });
    }
    Ok(())
}

fn validate_name(task: TaskId, name: &str) -> Result<(), ScheduleError> {
    if name.trim().is_empty() {
        return Err(ScheduleError::InvalidTask(format!(
            "task {task} requires a non-empty name"
        )));
    }
    Ok(())
}

/// `task` is the id the input will be stored under.
pub fn validate_input(task: TaskId, input: &TaskInput) -> Result<(), ScheduleError> {
    validate_duration(task, input.duration_days)?;
    validate_name(task, &input.name)?;
    if let Some(resource) = &input.resource {
        if resource.trim().is_empty() {
            return Err(ScheduleError::InvalidTask(format!(
                "task {task} resource lane must not be blank"
            )));
        }
    }
    Ok(())
}

pub fn validate_task(task: &Task) -> Result<(), ScheduleError> {
    validate_duration(task.id, task.duration_days)?;
    validate_name(task.id, &task.name)
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(ScheduleError::InvalidTask(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
