use crate::task::Task;

pub fn task_progress(task: &Task) -> u8 {
    if task.completed { 100 } else { 0 }
}

/// Truncating percentage of completed tasks; 0 for an empty set.
pub fn completion_percent<'a, I>(tasks: I) -> u8
where
    I: IntoIterator<Item = &'a Task>,
{
    let (done, total) = tasks
        .into_iter()
        .fold((0usize, 0usize), |(done, total), task| {
            (done + usize::from(task.completed), total + 1)
        });
    if total == 0 {
        return 0;
    }
    // done <= total, so the quotient is at most 100
    u8::try_from(done * 100 / total).unwrap_or(100)
}

pub fn sprint_progress<'a, I>(tasks: I) -> u8
where
    I: IntoIterator<Item = &'a Task>,
{
    completion_percent(tasks)
}

/// Same formula over the union of every sprint's tasks, not an average of
/// sprint percentages.
pub fn campaign_progress<'a, I>(tasks: I) -> u8
where
    I: IntoIterator<Item = &'a Task>,
{
    completion_percent(tasks)
}
