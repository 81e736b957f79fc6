use crate::calculations::progress::{campaign_progress, sprint_progress, task_progress};
use crate::calculations::{DateResolver, EffectiveDates};
use crate::errors::{ScheduleError, ScheduleResult};
use crate::schedule::Schedule;
use crate::task::{Campaign, CampaignId, Sprint, SprintId, Task, TaskId};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// Which node of the hierarchy a timeline is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum TimelineScope {
    All,
    Campaign(CampaignId),
    Sprint(SprintId),
}

/// One Gantt row. Serializes as the chart's 8-element array:
/// `[id, label, resource, start, end, null, percent, dependencies]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    pub row_id: String,
    pub label: String,
    pub resource: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub percent_complete: u8,
    /// Comma-joined predecessor row ids; only task rows carry these.
    pub dependencies: Option<String>,
}

impl Serialize for TimelineRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(8)?;
        tuple.serialize_element(&self.row_id)?;
        tuple.serialize_element(&self.label)?;
        tuple.serialize_element(&self.resource)?;
        tuple.serialize_element(&self.start)?;
        tuple.serialize_element(&self.end)?;
        tuple.serialize_element(&Option::<i64>::None)?;
        tuple.serialize_element(&self.percent_complete)?;
        tuple.serialize_element(&self.dependencies)?;
        tuple.end()
    }
}

/// Projects the hierarchy into timeline rows.
///
/// Dates are resolved once per projector and shared by every row, so a
/// projector must not outlive the read call that created it.
pub struct TimelineProjector<'a> {
    schedule: &'a Schedule,
    dates: HashMap<TaskId, EffectiveDates>,
    today: NaiveDate,
}

impl<'a> TimelineProjector<'a> {
    pub fn new(schedule: &'a Schedule, today: NaiveDate) -> ScheduleResult<Self> {
        let dates = DateResolver::new(schedule.task_map(), schedule.graph(), schedule.calendar())
            .resolve_all()?;
        Ok(Self {
            schedule,
            dates,
            today,
        })
    }

    pub fn project(&self, scope: TimelineScope) -> ScheduleResult<Vec<TimelineRow>> {
        let rows = match scope {
            TimelineScope::All => self.campaign_rows(),
            TimelineScope::Campaign(id) => {
                let campaign = self
                    .schedule
                    .campaign(id)
                    .ok_or(ScheduleError::UnknownCampaign(id))?;
                self.sprint_rows(campaign)
            }
            TimelineScope::Sprint(id) => {
                let sprint = self
                    .schedule
                    .sprint(id)
                    .ok_or(ScheduleError::UnknownSprint(id))?;
                self.task_rows(sprint)
            }
        };
        debug!(?scope, rows = rows.len(), "projected timeline");
        Ok(rows)
    }

    pub fn dates_of(&self, task: TaskId) -> EffectiveDates {
        self.dates.get(&task).copied().unwrap_or_default()
    }

    fn campaign_rows(&self) -> Vec<TimelineRow> {
        let campaigns: Vec<&Campaign> = self.schedule.campaigns().collect();
        campaigns
            .par_iter()
            .map(|campaign| {
                let tasks: Vec<&Task> = self.schedule.tasks_of_campaign(campaign.id).collect();
                self.aggregate_row(
                    campaign.id,
                    &campaign.name,
                    &campaign.name,
                    &tasks,
                    campaign_progress(tasks.iter().copied()),
                )
            })
            .collect()
    }

    fn sprint_rows(&self, campaign: &Campaign) -> Vec<TimelineRow> {
        self.schedule
            .sprints_of(campaign.id)
            .map(|sprint| {
                let tasks: Vec<&Task> = self.schedule.tasks_of_sprint(sprint.id).collect();
                self.aggregate_row(
                    sprint.id,
                    &sprint.name,
                    &campaign.name,
                    &tasks,
                    sprint_progress(tasks.iter().copied()),
                )
            })
            .collect()
    }

    fn task_rows(&self, sprint: &Sprint) -> Vec<TimelineRow> {
        self.schedule
            .tasks_of_sprint(sprint.id)
            .map(|task| {
                let dates = self.dates_of(task.id);
                let (start, end) = match (dates.start, dates.end) {
                    (Some(start), Some(end)) => (start, end),
                    _ => self.fallback_span(task.duration_days),
                };
                let preds = self.schedule.graph().predecessors_of(task.id);
                let dependencies = (!preds.is_empty()).then(|| {
                    preds
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                });
                TimelineRow {
                    row_id: task.id.to_string(),
                    label: task.name.clone(),
                    resource: task.resource.clone(),
                    start,
                    end,
                    percent_complete: task_progress(task),
                    dependencies,
                }
            })
            .collect()
    }

    fn aggregate_row(
        &self,
        id: i32,
        label: &str,
        resource: &str,
        tasks: &[&Task],
        percent: u8,
    ) -> TimelineRow {
        let (start, end, percent_complete) = match self.span(tasks) {
            Some((start, end)) => (start, end, percent),
            None => {
                let (start, end) = self.fallback_span(1);
                (start, end, 0)
            }
        };
        TimelineRow {
            row_id: id.to_string(),
            label: label.to_string(),
            resource: resource.to_string(),
            start,
            end,
            percent_complete,
            dependencies: None,
        }
    }

    /// Earliest start and latest end over the tasks that resolve.
    fn span(&self, tasks: &[&Task]) -> Option<(NaiveDate, NaiveDate)> {
        tasks
            .iter()
            .filter_map(|task| {
                let dates = self.dates.get(&task.id)?;
                Some((dates.start?, dates.end?))
            })
            .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
    }

    /// Anchored at the first business day from `today`. Near the end of the
    /// representable range the span collapses onto its start.
    fn fallback_span(&self, duration_days: i64) -> (NaiveDate, NaiveDate) {
        let calendar = self.schedule.calendar();
        let start = calendar.next_business_day(self.today).unwrap_or(self.today);
        let end = calendar
            .add_business_days(start, duration_days)
            .unwrap_or(start);
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn row_serializes_as_chart_array() {
        let row = TimelineRow {
            row_id: "7".into(),
            label: "Wiring".into(),
            resource: "Internal".into(),
            start: d(2024, 1, 1),
            end: d(2024, 1, 3),
            percent_complete: 100,
            dependencies: Some("3,5".into()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["7", "Wiring", "Internal", "2024-01-01", "2024-01-03", null, 100, "3,5"])
        );
    }

    #[test]
    fn scope_round_trips_through_json() {
        let json = serde_json::to_string(&TimelineScope::Sprint(4)).unwrap();
        assert_eq!(json, r#"{"scope":"sprint","id":4}"#);
        let all: TimelineScope = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert_eq!(all, TimelineScope::All);
    }
}
