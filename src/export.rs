//! Flat data shapes handed to file exporters and table renderers.
//!
//! Writing CSV or XML is the exporter's job; this module only fixes the
//! columns and their order.

use crate::calculations::EffectiveDates;
use crate::task::{Task, TaskId};
use crate::timeline::TimelineRow;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Completed,
    Active,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "Completed",
            TaskStatus::Active => "Active",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported task. Field names match the export header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "Task ID")]
    pub id: TaskId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Start")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "End")]
    pub end: Option<NaiveDate>,
    #[serde(rename = "Duration")]
    pub duration_days: i64,
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Status")]
    pub status: TaskStatus,
    #[serde(rename = "Comments")]
    pub comments: String,
}

impl ExportRecord {
    pub fn new(task: &Task, dates: EffectiveDates) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            start: dates.start,
            end: dates.end,
            duration_days: task.duration_days,
            resource: task.resource.clone(),
            status: if task.completed {
                TaskStatus::Completed
            } else {
                TaskStatus::Active
            },
            comments: task.comments.clone().unwrap_or_default(),
        }
    }
}

pub fn records_to_dataframe(records: &[ExportRecord]) -> PolarsResult<DataFrame> {
    let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let starts: Vec<Option<i32>> = records.iter().map(|r| r.start.map(date_to_i32)).collect();
    let ends: Vec<Option<i32>> = records.iter().map(|r| r.end.map(date_to_i32)).collect();
    let durations: Vec<i64> = records.iter().map(|r| r.duration_days).collect();
    let resources: Vec<&str> = records.iter().map(|r| r.resource.as_str()).collect();
    let statuses: Vec<&str> = records.iter().map(|r| r.status.as_str()).collect();
    let comments: Vec<&str> = records.iter().map(|r| r.comments.as_str()).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("end"), ends)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("duration"), durations).into_column(),
        Series::new(PlSmallStr::from_static("resource"), resources).into_column(),
        Series::new(PlSmallStr::from_static("status"), statuses).into_column(),
        Series::new(PlSmallStr::from_static("comments"), comments).into_column(),
    ])
}

pub fn timeline_to_dataframe(rows: &[TimelineRow]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = rows.iter().map(|r| r.row_id.as_str()).collect();
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let resources: Vec<&str> = rows.iter().map(|r| r.resource.as_str()).collect();
    let starts: Vec<i32> = rows.iter().map(|r| date_to_i32(r.start)).collect();
    let ends: Vec<i32> = rows.iter().map(|r| date_to_i32(r.end)).collect();
    let percents: Vec<i32> = rows.iter().map(|r| i32::from(r.percent_complete)).collect();
    let deps: Vec<Option<&str>> = rows.iter().map(|r| r.dependencies.as_deref()).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("label"), labels).into_column(),
        Series::new(PlSmallStr::from_static("resource"), resources).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("end"), ends)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("percent"), percents).into_column(),
        Series::new(PlSmallStr::from_static("dependencies"), deps).into_column(),
    ])
}

fn date_to_i32(date: NaiveDate) -> i32 {
    // NaiveDate::default() is the unix epoch
    (date - NaiveDate::default()).num_days() as i32
}
