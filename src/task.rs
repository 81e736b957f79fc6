use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TaskId = i32;
pub type SprintId = i32;
pub type CampaignId = i32;
pub type OwnerId = i32;

pub const DEFAULT_RESOURCE: &str = "Internal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_start_date: Option<NaiveDate>,
    /// Sprints in creation order.
    #[serde(skip)]
    pub sprint_ids: Vec<SprintId>,
}

impl Campaign {
    pub fn new(id: CampaignId, name: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            completed: false,
            proposed_start_date: None,
            sprint_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: SprintId,
    pub campaign_id: CampaignId,
    pub name: String,
    /// Tasks in creation order.
    #[serde(skip)]
    pub task_ids: Vec<TaskId>,
}

impl Sprint {
    pub fn new(id: SprintId, campaign_id: CampaignId, name: impl Into<String>) -> Self {
        Self {
            id,
            campaign_id,
            name: name.into(),
            task_ids: Vec::new(),
        }
    }
}

/// A unit of work. Predecessors live in the dependency graph, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub sprint_id: SprintId,
    pub name: String,
    /// Explicit start date; authoritative only while no predecessor resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub duration_days: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Chart lane, e.g. the contractor type.
    pub resource: String,
    #[serde(default)]
    pub group_ids: Vec<i32>,
    #[serde(default)]
    pub assignee_ids: Vec<i32>,
}

impl Task {
    pub fn new(
        id: TaskId,
        sprint_id: SprintId,
        name: impl Into<String>,
        duration_days: i64,
    ) -> Self {
        Self {
            id,
            sprint_id,
            name: name.into(),
            start_date: None,
            duration_days,
            completed: false,
            comments: None,
            resource: DEFAULT_RESOURCE.to_string(),
            group_ids: Vec::new(),
            assignee_ids: Vec::new(),
        }
    }
}

/// Payload of the task save entry point. `id: None` creates a new task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub id: Option<TaskId>,
    pub sprint_id: SprintId,
    pub name: String,
    pub duration_days: i64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub predecessor_ids: Vec<TaskId>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub comments: Option<String>,
    /// Falls back to the configured default lane.
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub group_ids: Vec<i32>,
    #[serde(default)]
    pub assignee_ids: Vec<i32>,
}

impl TaskInput {
    pub fn new(sprint_id: SprintId, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            sprint_id,
            name: name.into(),
            duration_days,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn after(mut self, predecessors: impl IntoIterator<Item = TaskId>) -> Self {
        self.predecessor_ids = predecessors.into_iter().collect();
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}
