use crate::calculations::progress::{campaign_progress, sprint_progress};
use crate::calculations::{DateResolver, EffectiveDates};
use crate::calendar::WorkCalendar;
use crate::config::ScheduleConfig;
use crate::errors::{ConfigError, ScheduleError, ScheduleResult};
use crate::export::ExportRecord;
use crate::graph::DependencyGraph;
use crate::task::{Campaign, CampaignId, OwnerId, Sprint, SprintId, Task, TaskId, TaskInput};
use crate::task_validation;
use crate::timeline::{TimelineProjector, TimelineRow, TimelineScope};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Node kinds that carry a rolled-up progress percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProgressNode {
    Campaign(CampaignId),
    Sprint(SprintId),
}

/// In-memory campaign → sprint → task hierarchy plus the dependency graph
/// between tasks. Every external entry point goes through here.
#[derive(Debug)]
pub struct Schedule {
    config: ScheduleConfig,
    calendar: WorkCalendar,
    campaigns: HashMap<CampaignId, Campaign>,
    campaign_order: Vec<CampaignId>,
    sprints: HashMap<SprintId, Sprint>,
    tasks: HashMap<TaskId, Task>,
    graph: DependencyGraph,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule {
    pub fn new() -> Self {
        let config = ScheduleConfig::default();
        Self {
            calendar: WorkCalendar::default(),
            config,
            campaigns: HashMap::new(),
            campaign_order: Vec::new(),
            sprints: HashMap::new(),
            tasks: HashMap::new(),
            graph: DependencyGraph::new(),
        }
    }

    pub fn with_config(config: ScheduleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let calendar = config.build_calendar()?;
        Ok(Self {
            calendar,
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub(crate) fn task_map(&self) -> &HashMap<TaskId, Task> {
        &self.tasks
    }

    pub fn campaign(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns.get(&id)
    }

    pub fn sprint(&self, id: SprintId) -> Option<&Sprint> {
        self.sprints.get(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Campaigns in creation order.
    pub fn campaigns(&self) -> impl Iterator<Item = &Campaign> + '_ {
        self.campaign_order
            .iter()
            .filter_map(move |id| self.campaigns.get(id))
    }

    pub fn sprints_of(&self, campaign: CampaignId) -> impl Iterator<Item = &Sprint> + '_ {
        self.campaigns
            .get(&campaign)
            .into_iter()
            .flat_map(|c| c.sprint_ids.iter())
            .filter_map(move |id| self.sprints.get(id))
    }

    pub fn tasks_of_sprint(&self, sprint: SprintId) -> impl Iterator<Item = &Task> + '_ {
        self.sprints
            .get(&sprint)
            .into_iter()
            .flat_map(|s| s.task_ids.iter())
            .filter_map(move |id| self.tasks.get(id))
    }

    pub fn tasks_of_campaign(&self, campaign: CampaignId) -> impl Iterator<Item = &Task> + '_ {
        self.sprints_of(campaign)
            .flat_map(move |sprint| self.tasks_of_sprint(sprint.id))
    }

    /// Every task, campaign by campaign, sprint by sprint.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.campaigns()
            .flat_map(move |campaign| self.tasks_of_campaign(campaign.id))
    }

    pub fn predecessors_of(&self, task: TaskId) -> Vec<TaskId> {
        self.graph.predecessors_of(task)
    }

    pub fn followers_of(&self, task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.graph.followers_of(task)
    }

    /// Incomplete tasks assigned to `assignee`, in hierarchy order.
    pub fn pending_tasks_for(&self, assignee: i32) -> Vec<&Task> {
        self.tasks()
            .filter(|task| !task.completed && task.assignee_ids.contains(&assignee))
            .collect()
    }

    pub fn add_campaign(
        &mut self,
        name: impl Into<String>,
        owner_id: OwnerId,
    ) -> ScheduleResult<CampaignId> {
        let id = next_id("campaign", self.campaigns.keys())?;
        self.campaigns.insert(id, Campaign::new(id, name, owner_id));
        self.campaign_order.push(id);
        debug!(campaign = id, "added campaign");
        Ok(id)
    }

    /// Inserts a campaign under its own id. Any sprint ids it carries are
    /// dropped; sprints attach themselves through `insert_sprint`.
    pub fn insert_campaign(&mut self, mut campaign: Campaign) -> ScheduleResult<CampaignId> {
        if self.campaigns.contains_key(&campaign.id) {
            return Err(ScheduleError::DuplicateId {
                kind: "campaign",
                id: campaign.id,
            });
        }
        campaign.sprint_ids.clear();
        let id = campaign.id;
        self.campaigns.insert(id, campaign);
        self.campaign_order.push(id);
        Ok(id)
    }

    pub fn rename_campaign(&mut self, id: CampaignId, name: impl Into<String>) -> ScheduleResult<()> {
        self.campaign_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_campaign_completed(&mut self, id: CampaignId, completed: bool) -> ScheduleResult<()> {
        self.campaign_mut(id)?.completed = completed;
        Ok(())
    }

    pub fn set_campaign_start_date(
        &mut self,
        id: CampaignId,
        date: Option<NaiveDate>,
    ) -> ScheduleResult<()> {
        self.campaign_mut(id)?.proposed_start_date = date;
        Ok(())
    }

    /// Deletes a campaign and everything under it.
    pub fn delete_campaign(&mut self, id: CampaignId) -> ScheduleResult<()> {
        let sprint_ids = self.campaign_mut(id)?.sprint_ids.clone();
        for sprint in sprint_ids {
            self.delete_sprint(sprint)?;
        }
        self.campaigns.remove(&id);
        self.campaign_order.retain(|c| *c != id);
        debug!(campaign = id, "deleted campaign");
        Ok(())
    }

    pub fn add_sprint(&mut self, campaign: CampaignId, name: impl Into<String>) -> ScheduleResult<SprintId> {
        let id = next_id("sprint", self.sprints.keys())?;
        self.insert_sprint(Sprint::new(id, campaign, name))
    }

    /// Inserts a sprint under its own id, appended to its campaign.
    pub fn insert_sprint(&mut self, mut sprint: Sprint) -> ScheduleResult<SprintId> {
        if self.sprints.contains_key(&sprint.id) {
            return Err(ScheduleError::DuplicateId {
                kind: "sprint",
                id: sprint.id,
            });
        }
        let id = sprint.id;
        self.campaign_mut(sprint.campaign_id)?.sprint_ids.push(id);
        sprint.task_ids.clear();
        debug!(sprint = id, campaign = sprint.campaign_id, "added sprint");
        self.sprints.insert(id, sprint);
        Ok(id)
    }

    pub fn rename_sprint(&mut self, id: SprintId, name: impl Into<String>) -> ScheduleResult<()> {
        self.sprint_mut(id)?.name = name.into();
        Ok(())
    }

    /// Deletes a sprint and its tasks.
    pub fn delete_sprint(&mut self, id: SprintId) -> ScheduleResult<()> {
        let task_ids = self.sprint_mut(id)?.task_ids.clone();
        for task in task_ids {
            self.delete_task(task)?;
        }
        if let Some(sprint) = self.sprints.remove(&id) {
            if let Some(campaign) = self.campaigns.get_mut(&sprint.campaign_id) {
                campaign.sprint_ids.retain(|s| *s != id);
            }
        }
        debug!(sprint = id, "deleted sprint");
        Ok(())
    }

    /// Deep-copies a campaign for `acting_owner`.
    ///
    /// Edges between copied tasks are remapped onto the copies; edges to tasks
    /// outside the campaign point at the same external tasks. Completion
    /// flags start cleared.
    pub fn clone_campaign(
        &mut self,
        source: CampaignId,
        acting_owner: OwnerId,
    ) -> ScheduleResult<CampaignId> {
        let original = self
            .campaigns
            .get(&source)
            .cloned()
            .ok_or(ScheduleError::UnknownCampaign(source))?;
        let task_count = original
            .sprint_ids
            .iter()
            .filter_map(|id| self.sprints.get(id))
            .map(|sprint| sprint.task_ids.len())
            .sum();
        ensure_ids_left("campaign", self.campaigns.keys(), 1)?;
        ensure_ids_left("sprint", self.sprints.keys(), original.sprint_ids.len())?;
        ensure_ids_left("task", self.tasks.keys(), task_count)?;

        let copy_id = self.add_campaign(format!("{} (copy)", original.name), acting_owner)?;
        self.campaign_mut(copy_id)?.proposed_start_date = original.proposed_start_date;

        let mut task_map: HashMap<TaskId, TaskId> = HashMap::new();
        let mut copied: Vec<(TaskId, TaskId)> = Vec::new();
        for sprint_id in &original.sprint_ids {
            let Some(sprint) = self.sprints.get(sprint_id).cloned() else {
                continue;
            };
            let new_sprint = self.add_sprint(copy_id, sprint.name.clone())?;
            for task_id in &sprint.task_ids {
                let Some(task) = self.tasks.get(task_id).cloned() else {
                    continue;
                };
                let new_id = next_id("task", self.tasks.keys())?;
                let mut clone = task;
                clone.id = new_id;
                clone.sprint_id = new_sprint;
                clone.completed = false;
                self.sprint_mut(new_sprint)?.task_ids.push(new_id);
                self.tasks.insert(new_id, clone);
                self.graph.add_task(new_id);
                task_map.insert(*task_id, new_id);
                copied.push((*task_id, new_id));
            }
        }

        for (old_id, new_id) in copied {
            let preds: Vec<TaskId> = self
                .graph
                .predecessors_of(old_id)
                .into_iter()
                .map(|p| task_map.get(&p).copied().unwrap_or(p))
                .collect();
            self.graph.set_predecessors(new_id, &preds)?;
        }

        debug!(source, copy = copy_id, owner = acting_owner, "cloned campaign");
        Ok(copy_id)
    }

    /// Creates or fully replaces a task, including its predecessor set.
    ///
    /// Everything is validated before anything is written, so a rejected
    /// save leaves the schedule exactly as it was.
    pub fn upsert_task(&mut self, input: TaskInput) -> ScheduleResult<TaskId> {
        let id = match input.id {
            Some(id) => id,
            None => next_id("task", self.tasks.keys())?,
        };

        task_validation::validate_input(id, &input)
            .inspect_err(|err| warn!(task = id, %err, "rejected task save"))?;
        if !self.sprints.contains_key(&input.sprint_id) {
            return Err(ScheduleError::UnknownSprint(input.sprint_id));
        }
        let preds = self
            .graph
            .validate_predecessors(id, &input.predecessor_ids)
            .inspect_err(|err| warn!(task = id, %err, "rejected predecessor set"))?;

        let previous_sprint = self.tasks.get(&id).map(|t| t.sprint_id);
        if previous_sprint != Some(input.sprint_id) {
            if let Some(old) = previous_sprint.and_then(|s| self.sprints.get_mut(&s)) {
                old.task_ids.retain(|t| *t != id);
            }
            if let Some(sprint) = self.sprints.get_mut(&input.sprint_id) {
                sprint.task_ids.push(id);
            }
        }

        let task = Task {
            id,
            sprint_id: input.sprint_id,
            name: input.name,
            start_date: input.start_date,
            duration_days: input.duration_days,
            completed: input.completed,
            comments: input.comments,
            resource: input
                .resource
                .unwrap_or_else(|| self.config.default_resource.clone()),
            group_ids: input.group_ids,
            assignee_ids: input.assignee_ids,
        };
        self.tasks.insert(id, task);
        self.graph.add_task(id);
        self.graph.set_predecessors(id, &preds)?;

        debug!(task = id, predecessors = ?preds, "saved task");
        Ok(id)
    }

    /// Replaces a task's predecessor set. Self references are dropped.
    pub fn set_predecessors(&mut self, task: TaskId, predecessors: &[TaskId]) -> ScheduleResult<Vec<TaskId>> {
        self.task_ref(task)?;
        let preds = self
            .graph
            .set_predecessors(task, predecessors)
            .inspect_err(|err| warn!(task, %err, "rejected predecessor set"))?;
        debug!(task, predecessors = ?preds, "replaced predecessors");
        Ok(preds)
    }

    pub fn set_task_duration(&mut self, task: TaskId, duration_days: i64) -> ScheduleResult<()> {
        task_validation::validate_duration(task, duration_days)
            .inspect_err(|err| warn!(task, %err, "rejected duration"))?;
        self.task_mut(task)?.duration_days = duration_days;
        Ok(())
    }

    pub fn set_task_start_date(&mut self, task: TaskId, date: Option<NaiveDate>) -> ScheduleResult<()> {
        self.task_mut(task)?.start_date = date;
        Ok(())
    }

    pub fn set_task_completed(&mut self, task: TaskId, completed: bool) -> ScheduleResult<()> {
        self.task_mut(task)?.completed = completed;
        Ok(())
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle_task_completion(&mut self, task: TaskId) -> ScheduleResult<bool> {
        let task = self.task_mut(task)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn rename_task(&mut self, task: TaskId, name: impl Into<String>) -> ScheduleResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScheduleError::InvalidTask(format!(
                "task {task} requires a non-empty name"
            )));
        }
        self.task_mut(task)?.name = name;
        Ok(())
    }

    pub fn set_task_comments(&mut self, task: TaskId, comments: Option<String>) -> ScheduleResult<()> {
        self.task_mut(task)?.comments = comments;
        Ok(())
    }

    pub fn set_task_resource(&mut self, task: TaskId, resource: impl Into<String>) -> ScheduleResult<()> {
        let resource = resource.into();
        if resource.trim().is_empty() {
            return Err(ScheduleError::InvalidTask(format!(
                "task {task} resource lane must not be blank"
            )));
        }
        self.task_mut(task)?.resource = resource;
        Ok(())
    }

    pub fn set_task_assignees(
        &mut self,
        task: TaskId,
        group_ids: Vec<i32>,
        assignee_ids: Vec<i32>,
    ) -> ScheduleResult<()> {
        let task = self.task_mut(task)?;
        task.group_ids = group_ids;
        task.assignee_ids = assignee_ids;
        Ok(())
    }

    /// Removes a task; its followers lose it as a predecessor.
    pub fn delete_task(&mut self, task: TaskId) -> ScheduleResult<()> {
        let removed = self.tasks.remove(&task).ok_or(ScheduleError::UnknownTask(task))?;
        if let Some(sprint) = self.sprints.get_mut(&removed.sprint_id) {
            sprint.task_ids.retain(|t| *t != task);
        }
        self.graph.remove_task(task);
        debug!(task, "deleted task");
        Ok(())
    }

    pub fn effective_dates(&self, task: TaskId) -> ScheduleResult<EffectiveDates> {
        self.task_ref(task)?;
        Ok(DateResolver::new(&self.tasks, &self.graph, &self.calendar).resolve(task))
    }

    pub fn progress(&self, node: ProgressNode) -> ScheduleResult<u8> {
        match node {
            ProgressNode::Campaign(id) => {
                self.campaigns
                    .get(&id)
                    .ok_or(ScheduleError::UnknownCampaign(id))?;
                Ok(campaign_progress(self.tasks_of_campaign(id)))
            }
            ProgressNode::Sprint(id) => {
                self.sprints.get(&id).ok_or(ScheduleError::UnknownSprint(id))?;
                Ok(sprint_progress(self.tasks_of_sprint(id)))
            }
        }
    }

    /// Timeline anchored at the configured "today".
    pub fn timeline(&self, scope: TimelineScope) -> ScheduleResult<Vec<TimelineRow>> {
        self.timeline_at(scope, self.config.today())
    }

    pub fn timeline_at(&self, scope: TimelineScope, today: NaiveDate) -> ScheduleResult<Vec<TimelineRow>> {
        TimelineProjector::new(self, today)?.project(scope)
    }

    /// Task-level export records for every task under `scope`.
    pub fn export_records(&self, scope: TimelineScope) -> ScheduleResult<Vec<ExportRecord>> {
        let tasks: Vec<&Task> = match scope {
            TimelineScope::All => self.tasks().collect(),
            TimelineScope::Campaign(id) => {
                self.campaigns
                    .get(&id)
                    .ok_or(ScheduleError::UnknownCampaign(id))?;
                self.tasks_of_campaign(id).collect()
            }
            TimelineScope::Sprint(id) => {
                self.sprints.get(&id).ok_or(ScheduleError::UnknownSprint(id))?;
                self.tasks_of_sprint(id).collect()
            }
        };
        let mut resolver = DateResolver::new(&self.tasks, &self.graph, &self.calendar);
        Ok(tasks
            .into_iter()
            .map(|task| ExportRecord::new(task, resolver.resolve(task.id)))
            .collect())
    }

    fn campaign_mut(&mut self, id: CampaignId) -> ScheduleResult<&mut Campaign> {
        self.campaigns
            .get_mut(&id)
            .ok_or(ScheduleError::UnknownCampaign(id))
    }

    fn sprint_mut(&mut self, id: SprintId) -> ScheduleResult<&mut Sprint> {
        self.sprints
            .get_mut(&id)
            .ok_or(ScheduleError::UnknownSprint(id))
    }

    fn task_ref(&self, id: TaskId) -> ScheduleResult<&Task> {
        self.tasks.get(&id).ok_or(ScheduleError::UnknownTask(id))
    }

    fn task_mut(&mut self, id: TaskId) -> ScheduleResult<&mut Task> {
        self.tasks.get_mut(&id).ok_or(ScheduleError::UnknownTask(id))
    }
}

/// `max + 1`, or 1 for an empty collection.
fn next_id<'a>(kind: &'static str, ids: impl Iterator<Item = &'a i32>) -> ScheduleResult<i32> {
    match ids.copied().max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or(ScheduleError::IdsExhausted { kind }),
    }
}

/// Fails unless `count` more ids can be allocated after the current maximum.
fn ensure_ids_left<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a i32>,
    count: usize,
) -> ScheduleResult<()> {
    let max = i64::from(ids.copied().max().unwrap_or(0));
    let wanted = i64::try_from(count).unwrap_or(i64::MAX);
    if max.saturating_add(wanted) > i64::from(i32::MAX) {
        return Err(ScheduleError::IdsExhausted { kind });
    }
    Ok(())
}
