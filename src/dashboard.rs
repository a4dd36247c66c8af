//! Cross-project aggregation for the dashboard and the activity feed
//!
//! The backend has no aggregate endpoints, so both views walk the hierarchy
//! level by level: workspaces, then projects of every workspace, then tasks
//! of every project (and for the feed, activity of every task). Requests of
//! one level run concurrently; an empty level ends the walk early.

use crate::api::{ActivityEntry, ApiResult, Task, TaskStatus, TaskboardApi};
use chrono::NaiveDate;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::debug;

/// Every task of every project the user can see
pub async fn collect_tasks(api: &dyn TaskboardApi) -> ApiResult<Vec<Task>> {
    let workspaces = api.list_workspaces().await?;
    if workspaces.is_empty() {
        return Ok(Vec::new());
    }

    let projects: Vec<_> = try_join_all(
        workspaces
            .iter()
            .map(|ws| api.list_projects(&ws.workspace_id)),
    )
    .await?
    .into_iter()
    .flatten()
    .collect();
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let tasks: Vec<Task> = try_join_all(projects.iter().map(|p| api.list_tasks(&p.project_id)))
        .await?
        .into_iter()
        .flatten()
        .collect();

    debug!(
        workspaces = workspaces.len(),
        projects = projects.len(),
        tasks = tasks.len(),
        "Collected tasks"
    );
    Ok(tasks)
}

/// Activity of every visible task, newest first
pub async fn activity_feed(api: &dyn TaskboardApi) -> ApiResult<Vec<ActivityEntry>> {
    let tasks = collect_tasks(api).await?;
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<ActivityEntry> =
        try_join_all(tasks.iter().map(|t| api.list_activity(&t.task_id)))
            .await?
            .into_iter()
            .flatten()
            .collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
}

/// Headline numbers and chart series shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    /// Due on or before today and not done
    pub overdue: usize,
    /// Due today and not done
    pub due_today: usize,
    /// High or urgent priority
    pub high_priority: usize,
    /// Done tasks per day of their last update, oldest day first
    pub completion_trend: Vec<(NaiveDate, usize)>,
}

impl DashboardStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Default::default()
        };
        let mut trend: BTreeMap<NaiveDate, usize> = BTreeMap::new();

        for task in tasks {
            match task.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Done => stats.done += 1,
            }
            if task.priority.is_high() {
                stats.high_priority += 1;
            }
            if task.status == TaskStatus::Done {
                if let Some(updated) = task.updated_at {
                    *trend.entry(updated.date_naive()).or_default() += 1;
                }
                continue;
            }
            // A task due today is already overdue and also due today
            if let Some(due) = task.due_date {
                if due <= today {
                    stats.overdue += 1;
                }
                if due == today {
                    stats.due_today += 1;
                }
            }
        }

        stats.completion_trend = trend.into_iter().collect();
        stats
    }

    /// Count for one status column
    pub fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
        }
    }

    /// Share of done tasks in percent, rounded down
    pub fn completion_rate(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.done * 100 / self.total
        }
    }
}
