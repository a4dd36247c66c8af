//! Board filters and status columns

use crate::api::{Task, TaskPriority, TaskStatus};
use chrono::NaiveDate;

/// Due-date filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueFilter {
    #[default]
    All,
    Today,
    Overdue,
}

/// Filters applied before tasks are laid out in columns. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due: DueFilter,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !task.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        match self.due {
            DueFilter::All => true,
            DueFilter::Today => task.due_date == Some(today),
            // Due dates are whole days, so anything due up to today counts
            DueFilter::Overdue => task.due_date.is_some_and(|d| d <= today),
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t, today)).collect()
    }
}

/// One kanban column
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

/// Lay filtered tasks out in the fixed column order, keeping arrival order
/// within each column.
pub fn columns<'a>(tasks: &'a [Task], filter: &TaskFilter, today: NaiveDate) -> Vec<Column<'a>> {
    let visible = filter.apply(tasks, today);
    TaskStatus::ALL
        .iter()
        .map(|status| Column {
            status: *status,
            tasks: visible
                .iter()
                .copied()
                .filter(|t| t.status == *status)
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn task(id: &str, title: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(id, "p", title);
        t.status = status;
        t
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tasks = vec![
            task("1", "Fix Login bug", TaskStatus::Todo),
            task("2", "Write docs", TaskStatus::Todo),
        ];
        let filter = TaskFilter {
            search: Some("login".into()),
            ..Default::default()
        };
        let hits = filter.apply(&tasks, day(10));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, "1");
    }

    #[test]
    fn test_priority_filter() {
        let mut urgent = task("1", "a", TaskStatus::Todo);
        urgent.priority = TaskPriority::Urgent;
        let tasks = vec![urgent, task("2", "b", TaskStatus::Todo)];
        let filter = TaskFilter {
            priority: Some(TaskPriority::Urgent),
            ..Default::default()
        };
        assert_eq!(filter.apply(&tasks, day(10)).len(), 1);
    }

    #[test]
    fn test_due_filters() {
        let mut past = task("past", "a", TaskStatus::Todo);
        past.due_date = Some(day(1));
        let mut today = task("today", "b", TaskStatus::Todo);
        today.due_date = Some(day(10));
        let mut future = task("future", "c", TaskStatus::Todo);
        future.due_date = Some(day(20));
        let none = task("none", "d", TaskStatus::Todo);
        let tasks = vec![past, today, future, none];

        let ids = |due| {
            TaskFilter {
                due,
                ..Default::default()
            }
            .apply(&tasks, day(10))
            .iter()
            .map(|t| t.task_id.clone())
            .collect::<Vec<_>>()
        };

        assert_eq!(ids(DueFilter::All).len(), 4);
        assert_eq!(ids(DueFilter::Today), vec!["today"]);
        assert_eq!(ids(DueFilter::Overdue), vec!["past", "today"]);
    }

    #[test]
    fn test_columns_keep_fixed_order_and_arrival_order() {
        let tasks = vec![
            task("1", "a", TaskStatus::Done),
            task("2", "b", TaskStatus::Todo),
            task("3", "c", TaskStatus::Done),
        ];
        let cols = columns(&tasks, &TaskFilter::default(), day(1));

        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].status, TaskStatus::Todo);
        assert_eq!(cols[1].status, TaskStatus::InProgress);
        assert!(cols[1].tasks.is_empty());
        let done: Vec<_> = cols[2].tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(done, vec!["1", "3"]);
    }
}
