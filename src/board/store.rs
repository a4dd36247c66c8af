//! Client-side task store for the open project
//!
//! Holds a transient, non-authoritative copy of one project's tasks in
//! arrival order. The backend stays the source of truth; this store only
//! keeps what it is given.
//!
//! ## Design
//!
//! The collection lives in a `tokio::sync::watch` channel as an
//! `Arc<Vec<Task>>`:
//! - `replace_all` swaps the whole `Arc` in one assignment, so a reader holds
//!   either the old or the new collection, never a mix
//! - `apply_optimistic` copies-on-write when a reader still holds the
//!   current snapshot, so snapshots already handed out never change
//! - receivers from [`TaskStore::subscribe`] wake on every change, which is
//!   how a board renderer knows to redraw
//!
//! Once [`TaskStore::close`] has run, writes are discarded. Fetches that
//! were in flight when the view went away land here and are dropped.

use crate::api::{Task, TaskPatch};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Point-in-time view of the store's collection
pub type TaskSnapshot = Arc<Vec<Task>>;

#[derive(Debug)]
struct StoreInner {
    project_id: String,
    tasks: watch::Sender<TaskSnapshot>,
    closed: AtomicBool,
}

/// Shared handle to a project's task collection. Clones share state.
#[derive(Debug, Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_tasks(project_id, Vec::new())
    }

    pub fn with_tasks(project_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        let (tasks, _) = watch::channel(Arc::new(tasks));
        Self {
            inner: Arc::new(StoreInner {
                project_id: project_id.into(),
                tasks,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn snapshot(&self) -> TaskSnapshot {
        self.inner.tasks.borrow().clone()
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.inner
            .tasks
            .borrow()
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver that wakes on every change to the collection
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.inner.tasks.subscribe()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Swap in a whole new collection. Returns false if the store is closed.
    pub fn replace_all(&self, tasks: Vec<Task>) -> bool {
        let closed = &self.inner.closed;
        let mut next = Some(Arc::new(tasks));
        let applied = self.inner.tasks.send_if_modified(|current| {
            if closed.load(Ordering::SeqCst) {
                return false;
            }
            if let Some(next) = next.take() {
                *current = next;
            }
            true
        });
        if !applied {
            debug!(project_id = %self.inner.project_id, "Discarded replace on closed store");
        }
        applied
    }

    /// Update the fields present in `patch` on the task with `task_id`.
    ///
    /// Unknown ids and closed stores are a no-op; returns whether a task
    /// was updated. Other tasks and absent fields are never touched.
    pub fn apply_optimistic(&self, task_id: &str, patch: &TaskPatch) -> bool {
        let closed = &self.inner.closed;
        self.inner.tasks.send_if_modified(|current| {
            if closed.load(Ordering::SeqCst) {
                return false;
            }
            let Some(pos) = current.iter().position(|t| t.task_id == task_id) else {
                return false;
            };
            patch.apply_to(&mut Arc::make_mut(current)[pos]);
            true
        })
    }

    /// Tear the store down. Subscribers are woken one last time.
    pub fn close(&self) {
        let closed = &self.inner.closed;
        self.inner.tasks.send_modify(|_| closed.store(true, Ordering::SeqCst));
        debug!(project_id = %self.inner.project_id, "Task store closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TaskPriority, TaskStatus};

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(id, "p-1", format!("Task {}", id));
        t.status = status;
        t
    }

    #[test]
    fn test_apply_optimistic_touches_only_patched_fields_of_one_task() {
        let mut a = task("a", TaskStatus::Todo);
        a.priority = TaskPriority::High;
        a.description = Some("desc".into());
        let b = task("b", TaskStatus::Todo);
        let store = TaskStore::with_tasks("p-1", vec![a.clone(), b.clone()]);

        assert!(store.apply_optimistic("a", &TaskPatch::status(TaskStatus::Done)));

        let snap = store.snapshot();
        let mut expected_a = a;
        expected_a.status = TaskStatus::Done;
        assert_eq!(snap[0], expected_a);
        assert_eq!(snap[1], b);
    }

    #[test]
    fn test_apply_optimistic_unknown_id_is_noop() {
        let store = TaskStore::with_tasks("p-1", vec![task("a", TaskStatus::Todo)]);
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert!(!store.apply_optimistic("zzz", &TaskPatch::status(TaskStatus::Done)));
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Todo);
        assert!(!rx.has_changed().unwrap(), "no-op must not notify");
    }

    #[test]
    fn test_replace_all_swaps_whole_collection() {
        let store = TaskStore::with_tasks(
            "p-1",
            vec![task("a", TaskStatus::Todo), task("b", TaskStatus::Todo)],
        );
        let before = store.snapshot();

        assert!(store.replace_all(vec![task("c", TaskStatus::Done)]));

        // A snapshot taken before the swap is entirely the old collection
        assert_eq!(before.len(), 2);
        assert_eq!(before[0].task_id, "a");
        let after = store.snapshot();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].task_id, "c");
    }

    #[test]
    fn test_snapshots_are_not_mutated_by_optimistic_writes() {
        let store = TaskStore::with_tasks("p-1", vec![task("a", TaskStatus::Todo)]);
        let held = store.snapshot();

        store.apply_optimistic("a", &TaskPatch::status(TaskStatus::InProgress));

        assert_eq!(held[0].status, TaskStatus::Todo);
        assert_eq!(store.get("a").unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_writes_after_close_are_discarded() {
        let store = TaskStore::with_tasks("p-1", vec![task("a", TaskStatus::Todo)]);
        store.close();

        assert!(store.is_closed());
        assert!(!store.replace_all(vec![]));
        assert!(!store.apply_optimistic("a", &TaskPatch::status(TaskStatus::Done)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_subscribers_wake_on_change() {
        let store = TaskStore::new("p-1");
        let mut rx = store.subscribe();

        let writer = store.clone();
        tokio::spawn(async move {
            writer.replace_all(vec![task("a", TaskStatus::Todo)]);
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
