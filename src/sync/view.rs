//! Lifetime of one open project board
//!
//! Mounting a view creates the task store, loads it once, starts the polling
//! timer and subscribes to the realtime channel. Unmounting (or dropping the
//! view) cancels the timer, unsubscribes and closes the store, so refetches
//! still in flight at that point have nowhere to land.

use super::reconciler::{Reconciler, DEFAULT_POLL_INTERVAL};
use crate::api::{ApiResult, NewTask, TaskPatch, TaskStatus, TaskboardApi};
use crate::board::{DragTransitionHandler, DropOutcome, TaskStore};
use crate::realtime::{RealtimeChannel, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub poll_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct ProjectView {
    api: Arc<dyn TaskboardApi>,
    store: TaskStore,
    reconciler: Reconciler,
    drag: DragTransitionHandler,
    cancel: CancellationToken,
    subscription: Option<Subscription>,
}

impl ProjectView {
    /// Open the board for `project_id`.
    ///
    /// A failed initial load leaves the board empty; the timer or a push
    /// message will fill it later.
    pub async fn mount(
        api: Arc<dyn TaskboardApi>,
        project_id: impl Into<String>,
        options: &SyncOptions,
        realtime: Option<&RealtimeChannel>,
    ) -> Self {
        let store = TaskStore::new(project_id);
        let reconciler = Reconciler::new(api.clone(), store.clone());
        let drag = DragTransitionHandler::new(api.clone(), reconciler.clone());

        reconciler.refresh_quietly().await;

        let cancel = CancellationToken::new();
        reconciler.spawn_polling(options.poll_interval, cancel.clone());

        let subscription = realtime.map(|channel| {
            let subscription = reconciler.attach(channel);
            channel.connect();
            subscription
        });

        info!(
            project_id = %store.project_id(),
            tasks = store.len(),
            realtime = subscription.is_some(),
            "Project view mounted"
        );

        Self {
            api,
            store,
            reconciler,
            drag,
            cancel,
            subscription,
        }
    }

    pub fn project_id(&self) -> &str {
        self.store.project_id()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn drag_handler(&self) -> &DragTransitionHandler {
        &self.drag
    }

    /// A card was dropped onto the `status` column
    pub async fn drop_task(&self, task_id: &str, status: TaskStatus) -> DropOutcome {
        self.drag.handle_drop(task_id, status).await
    }

    /// Refetch the board, then drop `task_id` onto `status`.
    ///
    /// For one-shot callers that cannot wait for the next poll: a failed
    /// refetch is returned instead of turning into `NoOp(TaskNotFound)`.
    pub async fn move_task(&self, task_id: &str, status: TaskStatus) -> ApiResult<DropOutcome> {
        self.reconciler.refresh().await?;
        Ok(self.drop_task(task_id, status).await)
    }

    /// Create a task in the todo column, then refetch the board.
    ///
    /// Blank titles are ignored (`Ok(false)`). Errors are returned so the
    /// caller can show a notice.
    pub async fn create_task(&self, title: &str) -> ApiResult<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        self.api
            .create_task(&NewTask::new(self.project_id(), title))
            .await?;
        info!(project_id = %self.project_id(), title, "Task created");
        self.reconciler.refresh_quietly().await;
        Ok(true)
    }

    /// Edit fields of one task (title, description, priority, due date).
    ///
    /// The backend is asked first; the local copy changes only once it
    /// accepted. Unknown tasks and empty patches are ignored (`Ok(false)`).
    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> ApiResult<bool> {
        if patch.is_empty() || self.store.get(task_id).is_none() {
            return Ok(false);
        }
        self.api
            .update_task(task_id, self.project_id(), patch)
            .await?;
        self.store.apply_optimistic(task_id, patch);
        debug!(task_id, "Task updated");
        Ok(true)
    }

    /// Tear the view down
    pub fn unmount(self) {}

    fn teardown(&mut self) {
        if self.store.is_closed() {
            return;
        }
        self.cancel.cancel();
        self.subscription.take();
        self.store.close();
        info!(project_id = %self.store.project_id(), "Project view unmounted");
    }
}

impl Drop for ProjectView {
    fn drop(&mut self) {
        self.teardown();
    }
}
