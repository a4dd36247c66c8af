//! Drag-and-drop status transitions
//!
//! A drop becomes a status change in two explicit steps:
//! 1. [`DragTransitionHandler::tentative_apply`] checks the preconditions and
//!    writes the new status into the store, so the board moves with zero
//!    latency
//! 2. [`DragTransitionHandler::confirm_or_invalidate`] sends the change to the
//!    backend; on any failure the optimistic state is thrown away by a full
//!    refetch
//!
//! Invalidation never computes an inverse patch and never retries. A move
//! that did not survive visibly snaps back when the refetch lands.

use crate::api::{ApiError, TaskPatch, TaskStatus, TaskboardApi};
use crate::board::TaskStore;
use crate::sync::Reconciler;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a drop did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    TaskNotFound,
    /// Dropped onto the column it already sits in
    AlreadyInStatus,
    /// The project view was torn down
    ViewClosed,
}

#[derive(Debug)]
pub enum DropOutcome {
    /// Nothing changed locally and no request was sent
    NoOp(NoOpReason),
    /// Backend accepted the new status
    Confirmed,
    /// Backend rejected it; the store was refetched
    Invalidated { error: ApiError },
}

impl DropOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, DropOutcome::NoOp(_))
    }
}

/// A status change already visible locally but not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub task_id: String,
    pub project_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Precondition for a drop. Returns the task's current status when the
/// drop would change something.
pub fn check_drop(store: &TaskStore, task_id: &str, to: TaskStatus) -> Result<TaskStatus, NoOpReason> {
    if store.is_closed() {
        return Err(NoOpReason::ViewClosed);
    }
    let task = store.get(task_id).ok_or(NoOpReason::TaskNotFound)?;
    if task.status == to {
        return Err(NoOpReason::AlreadyInStatus);
    }
    Ok(task.status)
}

#[derive(Clone)]
pub struct DragTransitionHandler {
    api: Arc<dyn TaskboardApi>,
    reconciler: Reconciler,
}

impl DragTransitionHandler {
    pub fn new(api: Arc<dyn TaskboardApi>, reconciler: Reconciler) -> Self {
        Self { api, reconciler }
    }

    fn store(&self) -> &TaskStore {
        self.reconciler.store()
    }

    /// Step 1: precondition check, then optimistic local write
    pub fn tentative_apply(
        &self,
        task_id: &str,
        to: TaskStatus,
    ) -> Result<PendingTransition, NoOpReason> {
        let from = check_drop(self.store(), task_id, to)?;
        if !self.store().apply_optimistic(task_id, &TaskPatch::status(to)) {
            // Closed between the check and the write
            return Err(NoOpReason::ViewClosed);
        }
        Ok(PendingTransition {
            task_id: task_id.to_string(),
            project_id: self.store().project_id().to_string(),
            from,
            to,
        })
    }

    /// Step 2: confirm with the backend, or discard local state and refetch
    pub async fn confirm_or_invalidate(&self, pending: PendingTransition) -> DropOutcome {
        let patch = TaskPatch::status(pending.to);
        match self
            .api
            .update_task(&pending.task_id, &pending.project_id, &patch)
            .await
        {
            Ok(()) => {
                debug!(
                    task_id = %pending.task_id,
                    from = %pending.from,
                    to = %pending.to,
                    "Status change confirmed"
                );
                DropOutcome::Confirmed
            }
            Err(error) => {
                warn!(
                    task_id = %pending.task_id,
                    to = %pending.to,
                    error = %error,
                    "Status update failed, refetching"
                );
                self.reconciler.refresh_quietly().await;
                DropOutcome::Invalidated { error }
            }
        }
    }

    /// Both steps for one drop gesture
    pub async fn handle_drop(&self, task_id: &str, to: TaskStatus) -> DropOutcome {
        match self.tentative_apply(task_id, to) {
            Ok(pending) => self.confirm_or_invalidate(pending).await,
            Err(reason) => {
                debug!(task_id, to = %to, ?reason, "Drop ignored");
                DropOutcome::NoOp(reason)
            }
        }
    }
}
