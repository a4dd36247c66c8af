//! Reconciliation between the client task store and the backend
//!
//! Divergence is always resolved the same way: fetch the project's full
//! task list and swap it into the store. Nothing is merged. Two independent
//! triggers lead here:
//! - a fixed-period timer while the project view is mounted
//! - any message on the realtime channel (payload is not interpreted)
//!
//! Both may fire close together; refetches then overlap and the one that
//! completes last wins. Failures are logged and swallowed, so the store
//! keeps its last-known state until the next successful refetch.

use crate::api::{ApiResult, TaskboardApi};
use crate::board::TaskStore;
use crate::realtime::{RealtimeChannel, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default timer period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(8);

#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn TaskboardApi>,
    store: TaskStore,
}

impl Reconciler {
    pub fn new(api: Arc<dyn TaskboardApi>, store: TaskStore) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Full refetch followed by `replace_all`.
    ///
    /// Returns whether the result reached the store: false when the store
    /// was torn down before or while the fetch ran.
    pub async fn refresh(&self) -> ApiResult<bool> {
        if self.store.is_closed() {
            debug!(project_id = %self.store.project_id(), "Skipping refetch for closed view");
            return Ok(false);
        }
        let tasks = self.api.list_tasks(self.store.project_id()).await?;
        let count = tasks.len();
        let applied = self.store.replace_all(tasks);
        if applied {
            debug!(project_id = %self.store.project_id(), tasks = count, "Tasks reconciled");
        }
        Ok(applied)
    }

    /// [`refresh`](Self::refresh) for background triggers: errors are
    /// logged, never raised.
    pub async fn refresh_quietly(&self) -> bool {
        match self.refresh().await {
            Ok(applied) => applied,
            Err(e) => {
                warn!(
                    project_id = %self.store.project_id(),
                    error = %e,
                    "Load tasks failed"
                );
                false
            }
        }
    }

    /// Refetch every `period` until `cancel` fires.
    ///
    /// The first tick is one period from now (the view does its own initial
    /// load). Each tick spawns its refetch, so a slow backend never stretches
    /// the period.
    pub fn spawn_polling(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let tick = this.clone();
                        tokio::spawn(async move {
                            tick.refresh_quietly().await;
                        });
                    }
                }
            }
            debug!(project_id = %this.store.project_id(), "Polling stopped");
        })
    }

    /// Refetch on every message of `channel` until the returned token is dropped
    pub fn attach(&self, channel: &RealtimeChannel) -> Subscription {
        let this = self.clone();
        channel.subscribe(move |_payload| {
            let push = this.clone();
            tokio::spawn(async move {
                push.refresh_quietly().await;
            });
        })
    }
}
