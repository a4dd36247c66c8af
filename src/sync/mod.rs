//! Keeping the client task store eventually consistent with the backend

pub mod reconciler;
pub mod view;

pub use reconciler::{Reconciler, DEFAULT_POLL_INTERVAL};
pub use view::{ProjectView, SyncOptions};
