//! Kanban board state: task store, filters and drag transitions

pub mod drag;
pub mod filter;
pub mod store;

pub use drag::{check_drop, DragTransitionHandler, DropOutcome, NoOpReason, PendingTransition};
pub use filter::{columns, Column, DueFilter, TaskFilter};
pub use store::{TaskSnapshot, TaskStore};
