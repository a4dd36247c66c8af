//! Backend REST API client, wire models and trait abstraction

pub mod client;
pub mod error;
pub mod models;
pub mod traits;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use traits::TaskboardApi;

#[cfg(test)]
pub(crate) mod mock;
