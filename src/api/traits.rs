//! Trait abstraction over the Taskboard backend

use super::error::ApiResult;
use super::models::*;
use async_trait::async_trait;

/// Every backend endpoint the client exercises.
///
/// Implemented by [`ApiClient`](super::ApiClient) over HTTP and by an
/// in-memory mock in tests. Object-safe so views can hold
/// `Arc<dyn TaskboardApi>`.
#[async_trait]
pub trait TaskboardApi: Send + Sync {
    // ========================================================================
    // Workspaces & projects
    // ========================================================================

    async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>>;

    async fn create_workspace(&self, name: &str) -> ApiResult<()>;

    async fn list_projects(&self, workspace_id: &str) -> ApiResult<Vec<Project>>;

    async fn create_project(&self, workspace_id: &str, name: &str) -> ApiResult<()>;

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Full list of a project's tasks, in backend order
    async fn list_tasks(&self, project_id: &str) -> ApiResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask) -> ApiResult<()>;

    /// Partial update of one task; the project id travels in the body
    async fn update_task(&self, task_id: &str, project_id: &str, patch: &TaskPatch)
        -> ApiResult<()>;

    async fn list_activity(&self, task_id: &str) -> ApiResult<Vec<ActivityEntry>>;

    // ========================================================================
    // Comments
    // ========================================================================

    async fn list_comments(&self, task_id: &str) -> ApiResult<Vec<Comment>>;

    async fn add_comment(&self, task_id: &str, message: &str) -> ApiResult<()>;

    // ========================================================================
    // Attachments
    // ========================================================================

    async fn list_attachments(&self, task_id: &str) -> ApiResult<Vec<Attachment>>;

    /// Ask the backend for a time-limited upload URL
    async fn attachment_upload_url(
        &self,
        task_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> ApiResult<String>;

    /// Ask the backend for a time-limited download URL
    async fn attachment_download_url(&self, attachment_id: &str) -> ApiResult<String>;

    async fn delete_attachment(&self, attachment_id: &str, task_id: &str) -> ApiResult<()>;

    /// Direct PUT of a file body to object storage (no bearer token)
    async fn put_object(&self, upload_url: &str, content_type: &str, body: Vec<u8>)
        -> ApiResult<()>;
}
