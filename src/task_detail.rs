//! Per-task detail: comments, activity trail and attachments
//!
//! The detail view owns plain copies of the three lists. Every mutation goes
//! to the backend first and then reloads the affected list, so what the view
//! shows is always what the backend returned last.

use crate::api::{ActivityEntry, ApiResult, Attachment, Comment, TaskboardApi};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a file can be shown as an inline preview
pub fn is_image_file(file_name: &str) -> bool {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "jpg" | "jpeg" | "png" | "gif" | "webp"
    )
}

/// Content type sent with an upload, guessed from the file name
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub struct TaskDetail {
    api: Arc<dyn TaskboardApi>,
    task_id: String,
    pub comments: Vec<Comment>,
    pub activity: Vec<ActivityEntry>,
    pub attachments: Vec<Attachment>,
}

impl TaskDetail {
    /// Fetch everything shown for `task_id`.
    ///
    /// Comments and activity are requested together; attachments follow.
    /// A failed attachment fetch leaves that list empty without discarding
    /// the discussion.
    pub async fn load(api: Arc<dyn TaskboardApi>, task_id: impl Into<String>) -> ApiResult<Self> {
        let task_id = task_id.into();
        let (comments, activity) = futures::try_join!(
            api.list_comments(&task_id),
            api.list_activity(&task_id)
        )?;
        let attachments = match api.list_attachments(&task_id).await {
            Ok(attachments) => attachments,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Load attachments failed");
                Vec::new()
            }
        };
        debug!(
            task_id = %task_id,
            comments = comments.len(),
            activity = activity.len(),
            attachments = attachments.len(),
            "Task detail loaded"
        );
        Ok(Self {
            api,
            task_id,
            comments,
            activity,
            attachments,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Re-fetch comments and activity
    pub async fn reload_discussion(&mut self) -> ApiResult<()> {
        let (comments, activity) = futures::try_join!(
            self.api.list_comments(&self.task_id),
            self.api.list_activity(&self.task_id)
        )?;
        self.comments = comments;
        self.activity = activity;
        Ok(())
    }

    pub async fn reload_attachments(&mut self) -> ApiResult<()> {
        self.attachments = self.api.list_attachments(&self.task_id).await?;
        Ok(())
    }

    /// Post a comment. Blank messages are ignored (`Ok(false)`).
    pub async fn add_comment(&mut self, message: &str) -> ApiResult<bool> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(false);
        }
        self.api.add_comment(&self.task_id, message).await?;
        self.reload_discussion().await?;
        Ok(true)
    }

    /// Upload `body` as `file_name`: ask for a signed URL, PUT the bytes
    /// there, then reload the attachment list.
    pub async fn upload_attachment(&mut self, file_name: &str, body: Vec<u8>) -> ApiResult<()> {
        let content_type = content_type_for(file_name);
        let upload_url = self
            .api
            .attachment_upload_url(&self.task_id, file_name, &content_type)
            .await?;
        let size = body.len();
        self.api.put_object(&upload_url, &content_type, body).await?;
        info!(task_id = %self.task_id, file_name, size, "Attachment uploaded");
        self.reload_attachments().await
    }

    pub async fn download_url(&self, attachment_id: &str) -> ApiResult<String> {
        self.api.attachment_download_url(attachment_id).await
    }

    pub async fn delete_attachment(&mut self, attachment_id: &str) -> ApiResult<()> {
        self.api
            .delete_attachment(attachment_id, &self.task_id)
            .await?;
        info!(task_id = %self.task_id, attachment_id, "Attachment deleted");
        self.reload_attachments().await
    }
}
