//! In-memory mock implementation of TaskboardApi for testing without a backend.

use super::error::{ApiError, ApiResult};
use super::models::*;
use super::traits::TaskboardApi;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;

/// A recorded backend call: endpoint name plus the id it targeted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub endpoint: &'static str,
    pub target: String,
}

/// In-memory backend.
///
/// Data lives in `Vec`s behind async `RwLock`s. Every call is appended to a
/// log so tests can assert on call counts and ordering. Failures can be
/// injected per endpoint family.
#[derive(Default)]
pub struct MockTaskboardApi {
    workspaces: RwLock<Vec<Workspace>>,
    projects: RwLock<Vec<Project>>,
    tasks: RwLock<Vec<Task>>,
    comments: RwLock<Vec<Comment>>,
    attachments: RwLock<Vec<Attachment>>,
    activity: RwLock<Vec<ActivityEntry>>,
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
    calls: Mutex<Vec<Call>>,
    update_bodies: Mutex<Vec<(String, String, TaskPatch)>>,
    fail_updates: AtomicBool,
    fail_list_tasks: AtomicBool,
    fail_list_attachments: AtomicBool,
    list_tasks_delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl MockTaskboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub fn with_workspace(self, id: &str, name: &str) -> Self {
        self.workspaces.try_write().expect("unshared").push(Workspace {
            workspace_id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_project(self, workspace_id: &str, id: &str, name: &str) -> Self {
        self.projects.try_write().expect("unshared").push(Project {
            project_id: id.into(),
            workspace_id: Some(workspace_id.into()),
            name: name.into(),
        });
        self
    }

    pub fn with_task(self, task: Task) -> Self {
        self.tasks.try_write().expect("unshared").push(task);
        self
    }

    pub fn with_activity(self, entry: ActivityEntry) -> Self {
        self.activity.try_write().expect("unshared").push(entry);
        self
    }

    pub fn with_comment(self, comment: Comment) -> Self {
        self.comments.try_write().expect("unshared").push(comment);
        self
    }

    pub fn with_attachment(self, attachment: Attachment) -> Self {
        self.attachments.try_write().expect("unshared").push(attachment);
        self
    }

    // ------------------------------------------------------------------
    // Failure injection & server-side edits
    // ------------------------------------------------------------------

    /// Reject every `update_task` with a 500 and leave server state alone
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_tasks(&self, fail: bool) {
        self.fail_list_tasks.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_attachments(&self, fail: bool) {
        self.fail_list_attachments.store(fail, Ordering::SeqCst);
    }

    /// Delay every `list_tasks` response (uses tokio time, so it honours a paused clock)
    pub fn delay_list_tasks(&self, delay: Option<Duration>) {
        *self.list_tasks_delay.lock().unwrap() = delay;
    }

    /// Replace the server-side task list, as another client would
    pub async fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.write().await = tasks;
    }

    pub async fn server_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn stored_object(&self, url: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(url).cloned()
    }

    // ------------------------------------------------------------------
    // Call log
    // ------------------------------------------------------------------

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    /// `(task_id, project_id, patch)` of every update attempt
    pub fn update_bodies(&self) -> Vec<(String, String, TaskPatch)> {
        self.update_bodies.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &'static str, target: &str) {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            target: target.to_string(),
        });
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn server_error(path: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        path: path.to_string(),
    }
}

#[async_trait]
impl TaskboardApi for MockTaskboardApi {
    async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        self.record("list_workspaces", "");
        Ok(self.workspaces.read().await.clone())
    }

    async fn create_workspace(&self, name: &str) -> ApiResult<()> {
        self.record("create_workspace", name);
        let id = self.next_id("ws");
        self.workspaces.write().await.push(Workspace {
            workspace_id: id,
            name: name.into(),
        });
        Ok(())
    }

    async fn list_projects(&self, workspace_id: &str) -> ApiResult<Vec<Project>> {
        self.record("list_projects", workspace_id);
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .filter(|p| p.workspace_id.as_deref() == Some(workspace_id))
            .cloned()
            .collect())
    }

    async fn create_project(&self, workspace_id: &str, name: &str) -> ApiResult<()> {
        self.record("create_project", workspace_id);
        let id = self.next_id("proj");
        self.projects.write().await.push(Project {
            project_id: id,
            workspace_id: Some(workspace_id.into()),
            name: name.into(),
        });
        Ok(())
    }

    async fn list_tasks(&self, project_id: &str) -> ApiResult<Vec<Task>> {
        self.record("list_tasks", project_id);
        let delay = *self.list_tasks_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list_tasks.load(Ordering::SeqCst) {
            return Err(server_error("/tasks"));
        }
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &NewTask) -> ApiResult<()> {
        self.record("create_task", &task.project_id);
        let mut created = Task::new(self.next_id("task"), &task.project_id, &task.title);
        created.status = task.status;
        created.updated_at = Some(Utc::now());
        self.tasks.write().await.push(created);
        Ok(())
    }

    async fn update_task(
        &self,
        task_id: &str,
        project_id: &str,
        patch: &TaskPatch,
    ) -> ApiResult<()> {
        self.record("update_task", task_id);
        self.update_bodies.lock().unwrap().push((
            task_id.to_string(),
            project_id.to_string(),
            patch.clone(),
        ));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(server_error(&format!("/tasks/{}", task_id)));
        }
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.task_id == task_id) {
            Some(task) => {
                patch.apply_to(task);
                task.updated_at = Some(Utc::now());
                Ok(())
            }
            None => Err(ApiError::Status {
                status: 404,
                path: format!("/tasks/{}", task_id),
            }),
        }
    }

    async fn list_activity(&self, task_id: &str) -> ApiResult<Vec<ActivityEntry>> {
        self.record("list_activity", task_id);
        Ok(self
            .activity
            .read()
            .await
            .iter()
            .filter(|a| a.task_id.as_deref() == Some(task_id))
            .cloned()
            .collect())
    }

    async fn list_comments(&self, task_id: &str) -> ApiResult<Vec<Comment>> {
        self.record("list_comments", task_id);
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, task_id: &str, message: &str) -> ApiResult<()> {
        self.record("add_comment", task_id);
        let id = self.next_id("comment");
        self.comments.write().await.push(Comment {
            comment_id: id,
            task_id: task_id.into(),
            message: message.into(),
            author: None,
            created_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn list_attachments(&self, task_id: &str) -> ApiResult<Vec<Attachment>> {
        self.record("list_attachments", task_id);
        if self.fail_list_attachments.load(Ordering::SeqCst) {
            return Err(server_error("/tasks/attachments"));
        }
        Ok(self
            .attachments
            .read()
            .await
            .iter()
            .filter(|a| a.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn attachment_upload_url(
        &self,
        task_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> ApiResult<String> {
        self.record("attachment_upload_url", task_id);
        let id = self.next_id("att");
        let url = format!("https://objects.test/{}/{}", id, file_name);
        // The real backend registers the attachment when it issues the URL
        self.attachments.write().await.push(Attachment {
            attachment_id: id,
            task_id: task_id.into(),
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            created_at: Some(Utc::now()),
        });
        Ok(url)
    }

    async fn attachment_download_url(&self, attachment_id: &str) -> ApiResult<String> {
        self.record("attachment_download_url", attachment_id);
        let attachments = self.attachments.read().await;
        match attachments.iter().find(|a| a.attachment_id == attachment_id) {
            Some(a) => Ok(format!(
                "https://objects.test/{}/{}?signed=1",
                a.attachment_id, a.file_name
            )),
            None => Err(ApiError::Status {
                status: 404,
                path: "/tasks/attachments/download-url".into(),
            }),
        }
    }

    async fn delete_attachment(&self, attachment_id: &str, task_id: &str) -> ApiResult<()> {
        self.record("delete_attachment", attachment_id);
        self.attachments
            .write()
            .await
            .retain(|a| !(a.attachment_id == attachment_id && a.task_id == task_id));
        Ok(())
    }

    async fn put_object(
        &self,
        upload_url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> ApiResult<()> {
        self.record("put_object", upload_url);
        self.objects
            .write()
            .await
            .insert(upload_url.to_string(), (content_type.to_string(), body));
        Ok(())
    }
}
