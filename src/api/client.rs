//! HTTP client for the Taskboard REST backend

use super::error::{ApiError, ApiResult};
use super::models::*;
use super::traits::TaskboardApi;
use crate::auth::TokenProvider;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Bearer-authenticated JSON client.
///
/// Cheap to clone; clones share the connection pool and token provider.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> ApiResult<Self> {
        Self::with_timeout(base_url, tokens, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated request. Fails before any I/O when signed out.
    async fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let token = self
            .tokens
            .access_token()
            .await
            .ok_or(ApiError::MissingToken)?;
        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> ApiResult<reqwest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        debug!(path, status = status.as_u16(), "Backend response");
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let builder = self.request(Method::GET, path).await?.query(query);
        Ok(self.send(path, builder).await?.json().await?)
    }

    /// A `null` body is an empty list
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Vec<T>> {
        let list: Option<Vec<T>> = self.get_json(path, query).await?;
        Ok(list.unwrap_or_default())
    }

    /// Send a JSON body and ignore whatever comes back
    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<()> {
        let builder = self.request(method, path).await?.json(body);
        self.send(path, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskboardApi for ApiClient {
    async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        self.get_list("/workspaces", &[]).await
    }

    async fn create_workspace(&self, name: &str) -> ApiResult<()> {
        self.send_json(
            Method::POST,
            "/workspaces",
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    async fn list_projects(&self, workspace_id: &str) -> ApiResult<Vec<Project>> {
        self.get_list("/projects", &[("workspaceId", workspace_id)])
            .await
    }

    async fn create_project(&self, workspace_id: &str, name: &str) -> ApiResult<()> {
        self.send_json(
            Method::POST,
            "/projects",
            &serde_json::json!({ "name": name, "workspaceId": workspace_id }),
        )
        .await
    }

    async fn list_tasks(&self, project_id: &str) -> ApiResult<Vec<Task>> {
        self.get_list("/tasks", &[("projectId", project_id)]).await
    }

    async fn create_task(&self, task: &NewTask) -> ApiResult<()> {
        self.send_json(Method::POST, "/tasks", task).await
    }

    async fn update_task(
        &self,
        task_id: &str,
        project_id: &str,
        patch: &TaskPatch,
    ) -> ApiResult<()> {
        let path = format!("/tasks/{}", urlencoding::encode(task_id));
        self.send_json(
            Method::PATCH,
            &path,
            &UpdateTaskRequest { project_id, patch },
        )
        .await
    }

    async fn list_activity(&self, task_id: &str) -> ApiResult<Vec<ActivityEntry>> {
        self.get_list("/tasks/activity", &[("taskId", task_id)])
            .await
    }

    async fn list_comments(&self, task_id: &str) -> ApiResult<Vec<Comment>> {
        self.get_list("/tasks/comments", &[("taskId", task_id)])
            .await
    }

    async fn add_comment(&self, task_id: &str, message: &str) -> ApiResult<()> {
        self.send_json(
            Method::POST,
            "/tasks/comments",
            &serde_json::json!({ "taskId": task_id, "message": message }),
        )
        .await
    }

    async fn list_attachments(&self, task_id: &str) -> ApiResult<Vec<Attachment>> {
        self.get_list("/tasks/attachments", &[("taskId", task_id)])
            .await
    }

    async fn attachment_upload_url(
        &self,
        task_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> ApiResult<String> {
        let path = "/tasks/attachments/upload-url";
        let builder = self
            .request(Method::POST, path)
            .await?
            .json(&serde_json::json!({
                "taskId": task_id,
                "fileName": file_name,
                "contentType": content_type,
            }));
        let resp: UploadUrlResponse = self.send(path, builder).await?.json().await?;
        Ok(resp.upload_url)
    }

    async fn attachment_download_url(&self, attachment_id: &str) -> ApiResult<String> {
        let resp: DownloadUrlResponse = self
            .get_json(
                "/tasks/attachments/download-url",
                &[("attachmentId", attachment_id)],
            )
            .await?;
        Ok(resp.download_url)
    }

    async fn delete_attachment(&self, attachment_id: &str, task_id: &str) -> ApiResult<()> {
        self.send_json(
            Method::DELETE,
            "/tasks/attachments",
            &serde_json::json!({ "attachmentId": attachment_id, "taskId": task_id }),
        )
        .await
    }

    async fn put_object(
        &self,
        upload_url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> ApiResult<()> {
        let resp = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Upload {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}
