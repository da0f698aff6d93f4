//! Task endpoints, always sent through [`SessionManager::auth_fetch`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared::models::{Task, TaskCreate, TaskUpdate};
use tracing::debug;

use crate::{
    error::{ClientError, ClientResult},
    http::{ApiRequest, ApiResponse},
    session::{SessionManager, server_detail},
};

const TASKS_PATH: &str = "/tasks/";

/// Typed access to `/tasks`.
#[derive(Clone, Debug)]
pub struct TaskApi {
    session: Arc<SessionManager>,
}

impl TaskApi {
    /// Task API acting as `session`.
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// The session requests are sent as.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// All tasks of the current user.
    ///
    /// # Errors
    /// Any [`ClientError`] from the wrapper, or [`ClientError::Api`] on a non-2xx answer.
    pub async fn list(&self) -> ClientResult<Vec<Task>> {
        let response = self.session.auth_fetch(ApiRequest::get(TASKS_PATH)).await?;
        decode(&response)
    }

    /// One task by id.
    ///
    /// # Errors
    /// [`ClientError::Api`] with status `404` when the task does not exist.
    pub async fn get(&self, id: i64) -> ClientResult<Task> {
        let response = self.session.auth_fetch(ApiRequest::get(task_path(id))).await?;
        decode(&response)
    }

    /// Create a task and return it as stored.
    ///
    /// # Errors
    /// Any [`ClientError`] from the wrapper, or [`ClientError::Api`] on a non-2xx answer.
    pub async fn create(&self, task: &TaskCreate) -> ClientResult<Task> {
        let request = ApiRequest::post(TASKS_PATH)
            .json(task)
            .map_err(ClientError::Encode)?;
        let response = self.session.auth_fetch(request).await?;
        let created: Task = decode(&response)?;
        debug!(task_id = created.id, "task created");
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    /// Any [`ClientError`] from the wrapper, or [`ClientError::Api`] on a non-2xx answer.
    pub async fn update(&self, id: i64, update: &TaskUpdate) -> ClientResult<Task> {
        let request = ApiRequest::put(task_path(id))
            .json(update)
            .map_err(ClientError::Encode)?;
        let response = self.session.auth_fetch(request).await?;
        decode(&response)
    }

    /// Mark a task as completed.
    ///
    /// # Errors
    /// See [`update`](Self::update).
    pub async fn complete(&self, id: i64) -> ClientResult<Task> {
        self.update(id, &TaskUpdate::complete()).await
    }

    /// Delete a task. The backend answers `204 No Content`.
    ///
    /// # Errors
    /// Any [`ClientError`] from the wrapper, or [`ClientError::Api`] on a non-2xx answer.
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let response = self
            .session
            .auth_fetch(ApiRequest::delete(task_path(id)))
            .await?;
        ensure_success(&response)?;
        debug!(task_id = id, "task deleted");
        Ok(())
    }
}

fn task_path(id: i64) -> String {
    format!("{TASKS_PATH}{id}")
}

fn ensure_success(response: &ApiResponse) -> ClientResult<()> {
    if response.is_success() {
        return Ok(());
    }
    let message = server_detail(response).unwrap_or_else(|| {
        response
            .status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    Err(ClientError::Api {
        status: response.status,
        message,
    })
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ClientResult<T> {
    ensure_success(response)?;
    response
        .json()
        .map_err(|err| ClientError::MalformedResponse(err.to_string()))
}
