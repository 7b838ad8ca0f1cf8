// Task resource handlers - thin HTTP orchestration layer
// Handlers only deal with HTTP concerns:
// 1. Extract and validate path/query/body
// 2. Call the task store
// 3. Map the store result to a status and JSON body

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::db::SharedStore;
use crate::models::{ListTasksQuery, Task, TaskPayload};

fn invalid_id() -> ApiError {
    ApiError::BadRequest("invalid id".to_string())
}

/// Positive integer ids only
pub fn parse_task_id(raw: &str) -> ApiResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid_id()),
    }
}

/// `None`/empty means no filter; anything but `true`/`false` is rejected.
pub fn parse_completed_filter(raw: Option<&str>) -> ApiResult<Option<bool>> {
    match raw {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(_) => Err(ApiError::BadRequest("invalid completed value".to_string())),
    }
}

fn parse_payload(body: &Bytes) -> ApiResult<TaskPayload> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("invalid json".to_string()))
}

fn path_id(path: Result<Path<String>, PathRejection>) -> ApiResult<i64> {
    let Path(raw) = path.map_err(|_| invalid_id())?;
    parse_task_id(&raw)
}

/// GET /tasks?completed={true|false}
#[tracing::instrument(skip(store, query), fields(endpoint = "list_tasks", user_id = user.0))]
pub async fn list_tasks(
    State(store): State<SharedStore>,
    user: CurrentUser,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(pairs) =
        query.map_err(|_| ApiError::BadRequest("invalid completed value".to_string()))?;
    let query = ListTasksQuery::from(pairs);
    let filter = parse_completed_filter(query.completed.as_deref())?;

    let tasks = store.list_tasks(filter).await?;

    info!(count = tasks.len(), ?filter, "Listed tasks");
    Ok(Json(tasks))
}

/// POST /tasks
#[tracing::instrument(skip(store, body), fields(endpoint = "create_task", user_id = user.0))]
pub async fn create_task(
    State(store): State<SharedStore>,
    user: CurrentUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let payload = parse_payload(&body)?;

    let task = store.create_task(payload.into_new_task()).await?;

    info!(task_id = task.id, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks/{id}
#[tracing::instrument(skip(store, path), fields(endpoint = "get_task", user_id = user.0))]
pub async fn get_task(
    State(store): State<SharedStore>,
    user: CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let id = path_id(path)?;

    Ok(Json(store.get_task(id).await?))
}

/// PUT /tasks/{id}
///
/// The response echoes the caller's fields plus the stored timestamps; the
/// row is not read back after the write.
#[tracing::instrument(skip(store, path, body), fields(endpoint = "update_task", user_id = user.0))]
pub async fn update_task(
    State(store): State<SharedStore>,
    user: CurrentUser,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ApiResult<Json<Task>> {
    let id = path_id(path)?;
    let payload = parse_payload(&body)?;

    let task = store.update_task(payload.into_update(id)).await?;

    info!(task_id = task.id, completed = task.completed, "Updated task");
    Ok(Json(task))
}

/// DELETE /tasks/{id}
#[tracing::instrument(skip(store, path), fields(endpoint = "delete_task", user_id = user.0))]
pub async fn delete_task(
    State(store): State<SharedStore>,
    user: CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(path)?;

    store.delete_task(id).await?;

    info!(task_id = id, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}
