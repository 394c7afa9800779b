/// Task endpoints, all ownership-scoped
///
/// # Endpoints
///
/// - `POST /tasks` - create, owner forced to the caller
/// - `GET /tasks` - list with `isCompleted`, `sortBy`, `limit`, `skip`
/// - `GET /tasks/:id` - fetch one
/// - `PATCH /tasks/:id` - update {description, isCompleted} only
/// - `DELETE /tasks/:id` - delete, returns the removed task
///
/// Every lookup goes through a predicate that carries the caller's id, so
/// a task belonging to someone else yields the same 404 as a task that
/// does not exist. There is no route that can reach another user's tasks.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use taskvault_shared::auth::gate::Authenticated;
use taskvault_shared::models::task::{NewTask, Task, TaskUpdate};
use taskvault_shared::query::{ListParams, TaskQuery};
use taskvault_shared::store::TaskPredicate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Creates a task owned by the caller
///
/// The body may only carry {description, isCompleted}; an explicit owner
/// field is rejected rather than silently overridden.
///
/// # Errors
///
/// - `400 Bad Request`: empty description or an unknown field
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(draft) = payload.map_err(ApiError::from_rejection)?;

    let task = Task::create(auth.user.id, draft)?;
    state.tasks.save_task(&task).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Lists the caller's tasks
///
/// Query parameters are coerced leniently: an unparsable `limit` or `skip`
/// means "no constraint", an unknown `sortBy` field means default order.
///
/// ```text
/// GET /tasks?isCompleted=true&sortBy=createdAt:desc&limit=10&skip=0
/// ```
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let query = TaskQuery::from_params(auth.user.id, &params);
    let tasks = state.tasks.list_tasks(&query).await?;

    Ok(Json(tasks))
}

/// Fetches a single task by id, scoped to the caller
pub async fn get_one(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let predicate = owned_predicate(&id, &auth)?;
    let task = state
        .tasks
        .find_task(&predicate)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(task))
}

/// Updates a task's description and/or completion flag
///
/// # Errors
///
/// - `400 Bad Request`: unknown field or empty description
/// - `404 Not Found`: absent task, or a task owned by someone else
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    Path(id): Path<String>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(changes) = payload.map_err(ApiError::from_rejection)?;

    let predicate = owned_predicate(&id, &auth)?;
    let mut task = state
        .tasks
        .find_task(&predicate)
        .await?
        .ok_or(ApiError::NotFound)?;

    task.apply(changes)?;
    state.tasks.save_task(&task).await?;

    Ok(Json(task))
}

/// Deletes a task, returning the removed record
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let predicate = owned_predicate(&id, &auth)?;
    let task = state
        .tasks
        .delete_task(&predicate)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(task))
}

/// Builds the ownership predicate for a path id
///
/// An unparsable id maps to the same 404 as an absent task.
fn owned_predicate(raw_id: &str, auth: &Authenticated) -> Result<TaskPredicate, ApiError> {
    let id = Uuid::parse_str(raw_id).map_err(|_| ApiError::NotFound)?;
    Ok(TaskPredicate::owned(id, auth.user.id))
}
