//! Task CRUD and bulk-create handlers.

use super::{parse_body, DEFAULT_LIMIT};
use crate::envelope::{self, ApiFailure, ApiResult, Pagination};
use crate::state::{AppState, CurrentUser};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Extension;
use serde::Deserialize;
use taskrelay_core::{CoreError, NewTaskInput, Task, TaskId, TaskPatch};

fn parse_task_id(raw: &str) -> Result<TaskId, ApiFailure> {
    TaskId::parse(raw)
        .ok_or_else(|| ApiFailure(CoreError::validation(format!("invalid task id: {raw}"))))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    completed: Option<bool>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// `GET /api/tasks`: the owner's tasks, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let (items, total) = state.tasks.list(user.0, query.completed, limit, offset)?;
    Ok(envelope::page(items, Pagination::new(total, limit, offset)))
}

/// `GET /api/tasks/stats`: the owner's aggregate counts.
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult {
    let stats = state.tasks.stats(user.0)?;
    Ok(envelope::ok(stats))
}

/// `GET /api/tasks/:id`.
pub async fn get_one(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = state.tasks.get(parse_task_id(&id)?, user.0)?;
    Ok(envelope::ok(task))
}

/// `POST /api/tasks`.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> ApiResult {
    let input: NewTaskInput = parse_body(&body)?;
    input.reject_client_owner()?;

    let task = Task::new(user.0, &input.title, &input.body, input.origin_id.clone())?;
    let task = state.tasks.insert(task)?;
    Ok(envelope::created("Task created successfully", task))
}

/// `POST /api/tasks/sync`: bulk create; items are independent.
pub async fn sync_batch(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> ApiResult {
    #[derive(Deserialize)]
    struct SyncBody {
        tasks: Vec<NewTaskInput>,
    }

    let SyncBody { tasks } = parse_body(&body)?;
    if tasks.is_empty() {
        return Err(ApiFailure(CoreError::validation(
            "tasks must be a non-empty array",
        )));
    }

    let report = state.reconciler.batch_create(user.0, tasks);
    Ok(envelope::ok_with_message(
        format!("Synced {} tasks", report.synced.len()),
        report,
    ))
}

/// `PUT /api/tasks/:id`: partial update.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let patch: TaskPatch = parse_body(&body)?;
    patch.reject_client_owner()?;

    let task = state.tasks.update(parse_task_id(&id)?, user.0, &patch)?;
    Ok(envelope::ok_with_message("Task updated successfully", task))
}

/// `PATCH /api/tasks/:id/toggle`.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = state.tasks.toggle_complete(parse_task_id(&id)?, user.0)?;
    Ok(envelope::ok_with_message("Task status updated", task))
}

/// `DELETE /api/tasks/:id`.
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult {
    state.tasks.delete(parse_task_id(&id)?, user.0)?;
    Ok(envelope::message_only("Task deleted successfully"))
}
