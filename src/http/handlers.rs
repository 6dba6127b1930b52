//! Route handlers.
//!
//! Every handler locks the shared [`Tracker`] for the length of one store
//! operation. A `POST` body carrying a non-zero `id` updates that record;
//! without one it creates a new record and answers `201 Created`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;

use super::response::{ApiResult, DeleteResponse, HealthResponse};
use super::SharedTracker;
use crate::task::{minutes, Entity, Epic, Status, Subtask, Task, TaskId, UNASSIGNED_ID};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBody {
    #[serde(default)]
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "minutes::deserialize")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
}

impl From<TaskBody> for Task {
    fn from(body: TaskBody) -> Self {
        let mut task = Task::with_id(body.id, body.name, body.description, body.status);
        task.duration = body.duration;
        task.start_time = body.start_time;
        task
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicBody {
    #[serde(default)]
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl From<EpicBody> for Epic {
    fn from(body: EpicBody) -> Self {
        Epic::with_id(body.id, body.name, body.description)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskBody {
    #[serde(default)]
    pub id: TaskId,
    pub epic_id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "minutes::deserialize")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
}

impl From<SubtaskBody> for Subtask {
    fn from(body: SubtaskBody) -> Self {
        let mut subtask =
            Subtask::with_id(body.id, body.epic_id, body.name, body.description, body.status);
        subtask.duration = body.duration;
        subtask.start_time = body.start_time;
        subtask
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Tasks

pub async fn list_tasks(State(tracker): State<SharedTracker>) -> Json<Vec<Task>> {
    Json(tracker.lock().await.get_all_tasks())
}

pub async fn get_task(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tracker.lock().await.get_task(id)?))
}

pub async fn upsert_task(
    State(tracker): State<SharedTracker>,
    Json(body): Json<TaskBody>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut tracker = tracker.lock().await;
    if body.id == UNASSIGNED_ID {
        let task = tracker.create_task(body.into())?;
        Ok((StatusCode::CREATED, Json(task)))
    } else {
        let task = tracker.update_task(body.into())?;
        Ok((StatusCode::OK, Json(task)))
    }
}

pub async fn delete_task(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = tracker.lock().await.delete_task(id)?;
    Ok(Json(DeleteResponse {
        id,
        deleted: removed.is_some(),
    }))
}

pub async fn delete_all_tasks(State(tracker): State<SharedTracker>) -> ApiResult<StatusCode> {
    tracker.lock().await.delete_all_tasks()?;
    Ok(StatusCode::NO_CONTENT)
}

// Epics

pub async fn list_epics(State(tracker): State<SharedTracker>) -> Json<Vec<Epic>> {
    Json(tracker.lock().await.get_all_epics())
}

pub async fn get_epic(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Epic>> {
    Ok(Json(tracker.lock().await.get_epic(id)?))
}

pub async fn get_epic_subtasks(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Vec<Subtask>>> {
    Ok(Json(tracker.lock().await.require_epic_subtasks(id)?))
}

pub async fn upsert_epic(
    State(tracker): State<SharedTracker>,
    Json(body): Json<EpicBody>,
) -> ApiResult<(StatusCode, Json<Epic>)> {
    let mut tracker = tracker.lock().await;
    if body.id == UNASSIGNED_ID {
        let epic = tracker.create_epic(body.into())?;
        Ok((StatusCode::CREATED, Json(epic)))
    } else {
        let epic = tracker.update_epic(body.into())?;
        Ok((StatusCode::OK, Json(epic)))
    }
}

pub async fn delete_epic(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = tracker.lock().await.delete_epic(id)?;
    Ok(Json(DeleteResponse {
        id,
        deleted: removed.is_some(),
    }))
}

pub async fn delete_all_epics(State(tracker): State<SharedTracker>) -> ApiResult<StatusCode> {
    tracker.lock().await.delete_all_epics()?;
    Ok(StatusCode::NO_CONTENT)
}

// Subtasks

pub async fn list_subtasks(State(tracker): State<SharedTracker>) -> Json<Vec<Subtask>> {
    Json(tracker.lock().await.get_all_subtasks())
}

pub async fn get_subtask(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(tracker.lock().await.get_subtask(id)?))
}

pub async fn upsert_subtask(
    State(tracker): State<SharedTracker>,
    Json(body): Json<SubtaskBody>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let mut tracker = tracker.lock().await;
    if body.id == UNASSIGNED_ID {
        let subtask = tracker.create_subtask(body.into())?;
        Ok((StatusCode::CREATED, Json(subtask)))
    } else {
        let subtask = tracker.update_subtask(body.into())?;
        Ok((StatusCode::OK, Json(subtask)))
    }
}

pub async fn delete_subtask(
    State(tracker): State<SharedTracker>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = tracker.lock().await.delete_subtask(id)?;
    Ok(Json(DeleteResponse {
        id,
        deleted: removed.is_some(),
    }))
}

pub async fn delete_all_subtasks(State(tracker): State<SharedTracker>) -> ApiResult<StatusCode> {
    tracker.lock().await.delete_all_subtasks()?;
    Ok(StatusCode::NO_CONTENT)
}

// Views

pub async fn history(State(tracker): State<SharedTracker>) -> Json<Vec<Entity>> {
    Json(tracker.lock().await.get_history())
}

pub async fn prioritized(State(tracker): State<SharedTracker>) -> Json<Vec<Entity>> {
    Json(tracker.lock().await.get_prioritized_tasks())
}
