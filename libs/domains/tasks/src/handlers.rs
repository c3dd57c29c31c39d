use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use axum_helpers::{
    JsonBody, UuidPath,
    errors::responses::{
        BadRequestJsonResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{TaskError, TaskResult};
use crate::models::{
    CreateTaskRequest, CreateTaskResponse, ListTasksQuery, TaskListItem, TaskResponse, TaskStatus,
    UpdateTaskRequest, UpdateTaskResponse,
};
use crate::repository::TaskRepository;
use crate::service::TaskService;

const TAG: &str = "tasks";

/// OpenAPI documentation for Tasks API
#[derive(OpenApi)]
#[openapi(
    paths(list_tasks, create_task, get_task, update_task, delete_task),
    components(
        schemas(
            TaskResponse,
            TaskListItem,
            TaskStatus,
            CreateTaskRequest,
            CreateTaskResponse,
            UpdateTaskRequest,
            UpdateTaskResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            BadRequestJsonResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Task management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the task router with all HTTP endpoints
pub fn router<R: TaskRepository + 'static>(service: TaskService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/{id}", get(get_task).put(update_task).delete(delete_task))
        .with_state(shared_service)
}

/// Parse an optional integer query value. Blank counts as absent.
fn parse_query_int(
    raw: Option<&str>,
    invalid: impl FnOnce(String) -> TaskError,
) -> TaskResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| invalid(value.to_string())),
    }
}

/// List tasks, one page at a time
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Page of tasks ordered by id", body = Vec<TaskListItem>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn list_tasks<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Query(query): Query<ListTasksQuery>,
) -> TaskResult<Json<Vec<TaskListItem>>> {
    let limit = parse_query_int(query.limit.as_deref(), TaskError::InvalidLimit)?;
    let offset = parse_query_int(query.offset.as_deref(), TaskError::InvalidOffset)?;
    let status = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let tasks = service.list_tasks(status, limit, offset).await?;
    Ok(Json(tasks))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = CreateTaskResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn create_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    JsonBody(input): JsonBody<CreateTaskRequest>,
) -> TaskResult<(StatusCode, Json<CreateTaskResponse>)> {
    let id = service
        .create_task(&input.title, input.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(CreateTaskResponse { id })))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Task ID (UUID)")
    ),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn get_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
) -> TaskResult<Json<TaskResponse>> {
    let task = service.get_task(id).await?;
    Ok(Json(task.into()))
}

/// Update a task's title, description and status
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Task ID (UUID)")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = UpdateTaskResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn update_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
    JsonBody(input): JsonBody<UpdateTaskRequest>,
) -> TaskResult<Json<UpdateTaskResponse>> {
    service
        .update_task(id, &input.title, input.description.as_deref(), &input.status)
        .await?;
    Ok(Json(UpdateTaskResponse::updated()))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Task ID (UUID)")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn delete_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
) -> TaskResult<StatusCode> {
    service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
