use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the task service.
///
/// The four `Invalid*` kinds are caller-input defects, `NotFound` means the
/// addressed task does not exist, and `Database` wraps any store failure with
/// the operation that hit it.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("title must not be empty")]
    InvalidTitle,

    #[error("invalid status '{0}': expected one of new, in_progress, done")]
    InvalidStatus(String),

    #[error("invalid limit '{0}': expected an integer between 0 and 1000")]
    InvalidLimit(String),

    #[error("invalid offset '{0}': expected a non-negative integer")]
    InvalidOffset(String),

    #[error("Task {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

impl TaskError {
    /// True for errors caused by the request itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TaskError::InvalidTitle
                | TaskError::InvalidStatus(_)
                | TaskError::InvalidLimit(_)
                | TaskError::InvalidOffset(_)
        )
    }
}

pub type TaskResult<T> = Result<T, TaskError>;

/// Convert TaskError to AppError for standardized error responses
impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(_) => AppError::NotFound(err.to_string()),
            e if e.is_validation() => AppError::BadRequest(e.to_string()),
            e => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for TaskError {
    fn from(err: sea_orm::DbErr) -> Self {
        TaskError::Database(err.to_string())
    }
}
