use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Task status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Default,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned on create
    #[default]
    New,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Wire and column representation
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduced projection returned by list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskListItem {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

/// A validated task ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// What an update does to the stored description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DescriptionUpdate {
    /// Leave the stored value untouched
    #[default]
    Keep,
    /// Store `NULL`
    Clear,
    Set(String),
}

impl DescriptionUpdate {
    /// `None` keeps the current value; a blank string clears it.
    pub fn from_input(input: Option<&str>) -> Self {
        match input {
            None => DescriptionUpdate::Keep,
            Some(raw) => match normalize_description(Some(raw)) {
                None => DescriptionUpdate::Clear,
                Some(value) => DescriptionUpdate::Set(value),
            },
        }
    }
}

/// A validated full overwrite of a task's mutable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: String,
    pub description: DescriptionUpdate,
    pub status: TaskStatus,
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
    pub limit: u64,
    pub offset: u64,
}

/// Trim a description; empty or whitespace-only becomes absent.
pub fn normalize_description(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// HTTP DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /tasks`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[schema(example = "Buy milk")]
    pub title: String,
    /// Blank or missing means no description
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /tasks/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: String,
    /// Missing or `null` keeps the current description, blank clears it
    #[serde(default)]
    pub description: Option<String>,
    /// One of `new`, `in_progress`, `done`
    #[serde(default)]
    #[schema(example = "in_progress")]
    pub status: String,
}

/// Query string of `GET /tasks`.
///
/// Values are kept as strings so that malformed numbers surface as
/// `InvalidLimit` / `InvalidOffset` rather than a generic rejection.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Filter by status; blank means no filter
    pub status: Option<String>,
    /// Page size, 0 or missing means 100, at most 1000
    pub limit: Option<String>,
    /// Number of tasks to skip
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskResponse {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskResponse {
    #[schema(example = "updated")]
    pub status: String,
}

impl UpdateTaskResponse {
    pub fn updated() -> Self {
        Self {
            status: "updated".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in TaskStatus::iter() {
            assert_eq!(TaskStatus::from_str(status.as_str()).unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn test_status_rejects_unknown_and_wrong_case() {
        assert!(TaskStatus::from_str("archived").is_err());
        assert!(TaskStatus::from_str("NEW").is_err());
        assert!(TaskStatus::from_str("").is_err());
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description(None), None);
        assert_eq!(normalize_description(Some("")), None);
        assert_eq!(normalize_description(Some("  \t\n")), None);
        assert_eq!(normalize_description(Some("  2% ")), Some("2%".to_string()));
    }

    #[test]
    fn test_description_update_from_input() {
        assert_eq!(DescriptionUpdate::from_input(None), DescriptionUpdate::Keep);
        assert_eq!(DescriptionUpdate::from_input(Some("   ")), DescriptionUpdate::Clear);
        assert_eq!(
            DescriptionUpdate::from_input(Some(" note ")),
            DescriptionUpdate::Set("note".to_string())
        );
    }

    #[test]
    fn test_task_response_omits_absent_description() {
        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7(),
            title: "Buy milk".to_string(),
            description: None,
            status: TaskStatus::New,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(TaskResponse::from(task)).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["status"], "new");
    }

    #[test]
    fn test_update_request_distinguishes_null_and_missing_description() {
        let missing: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"a","status":"new"}"#).unwrap();
        let null: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"a","description":null,"status":"new"}"#).unwrap();
        let blank: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"a","description":"","status":"new"}"#).unwrap();

        assert_eq!(missing.description, None);
        assert_eq!(null.description, None);
        assert_eq!(blank.description, Some(String::new()));
    }
}
