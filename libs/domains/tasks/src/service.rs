use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{
    DescriptionUpdate, ListQuery, NewTask, Task, TaskChanges, TaskListItem, TaskStatus,
    normalize_description,
};
use crate::repository::TaskRepository;

/// Page size used when the caller gives none (or zero)
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Largest accepted page size
pub const MAX_LIST_LIMIT: u64 = 1000;

/// Service layer for Task business logic
///
/// Owns every business rule: trimming and emptiness checks, the status
/// enumeration, pagination bounds and the translation of "no row" into
/// [`TaskError::NotFound`]. Store errors pass through untouched.
pub struct TaskService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> Clone for TaskService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a task with status `new` and return its id.
    #[instrument(skip(self, title, description))]
    pub async fn create_task(&self, title: &str, description: Option<&str>) -> TaskResult<Uuid> {
        let title = validate_title(title)?;

        let task = NewTask {
            id: Uuid::now_v7(),
            title,
            description: normalize_description(description),
            status: TaskStatus::New,
        };

        self.repository.insert(task).await
    }

    /// Get a task by ID
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn get_task(&self, id: Uuid) -> TaskResult<Task> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(TaskError::NotFound(id))
    }

    /// Overwrite title and status, and description when one is given.
    ///
    /// `description`: `None` keeps the stored value, a blank string clears it.
    #[instrument(skip(self, title, description), fields(task_id = %id))]
    pub async fn update_task(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        status: &str,
    ) -> TaskResult<()> {
        let changes = TaskChanges {
            title: validate_title(title)?,
            status: parse_status(status)?,
            description: DescriptionUpdate::from_input(description),
        };

        match self.repository.update(id, changes).await? {
            0 => Err(TaskError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// Delete a task. Deleting an absent task is `NotFound`.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn delete_task(&self, id: Uuid) -> TaskResult<()> {
        match self.repository.delete(id).await? {
            0 => Err(TaskError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// List one page of tasks ordered by id, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        status: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> TaskResult<Vec<TaskListItem>> {
        let query = ListQuery {
            status: status.map(parse_status).transpose()?,
            limit: validate_limit(limit)?,
            offset: validate_offset(offset)?,
        };

        self.repository.list(query).await
    }
}

fn validate_title(title: &str) -> TaskResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::InvalidTitle);
    }
    Ok(title.to_string())
}

fn parse_status(status: &str) -> TaskResult<TaskStatus> {
    TaskStatus::from_str(status).map_err(|_| TaskError::InvalidStatus(status.to_string()))
}

fn validate_limit(limit: Option<i64>) -> TaskResult<u64> {
    match limit {
        None | Some(0) => Ok(DEFAULT_LIST_LIMIT),
        Some(n) => u64::try_from(n)
            .ok()
            .filter(|n| *n <= MAX_LIST_LIMIT)
            .ok_or_else(|| TaskError::InvalidLimit(n.to_string())),
    }
}

fn validate_offset(offset: Option<i64>) -> TaskResult<u64> {
    match offset {
        None => Ok(0),
        Some(n) => u64::try_from(n).map_err(|_| TaskError::InvalidOffset(n.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockTaskRepository;
    use chrono::Utc;
    use mockall::predicate::*;
    use strum::IntoEnumIterator;

    fn service(mock: MockTaskRepository) -> TaskService<MockTaskRepository> {
        TaskService::new(mock)
    }

    #[tokio::test]
    async fn test_create_task_trims_and_defaults() {
        let mut mock = MockTaskRepository::new();
        mock.expect_insert()
            .withf(|task| {
                task.title == "Buy milk" && task.description.is_none() && task.status == TaskStatus::New
            })
            .times(1)
            .returning(|task| Ok(task.id));

        let id = service(mock)
            .create_task("  Buy milk ", Some("   "))
            .await
            .unwrap();
        assert!(!id.is_nil());
    }

    #[tokio::test]
    async fn test_create_task_keeps_trimmed_description() {
        let mut mock = MockTaskRepository::new();
        mock.expect_insert()
            .withf(|task| task.description.as_deref() == Some("2%"))
            .times(1)
            .returning(|task| Ok(task.id));

        service(mock).create_task("Buy milk", Some(" 2% ")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_task_blank_title_never_reaches_store() {
        let mut mock = MockTaskRepository::new();
        mock.expect_insert().times(0);
        let service = service(mock);

        for title in ["", "   ", "\t\n"] {
            let err = service.create_task(title, Some("x")).await.unwrap_err();
            assert!(matches!(err, TaskError::InvalidTitle));
        }
    }

    #[tokio::test]
    async fn test_create_task_assigns_distinct_ids() {
        let mut mock = MockTaskRepository::new();
        mock.expect_insert().times(2).returning(|task| Ok(task.id));
        let service = service(mock);

        let a = service.create_task("a", None).await.unwrap();
        let b = service.create_task("b", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let id = Uuid::now_v7();
        let mut mock = MockTaskRepository::new();
        mock.expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(None));

        let err = service(mock).get_task(id).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_get_task_found() {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut mock = MockTaskRepository::new();
        mock.expect_get_by_id().with(eq(id)).returning(move |_| {
            Ok(Some(Task {
                id,
                title: "Buy milk".to_string(),
                description: None,
                status: TaskStatus::New,
                created_at: now,
                updated_at: now,
            }))
        });

        let task = service(mock).get_task(id).await.unwrap();
        assert_eq!(task.id, id);
    }

    #[tokio::test]
    async fn test_update_task_accepts_every_status() {
        let mut mock = MockTaskRepository::new();
        mock.expect_update().times(3).returning(|_, _| Ok(1));
        let service = service(mock);

        for status in TaskStatus::iter() {
            service
                .update_task(Uuid::now_v7(), "title", None, status.as_str())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_update_task_invalid_status() {
        let mut mock = MockTaskRepository::new();
        mock.expect_update().times(0);
        let service = service(mock);

        for status in ["", "archived", "Done", "in progress"] {
            let err = service
                .update_task(Uuid::now_v7(), "title", None, status)
                .await
                .unwrap_err();
            assert!(matches!(err, TaskError::InvalidStatus(ref s) if s == status));
        }
    }

    #[tokio::test]
    async fn test_update_task_checks_title_before_status() {
        let mut mock = MockTaskRepository::new();
        mock.expect_update().times(0);

        let err = service(mock)
            .update_task(Uuid::now_v7(), " ", None, "bogus")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTitle));
    }

    #[tokio::test]
    async fn test_update_task_description_semantics() {
        let mut mock = MockTaskRepository::new();
        mock.expect_update()
            .withf(|_, c| c.description == DescriptionUpdate::Keep)
            .times(1)
            .returning(|_, _| Ok(1));
        mock.expect_update()
            .withf(|_, c| c.description == DescriptionUpdate::Clear)
            .times(1)
            .returning(|_, _| Ok(1));
        mock.expect_update()
            .withf(|_, c| c.description == DescriptionUpdate::Set("2%".to_string()))
            .times(1)
            .returning(|_, _| Ok(1));
        let service = service(mock);
        let id = Uuid::now_v7();

        service.update_task(id, "t", None, "new").await.unwrap();
        service.update_task(id, "t", Some("  "), "new").await.unwrap();
        service.update_task(id, "t", Some(" 2% "), "new").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_task_zero_rows_is_not_found() {
        let id = Uuid::now_v7();
        let mut mock = MockTaskRepository::new();
        mock.expect_update()
            .withf(move |target, changes| {
                *target == id && changes.title == "Buy milk" && changes.status == TaskStatus::Done
            })
            .times(1)
            .returning(|_, _| Ok(0));

        let err = service(mock)
            .update_task(id, " Buy milk ", Some("x"), "done")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_delete_task_is_strict() {
        let mut mock = MockTaskRepository::new();
        let mut remaining = 1u64;
        mock.expect_delete().times(2).returning(move |_| {
            let rows = remaining;
            remaining = 0;
            Ok(rows)
        });
        let service = service(mock);
        let id = Uuid::now_v7();

        service.delete_task(id).await.unwrap();
        let err = service.delete_task(id).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unchanged() {
        let mut mock = MockTaskRepository::new();
        mock.expect_delete()
            .returning(|_| Err(TaskError::Database("delete task: connection reset".to_string())));

        let err = service(mock).delete_task(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, TaskError::Database(ref m) if m == "delete task: connection reset"));
    }

    #[tokio::test]
    async fn test_list_tasks_defaults() {
        let mut mock = MockTaskRepository::new();
        mock.expect_list()
            .with(eq(ListQuery {
                status: None,
                limit: DEFAULT_LIST_LIMIT,
                offset: 0,
            }))
            .times(2)
            .returning(|_| Ok(vec![]));
        let service = service(mock);

        service.list_tasks(None, None, None).await.unwrap();
        service.list_tasks(None, Some(0), Some(0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tasks_limit_bounds() {
        let mut mock = MockTaskRepository::new();
        mock.expect_list()
            .with(eq(ListQuery {
                status: None,
                limit: MAX_LIST_LIMIT,
                offset: 0,
            }))
            .times(1)
            .returning(|_| Ok(vec![]));
        let service = service(mock);

        service.list_tasks(None, Some(1000), None).await.unwrap();

        for limit in [1001, -1, i64::MIN] {
            let err = service.list_tasks(None, Some(limit), None).await.unwrap_err();
            assert!(matches!(err, TaskError::InvalidLimit(_)));
        }
    }

    #[tokio::test]
    async fn test_list_tasks_negative_offset() {
        let mut mock = MockTaskRepository::new();
        mock.expect_list().times(0);

        let err = service(mock)
            .list_tasks(None, Some(10), Some(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidOffset(ref s) if s == "-1"));
    }

    #[tokio::test]
    async fn test_list_tasks_status_filter() {
        let mut mock = MockTaskRepository::new();
        for status in TaskStatus::iter() {
            mock.expect_list()
                .with(eq(ListQuery {
                    status: Some(status),
                    limit: 2,
                    offset: 4,
                }))
                .times(1)
                .returning(|_| Ok(vec![]));
        }
        let service = service(mock);

        for status in TaskStatus::iter() {
            service
                .list_tasks(Some(status.as_str()), Some(2), Some(4))
                .await
                .unwrap();
        }

        let err = service
            .list_tasks(Some("archived"), Some(-5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidStatus(_)));
    }
}
