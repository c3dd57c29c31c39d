use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::TaskResult;
use crate::models::{DescriptionUpdate, ListQuery, NewTask, Task, TaskChanges, TaskListItem};

/// Repository trait for Task persistence
///
/// Implementations execute storage operations only. They never validate
/// input and never turn absence into an error: lookups return `None` and
/// mutations report how many rows they touched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task and return its id
    async fn insert(&self, task: NewTask) -> TaskResult<Uuid>;

    /// Get a task by ID
    async fn get_by_id(&self, id: Uuid) -> TaskResult<Option<Task>>;

    /// Overwrite a task's mutable fields, returning the affected row count
    async fn update(&self, id: Uuid, changes: TaskChanges) -> TaskResult<u64>;

    /// Delete a task, returning the affected row count
    async fn delete(&self, id: Uuid) -> TaskResult<u64>;

    /// One page of tasks ordered by id ascending
    async fn list(&self, query: ListQuery) -> TaskResult<Vec<TaskListItem>>;
}

/// In-memory implementation of TaskRepository (for development and tests)
///
/// Backed by a `BTreeMap`, so iteration order is id order like the
/// `ORDER BY id` of the Postgres store.
#[derive(Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<BTreeMap<Uuid, Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: NewTask) -> TaskResult<Uuid> {
        let now = Utc::now();
        let id = task.id;

        self.tasks.write().await.insert(
            id,
            Task {
                id,
                title: task.title,
                description: task.description,
                status: task.status,
                created_at: now,
                updated_at: now,
            },
        );

        tracing::info!(task_id = %id, "Created task");
        Ok(id)
    }

    async fn get_by_id(&self, id: Uuid) -> TaskResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> TaskResult<u64> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            return Ok(0);
        };

        task.title = changes.title;
        task.status = changes.status;
        match changes.description {
            DescriptionUpdate::Keep => {}
            DescriptionUpdate::Clear => task.description = None,
            DescriptionUpdate::Set(value) => task.description = Some(value),
        }
        // Same invariant as the table's CHECK (updated_at >= created_at).
        task.updated_at = Utc::now().max(task.created_at);

        tracing::info!(task_id = %id, "Updated task");
        Ok(1)
    }

    async fn delete(&self, id: Uuid) -> TaskResult<u64> {
        let removed = self.tasks.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(task_id = %id, "Deleted task");
        }
        Ok(u64::from(removed))
    }

    async fn list(&self, query: ListQuery) -> TaskResult<Vec<TaskListItem>> {
        let tasks = self.tasks.read().await;

        let page = tasks
            .values()
            .filter(|task| query.status.is_none_or(|status| task.status == status))
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .map(|task| TaskListItem {
                id: task.id,
                title: task.title.clone(),
                status: task.status,
            })
            .collect();

        Ok(page)
    }
}
