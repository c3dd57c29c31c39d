use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::DatabaseError;
use database::postgres::apply_sql_script;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
    TransactionTrait, Value,
};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    error::{TaskError, TaskResult},
    models::{DescriptionUpdate, ListQuery, NewTask, Task, TaskChanges, TaskListItem, TaskStatus},
    repository::TaskRepository,
};

/// Bootstrap DDL for the `tasks` table. Safe to apply repeatedly.
pub const SCHEMA: &str = include_str!("../../../../manifests/migrations/tasks/0001_create_tasks.sql");

const SELECT_TASK: &str =
    "SELECT id, title, description, status, created_at, updated_at FROM tasks WHERE id = $1";
const INSERT_TASK: &str =
    "INSERT INTO tasks (id, title, description, status) VALUES ($1, $2, $3, $4)";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = $1";

/// PostgreSQL task store.
///
/// Every statement is parameterized. Update and delete run inside a
/// transaction that commits only after the statement succeeds; an
/// uncommitted transaction is rolled back when dropped, which also covers a
/// caller abandoning the future.
#[derive(Clone)]
pub struct PgTaskRepository {
    db: DatabaseConnection,
    statement_timeout: Option<Duration>,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            statement_timeout: None,
        }
    }

    /// Fail any single store operation that runs longer than `timeout`.
    /// `None` disables the deadline.
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Create the `tasks` table and its index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        apply_sql_script(&self.db, SCHEMA).await
    }
}

#[derive(Debug, FromQueryResult)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self) -> TaskResult<Task> {
        Ok(Task {
            status: parse_stored_status(&self.status)?,
            id: self.id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct TaskListRow {
    id: Uuid,
    title: String,
    status: String,
}

impl TaskListRow {
    fn into_item(self) -> TaskResult<TaskListItem> {
        Ok(TaskListItem {
            status: parse_stored_status(&self.status)?,
            id: self.id,
            title: self.title,
        })
    }
}

fn parse_stored_status(raw: &str) -> TaskResult<TaskStatus> {
    TaskStatus::from_str(raw)
        .map_err(|_| TaskError::Database(format!("unexpected status '{}' in tasks table", raw)))
}

fn statement(sql: impl Into<String>, values: Vec<Value>) -> Statement {
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

pub(crate) fn insert_statement(task: &NewTask) -> Statement {
    statement(
        INSERT_TASK,
        vec![
            task.id.into(),
            task.title.clone().into(),
            task.description.clone().into(),
            task.status.as_str().into(),
        ],
    )
}

pub(crate) fn select_statement(id: Uuid) -> Statement {
    statement(SELECT_TASK, vec![id.into()])
}

/// `UPDATE` overwriting title and status, and description unless it is
/// [`DescriptionUpdate::Keep`]. `updated_at` is always refreshed.
pub(crate) fn update_statement(id: Uuid, changes: &TaskChanges) -> Statement {
    let mut assignments = vec!["title = $1".to_string()];
    let mut values: Vec<Value> = vec![changes.title.clone().into()];

    let description: Option<Option<String>> = match &changes.description {
        DescriptionUpdate::Keep => None,
        DescriptionUpdate::Clear => Some(None),
        DescriptionUpdate::Set(value) => Some(Some(value.clone())),
    };
    if let Some(description) = description {
        values.push(description.into());
        assignments.push(format!("description = ${}", values.len()));
    }

    values.push(changes.status.as_str().into());
    assignments.push(format!("status = ${}", values.len()));
    assignments.push("updated_at = now()".to_string());

    values.push(id.into());
    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ${}",
        assignments.join(", "),
        values.len()
    );

    statement(sql, values)
}

pub(crate) fn delete_statement(id: Uuid) -> Statement {
    statement(DELETE_TASK, vec![id.into()])
}

/// Page query: optional status predicate, id order, bound `LIMIT`/`OFFSET`.
/// Placeholder positions follow the number of predicates; no caller value
/// ever reaches the SQL text.
pub(crate) fn list_statement(query: &ListQuery) -> Statement {
    let mut sql = String::from("SELECT id, title, status FROM tasks");
    let mut values: Vec<Value> = Vec::with_capacity(3);

    if let Some(status) = query.status {
        values.push(status.as_str().into());
        sql.push_str(&format!(" WHERE status = ${}", values.len()));
    }

    sql.push_str(" ORDER BY id ASC");

    values.push(clamp_to_i64(query.limit).into());
    sql.push_str(&format!(" LIMIT ${}", values.len()));
    values.push(clamp_to_i64(query.offset).into());
    sql.push_str(&format!(" OFFSET ${}", values.len()));

    statement(sql, values)
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Await a store future under an optional deadline, tagging failures with
/// the operation name.
async fn with_deadline<T, F>(op: &str, deadline: Option<Duration>, fut: F) -> TaskResult<T>
where
    F: Future<Output = Result<T, DbErr>>,
{
    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!(
                operation = op,
                timeout_ms = limit.as_millis() as u64,
                "Store operation timed out"
            );
            TaskError::Database(format!("{}: timed out after {:?}", op, limit))
        })?,
        None => fut.await,
    };

    result.map_err(|e| TaskError::Database(format!("{}: {}", op, e)))
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, task: NewTask) -> TaskResult<Uuid> {
        let stmt = insert_statement(&task);
        with_deadline("insert task", self.statement_timeout, self.db.execute_raw(stmt)).await?;

        tracing::info!(task_id = %task.id, "Created task");
        Ok(task.id)
    }

    async fn get_by_id(&self, id: Uuid) -> TaskResult<Option<Task>> {
        let row = with_deadline(
            "get task",
            self.statement_timeout,
            TaskRow::find_by_statement(select_statement(id)).one(&self.db),
        )
        .await?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> TaskResult<u64> {
        let stmt = update_statement(id, &changes);
        let rows = with_deadline("update task", self.statement_timeout, async {
            let txn = self.db.begin().await?;
            let result = txn.execute_raw(stmt).await?;
            txn.commit().await?;
            Ok::<_, DbErr>(result.rows_affected())
        })
        .await?;

        if rows > 0 {
            tracing::info!(task_id = %id, "Updated task");
        }
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> TaskResult<u64> {
        let stmt = delete_statement(id);
        let rows = with_deadline("delete task", self.statement_timeout, async {
            let txn = self.db.begin().await?;
            let result = txn.execute_raw(stmt).await?;
            txn.commit().await?;
            Ok::<_, DbErr>(result.rows_affected())
        })
        .await?;

        if rows > 0 {
            tracing::info!(task_id = %id, "Deleted task");
        }
        Ok(rows)
    }

    async fn list(&self, query: ListQuery) -> TaskResult<Vec<TaskListItem>> {
        let rows = with_deadline(
            "list tasks",
            self.statement_timeout,
            TaskListRow::find_by_statement(list_statement(&query)).all(&self.db),
        )
        .await?;

        rows.into_iter().map(TaskListRow::into_item).collect()
    }
}
