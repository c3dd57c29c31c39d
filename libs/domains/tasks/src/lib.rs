//! Tasks Domain
//!
//! Validation, business rules and persistence for tasks: a title, an
//! optional description and a status of `new`, `in_progress` or `done`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP parsing, error → status mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules, validation, not-found semantics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + Postgres / in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tasks::{PgTaskRepository, TaskService};
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//!
//! let repository = PgTaskRepository::new(db);
//! repository.ensure_schema().await?;
//!
//! let service = TaskService::new(repository);
//! let id = service.create_task("Buy milk", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{TaskError, TaskResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateTaskRequest, CreateTaskResponse, DescriptionUpdate, ListQuery, NewTask, Task,
    TaskChanges, TaskListItem, TaskResponse, TaskStatus, UpdateTaskRequest, UpdateTaskResponse,
};
pub use postgres::{PgTaskRepository, SCHEMA};
pub use repository::{InMemoryTaskRepository, TaskRepository};
pub use service::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, TaskService};
