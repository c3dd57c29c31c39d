use axum::Router;
use domain_tasks::{PgTaskRepository, TaskService, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgTaskRepository::new(state.db.clone())
        .with_statement_timeout(state.config.database.statement_timeout());
    let service = TaskService::new(repository);
    handlers::router(service)
}
