//! Shared application state handed to the API routers.

/// Cloned per router; the connection pool is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub db: database::postgres::DatabaseConnection,
}
