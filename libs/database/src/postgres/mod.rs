//! PostgreSQL connection provider
//!
//! Connection management, startup retry, bootstrap SQL and health checks.

mod config;
mod connector;
mod health;

pub use config::PostgresConfig;
pub use connector::{
    apply_sql_script, connect, connect_from_config_with_retry,
    connect_with_options,
};
pub use health::{HealthStatus, check_health, check_health_detailed};

// Re-export SeaORM types for convenience
pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
