//! Database library providing the PostgreSQL connection provider
//!
//! The rest of the workspace receives a ready, pooled
//! [`DatabaseConnection`](postgres::DatabaseConnection) from here and never
//! deals with pool settings, startup retries or health probing itself.
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::check_health(&db).await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, RetryConfig};
